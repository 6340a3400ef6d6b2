use crate::DocId;
use std::cmp::Ordering;

/// Sorted, duplicate-free set of document ids.
///
/// All set operations are linear merges over the two inputs, which is why
/// posting lists must stay sorted by doc id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocSet {
    ids: Vec<DocId>,
}

impl DocSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap ids already in strictly increasing order.
    pub fn from_sorted(ids: Vec<DocId>) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]), "doc ids must be strictly increasing");
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.ids
    }

    pub fn into_vec(self) -> Vec<DocId> {
        self.ids
    }

    pub fn intersect(&self, other: &DocSet) -> DocSet {
        let (a, b) = (&self.ids, &other.ids);
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        DocSet { ids: out }
    }

    pub fn union(&self, other: &DocSet) -> DocSet {
        let (a, b) = (&self.ids, &other.ids);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        DocSet { ids: out }
    }

    /// Ids in `self` that are not in `other`.
    pub fn difference(&self, other: &DocSet) -> DocSet {
        let (a, b) = (&self.ids, &other.ids);
        let mut out = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() {
            if j == b.len() {
                out.extend_from_slice(&a[i..]);
                break;
            }
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        DocSet { ids: out }
    }
}

impl FromIterator<DocId> for DocSet {
    /// Collects any ids, sorting and deduplicating them.
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        let mut ids: Vec<DocId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        DocSet { ids }
    }
}

impl<'a> IntoIterator for &'a DocSet {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[DocId]) -> DocSet {
        DocSet::from_sorted(ids.to_vec())
    }

    #[test]
    fn merges() {
        let a = set(&[1, 3, 5, 7]);
        let b = set(&[3, 4, 5, 9]);
        assert_eq!(a.intersect(&b), set(&[3, 5]));
        assert_eq!(a.union(&b), set(&[1, 3, 4, 5, 7, 9]));
        assert_eq!(a.difference(&b), set(&[1, 7]));
        assert_eq!(b.difference(&a), set(&[4, 9]));
    }

    #[test]
    fn empty_operands() {
        let a = set(&[1, 2]);
        let e = DocSet::new();
        assert!(a.intersect(&e).is_empty());
        assert_eq!(a.union(&e), a);
        assert_eq!(a.difference(&e), a);
        assert!(e.difference(&a).is_empty());
    }

    #[test]
    fn intersection_is_within_union() {
        let a = set(&[2, 4, 6, 8, 10]);
        let b = set(&[1, 2, 3, 8]);
        let and = a.intersect(&b);
        let or = a.union(&b);
        assert!(and.iter().all(|id| or.contains(id)));
        assert_eq!(and.len() + or.len(), a.len() + b.len());
    }

    #[test]
    fn collect_sorts_and_dedups() {
        let s: DocSet = vec![5, 1, 5, 3].into_iter().collect();
        assert_eq!(s.as_slice(), &[1, 3, 5]);
    }
}
