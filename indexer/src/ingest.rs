use anyhow::{bail, Context, Result};
use quarry_core::{DocId, DocMeta, Document};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputId {
    Num(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: InputId,
    #[serde(default)]
    title: Option<String>,
    body: String,
    #[serde(default)]
    url: Option<String>,
}

/// `.json` / `.jsonl` files under `input`, or `input` itself, sorted by path.
pub fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files.sort();
    files
}

fn read_file(file: &Path, out: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let doc: InputDoc = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}", file.display(), n + 1))?;
            out.push(doc);
        }
        return Ok(());
    }
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v).with_context(|| file.display().to_string())?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping file without a document object or array"),
    }
    Ok(())
}

/// Load every document under `input`.
///
/// Numeric ids are kept as-is. String ids are numbered after the largest
/// numeric id, in input order, and kept as `external_id` for display.
pub fn load_documents(input: &Path) -> Result<Vec<Document>> {
    let files = input_files(input);
    if files.is_empty() {
        bail!("no .json or .jsonl files found at {}", input.display());
    }
    let mut raw: Vec<InputDoc> = Vec::new();
    for file in &files {
        read_file(file, &mut raw)?;
    }

    let max_numeric = raw
        .iter()
        .filter_map(|d| match d.id { InputId::Num(n) => Some(n), InputId::Text(_) => None })
        .max();
    // None once the id space above the largest numeric id is used up
    let mut next_id: Option<DocId> = match max_numeric {
        Some(n) => n.checked_add(1),
        None => Some(0),
    };
    let mut external: HashMap<String, DocId> = HashMap::new();
    let mut docs = Vec::with_capacity(raw.len());
    for doc in raw {
        let (id, external_id) = match doc.id {
            InputId::Num(n) => (n, None),
            InputId::Text(s) => {
                if let Some(prev) = external.get(&s) {
                    bail!("duplicate document id {s:?} (already assigned {prev})");
                }
                let Some(id) = next_id else {
                    bail!("no numeric id left for document {s:?}");
                };
                next_id = id.checked_add(1);
                external.insert(s.clone(), id);
                (id, Some(s))
            }
        };
        let meta = DocMeta { title: doc.title, source: doc.url, external_id };
        docs.push(Document::new(id, doc.body).with_meta(meta));
    }
    tracing::info!(files = files.len(), num_docs = docs.len(), "read input documents");
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_json_and_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"[{"id": 4, "title": "Four", "body": "four score"}, {"id": "alpha", "body": "first letter"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.jsonl"),
            "{\"id\": \"beta\", \"body\": \"second letter\", \"url\": \"http://x\"}\n\n{\"id\": 9, \"body\": \"nine\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let ids: Vec<DocId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![4, 10, 11, 9]);
        assert_eq!(docs[1].meta.external_id.as_deref(), Some("alpha"));
        assert_eq!(docs[2].meta.source.as_deref(), Some("http://x"));
        assert_eq!(docs[0].meta.title.as_deref(), Some("Four"));
    }

    #[test]
    fn duplicate_string_ids_fail() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("d.jsonl"), "{\"id\": \"x\", \"body\": \"a\"}\n{\"id\": \"x\", \"body\": \"b\"}\n").unwrap();
        assert!(load_documents(dir.path()).is_err());
    }

    #[test]
    fn largest_numeric_id_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("max.jsonl"), "{\"id\": 18446744073709551615, \"body\": \"x\"}\n").unwrap();
        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs[0].id, u64::MAX);

        fs::write(dir.path().join("named.jsonl"), "{\"id\": \"late\", \"body\": \"y\"}\n").unwrap();
        let err = load_documents(dir.path()).unwrap_err();
        assert!(err.to_string().contains("late"), "{err}");
    }

    #[test]
    fn empty_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_documents(dir.path()).is_err());
    }
}
