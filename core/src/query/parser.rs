use super::{PhraseTerm, Query, QueryMode};
use crate::error::{Error, Result};
use crate::tokenizer::Tokenizer;

/// Turns query strings into [`Query`] trees.
///
/// Syntax: bare words (implicitly ANDed), `AND` / `OR` (same precedence,
/// left to right), prefix `NOT`, `( ... )` grouping and `"quoted phrases"`.
/// Words go through the index tokenizer, so stop words drop out of the tree.
pub struct QueryParser<'t> {
    tokenizer: &'t Tokenizer,
    mode: QueryMode,
}

impl<'t> QueryParser<'t> {
    pub fn new(tokenizer: &'t Tokenizer) -> Self {
        Self { tokenizer, mode: QueryMode::default() }
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn parse(&self, input: &str) -> Result<Query> {
        let lexemes = lex(input)?;
        if lexemes.is_empty() {
            return Err(Error::QueryEmpty);
        }

        if self.mode == QueryMode::Any && lexemes.iter().all(|l| matches!(l.kind, Kind::Word(_))) {
            let mut terms: Vec<String> = Vec::new();
            for lexeme in &lexemes {
                if let Kind::Word(word) = &lexeme.kind {
                    for term in self.tokenizer.terms(word) {
                        if !terms.contains(&term) {
                            terms.push(term);
                        }
                    }
                }
            }
            if terms.is_empty() {
                return Err(Error::QueryEmpty);
            }
            return Ok(Query::FreeText(terms));
        }

        let mut cursor = Cursor { parser: self, lexemes: &lexemes, at: 0, end: input.len() };
        let query = cursor.expression()?;
        if let Some(extra) = cursor.peek() {
            return Err(Error::syntax(extra.pos, "unexpected token"));
        }
        query.ok_or(Error::QueryEmpty)
    }

    /// Normalize a word or phrase body. More than one term becomes a phrase.
    fn leaf(&self, text: &str) -> Option<Query> {
        let tokens: Vec<_> = self.tokenizer.tokens(text).collect();
        match tokens.len() {
            0 => None,
            1 => tokens.into_iter().next().map(|t| Query::Term(t.term)),
            _ => {
                let base = tokens[0].position;
                Some(Query::Phrase(
                    tokens
                        .into_iter()
                        .map(|t| PhraseTerm { term: t.term, offset: t.position - base })
                        .collect(),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Open,
    Close,
    And,
    Or,
    Not,
    Word(String),
    Phrase(String),
}

#[derive(Debug)]
struct Lexeme {
    kind: Kind,
    /// Byte offset of the lexeme in the query string.
    pos: usize,
}

/// Split the query into lexemes and check parenthesis and quote balance.
fn lex(input: &str) -> Result<Vec<Lexeme>> {
    let mut out = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                open.push(pos);
                out.push(Lexeme { kind: Kind::Open, pos });
            }
            ')' => {
                chars.next();
                if open.pop().is_none() {
                    return Err(Error::syntax(pos, "unmatched closing parenthesis"));
                }
                out.push(Lexeme { kind: Kind::Close, pos });
            }
            '"' => {
                chars.next();
                let start = pos + 1;
                let end = loop {
                    match chars.next() {
                        Some((i, '"')) => break i,
                        Some(_) => {}
                        None => return Err(Error::syntax(pos, "unterminated phrase")),
                    }
                };
                out.push(Lexeme { kind: Kind::Phrase(input[start..end].to_string()), pos });
            }
            _ => {
                let mut end = input.len();
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                let word = &input[pos..end];
                let kind = match word {
                    "AND" => Kind::And,
                    "OR" => Kind::Or,
                    "NOT" => Kind::Not,
                    _ => Kind::Word(word.to_string()),
                };
                out.push(Lexeme { kind, pos });
            }
        }
    }

    if let Some(&pos) = open.last() {
        return Err(Error::syntax(pos, "unclosed parenthesis"));
    }
    Ok(out)
}

/// Recursive-descent state over the lexeme stream.
///
/// Each production returns `None` when every word it covered normalized
/// away, so stop words prune cleanly instead of matching nothing.
struct Cursor<'p, 't> {
    parser: &'p QueryParser<'t>,
    lexemes: &'p [Lexeme],
    at: usize,
    end: usize,
}

#[derive(Clone, Copy)]
enum Op {
    And,
    Or,
}

impl<'p> Cursor<'p, '_> {
    fn peek(&self) -> Option<&'p Lexeme> {
        self.lexemes.get(self.at)
    }

    fn next(&mut self) -> Option<&'p Lexeme> {
        let lexeme = self.lexemes.get(self.at);
        self.at += 1;
        lexeme
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek().map(|l| &l.kind),
            Some(Kind::Word(_) | Kind::Phrase(_) | Kind::Open | Kind::Not)
        )
    }

    /// `unary ((AND | OR)? unary)*`
    fn expression(&mut self) -> Result<Option<Query>> {
        let mut left = self.unary()?;
        loop {
            let binary = self.peek().and_then(|l| match l.kind {
                Kind::And => Some((Op::And, l.pos)),
                Kind::Or => Some((Op::Or, l.pos)),
                _ => None,
            });
            let op = match binary {
                Some((op, pos)) => {
                    self.at += 1;
                    if !self.starts_operand() {
                        return Err(Error::syntax(pos, "operator is missing its right operand"));
                    }
                    op
                }
                None if self.starts_operand() => Op::And,
                None => return Ok(left),
            };
            let right = self.unary()?;
            left = combine(op, left, right);
        }
    }

    /// `NOT unary | primary`
    fn unary(&mut self) -> Result<Option<Query>> {
        if let Some(Lexeme { kind: Kind::Not, pos }) = self.peek() {
            self.at += 1;
            if !self.starts_operand() {
                return Err(Error::syntax(*pos, "NOT is missing its operand"));
            }
            return Ok(self.unary()?.map(|q| Query::Not(Box::new(q))));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Option<Query>> {
        let Some(lexeme) = self.next() else {
            return Err(Error::syntax(self.end, "unexpected end of query"));
        };
        match &lexeme.kind {
            Kind::Word(w) | Kind::Phrase(w) => Ok(self.parser.leaf(w)),
            Kind::Open => {
                if let Some(Lexeme { kind: Kind::Close, pos }) = self.peek() {
                    return Err(Error::syntax(*pos, "empty group"));
                }
                let inner = self.expression()?;
                match self.next() {
                    Some(Lexeme { kind: Kind::Close, .. }) => Ok(inner),
                    Some(other) => Err(Error::syntax(other.pos, "expected closing parenthesis")),
                    None => Err(Error::syntax(lexeme.pos, "unclosed parenthesis")),
                }
            }
            Kind::And | Kind::Or => Err(Error::syntax(lexeme.pos, "operator is missing its left operand")),
            Kind::Close => Err(Error::syntax(lexeme.pos, "unexpected closing parenthesis")),
            Kind::Not => Err(Error::syntax(lexeme.pos, "unexpected NOT")),
        }
    }
}

fn combine(op: Op, left: Option<Query>, right: Option<Query>) -> Option<Query> {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (l, None) => return l,
        (None, r) => return r,
    };
    Some(match (op, left) {
        (Op::And, Query::And(mut children)) => {
            children.push(right);
            Query::And(children)
        }
        (Op::Or, Query::Or(mut children)) => {
            children.push(right);
            Query::Or(children)
        }
        (Op::And, left) => Query::And(vec![left, right]),
        (Op::Or, left) => Query::Or(vec![left, right]),
    })
}
