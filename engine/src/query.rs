use crate::error::EngineError;
use crate::index::{doc_ordinal, Position, PositionalIndex};
use crate::stats::IndexStats;
use crate::tokenizer::tokenize_terms;
use std::collections::BTreeSet;

/// Two-operand boolean connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    AndNot,
    Or,
}

/// Parsed query. The parser only ever nests one level deep (two phrase
/// operands); deeper nesting is an explicit non-goal.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Phrase(Vec<String>),
    Binary {
        op: BooleanOp,
        left: Box<Query>,
        right: Box<Query>,
    },
}

impl Query {
    /// Every phrase term in the query, operands left to right. This is the
    /// term list the query profile reports on.
    pub fn terms(&self) -> Vec<String> {
        match self {
            Query::Phrase(terms) => terms.clone(),
            Query::Binary { left, right, .. } => {
                let mut terms = left.terms();
                terms.extend(right.terms());
                terms
            }
        }
    }
}

/// Operator substrings in match-priority order. ` AND NOT ` must come first
/// or ` AND ` would swallow it.
const OPERATORS: [(&str, BooleanOp); 3] = [
    (" AND NOT ", BooleanOp::AndNot),
    (" AND ", BooleanOp::And),
    (" OR ", BooleanOp::Or),
];

/// Parse query text: split at the first occurrence of the highest-priority
/// operator present, tokenize each side, or treat the whole text as a phrase.
///
/// A second occurrence of the chosen operator means three or more operands,
/// which is rejected rather than silently re-split.
pub fn parse_query(text: &str) -> Result<Query, EngineError> {
    for (token, op) in OPERATORS {
        if let Some(at) = text.find(token) {
            let left = &text[..at];
            let right = &text[at + token.len()..];
            if right.contains(token) {
                return Err(EngineError::OperandCount);
            }
            return Ok(Query::Binary {
                op,
                left: Box::new(phrase(left)?),
                right: Box::new(phrase(right)?),
            });
        }
    }
    phrase(text)
}

fn phrase(text: &str) -> Result<Query, EngineError> {
    let terms = tokenize_terms(text);
    if terms.is_empty() {
        return Err(EngineError::EmptyOperand);
    }
    Ok(Query::Phrase(terms))
}

/// True when the text would parse as a boolean query.
pub fn contains_operator(text: &str) -> bool {
    OPERATORS.iter().any(|(token, _)| text.contains(token))
}

/// Positional adjacency check for an ordered list of query terms.
///
/// Permissive by contract: each term needs a position exactly one past *some*
/// occurrence of the preceding term, not the occurrence the previous step
/// matched, so documents with repeated terms can match phrases that never
/// occur verbatim.
pub fn phrase_matches(index: &PositionalIndex, terms: &[String], doc: &str) -> bool {
    let mut last_positions: Option<&[Position]> = None;
    for term in terms {
        let positions = index.positions(term, doc);
        if positions.is_empty() {
            return false;
        }
        if let Some(last) = last_positions {
            let adjacent = positions
                .iter()
                .any(|&p| last.iter().any(|&prev| prev.checked_add(1) == Some(p)));
            if !adjacent {
                return false;
            }
        }
        last_positions = Some(positions);
    }
    !terms.is_empty()
}

/// Do all query terms carry nonzero TF-IDF weight in `doc`?
///
/// The single relevance gate applied after scoring; a term that occurs in
/// every document (idf = 0) fails it even though its positions match.
fn has_all_terms(stats: &IndexStats, terms: &[String], doc: &str) -> bool {
    terms.iter().all(|term| stats.tfidf(term, doc) > 0.0)
}

/// Descending by score; score ties fall back to canonical ordinal order.
fn sort_ranked(ranked: &mut [(String, f64)]) {
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| ordinal_key(&a.0).cmp(&ordinal_key(&b.0)))
    });
}

// Ids without digits sort last; sealed indexes never produce them.
fn ordinal_key(doc: &str) -> u64 {
    doc_ordinal(doc).unwrap_or(u64::MAX)
}

/// Rank documents for a phrase query (candidate-similarity path).
///
/// The per-term query weight is the candidate document's own un-normalized
/// TF-IDF value, which makes the query vector document-dependent. Intended
/// behavior; every result list depends on it.
///
/// Fails fast with [`EngineError::NoKnownTerms`] before scoring anything when
/// no query term exists in the vocabulary. An empty result is not an error.
pub fn rank_phrase(
    index: &PositionalIndex,
    stats: &IndexStats,
    terms: &[String],
) -> Result<Vec<(String, f64)>, EngineError> {
    if !terms.iter().any(|term| index.contains_term(term)) {
        return Err(EngineError::NoKnownTerms);
    }

    // Duplicate query terms collapse into one vector component.
    let unique: BTreeSet<&str> = terms.iter().map(String::as_str).collect();

    let mut ranked: Vec<(String, f64)> = Vec::new();
    for doc in index.documents() {
        if !phrase_matches(index, terms, doc) {
            continue;
        }

        let mut dot = 0.0;
        let mut query_norm = 0.0;
        for term in &unique {
            let query_weight = stats.tfidf(term, doc);
            if query_weight > 0.0 {
                dot += query_weight * stats.tfidf(term, doc);
                query_norm += query_weight * query_weight;
            }
        }
        let query_norm = query_norm.sqrt();
        let doc_norm = stats.doc_length(doc);

        let similarity = if query_norm != 0.0 && doc_norm != 0.0 {
            dot / (query_norm * doc_norm)
        } else {
            0.0
        };
        if similarity > 0.0 {
            ranked.push((doc.clone(), similarity));
        }
    }

    sort_ranked(&mut ranked);
    ranked.retain(|(doc, _)| has_all_terms(stats, terms, doc));
    tracing::debug!(terms = ?terms, hits = ranked.len(), "ranked phrase");
    Ok(ranked)
}

/// Merge two ranked operand lists under a boolean connective.
///
/// AND keeps the intersection at the smaller score. AND NOT keeps docs1 minus
/// docs2 at docs1's score. OR writes docs1 then docs2, so a document in both
/// ends with docs2's score. The merge policies differ on purpose.
pub fn combine(
    op: BooleanOp,
    docs1: Vec<(String, f64)>,
    docs2: Vec<(String, f64)>,
) -> Vec<(String, f64)> {
    let mut combined: Vec<(String, f64)> = Vec::new();
    match op {
        BooleanOp::And => {
            for (doc, score1) in docs1 {
                if let Some((_, score2)) = docs2.iter().find(|(d, _)| *d == doc) {
                    combined.push((doc, score1.min(*score2)));
                }
            }
        }
        BooleanOp::AndNot => {
            for (doc, score) in docs1 {
                if !docs2.iter().any(|(d, _)| *d == doc) {
                    combined.push((doc, score));
                }
            }
        }
        BooleanOp::Or => {
            for (doc, score) in docs1.into_iter().chain(docs2) {
                match combined.iter_mut().find(|(d, _)| *d == doc) {
                    Some(entry) => entry.1 = score,
                    None => combined.push((doc, score)),
                }
            }
        }
    }
    sort_ranked(&mut combined);
    combined
}

/// Evaluate a parsed query into a ranked (document, score) list.
pub fn evaluate(
    index: &PositionalIndex,
    stats: &IndexStats,
    query: &Query,
) -> Result<Vec<(String, f64)>, EngineError> {
    match query {
        Query::Phrase(terms) => rank_phrase(index, stats, terms),
        Query::Binary { op, left, right } => {
            let docs1 = evaluate(index, stats, left)?;
            let docs2 = evaluate(index, stats, right)?;
            Ok(combine(*op, docs1, docs2))
        }
    }
}

/// Evaluate boolean query text. Text without an operator is rejected; plain
/// phrases go through [`rank_phrase`] instead.
pub fn evaluate_boolean(
    index: &PositionalIndex,
    stats: &IndexStats,
    text: &str,
) -> Result<Vec<(String, f64)>, EngineError> {
    match parse_query(text)? {
        query @ Query::Binary { .. } => evaluate(index, stats, &query),
        Query::Phrase(_) => Err(EngineError::MissingOperator),
    }
}
