use crate::error::EngineError;
use std::collections::{BTreeMap, HashSet};

/// 1-based token position within a document.
pub type Position = u32;

/// Numeric sort key of a document id: the digits of the id, in order.
///
/// `"doc12.txt"` -> 12. An id without digits has no place in the canonical
/// document order and is rejected.
pub fn doc_ordinal(id: &str) -> Result<u64, EngineError> {
    let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .parse::<u64>()
        .map_err(|_| EngineError::InvalidDocumentId(id.to_string()))
}

/// Accumulates `(term, document, position)` occurrences during ingestion.
///
/// Append-only; nothing can be queried until [`IndexBuilder::seal`] freezes
/// the store into a [`PositionalIndex`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: BTreeMap<String, BTreeMap<String, Vec<Position>>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a position to the (term, document) posting, creating the entry
    /// on first sight. Positions may arrive in any order.
    pub fn add_occurrence(&mut self, term: &str, doc: &str, position: Position) {
        // Clone the keys only on first insertion of a term or document.
        match self.postings.get_mut(term) {
            Some(docs) => match docs.get_mut(doc) {
                Some(list) => list.push(position),
                None => {
                    docs.insert(doc.to_string(), vec![position]);
                }
            },
            None => {
                let mut docs = BTreeMap::new();
                docs.insert(doc.to_string(), vec![position]);
                self.postings.insert(term.to_string(), docs);
            }
        }
    }

    /// Freeze the store: sort every position list, validate every document
    /// ordinal, and fix the canonical document order (ordinal ascending).
    pub fn seal(mut self) -> Result<PositionalIndex, EngineError> {
        for docs in self.postings.values_mut() {
            for list in docs.values_mut() {
                list.sort_unstable();
            }
        }

        let mut documents: Vec<(u64, String)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for docs in self.postings.values() {
            for doc in docs.keys() {
                if seen.insert(doc.as_str()) {
                    documents.push((doc_ordinal(doc)?, doc.clone()));
                }
            }
        }
        documents.sort_by_key(|(ordinal, _)| *ordinal);
        let documents = documents.into_iter().map(|(_, id)| id).collect();

        Ok(PositionalIndex {
            postings: self.postings,
            documents,
        })
    }
}

/// The frozen posting store: term -> document -> sorted positions, plus the
/// canonical document list.
///
/// Immutable for its whole lifetime; queries only ever borrow it, so sharing
/// it across readers needs no locking.
#[derive(Debug, PartialEq)]
pub struct PositionalIndex {
    postings: BTreeMap<String, BTreeMap<String, Vec<Position>>>,
    documents: Vec<String>,
}

impl PositionalIndex {
    /// Sorted positions of `term` in `doc`; empty when the pair is unknown.
    pub fn positions(&self, term: &str, doc: &str) -> &[Position] {
        self.postings
            .get(term)
            .and_then(|docs| docs.get(doc))
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Documents containing `term`, in ascending lexical id order.
    pub fn documents_of(&self, term: &str) -> impl Iterator<Item = &str> {
        self.postings
            .get(term)
            .into_iter()
            .flat_map(|docs| docs.keys().map(|d| d.as_str()))
    }

    /// The vocabulary, in ascending lexical order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(|t| t.as_str())
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    /// Canonical document list: ordinal ascending. Display order and the
    /// tie-stable iteration order for ranking.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(occurrences: &[(&str, &str, Position)]) -> PositionalIndex {
        let mut builder = IndexBuilder::new();
        for (term, doc, pos) in occurrences {
            builder.add_occurrence(term, doc, *pos);
        }
        builder.seal().unwrap()
    }

    #[test]
    fn positions_are_sorted_after_seal() {
        let index = sealed(&[("cat", "doc1", 7), ("cat", "doc1", 2), ("cat", "doc1", 5)]);
        assert_eq!(index.positions("cat", "doc1"), &[2, 5, 7]);
    }

    #[test]
    fn unknown_pairs_read_as_empty() {
        let index = sealed(&[("cat", "doc1", 1)]);
        assert!(index.positions("cat", "doc9").is_empty());
        assert!(index.positions("dog", "doc1").is_empty());
        assert_eq!(index.documents_of("dog").count(), 0);
    }

    #[test]
    fn documents_sort_by_numeric_ordinal_not_string_order() {
        let index = sealed(&[
            ("a", "doc10.txt", 1),
            ("a", "doc2.txt", 1),
            ("a", "doc1.txt", 1),
        ]);
        assert_eq!(index.documents(), &["doc1.txt", "doc2.txt", "doc10.txt"]);
        assert_eq!(index.num_docs(), 3);
    }

    #[test]
    fn seal_rejects_ids_without_digits() {
        let mut builder = IndexBuilder::new();
        builder.add_occurrence("cat", "notes", 1);
        assert_eq!(
            builder.seal().unwrap_err(),
            EngineError::InvalidDocumentId("notes".into())
        );
    }

    #[test]
    fn ordinal_strips_every_non_digit() {
        assert_eq!(doc_ordinal("doc12.txt").unwrap(), 12);
        assert_eq!(doc_ordinal("3-of-5.md").unwrap(), 35);
        assert!(doc_ordinal("readme").is_err());
    }

    #[test]
    fn vocabulary_iterates_lexically() {
        let index = sealed(&[("mat", "d1", 3), ("cat", "d1", 1), ("sat", "d1", 2)]);
        let terms: Vec<_> = index.terms().collect();
        assert_eq!(terms, vec!["cat", "mat", "sat"]);
    }
}
