use crate::error::EngineError;
use crate::index::PositionalIndex;
use crate::stats::IndexStats;
use serde::Serialize;

/// One (document, term) cell of a per-cell statistics table. Zero cells are
/// kept so every table covers the full document-by-vocabulary grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRow {
    pub doc: String,
    pub term: String,
    pub value: f64,
}

/// One vocabulary term with its corpus-wide frequency statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermRow {
    pub term: String,
    pub df: u32,
    pub idf: f64,
}

/// One document with its Euclidean vector length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthRow {
    pub doc: String,
    pub length: f64,
}

/// Documents in ordinal order, vocabulary in lexical order inside each.
fn cells(
    index: &PositionalIndex,
    value: impl Fn(&str, &str) -> f64,
) -> Vec<CellRow> {
    let mut rows = Vec::with_capacity(index.num_docs() * index.num_terms());
    for doc in index.documents() {
        for term in index.terms() {
            rows.push(CellRow {
                doc: doc.clone(),
                term: term.to_string(),
                value: value(term, doc),
            });
        }
    }
    rows
}

pub fn tf_rows(index: &PositionalIndex, stats: &IndexStats) -> Vec<CellRow> {
    cells(index, |term, doc| stats.tf(term, doc) as f64)
}

pub fn weighted_tf_rows(index: &PositionalIndex, stats: &IndexStats) -> Vec<CellRow> {
    cells(index, |term, doc| stats.weighted_tf(term, doc))
}

pub fn tfidf_rows(index: &PositionalIndex, stats: &IndexStats) -> Vec<CellRow> {
    cells(index, |term, doc| stats.tfidf(term, doc))
}

pub fn normalized_tfidf_rows(index: &PositionalIndex, stats: &IndexStats) -> Vec<CellRow> {
    cells(index, |term, doc| stats.normalized_tfidf(term, doc))
}

/// Per-term df and idf rows in vocabulary order.
pub fn df_idf_rows(
    index: &PositionalIndex,
    stats: &IndexStats,
) -> Result<Vec<TermRow>, EngineError> {
    let mut rows = Vec::with_capacity(index.num_terms());
    for term in index.terms() {
        rows.push(TermRow {
            term: term.to_string(),
            df: stats.df(term),
            idf: stats.idf(term)?,
        });
    }
    Ok(rows)
}

/// Per-document vector lengths in ordinal order.
pub fn length_rows(index: &PositionalIndex, stats: &IndexStats) -> Vec<LengthRow> {
    index
        .documents()
        .iter()
        .map(|doc| LengthRow {
            doc: doc.clone(),
            length: stats.doc_length(doc),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::tokenizer::tokenize;

    fn corpus(docs: &[(&str, &str)]) -> (PositionalIndex, IndexStats) {
        let mut builder = IndexBuilder::new();
        for (id, text) in docs {
            for (term, pos) in tokenize(text) {
                builder.add_occurrence(&term, id, pos);
            }
        }
        let index = builder.seal().unwrap();
        let stats = IndexStats::compute(&index);
        (index, stats)
    }

    #[test]
    fn cell_tables_cover_the_full_grid() {
        let (index, stats) = corpus(&[("doc1", "cat sat"), ("doc2", "cat dog")]);
        let rows = tf_rows(&index, &stats);
        // 2 documents x 3 vocabulary terms, zero cells included.
        assert_eq!(rows.len(), 6);
        let zero = rows
            .iter()
            .find(|r| r.doc == "doc1" && r.term == "dog")
            .unwrap();
        assert_eq!(zero.value, 0.0);
        let hit = rows
            .iter()
            .find(|r| r.doc == "doc2" && r.term == "dog")
            .unwrap();
        assert_eq!(hit.value, 1.0);
    }

    #[test]
    fn cell_tables_order_documents_by_ordinal() {
        let (index, stats) = corpus(&[
            ("doc10", "cat"),
            ("doc2", "cat"),
            ("doc1", "cat"),
        ]);
        let rows = tfidf_rows(&index, &stats);
        let docs: Vec<&str> = rows.iter().map(|r| r.doc.as_str()).collect();
        assert_eq!(docs, vec!["doc1", "doc2", "doc10"]);
    }

    #[test]
    fn df_idf_rows_follow_vocabulary_order() {
        let (index, stats) = corpus(&[("doc1", "cat sat"), ("doc2", "cat dog")]);
        let rows = df_idf_rows(&index, &stats).unwrap();
        let terms: Vec<&str> = rows.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["cat", "dog", "sat"]);
        assert_eq!(rows[0].df, 2);
        assert!((rows[0].idf - 1.0_f64.log10()).abs() < 1e-12);
        assert_eq!(rows[1].df, 1);
    }

    #[test]
    fn length_rows_match_stats() {
        let (index, stats) = corpus(&[("doc1", "cat sat"), ("doc2", "cat dog")]);
        let rows = length_rows(&index, &stats);
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row.length, stats.doc_length(&row.doc));
        }
    }
}
