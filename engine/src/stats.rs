use crate::error::EngineError;
use crate::index::PositionalIndex;
use std::collections::BTreeMap;

/// Derived corpus statistics: TF, DF, IDF, TF-IDF, and document lengths.
///
/// Computed in one batch pass over a sealed [`PositionalIndex`] and immutable
/// afterwards. Derivation is deterministic, so recomputing from the same
/// index reproduces every number bit for bit.
#[derive(Debug, PartialEq)]
pub struct IndexStats {
    num_docs: usize,
    tf: BTreeMap<String, BTreeMap<String, u32>>,
    df: BTreeMap<String, u32>,
    idf: BTreeMap<String, f64>,
    tfidf: BTreeMap<String, BTreeMap<String, f64>>,
    doc_length: BTreeMap<String, f64>,
}

impl IndexStats {
    pub fn compute(index: &PositionalIndex) -> Self {
        let num_docs = index.num_docs();

        let mut tf: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
        let mut df: BTreeMap<String, u32> = BTreeMap::new();
        for term in index.terms() {
            let mut per_doc = BTreeMap::new();
            for doc in index.documents_of(term) {
                per_doc.insert(doc.to_string(), index.positions(term, doc).len() as u32);
            }
            df.insert(term.to_string(), per_doc.len() as u32);
            tf.insert(term.to_string(), per_doc);
        }

        let mut idf: BTreeMap<String, f64> = BTreeMap::new();
        for (term, &df_t) in &df {
            // df >= 1 for every term the index knows, so the quotient is finite.
            idf.insert(term.clone(), (num_docs as f64 / df_t as f64).log10());
        }

        let mut tfidf: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (term, per_doc) in &tf {
            let idf_t = idf[term];
            let weights = per_doc
                .iter()
                .map(|(doc, &count)| (doc.clone(), count as f64 * idf_t))
                .collect();
            tfidf.insert(term.clone(), weights);
        }

        // Euclidean length over the whole vocabulary; terms absent from the
        // document contribute zero, so the present entries are the whole sum.
        let mut doc_length: BTreeMap<String, f64> = BTreeMap::new();
        for doc in index.documents() {
            let mut sum = 0.0;
            for weights in tfidf.values() {
                if let Some(w) = weights.get(doc) {
                    sum += w * w;
                }
            }
            doc_length.insert(doc.clone(), sum.sqrt());
        }

        Self {
            num_docs,
            tf,
            df,
            idf,
            tfidf,
            doc_length,
        }
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Raw term frequency; 0 when the pair is unknown.
    pub fn tf(&self, term: &str, doc: &str) -> u32 {
        self.tf
            .get(term)
            .and_then(|per_doc| per_doc.get(doc))
            .copied()
            .unwrap_or(0)
    }

    /// `tf * (1 + ln(tf))` where tf >= 1; 0 when the pair is unknown.
    pub fn weighted_tf(&self, term: &str, doc: &str) -> f64 {
        match self.tf(term, doc) {
            0 => 0.0,
            tf => {
                let tf = tf as f64;
                tf * (1.0 + tf.ln())
            }
        }
    }

    /// Document frequency; 0 for terms outside the vocabulary.
    pub fn df(&self, term: &str) -> u32 {
        self.df.get(term).copied().unwrap_or(0)
    }

    /// `log10(N / df)`. Unlike the other accessors this one fails for a term
    /// the index has never seen, because df = 0 has no defined idf.
    pub fn idf(&self, term: &str) -> Result<f64, EngineError> {
        self.idf
            .get(term)
            .copied()
            .ok_or_else(|| EngineError::UnknownTerm(term.to_string()))
    }

    /// `tf * idf`; 0 when the pair is unknown.
    pub fn tfidf(&self, term: &str, doc: &str) -> f64 {
        self.tfidf
            .get(term)
            .and_then(|per_doc| per_doc.get(doc))
            .copied()
            .unwrap_or(0.0)
    }

    /// Euclidean document length over the full vocabulary; 0 for unknown docs.
    pub fn doc_length(&self, doc: &str) -> f64 {
        self.doc_length.get(doc).copied().unwrap_or(0.0)
    }

    /// `tfidf / doc_length`, or 0 for a zero-length document.
    pub fn normalized_tfidf(&self, term: &str, doc: &str) -> f64 {
        let length = self.doc_length(doc);
        if length == 0.0 {
            0.0
        } else {
            self.tfidf(term, doc) / length
        }
    }
}
