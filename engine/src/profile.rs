use crate::stats::IndexStats;
use serde::Serialize;
use std::collections::HashMap;

/// One query term treated as a single-occurrence pseudo-document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermProfile {
    pub term: String,
    pub tf: f64,
    pub weighted_tf: f64,
    pub idf: f64,
    pub tfidf: f64,
    pub normalized: f64,
}

/// Product of a query term's normalized weight and a document's normalized
/// weight for the same term. Only nonzero document weights produce a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub term: String,
    pub doc: String,
    pub value: f64,
}

/// Diagnostic breakdown of a query against the corpus statistics.
///
/// This is the second scoring path. Its numbers answer "how does this query
/// look as a vector" and do not agree with the similarities produced by the
/// ranking path; the two are reported side by side, never mixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryProfile {
    pub terms: Vec<TermProfile>,
    pub query_length: f64,
    pub contributions: Vec<Contribution>,
    pub similarities: Vec<(String, f64)>,
}

/// Profile `terms` against the corpus, restricted to the documents in
/// `ranked` (the result list the caller is about to display).
///
/// Every term is taken with tf = 1 and weighted tf = 1. Terms outside the
/// vocabulary default to df = 1 rather than erroring, so unseen words profile
/// with the maximal idf of `log10(N)`. Duplicate query terms keep duplicate
/// rows and their contributions accumulate twice.
pub fn query_profile(
    stats: &IndexStats,
    terms: &[String],
    ranked: &[(String, f64)],
) -> QueryProfile {
    let num_docs = stats.num_docs() as f64;

    let mut profiles = Vec::with_capacity(terms.len());
    let mut length_squared = 0.0;
    for term in terms {
        let df = stats.df(term).max(1) as f64;
        let idf = (num_docs / df).log10();
        let tf = 1.0_f64;
        let weighted_tf = 1.0 + tf.log10();
        let tfidf = weighted_tf * idf;
        length_squared += tfidf * tfidf;
        profiles.push(TermProfile {
            term: term.clone(),
            tf,
            weighted_tf,
            idf,
            tfidf,
            normalized: 0.0,
        });
    }

    let query_length = length_squared.sqrt();
    for profile in &mut profiles {
        profile.normalized = if query_length != 0.0 {
            profile.tfidf / query_length
        } else {
            0.0
        };
    }

    // First occurrence wins for duplicate terms.
    let mut query_weights: HashMap<&str, f64> = HashMap::new();
    for profile in &profiles {
        query_weights
            .entry(profile.term.as_str())
            .or_insert(profile.normalized);
    }

    let mut contributions = Vec::new();
    for term in terms {
        for (doc, _) in ranked {
            let doc_weight = stats.normalized_tfidf(term, doc);
            if doc_weight > 0.0 {
                let query_weight = query_weights.get(term.as_str()).copied().unwrap_or(0.0);
                contributions.push(Contribution {
                    term: term.clone(),
                    doc: doc.clone(),
                    value: query_weight * doc_weight,
                });
            }
        }
    }

    // Per-document sums in first-seen contribution order.
    let mut similarities: Vec<(String, f64)> = Vec::new();
    for contribution in &contributions {
        match similarities.iter_mut().find(|(d, _)| *d == contribution.doc) {
            Some(entry) => entry.1 += contribution.value,
            None => similarities.push((contribution.doc.clone(), contribution.value)),
        }
    }

    QueryProfile {
        terms: profiles,
        query_length,
        contributions,
        similarities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::tokenizer::tokenize;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn stats_for(docs: &[(&str, &str)]) -> IndexStats {
        let mut builder = IndexBuilder::new();
        for (id, text) in docs {
            for (term, pos) in tokenize(text) {
                builder.add_occurrence(&term, id, pos);
            }
        }
        IndexStats::compute(&builder.seal().unwrap())
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn every_term_profiles_with_unit_tf() {
        let stats = stats_for(&[
            ("doc1", "cat sat mat"),
            ("doc2", "cat cat dog"),
            ("doc3", "bird"),
        ]);
        let profile = query_profile(&stats, &terms(&["cat", "bird"]), &[]);

        let cat = &profile.terms[0];
        assert_eq!(cat.tf, 1.0);
        assert_eq!(cat.weighted_tf, 1.0);
        assert!(close(cat.idf, (3.0_f64 / 2.0).log10()));
        assert!(close(cat.tfidf, cat.idf));

        let bird = &profile.terms[1];
        assert!(close(bird.idf, 3.0_f64.log10()));
    }

    #[test]
    fn unseen_terms_default_to_unit_df() {
        let stats = stats_for(&[("doc1", "cat"), ("doc2", "dog"), ("doc3", "owl")]);
        let profile = query_profile(&stats, &terms(&["ghost"]), &[]);
        assert!(close(profile.terms[0].idf, 3.0_f64.log10()));
    }

    #[test]
    fn query_length_is_the_euclidean_norm() {
        let stats = stats_for(&[
            ("doc1", "cat sat mat"),
            ("doc2", "cat cat dog"),
            ("doc3", "bird"),
        ]);
        let profile = query_profile(&stats, &terms(&["cat", "bird"]), &[]);
        let expected = (profile.terms[0].tfidf.powi(2) + profile.terms[1].tfidf.powi(2)).sqrt();
        assert!(close(profile.query_length, expected));
        for term in &profile.terms {
            assert!(close(term.normalized, term.tfidf / profile.query_length));
        }
    }

    #[test]
    fn zero_length_query_normalizes_to_zero() {
        // Both documents contain the term, so idf = 0 and the query vector
        // has length 0. Normalized weights stay finite.
        let stats = stats_for(&[("doc1", "cat"), ("doc2", "cat")]);
        let profile = query_profile(&stats, &terms(&["cat"]), &[]);
        assert_eq!(profile.query_length, 0.0);
        assert_eq!(profile.terms[0].normalized, 0.0);
    }

    #[test]
    fn contributions_skip_zero_document_weights() {
        let stats = stats_for(&[
            ("doc1", "cat sat mat"),
            ("doc2", "cat cat dog"),
            ("doc3", "bird"),
        ]);
        let ranked = vec![("doc1".to_string(), 1.0), ("doc3".to_string(), 0.5)];
        let profile = query_profile(&stats, &terms(&["sat", "bird"]), &ranked);

        // "sat" only weighs in doc1, "bird" only in doc3.
        assert_eq!(profile.contributions.len(), 2);
        assert_eq!(profile.contributions[0].term, "sat");
        assert_eq!(profile.contributions[0].doc, "doc1");
        assert_eq!(profile.contributions[1].term, "bird");
        assert_eq!(profile.contributions[1].doc, "doc3");

        for contribution in &profile.contributions {
            let expected = profile
                .terms
                .iter()
                .find(|t| t.term == contribution.term)
                .map(|t| t.normalized)
                .unwrap()
                * stats.normalized_tfidf(&contribution.term, &contribution.doc);
            assert!(close(contribution.value, expected));
        }
    }

    #[test]
    fn similarities_sum_contributions_per_document() {
        let stats = stats_for(&[
            ("doc1", "cat sat mat"),
            ("doc2", "cat cat dog"),
            ("doc3", "bird"),
        ]);
        let ranked = vec![("doc1".to_string(), 1.0)];
        let profile = query_profile(&stats, &terms(&["cat", "sat"]), &ranked);

        let total: f64 = profile
            .contributions
            .iter()
            .filter(|c| c.doc == "doc1")
            .map(|c| c.value)
            .sum();
        assert_eq!(profile.similarities.len(), 1);
        assert_eq!(profile.similarities[0].0, "doc1");
        assert!(close(profile.similarities[0].1, total));
    }

    #[test]
    fn duplicate_query_terms_accumulate_twice() {
        let stats = stats_for(&[
            ("doc1", "cat sat mat"),
            ("doc2", "cat cat dog"),
            ("doc3", "bird"),
        ]);
        let ranked = vec![("doc1".to_string(), 1.0)];
        let single = query_profile(&stats, &terms(&["cat"]), &ranked);
        let doubled = query_profile(&stats, &terms(&["cat", "cat"]), &ranked);

        assert_eq!(doubled.terms.len(), 2);
        // Two identical tfidf components double the squared length.
        assert!(close(
            doubled.query_length,
            single.query_length * 2.0_f64.sqrt()
        ));
        assert_eq!(doubled.contributions.len(), 2);
        assert!(close(
            doubled.similarities[0].1,
            doubled.contributions[0].value * 2.0
        ));
    }
}
