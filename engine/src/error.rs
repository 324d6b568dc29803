use thiserror::Error;

/// Failures raised by index construction and query evaluation.
///
/// Every variant is local to one request: nothing here invalidates a sealed
/// index, and queries are pure, so callers may simply resubmit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid query: none of the query terms exist in the vocabulary.
    #[error("invalid query: no terms in the query exist in the dataset")]
    NoKnownTerms,

    /// Invalid query: an operand tokenized to nothing.
    #[error("invalid query: empty operand")]
    EmptyOperand,

    /// Invalid query: a boolean operator was used with more than two operands.
    #[error("invalid query format: provide exactly two phrases")]
    OperandCount,

    /// Invalid query: boolean evaluation was requested for text without a
    /// recognized operator.
    #[error("invalid query format: use AND, AND NOT, or OR")]
    MissingOperator,

    /// Invalid state: idf was requested for a term with zero document
    /// frequency, which must never produce a silent infinity.
    #[error("term not in vocabulary: {0}")]
    UnknownTerm(String),

    /// Invalid input: a document id carries no digits, so its ordinal (the
    /// canonical sort key) cannot be derived.
    #[error("document id has no numeric ordinal: {0}")]
    InvalidDocumentId(String),
}
