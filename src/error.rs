use thiserror::Error;

/// Fatal error conditions of the search core. Search *outcomes* (timeout,
/// exhaustion, unsolvability) are not errors; they are reported as
/// [`crate::search::SearchStatus`] variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("metric evaluation yielded NaN")]
    MetricIsNaN,
    #[error("arity {arity} out of range, must be at most {max}")]
    ArityOutOfRange { arity: usize, max: usize },
    #[error("canonical ordering requested before canonization")]
    CanonizeBeforeQuery,
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),
}
