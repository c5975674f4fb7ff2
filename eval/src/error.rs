use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Name resolution, arity and type errors found while evaluating.
    #[error(transparent)]
    Graph(#[from] graph::Error),

    #[error("unknown worker `{name}`")]
    UnknownWorker { name: String },

    #[error("invalid cluster: {reason}")]
    InvalidCluster { reason: String },

    #[error("recursion limit of {limit} exceeded in call to `{name}`")]
    RecursionLimitExceeded { name: String, limit: usize },

    #[error("remote call to `{function}` on {worker} failed: {source}")]
    TransportFailure {
        worker: String,
        function: String,
        #[source]
        source: TransportError,
    },
}
