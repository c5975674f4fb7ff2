//! Evaluation of registered functions, locally or across the workers of a cluster.

pub mod cluster;
pub mod error;
pub mod evaluator;
pub mod num;
pub mod transport;

pub use cluster::{parse_job_spec, ClusterDescriptor};
pub use error::Error;
pub use evaluator::{Evaluator, Stats, DEFAULT_MAX_DEPTH};
pub use transport::{Loopback, RemoteCall, Transport, TransportError};
