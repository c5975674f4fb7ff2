use crate::cluster::ClusterDescriptor;
use crate::error::Error;
use crate::evaluator::{Evaluator, Stats};
use graph::{PlacementTag, Registry, Value};
use std::cell::Cell;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no transport is configured")]
    Unavailable,

    #[error("cannot reach {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// The call reached the worker and failed there. The evaluator returns the
    /// inner error unchanged.
    #[error(transparent)]
    Remote(Box<Error>),
}

/// A call leaving this worker, with its arguments already evaluated.
#[derive(Debug, Clone, Copy)]
pub struct RemoteCall<'a> {
    pub tag: &'a PlacementTag,
    pub endpoint: &'a str,
    pub function: &'a str,
    pub args: &'a [Value],
    /// Call depth of `function` itself.
    pub depth: usize,
}

pub trait Transport {
    fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, TransportError>;
}

/// Runs remote calls in-process, as the worker named by the call's tag.
pub struct Loopback<'a> {
    registry: &'a Registry,
    cluster: &'a ClusterDescriptor,
    max_depth: usize,
    stats: Cell<Stats>,
}

impl<'a> Loopback<'a> {
    pub fn new(registry: &'a Registry, cluster: &'a ClusterDescriptor, max_depth: usize) -> Self {
        Self {
            registry,
            cluster,
            max_depth,
            stats: Cell::new(Stats::default()),
        }
    }

    /// Work done by every worker this transport stood in for.
    pub fn stats(&self) -> Stats {
        self.stats.get()
    }
}

impl Transport for Loopback<'_> {
    fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, TransportError> {
        let remote = |e: Error| TransportError::Remote(Box::new(e));

        let worker = self
            .cluster
            .as_task(&call.tag.job, call.tag.task.unwrap_or(0))
            .map_err(remote)?;
        log::debug!(
            "[{}:{}] `{}`{:?} at depth {}",
            worker.job(),
            worker.task(),
            call.function,
            call.args,
            call.depth
        );

        let mut evaluator = Evaluator::new(self.registry)
            .with_cluster(&worker)
            .with_transport(self)
            .with_max_depth(self.max_depth);
        let result = evaluator.evaluate_at(call.function, call.args, call.depth);

        let mut stats = self.stats.get();
        stats.merge(evaluator.stats());
        self.stats.set(stats);

        result.map_err(remote)
    }
}
