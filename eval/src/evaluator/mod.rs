use crate::cluster::ClusterDescriptor;
use crate::error::Error;
use crate::num;
use crate::transport::{RemoteCall, Transport, TransportError};
use graph::{Expr, FunctionDefinition, PlacementTag, PrimOp, Registry, Value, E};
use log::{debug, trace};
use ops::Expected;


pub const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Function invocations evaluated by this evaluator.
    pub calls: u64,
    /// Deepest call depth reached; the entry call is depth 0.
    pub max_depth: usize,
    /// Calls handed to the transport.
    pub remote_calls: u64,
}

impl Stats {
    pub fn merge(&mut self, other: Stats) {
        self.calls += other.calls;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.remote_calls += other.remote_calls;
    }
}

/// Pending work of the machine. Every `Eval` leaves exactly one value.
enum Task<'a> {
    Eval {
        expr: &'a Expr,
        placement: Option<&'a PlacementTag>,
    },
    Apply {
        op: PrimOp,
        argc: usize,
    },
    Branch {
        then_expr: &'a Expr,
        else_expr: &'a Expr,
        placement: Option<&'a PlacementTag>,
    },
    Call {
        target: &'a str,
        argc: usize,
        placement: Option<&'a PlacementTag>,
    },
    Return {
        def: &'a FunctionDefinition,
    },
}

struct Frame {
    args: Vec<Value>,
    depth: usize,
}

/// Task, value and frame stacks of one evaluation. They live on the heap, so
/// call depth is bounded by `max_depth` and not by the native stack.
#[derive(Default)]
struct Machine<'a> {
    tasks: Vec<Task<'a>>,
    values: Vec<Value>,
    frames: Vec<Frame>,
}

impl<'a> Machine<'a> {
    fn push_evals(&mut self, exprs: &'a [Expr], placement: Option<&'a PlacementTag>) {
        // reversed, so operands are evaluated left to right
        for expr in exprs.iter().rev() {
            self.tasks.push(Task::Eval { expr, placement });
        }
    }

    fn pop(&mut self) -> Value {
        match self.values.pop() {
            Some(value) => value,
            None => unreachable!("value stack underflow"),
        }
    }

    fn pop_n(&mut self, n: usize) -> Vec<Value> {
        let at = self.values.len().saturating_sub(n);
        self.values.split_off(at)
    }

    fn depth(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.depth)
    }

    fn param(&self, index: usize) -> Result<Value, Error> {
        let args = self.frames.last().map_or(&[][..], |frame| &frame.args[..]);
        args.get(index).copied().ok_or_else(|| {
            graph::Error::ArityMismatch {
                context: "parameters".to_owned(),
                expect: index + 1,
                actual: args.len(),
            }
            .into()
        })
    }
}

/// Reduces calls against a read-only registry.
///
/// Without a cluster every call runs here and placement tags are ignored.
/// With one, calls whose effective tag is not local go through the transport.
pub struct Evaluator<'a> {
    registry: &'a Registry,
    cluster: Option<&'a ClusterDescriptor>,
    transport: Option<&'a dyn Transport>,
    max_depth: usize,
    stats: Stats,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            cluster: None,
            transport: None,
            max_depth: DEFAULT_MAX_DEPTH,
            stats: Stats::default(),
        }
    }

    pub fn with_cluster(mut self, cluster: &'a ClusterDescriptor) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_transport(mut self, transport: &'a dyn Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn evaluate(&mut self, name: &str, args: &[Value]) -> Result<Value, Error> {
        self.evaluate_at(name, args, 0)
    }

    /// Evaluates `name` as a call already `depth` levels deep.
    pub fn evaluate_at(&mut self, name: &str, args: &[Value], depth: usize) -> Result<Value, Error> {
        self.check_depth(name, depth)?;

        let mut m = Machine::default();
        self.enter(&mut m, name, args.to_vec(), depth, None)?;
        while let Some(task) = m.tasks.pop() {
            self.step(&mut m, task)?;
        }
        Ok(m.pop())
    }

    fn check_depth(&self, name: &str, depth: usize) -> Result<(), Error> {
        if depth > self.max_depth {
            return Err(Error::RecursionLimitExceeded {
                name: name.to_owned(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn enter(
        &mut self,
        m: &mut Machine<'a>,
        name: &str,
        args: Vec<Value>,
        depth: usize,
        placement: Option<&'a PlacementTag>,
    ) -> Result<(), Error> {
        let registry = self.registry;
        let def = registry.resolve(name)?;
        def.signature
            .check_args(name, args.iter().map(|v| Some(v.ty())))?;

        self.stats.calls += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        trace!("{:indent$}{}{:?}", "", name, args, indent = depth);

        m.frames.push(Frame { args, depth });
        m.tasks.push(Task::Return { def });
        m.tasks.push(Task::Eval {
            expr: &def.body,
            placement,
        });
        Ok(())
    }

    fn step(&mut self, m: &mut Machine<'a>, task: Task<'a>) -> Result<(), Error> {
        match task {
            Task::Eval { expr, placement } => {
                let placement = expr.placement.as_ref().or(placement);
                match &expr.e {
                    E::Constant(value) => m.values.push(*value),
                    E::Parameter(index) => {
                        let value = m.param(*index)?;
                        m.values.push(value);
                    }
                    E::Primitive { op, operands } => {
                        m.tasks.push(Task::Apply {
                            op: *op,
                            argc: operands.len(),
                        });
                        m.push_evals(operands, placement);
                    }
                    E::Conditional {
                        cond,
                        then_expr,
                        else_expr,
                    } => {
                        m.tasks.push(Task::Branch {
                            then_expr,
                            else_expr,
                            placement,
                        });
                        m.tasks.push(Task::Eval {
                            expr: cond,
                            placement,
                        });
                    }
                    E::Call { target, args } => {
                        m.tasks.push(Task::Call {
                            target,
                            argc: args.len(),
                            placement,
                        });
                        m.push_evals(args, placement);
                    }
                }
            }

            Task::Apply { op, argc } => {
                let operands = m.pop_n(argc);
                let value = num::apply(op, &operands)?;
                m.values.push(value);
            }

            // only the selected branch is ever scheduled
            Task::Branch {
                then_expr,
                else_expr,
                placement,
            } => {
                let pred = m.pop();
                let expr = match pred.as_bool() {
                    Some(true) => then_expr,
                    Some(false) => else_expr,
                    None => {
                        return Err(graph::Error::TypeMismatch {
                            context: "condition".to_owned(),
                            expect: Expected::Exactly(graph::ScalarType::Bool),
                            actual: pred.ty(),
                        }
                        .into())
                    }
                };
                m.tasks.push(Task::Eval { expr, placement });
            }

            Task::Call {
                target,
                argc,
                placement,
            } => {
                let args = m.pop_n(argc);
                let depth = m.depth() + 1;
                self.check_depth(target, depth)?;

                if let (Some(cluster), Some(tag)) = (self.cluster, placement) {
                    if !cluster.is_local(tag) {
                        let value = self.dispatch(cluster, tag, target, &args, depth)?;
                        m.values.push(value);
                        return Ok(());
                    }
                }
                self.enter(m, target, args, depth, placement)?;
            }

            // bodies calling functions unknown at build time are only typed here
            Task::Return { def } => {
                m.frames.pop();
                if let (Some(ret_ty), Some(value)) = (def.signature.ret_ty(), m.values.last()) {
                    if value.ty() != ret_ty {
                        return Err(graph::Error::TypeMismatch {
                            context: format!("result of `{}`", def.name),
                            expect: Expected::Exactly(ret_ty),
                            actual: value.ty(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        cluster: &ClusterDescriptor,
        tag: &PlacementTag,
        name: &str,
        args: &[Value],
        depth: usize,
    ) -> Result<Value, Error> {
        let endpoint = cluster.endpoint_for(tag)?;
        let failure = |source| Error::TransportFailure {
            worker: tag.to_string(),
            function: name.to_owned(),
            source,
        };

        let transport = self
            .transport
            .ok_or_else(|| failure(TransportError::Unavailable))?;
        self.stats.remote_calls += 1;
        debug!("`{}` -> {} ({})", name, tag, endpoint);

        let call = RemoteCall {
            tag,
            endpoint,
            function: name,
            args,
            depth,
        };
        match transport.dispatch(call) {
            Ok(value) => Ok(value),
            // the worker ran the call; its error is the call's error
            Err(TransportError::Remote(err)) => Err(*err),
            Err(source) => Err(failure(source)),
        }
    }
}
