//! Function declarations, typed expression graphs and the textual graph language.
//!
//! A [`Registry`] holds forward declarations and definitions keyed by name.
//! Bodies are built with a [`FunctionBuilder`] (or loaded from source with
//! [`load_program`]) and refer to other functions by name only, so self and
//! mutual recursion never create cycles in the expression trees.

pub mod builder;
pub mod callgraph;
pub mod error;
pub mod expr;
pub mod lower;
pub mod parser;
pub mod placement;
pub mod registry;
pub mod signature;

pub use builder::FunctionBuilder;
pub use callgraph::{call_sites, CallGraph, CallSite};
pub use error::Error;
pub use expr::{Expr, E};
pub use lower::load_program;
pub use placement::PlacementTag;
pub use registry::{FunctionDeclaration, FunctionDefinition, FunctionEntry, Registry};
pub use signature::{Field, Signature};

pub use ops::{PrimOp, ScalarType, Value};
