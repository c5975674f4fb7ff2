use crate::placement::PlacementTag;
use ops::{PrimOp, ScalarType, Value};

/// A node of a function body.
///
/// `ty` is the statically known result type; it is `None` for calls whose
/// callee had no visible signature when the node was built.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub e: E,
    pub ty: Option<ScalarType>,
    pub placement: Option<PlacementTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum E {
    Constant(Value),
    Parameter(usize),
    Call {
        target: String,
        args: Vec<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Primitive {
        op: PrimOp,
        operands: Vec<Expr>,
    },
}

impl Expr {
    pub fn new(e: E, ty: Option<ScalarType>) -> Self {
        Self {
            e,
            ty,
            placement: None,
        }
    }

    pub fn placed(mut self, tag: PlacementTag) -> Self {
        self.placement = Some(tag);
        self
    }

    pub fn children(&self) -> Vec<&Expr> {
        match &self.e {
            E::Constant(_) | E::Parameter(_) => vec![],
            E::Call { args, .. } => args.iter().collect(),
            E::Conditional {
                cond,
                then_expr,
                else_expr,
            } => vec![&**cond, &**then_expr, &**else_expr],
            E::Primitive { operands, .. } => operands.iter().collect(),
        }
    }

    /// Pre-order traversal; `f` receives each node with its depth below `self`.
    pub fn walk<F: FnMut(&Expr, usize)>(&self, f: &mut F) {
        self.walk_at(0, f);
    }

    fn walk_at<F: FnMut(&Expr, usize)>(&self, depth: usize, f: &mut F) {
        f(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, f);
        }
    }
}
