use crate::error::Error;
use crate::expr::{Expr, E};
use crate::registry::Registry;
use crate::signature::Signature;
use log::trace;
use ops::{Expected, PrimOp, ScalarType, Value};

/// Builds type-checked bodies for a function with the given signature.
///
/// Calls are checked against whatever signature the registry shows for the
/// callee at build time; calls to names the registry does not know yet are
/// left untyped and get checked when they are evaluated.
pub struct FunctionBuilder<'a> {
    registry: &'a Registry,
    signature: &'a Signature,
}

fn assert_type_eq(context: &str, actual: Option<ScalarType>, expect: ScalarType) -> Result<(), Error> {
    match actual {
        Some(actual) if actual != expect => Err(Error::TypeMismatch {
            context: context.to_owned(),
            expect: Expected::Exactly(expect),
            actual,
        }),
        _ => Ok(()),
    }
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(registry: &'a Registry, signature: &'a Signature) -> Self {
        Self {
            registry,
            signature,
        }
    }

    pub fn signature(&self) -> &Signature {
        self.signature
    }

    pub fn constant<V: Into<Value>>(&self, value: V) -> Expr {
        let value = value.into();
        Expr::new(E::Constant(value), Some(value.ty()))
    }

    pub fn param(&self, index: usize) -> Result<Expr, Error> {
        let params = self.signature.params();
        match params.get(index) {
            Some(p) => Ok(Expr::new(E::Parameter(index), Some(p.ty))),
            None => Err(Error::ArityMismatch {
                context: format!("parameter index {}", index),
                expect: params.len(),
                actual: index + 1,
            }),
        }
    }

    pub fn param_named(&self, name: &str) -> Result<Expr, Error> {
        match self.signature.param_index(name) {
            Some(index) => self.param(index),
            None => Err(Error::UndefinedVariable {
                name: name.to_owned(),
            }),
        }
    }

    pub fn primitive(&self, op: PrimOp, operands: Vec<Expr>) -> Result<Expr, Error> {
        if operands.len() != op.arity() {
            return Err(Error::ArityMismatch {
                context: format!("operands of `{}`", op),
                expect: op.arity(),
                actual: operands.len(),
            });
        }
        let types: Vec<_> = operands.iter().map(|e| e.ty).collect();
        let ty = op.result_type(&types).map_err(|m| Error::TypeMismatch {
            context: format!("operand {} of `{}`", m.index, op),
            expect: m.expect,
            actual: m.actual,
        })?;
        Ok(Expr::new(E::Primitive { op, operands }, ty))
    }

    pub fn call(&self, name: &str, args: Vec<Expr>) -> Result<Expr, Error> {
        let ty = match self.registry.signature(name) {
            Some(callee) => {
                callee.check_args(name, args.iter().map(|e| e.ty))?;
                callee.ret_ty()
            }
            None => {
                trace!("call to `{}` is not checked until evaluation", name);
                None
            }
        };
        let target = name.to_owned();
        Ok(Expr::new(E::Call { target, args }, ty))
    }

    pub fn conditional(&self, cond: Expr, then_expr: Expr, else_expr: Expr) -> Result<Expr, Error> {
        assert_type_eq("condition", cond.ty, ScalarType::Bool)?;

        let ty = match (then_expr.ty, else_expr.ty) {
            (Some(then_ty), Some(else_ty)) if then_ty != else_ty => {
                return Err(Error::BranchTypeMismatch { then_ty, else_ty });
            }
            (then_ty, else_ty) => then_ty.or(else_ty),
        };
        let e = E::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        };
        Ok(Expr::new(e, ty))
    }
}
