use crate::builder::FunctionBuilder;
use crate::error::Error;
use crate::expr::Expr;
use crate::parser::{self, Item, ParsedExpr};
use crate::registry::Registry;
use crate::signature::Signature;
use log::debug;
use ops::PrimOp;

/// Parses `source` and registers its items in order.
///
/// Either every item is registered or, on the first error, none is.
pub fn load_program(registry: &mut Registry, source: &str) -> Result<(), Error> {
    let program = parser::parse_program(source)?;

    let mut staged = registry.clone();
    for item in program.items {
        match item {
            Item::Decl {
                name,
                params,
                returns,
            } => {
                staged.declare(&name, Signature::new(params, returns)?)?;
            }
            Item::Func {
                name,
                params,
                returns,
                body,
            } => {
                let signature = Signature::new(params, returns)?;
                let body = {
                    let builder = FunctionBuilder::new(&staged, &signature);
                    lower_expr(&builder, body)?
                };
                staged.define(&name, signature, body)?;
            }
        }
    }

    debug!("loaded {} function(s)", staged.len());
    *registry = staged;
    Ok(())
}

pub fn lower_expr(b: &FunctionBuilder, expr: ParsedExpr) -> Result<Expr, Error> {
    let lower_all = |exprs: Vec<ParsedExpr>| {
        exprs
            .into_iter()
            .map(|e| lower_expr(b, e))
            .collect::<Result<Vec<_>, _>>()
    };

    match expr {
        ParsedExpr::Literal(value) => Ok(b.constant(value)),
        ParsedExpr::Var(name) => b.param_named(&name),
        ParsedExpr::Call { name, args } => {
            let args = lower_all(args)?;
            // primitives are callable by name, like `less_equal(n, 1)`
            match name.parse::<PrimOp>() {
                Ok(op) => b.primitive(op, args),
                Err(_) => b.call(&name, args),
            }
        }
        ParsedExpr::Prim { op, operands } => b.primitive(op, lower_all(operands)?),
        ParsedExpr::If {
            cond,
            then_expr,
            else_expr,
        } => {
            let cond = lower_expr(b, *cond)?;
            let then_expr = lower_expr(b, *then_expr)?;
            let else_expr = lower_expr(b, *else_expr)?;
            b.conditional(cond, then_expr, else_expr)
        }
        ParsedExpr::Placed { expr, tag } => Ok(lower_expr(b, *expr)?.placed(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::E;
    use crate::placement::PlacementTag;
    use ops::{ScalarType, Value};

    #[test]
    fn load_factorial() {
        let mut registry = Registry::new();
        load_program(
            &mut registry,
            r#"
            decl Fac(n: i32) -> i32;
            fn Fac(n: i32) -> i32 {
                if less_equal(n, 1) { 1 } else { n * Fac(n - 1) }
            }
            "#,
        )
        .unwrap();

        let def = registry.resolve("Fac").unwrap();
        assert_eq!(def.body.ty, Some(ScalarType::Int32));
        match &def.body.e {
            E::Conditional { cond, .. } => {
                assert!(matches!(
                    cond.e,
                    E::Primitive {
                        op: PrimOp::LessEqual,
                        ..
                    }
                ));
            }
            e => panic!("unexpected body {:?}", e),
        }
    }

    #[test]
    fn placement_is_kept() {
        let mut registry = Registry::new();
        load_program(
            &mut registry,
            r#"fn F(n: i32) -> i32 { G(n) @ "/job:local/task:1" }"#,
        )
        .unwrap();

        let body = &registry.resolve("F").unwrap().body;
        assert_eq!(body.placement, Some(PlacementTag::job("local").with_task(1)));
        assert_eq!(body.ty, None);
    }

    #[test]
    fn undefined_variable() {
        let mut registry = Registry::new();
        let err = load_program(&mut registry, "fn F(n: i32) -> i32 { m }").unwrap_err();
        assert_eq!(err, Error::UndefinedVariable { name: "m".into() });
    }

    #[test]
    fn failed_load_registers_nothing() {
        let mut registry = Registry::new();
        let err = load_program(
            &mut registry,
            r#"
            fn One() -> i32 { 1 }
            fn Bad(x: f32) -> i32 { x }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn type_errors_in_source() {
        let mut registry = Registry::new();
        let err = load_program(
            &mut registry,
            "fn F(n: i32) -> i32 { if n { 1 } else { 2 } }",
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = load_program(
            &mut registry,
            "fn F(n: i32) -> i32 { if n < 1 { 1 } else { false } }",
        )
        .unwrap_err();
        assert!(matches!(err, Error::BranchTypeMismatch { .. }));
    }

    #[test]
    fn literal_values() {
        let mut registry = Registry::new();
        load_program(&mut registry, "fn Half() -> f32 { 0.5 }").unwrap();
        assert_eq!(
            registry.resolve("Half").unwrap().body.e,
            E::Constant(Value::Float32(0.5))
        );
    }
}
