use graph::Error;
use num_traits::{Float, WrappingAdd, WrappingMul, WrappingNeg, WrappingSub};
use ops::{Expected, OpClass, PrimOp, ScalarType, Value};

pub trait Int:
    Copy + Ord + WrappingAdd + WrappingSub + WrappingMul + WrappingNeg + std::fmt::Debug
{
}
impl<T> Int for T where
    T: Copy + Ord + WrappingAdd + WrappingSub + WrappingMul + WrappingNeg + std::fmt::Debug
{
}

#[inline]
fn int_arith<T: Int>(op: PrimOp, lhs: T, rhs: Option<T>) -> T {
    match (op, rhs) {
        (PrimOp::Add, Some(rhs)) => lhs.wrapping_add(&rhs),
        (PrimOp::Subtract, Some(rhs)) => lhs.wrapping_sub(&rhs),
        (PrimOp::Multiply, Some(rhs)) => lhs.wrapping_mul(&rhs),
        (PrimOp::Negate, None) => lhs.wrapping_neg(),
        _ => unreachable!("{:?} is not a well-formed arithmetic op", op),
    }
}

#[inline]
fn float_arith<T: Float>(op: PrimOp, lhs: T, rhs: Option<T>) -> T {
    match (op, rhs) {
        (PrimOp::Add, Some(rhs)) => lhs + rhs,
        (PrimOp::Subtract, Some(rhs)) => lhs - rhs,
        (PrimOp::Multiply, Some(rhs)) => lhs * rhs,
        (PrimOp::Negate, None) => -lhs,
        _ => unreachable!("{:?} is not a well-formed arithmetic op", op),
    }
}

#[inline]
fn compare<T: PartialOrd>(op: PrimOp, lhs: T, rhs: T) -> bool {
    match op {
        PrimOp::Equal => lhs == rhs,
        PrimOp::NotEqual => lhs != rhs,
        PrimOp::Less => lhs < rhs,
        PrimOp::LessEqual => lhs <= rhs,
        PrimOp::Greater => lhs > rhs,
        PrimOp::GreaterEqual => lhs >= rhs,
        _ => unreachable!("{:?} is not a comparison", op),
    }
}

/// Applies a primitive op to evaluated operands. int32 arithmetic wraps on overflow.
pub fn apply(op: PrimOp, operands: &[Value]) -> Result<Value, Error> {
    if operands.len() != op.arity() {
        return Err(Error::ArityMismatch {
            context: format!("operands of `{}`", op),
            expect: op.arity(),
            actual: operands.len(),
        });
    }
    let types: Vec<_> = operands.iter().map(|v| Some(v.ty())).collect();
    op.result_type(&types).map_err(|m| Error::TypeMismatch {
        context: format!("operand {} of `{}`", m.index, op),
        expect: m.expect,
        actual: m.actual,
    })?;

    use Value::*;
    let val = match (op.class(), operands) {
        (OpClass::Arithmetic, [Int32(l)]) => Int32(int_arith(op, *l, None)),
        (OpClass::Arithmetic, [Int32(l), Int32(r)]) => Int32(int_arith(op, *l, Some(*r))),
        (OpClass::Arithmetic, [Float32(l)]) => Float32(float_arith(op, *l, None)),
        (OpClass::Arithmetic, [Float32(l), Float32(r)]) => Float32(float_arith(op, *l, Some(*r))),

        (OpClass::Ordering | OpClass::Equality, [Int32(l), Int32(r)]) => Bool(compare(op, l, r)),
        (OpClass::Ordering | OpClass::Equality, [Float32(l), Float32(r)]) => {
            Bool(compare(op, l, r))
        }
        (OpClass::Equality, [Bool(l), Bool(r)]) => Bool(compare(op, l, r)),

        (OpClass::Logical, [Bool(b)]) => Bool(!b),
        (OpClass::Logical, [Bool(l), Bool(r)]) => match op {
            PrimOp::LogicalAnd => Bool(*l && *r),
            _ => Bool(*l || *r),
        },

        (_, [first, ..]) => {
            return Err(Error::TypeMismatch {
                context: format!("operand 0 of `{}`", op),
                expect: Expected::Numeric,
                actual: first.ty(),
            })
        }
        (_, []) => unreachable!("every op takes at least one operand"),
    };
    log::trace!("{}({:?}) = {}", op, operands, val);
    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Value::*;

    #[test]
    fn int_ops() {
        assert_eq!(apply(PrimOp::Add, &[Int32(2), Int32(3)]), Ok(Int32(5)));
        assert_eq!(apply(PrimOp::Subtract, &[Int32(2), Int32(3)]), Ok(Int32(-1)));
        assert_eq!(apply(PrimOp::Multiply, &[Int32(4), Int32(3)]), Ok(Int32(12)));
        assert_eq!(apply(PrimOp::Negate, &[Int32(4)]), Ok(Int32(-4)));
    }

    #[test]
    fn int_wraps() {
        assert_eq!(
            apply(PrimOp::Add, &[Int32(i32::MAX), Int32(1)]),
            Ok(Int32(i32::MIN))
        );
        assert_eq!(
            apply(PrimOp::Multiply, &[Int32(479001600), Int32(13)]),
            Ok(Int32(1932053504))
        );
        assert_eq!(apply(PrimOp::Negate, &[Int32(i32::MIN)]), Ok(Int32(i32::MIN)));
    }

    #[test]
    fn float_ops() {
        assert_eq!(
            apply(PrimOp::Multiply, &[Float32(1.5), Float32(2.0)]),
            Ok(Float32(3.0))
        );
        assert_eq!(apply(PrimOp::Negate, &[Float32(0.5)]), Ok(Float32(-0.5)));
        assert_eq!(
            apply(PrimOp::GreaterEqual, &[Float32(0.5), Float32(0.5)]),
            Ok(Bool(true))
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply(PrimOp::LessEqual, &[Int32(1), Int32(1)]), Ok(Bool(true)));
        assert_eq!(apply(PrimOp::Less, &[Int32(1), Int32(1)]), Ok(Bool(false)));
        assert_eq!(apply(PrimOp::Equal, &[Bool(true), Bool(true)]), Ok(Bool(true)));
        assert_eq!(apply(PrimOp::NotEqual, &[Int32(0), Int32(1)]), Ok(Bool(true)));
    }

    #[test]
    fn logic() {
        assert_eq!(apply(PrimOp::LogicalAnd, &[Bool(true), Bool(false)]), Ok(Bool(false)));
        assert_eq!(apply(PrimOp::LogicalOr, &[Bool(true), Bool(false)]), Ok(Bool(true)));
        assert_eq!(apply(PrimOp::LogicalNot, &[Bool(true)]), Ok(Bool(false)));
    }

    #[test]
    fn rejects_bad_operands() {
        assert!(matches!(
            apply(PrimOp::Add, &[Int32(1)]),
            Err(Error::ArityMismatch { expect: 2, actual: 1, .. })
        ));
        assert!(matches!(
            apply(PrimOp::Add, &[Int32(1), Float32(1.0)]),
            Err(Error::TypeMismatch { actual: ScalarType::Float32, .. })
        ));
        assert!(matches!(
            apply(PrimOp::Less, &[Bool(true), Bool(false)]),
            Err(Error::TypeMismatch { actual: ScalarType::Bool, .. })
        ));
    }
}
