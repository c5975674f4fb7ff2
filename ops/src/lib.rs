use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ScalarType {
    #[strum(to_string = "int32", serialize = "i32")]
    Int32,
    #[strum(to_string = "float32", serialize = "f32")]
    Float32,
    #[strum(to_string = "bool")]
    Bool,
}

impl ScalarType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Int32 | ScalarType::Float32)
    }
}

/// What an operand position accepts, as reported by a rejected type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Exactly(ScalarType),
    Numeric,
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Exactly(ty) => write!(f, "{}", ty),
            Expected::Numeric => write!(f, "a numeric type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int32(i32),
    Float32(f32),
    Bool(bool),
}

impl Value {
    pub fn ty(&self) -> ScalarType {
        match self {
            Value::Int32(_) => ScalarType::Int32,
            Value::Float32(_) => ScalarType::Float32,
            Value::Bool(_) => ScalarType::Bool,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parses `text` as a value of type `ty`.
    pub fn parse(ty: ScalarType, text: &str) -> Option<Self> {
        let text = text.trim();
        match ty {
            ScalarType::Int32 => text.parse().ok().map(Value::Int32),
            ScalarType::Float32 => text.parse().ok().map(Value::Float32),
            ScalarType::Bool => text.parse().ok().map(Value::Bool),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int32(x) => write!(f, "{}", x),
            Value::Float32(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int32(x)
    }
}
impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float32(x)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    Arithmetic,
    Ordering,
    Equality,
    Logical,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum PrimOp {
    Add,
    Subtract,
    Multiply,
    Negate,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
}

/// A rejected operand: position in the operand list, what was wanted there, what was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandMismatch {
    pub index: usize,
    pub expect: Expected,
    pub actual: ScalarType,
}

impl PrimOp {
    pub fn class(self) -> OpClass {
        use PrimOp::*;
        match self {
            Add | Subtract | Multiply | Negate => OpClass::Arithmetic,
            Less | LessEqual | Greater | GreaterEqual => OpClass::Ordering,
            Equal | NotEqual => OpClass::Equality,
            LogicalAnd | LogicalOr | LogicalNot => OpClass::Logical,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            PrimOp::Negate | PrimOp::LogicalNot => 1,
            _ => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        use PrimOp::*;
        match self {
            Add => "+",
            Subtract | Negate => "-",
            Multiply => "*",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            LogicalAnd => "&&",
            LogicalOr => "||",
            LogicalNot => "!",
        }
    }

    /// Checks operand types against the typing rule of this op and returns the
    /// result type. `None` operands are not known yet and are accepted; the
    /// result is `None` only when it depends entirely on unknown operands.
    ///
    /// The operand count is not checked here.
    pub fn result_type(
        self,
        operands: &[Option<ScalarType>],
    ) -> Result<Option<ScalarType>, OperandMismatch> {
        let class = self.class();

        let mut first: Option<ScalarType> = None;
        for (index, ty) in operands.iter().enumerate() {
            let actual = match ty {
                Some(ty) => *ty,
                None => continue,
            };

            let expect = match (class, first) {
                (OpClass::Logical, _) => Expected::Exactly(ScalarType::Bool),
                (_, Some(first)) => Expected::Exactly(first),
                (OpClass::Equality, None) => Expected::Exactly(actual),
                (_, None) => Expected::Numeric,
            };
            let accepted = match expect {
                Expected::Exactly(ty) => ty == actual,
                Expected::Numeric => actual.is_numeric(),
            };
            if !accepted {
                return Err(OperandMismatch {
                    index,
                    expect,
                    actual,
                });
            }
            first.get_or_insert(actual);
        }

        Ok(match class {
            OpClass::Arithmetic => first,
            OpClass::Ordering | OpClass::Equality | OpClass::Logical => Some(ScalarType::Bool),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn op_ident() {
        for op in PrimOp::iter() {
            let name: &'static str = op.into();
            let op2: PrimOp = name.parse().unwrap();
            assert_eq!(op, op2);
        }
        assert_eq!("less_equal".parse::<PrimOp>(), Ok(PrimOp::LessEqual));
        assert_eq!(PrimOp::LogicalNot.to_string(), "logical_not");
    }

    #[test]
    fn scalar_type_names() {
        assert_eq!("i32".parse::<ScalarType>(), Ok(ScalarType::Int32));
        assert_eq!("int32".parse::<ScalarType>(), Ok(ScalarType::Int32));
        assert_eq!("f32".parse::<ScalarType>(), Ok(ScalarType::Float32));
        assert_eq!(ScalarType::Float32.to_string(), "float32");
        assert!("u64".parse::<ScalarType>().is_err());
    }

    #[test]
    fn arity() {
        assert_eq!(PrimOp::Negate.arity(), 1);
        assert_eq!(PrimOp::LogicalNot.arity(), 1);
        assert_eq!(PrimOp::Multiply.arity(), 2);
        assert_eq!(PrimOp::GreaterEqual.arity(), 2);
    }

    #[test]
    fn arithmetic_typing() {
        use ScalarType::*;
        let op = PrimOp::Add;
        assert_eq!(op.result_type(&[Some(Int32), Some(Int32)]), Ok(Some(Int32)));
        assert_eq!(op.result_type(&[None, Some(Float32)]), Ok(Some(Float32)));
        assert_eq!(op.result_type(&[None, None]), Ok(None));
        assert_eq!(
            op.result_type(&[Some(Int32), Some(Float32)]),
            Err(OperandMismatch {
                index: 1,
                expect: Expected::Exactly(Int32),
                actual: Float32,
            })
        );
        assert_eq!(
            op.result_type(&[Some(Bool), Some(Bool)]),
            Err(OperandMismatch {
                index: 0,
                expect: Expected::Numeric,
                actual: Bool,
            })
        );
    }

    #[test]
    fn comparison_typing() {
        use ScalarType::*;
        assert_eq!(
            PrimOp::LessEqual.result_type(&[Some(Int32), Some(Int32)]),
            Ok(Some(Bool))
        );
        assert_eq!(PrimOp::Less.result_type(&[None, None]), Ok(Some(Bool)));
        assert!(PrimOp::Less.result_type(&[Some(Bool), Some(Bool)]).is_err());
        assert_eq!(
            PrimOp::Equal.result_type(&[Some(Bool), Some(Bool)]),
            Ok(Some(Bool))
        );
        assert!(PrimOp::NotEqual
            .result_type(&[Some(Float32), Some(Int32)])
            .is_err());
    }

    #[test]
    fn logical_typing() {
        use ScalarType::*;
        assert_eq!(
            PrimOp::LogicalAnd.result_type(&[Some(Bool), None]),
            Ok(Some(Bool))
        );
        assert_eq!(
            PrimOp::LogicalNot.result_type(&[Some(Int32)]),
            Err(OperandMismatch {
                index: 0,
                expect: Expected::Exactly(Bool),
                actual: Int32,
            })
        );
    }

    #[test]
    fn value_parse() {
        assert_eq!(Value::parse(ScalarType::Int32, " 24 "), Some(Value::Int32(24)));
        assert_eq!(Value::parse(ScalarType::Float32, "2.5"), Some(Value::Float32(2.5)));
        assert_eq!(Value::parse(ScalarType::Bool, "true"), Some(Value::Bool(true)));
        assert_eq!(Value::parse(ScalarType::Int32, "2.5"), None);
        assert_eq!(Value::Float32(2.0).to_string(), "2.0");
        assert_eq!(Value::from(3).ty(), ScalarType::Int32);
    }
}
