use crate::signature::Signature;
use ops::{Expected, ScalarType};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("syntax error at {line}:{column}: {msg}")]
    Syntax {
        line: usize,
        column: usize,
        msg: String,
    },

    #[error("`{name}` is already declared as {existing}, cannot redeclare it as {requested}")]
    DuplicateDeclaration {
        name: String,
        existing: Signature,
        requested: Signature,
    },

    #[error("`{name}` is declared as {declared} but defined as {actual}")]
    SignatureMismatch {
        name: String,
        declared: Signature,
        actual: Signature,
    },

    #[error("function `{name}` is not defined")]
    UndefinedFunction { name: String },

    #[error("{context}: expected {expect} value(s), found {actual}")]
    ArityMismatch {
        context: String,
        expect: usize,
        actual: usize,
    },

    #[error("{context}: expected {expect}, found {actual}")]
    TypeMismatch {
        context: String,
        expect: Expected,
        actual: ScalarType,
    },

    #[error("conditional branches differ: then-branch is {then_ty}, else-branch is {else_ty}")]
    BranchTypeMismatch {
        then_ty: ScalarType,
        else_ty: ScalarType,
    },

    #[error("duplicate name `{name}` in signature")]
    DuplicateName { name: String },

    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
}
