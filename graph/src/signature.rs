use crate::error::Error;
use ops::{Expected, ScalarType};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: ScalarType,
}

impl Field {
    pub fn new(name: &str, ty: ScalarType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
        }
    }
}

/// Ordered, named, typed parameters and return values of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Field>,
    returns: Vec<Field>,
}

impl Signature {
    /// Fails with `DuplicateName` if a name appears twice across parameters and returns.
    pub fn new(params: Vec<Field>, returns: Vec<Field>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for f in params.iter().chain(returns.iter()) {
            if !seen.insert(f.name.as_str()) {
                return Err(Error::DuplicateName {
                    name: f.name.clone(),
                });
            }
        }
        Ok(Self { params, returns })
    }

    /// Shorthand for the common case of building a signature from literals.
    pub fn of(params: &[(&str, ScalarType)], returns: &[(&str, ScalarType)]) -> Result<Self, Error> {
        let fields = |list: &[(&str, ScalarType)]| {
            list.iter()
                .map(|&(name, ty)| Field::new(name, ty))
                .collect::<Vec<_>>()
        };
        Self::new(fields(params), fields(returns))
    }

    pub fn params(&self) -> &[Field] {
        &self.params
    }

    pub fn returns(&self) -> &[Field] {
        &self.returns
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// The single return type, if the signature has exactly one return value.
    pub fn ret_ty(&self) -> Option<ScalarType> {
        match self.returns.as_slice() {
            [ret] => Some(ret.ty),
            _ => None,
        }
    }

    /// Checks an argument list against the parameters. Unknown (`None`)
    /// argument types are accepted.
    pub fn check_args<I>(&self, callee: &str, args: I) -> Result<(), Error>
    where
        I: ExactSizeIterator<Item = Option<ScalarType>>,
    {
        if args.len() != self.params.len() {
            return Err(Error::ArityMismatch {
                context: format!("call to `{}`", callee),
                expect: self.params.len(),
                actual: args.len(),
            });
        }
        for (param, arg) in self.params.iter().zip(args) {
            match arg {
                Some(actual) if actual != param.ty => {
                    return Err(Error::TypeMismatch {
                        context: format!("argument `{}` of `{}`", param.name, callee),
                        expect: Expected::Exactly(param.ty),
                        actual,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn list(f: &mut std::fmt::Formatter<'_>, fields: &[Field]) -> std::fmt::Result {
            write!(f, "(")?;
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", field.name, field.ty)?;
            }
            write!(f, ")")
        }
        list(f, &self.params)?;
        write!(f, " -> ")?;
        list(f, &self.returns)
    }
}
