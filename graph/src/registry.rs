use crate::error::Error;
use crate::expr::Expr;
use crate::signature::Signature;
use log::{debug, warn};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub signature: Signature,
    pub body: Expr,
}

/// Everything the registry knows about one name.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    declaration: FunctionDeclaration,
    explicit: bool,
    definition: Option<FunctionDefinition>,
}

impl FunctionEntry {
    pub fn signature(&self) -> &Signature {
        &self.declaration.signature
    }

    /// Whether the name went through `declare` rather than only `define`.
    pub fn is_declared(&self) -> bool {
        self.explicit
    }

    pub fn definition(&self) -> Option<&FunctionDefinition> {
        self.definition.as_ref()
    }
}

/// Name-keyed table of function declarations and definitions.
///
/// Built at setup time, then only read while evaluating.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, FunctionEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `signature` under `name`. Repeating an identical declaration is
    /// a no-op; a differing one fails with `DuplicateDeclaration` carrying both
    /// signatures. A body that disagrees is reported by `define` as
    /// `SignatureMismatch` instead.
    pub fn declare(&mut self, name: &str, signature: Signature) -> Result<(), Error> {
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.signature() != &signature {
                    return Err(Error::DuplicateDeclaration {
                        name: name.to_owned(),
                        existing: entry.signature().clone(),
                        requested: signature,
                    });
                }
                debug!("redeclared `{}` with an identical signature", name);
                entry.explicit = true;
            }
            None => {
                debug!("declare `{}` {}", name, signature);
                self.entries.insert(
                    name.to_owned(),
                    FunctionEntry {
                        declaration: FunctionDeclaration {
                            name: name.to_owned(),
                            signature,
                        },
                        explicit: true,
                        definition: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Registers or replaces the body of `name`. Nothing is changed on failure.
    pub fn define(&mut self, name: &str, signature: Signature, body: Expr) -> Result<(), Error> {
        if let Some(entry) = self.entries.get(name) {
            if entry.signature() != &signature {
                return Err(Error::SignatureMismatch {
                    name: name.to_owned(),
                    declared: entry.signature().clone(),
                    actual: signature,
                });
            }
        }

        let ret_ty = match signature.ret_ty() {
            Some(ty) => ty,
            None => {
                return Err(Error::ArityMismatch {
                    context: format!("return values of `{}`", name),
                    expect: 1,
                    actual: signature.returns().len(),
                })
            }
        };
        if let Some(actual) = body.ty {
            if actual != ret_ty {
                return Err(Error::TypeMismatch {
                    context: format!("body of `{}`", name),
                    expect: ops::Expected::Exactly(ret_ty),
                    actual,
                });
            }
        }

        let definition = FunctionDefinition {
            name: name.to_owned(),
            signature: signature.clone(),
            body,
        };
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.definition.is_some() {
                    warn!("replacing the definition of `{}`", name);
                }
                entry.definition = Some(definition);
            }
            None => {
                self.entries.insert(
                    name.to_owned(),
                    FunctionEntry {
                        declaration: FunctionDeclaration {
                            name: name.to_owned(),
                            signature,
                        },
                        explicit: false,
                        definition: Some(definition),
                    },
                );
            }
        }
        debug!("define `{}`", name);
        Ok(())
    }

    /// A bare declaration is not callable.
    pub fn resolve(&self, name: &str) -> Result<&FunctionDefinition, Error> {
        self.entries
            .get(name)
            .and_then(|entry| entry.definition.as_ref())
            .ok_or_else(|| Error::UndefinedFunction {
                name: name.to_owned(),
            })
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.entries.get(name).map(|entry| entry.signature())
    }

    /// All entries in name order.
    pub fn functions(&self) -> impl Iterator<Item = (&str, &FunctionEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::E;
    use ops::ScalarType::*;
    use ops::{ScalarType, Value};

    fn fac_sig() -> Signature {
        Signature::of(&[("n", Int32)], &[("ret", Int32)]).unwrap()
    }

    fn one() -> Expr {
        Expr::new(E::Constant(Value::Int32(1)), Some(ScalarType::Int32))
    }

    #[test]
    fn redeclare_identical() {
        let mut registry = Registry::new();
        registry.declare("Fac", fac_sig()).unwrap();
        registry.declare("Fac", fac_sig()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn redeclare_different() {
        let mut registry = Registry::new();
        registry.declare("Fac", fac_sig()).unwrap();
        let other = Signature::of(&[("n", Float32)], &[("ret", Int32)]).unwrap();
        let err = registry.declare("Fac", other.clone()).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateDeclaration {
                name: "Fac".into(),
                existing: fac_sig(),
                requested: other,
            }
        );
        assert_eq!(registry.signature("Fac"), Some(&fac_sig()));
    }

    #[test]
    fn declared_only_is_not_callable() {
        let mut registry = Registry::new();
        registry.declare("Fac", fac_sig()).unwrap();
        assert_eq!(registry.signature("Fac"), Some(&fac_sig()));
        assert_eq!(
            registry.resolve("Fac").unwrap_err(),
            Error::UndefinedFunction { name: "Fac".into() }
        );
        assert_eq!(
            registry.resolve("Nope").unwrap_err(),
            Error::UndefinedFunction {
                name: "Nope".into()
            }
        );
    }

    #[test]
    fn define_checks_declaration() {
        let mut registry = Registry::new();
        registry.declare("Fac", fac_sig()).unwrap();

        let wrong = Signature::of(&[("m", Int32)], &[("ret", Int32)]).unwrap();
        let err = registry.define("Fac", wrong, one()).unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch { .. }));
        assert!(registry.resolve("Fac").is_err());

        registry.define("Fac", fac_sig(), one()).unwrap();
        assert_eq!(registry.resolve("Fac").unwrap().body, one());
    }

    #[test]
    fn definition_implies_declaration() {
        let mut registry = Registry::new();
        registry.define("Fac", fac_sig(), one()).unwrap();
        let entry = registry.functions().next().unwrap().1;
        assert!(!entry.is_declared());

        let wrong = Signature::of(&[], &[("ret", Int32)]).unwrap();
        assert!(matches!(
            registry.define("Fac", wrong, one()),
            Err(Error::SignatureMismatch { .. })
        ));

        // replacing with the same signature is allowed
        let two = Expr::new(E::Constant(Value::Int32(2)), Some(Int32));
        registry.define("Fac", fac_sig(), two.clone()).unwrap();
        assert_eq!(registry.resolve("Fac").unwrap().body, two);
    }

    #[test]
    fn define_checks_return() {
        let mut registry = Registry::new();

        let pair = Signature::of(&[], &[("a", Int32), ("b", Int32)]).unwrap();
        let err = registry.define("Pair", pair, one()).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { expect: 1, actual: 2, .. }));

        let flag = Signature::of(&[], &[("ret", Bool)]).unwrap();
        let err = registry.define("Flag", flag, one()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { actual: Int32, .. }));
        assert!(registry.is_empty());
    }
}
