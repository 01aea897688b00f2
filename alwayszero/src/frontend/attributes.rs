//! Table of attributes recognised by the front end
//!
//! One registry exists per [`Session`](crate::Session). Plugins extend it
//! through the attribute callback before any source is parsed.

use {
    common::{
        intern::InternedString,
        ir::{
            attribute::{Attribute, AttributeArgument},
            Declaration,
        },
        HashMap,
    },
    log::{trace, warn},
};

/// What an attribute handler decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandlerOutcome {
    /// Do not attach the attribute to the declaration
    pub no_add_attrs: bool,
}

impl HandlerOutcome {
    pub const ACCEPT: Self = Self {
        no_add_attrs: false,
    };
}

/// Called once for every occurrence of the attribute, after the generic checks
pub type AttributeHandler = fn(&mut Declaration, &Attribute) -> HandlerOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Any,
    String,
}

/// The construct an attribute is written on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTarget {
    Declaration,
    Type,
    Identifier,
}

#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub argument: ArgumentKind,
    pub applies_to_decl: bool,
    pub applies_to_type: bool,
    pub applies_to_identifier: bool,
    pub handler: AttributeHandler,
}

impl AttributeSpec {
    fn applies_to(&self, target: AttributeTarget) -> bool {
        match target {
            AttributeTarget::Declaration => self.applies_to_decl,
            AttributeTarget::Type => self.applies_to_type,
            AttributeTarget::Identifier => self.applies_to_identifier,
        }
    }
}

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum RegistryError {
    /// attribute {0:?} is already registered
    Duplicate(&'static str),
}

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum AttributeError {
    /// wrong number of arguments specified for {name:?} attribute: expected between {min} and {max}, found {found}
    WrongArgumentCount {
        name: InternedString,
        min: usize,
        max: usize,
        found: usize,
    },
    /// argument {index} of {name:?} attribute is not a string constant
    ArgumentNotString { name: InternedString, index: usize },
    /// {name:?} attribute does not apply to {target:?}
    NotApplicable {
        name: InternedString,
        target: AttributeTarget,
    },
}

#[derive(Debug, Default)]
pub struct AttributeRegistry {
    specs: HashMap<InternedString, AttributeSpec>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: AttributeSpec) -> Result<(), RegistryError> {
        let name = InternedString::from_static(spec.name);

        if self.specs.contains_key(&name) {
            return Err(RegistryError::Duplicate(spec.name));
        }

        trace!("registered attribute {name:?}");
        self.specs.insert(name, spec);

        Ok(())
    }

    pub fn lookup(&self, name: InternedString) -> Option<&AttributeSpec> {
        self.specs.get(&name)
    }

    /// Generic checks shared by every attribute: arity, argument kinds and
    /// the construct it is written on
    ///
    /// Returns `Ok(None)` for attributes nobody registered.
    pub fn check(
        &self,
        attribute: &Attribute,
        target: AttributeTarget,
    ) -> Result<Option<&AttributeSpec>, AttributeError> {
        let name = attribute.name();

        let Some(spec) = self.lookup(name) else {
            return Ok(None);
        };

        let found = attribute.args().len();
        if found < spec.min_args || found > spec.max_args {
            return Err(AttributeError::WrongArgumentCount {
                name,
                min: spec.min_args,
                max: spec.max_args,
                found,
            });
        }

        if spec.argument == ArgumentKind::String {
            if let Some(index) = attribute
                .args()
                .iter()
                .position(|arg| !matches!(arg, AttributeArgument::String(_)))
            {
                return Err(AttributeError::ArgumentNotString { name, index });
            }
        }

        if !spec.applies_to(target) {
            return Err(AttributeError::NotApplicable { name, target });
        }

        Ok(Some(spec))
    }

    /// Validates `attribute` and, if its handler agrees, attaches it to
    /// `declaration`
    ///
    /// Unknown attributes are ignored with a warning.
    pub fn apply(
        &self,
        declaration: &mut Declaration,
        attribute: Attribute,
    ) -> Result<(), AttributeError> {
        let Some(spec) = self.check(&attribute, AttributeTarget::Declaration)? else {
            warn!(
                "{:?} attribute directive ignored on {}",
                attribute.name(),
                declaration.name()
            );
            return Ok(());
        };

        let outcome = (spec.handler)(declaration, &attribute);

        if !outcome.no_add_attrs {
            declaration.add_attribute(attribute);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            ArgumentKind, AttributeError, AttributeRegistry, AttributeSpec, AttributeTarget,
            HandlerOutcome, RegistryError,
        },
        common::ir::{
            attribute::{Attribute, AttributeArgument},
            types::Type,
            Declaration,
        },
    };

    fn reject(_: &mut Declaration, _: &Attribute) -> HandlerOutcome {
        HandlerOutcome { no_add_attrs: true }
    }

    fn accept(_: &mut Declaration, _: &Attribute) -> HandlerOutcome {
        HandlerOutcome::ACCEPT
    }

    fn spec(name: &'static str, handler: super::AttributeHandler) -> AttributeSpec {
        AttributeSpec {
            name,
            min_args: 0,
            max_args: 2,
            argument: ArgumentKind::Any,
            applies_to_decl: true,
            applies_to_type: false,
            applies_to_identifier: false,
            handler,
        }
    }

    fn decl() -> Declaration {
        Declaration::new("f".into(), Some(Type::s32()), vec![])
    }

    #[test]
    fn duplicate_registration() {
        let mut registry = AttributeRegistry::new();
        registry.register(spec("hot", accept)).unwrap();

        assert!(matches!(
            registry.register(spec("hot", accept)),
            Err(RegistryError::Duplicate("hot"))
        ));
    }

    #[test]
    fn unknown_attribute_dropped() {
        let registry = AttributeRegistry::new();
        let mut decl = decl();

        registry
            .apply(&mut decl, Attribute::new("mystery".into(), vec![]))
            .unwrap();

        assert!(decl.attributes().is_empty());
    }

    #[test]
    fn handler_can_veto() {
        let mut registry = AttributeRegistry::new();
        registry.register(spec("veto", reject)).unwrap();
        registry.register(spec("keep", accept)).unwrap();
        let mut decl = decl();

        registry
            .apply(&mut decl, Attribute::new("veto".into(), vec![]))
            .unwrap();
        registry
            .apply(&mut decl, Attribute::new("keep".into(), vec![]))
            .unwrap();

        assert_eq!(decl.attributes().len(), 1);
        assert_eq!(decl.attributes()[0].name(), "keep");
    }

    #[test]
    fn arity_and_kind() {
        let mut registry = AttributeRegistry::new();
        registry
            .register(AttributeSpec {
                min_args: 1,
                max_args: 1,
                argument: ArgumentKind::String,
                ..spec("section", accept)
            })
            .unwrap();
        let mut decl = decl();

        assert!(matches!(
            registry.apply(&mut decl, Attribute::new("section".into(), vec![])),
            Err(AttributeError::WrongArgumentCount { found: 0, .. })
        ));
        assert!(matches!(
            registry.apply(
                &mut decl,
                Attribute::new("section".into(), vec![AttributeArgument::Integer(4)])
            ),
            Err(AttributeError::ArgumentNotString { index: 0, .. })
        ));
        assert!(decl.attributes().is_empty());
    }

    #[test]
    fn target_checked() {
        let mut registry = AttributeRegistry::new();
        registry.register(spec("hot", accept)).unwrap();
        let attr = Attribute::new("hot".into(), vec![]);

        assert!(registry
            .check(&attr, AttributeTarget::Declaration)
            .unwrap()
            .is_some());
        assert!(matches!(
            registry.check(&attr, AttributeTarget::Type),
            Err(AttributeError::NotApplicable {
                target: AttributeTarget::Type,
                ..
            })
        ));
        assert!(matches!(
            registry.check(&attr, AttributeTarget::Identifier),
            Err(AttributeError::NotApplicable { .. })
        ));
    }
}
