use {
    crate::frontend::attributes::{
        ArgumentKind, AttributeRegistry, AttributeSpec, HandlerOutcome, RegistryError,
    },
    common::ir::{attribute::Attribute, Declaration},
};

/// Name of the attribute carrying annotations such as `user("alwayszero")`
pub const USER_ATTRIBUTE: &str = "user";

/// Accepts every `user` attribute unchanged
///
/// Arity and argument kind are checked by the registry before this runs, the
/// argument string itself is only interpreted by the pass.
pub fn handle_user_attribute(_: &mut Declaration, _: &Attribute) -> HandlerOutcome {
    HandlerOutcome::ACCEPT
}

pub fn user_attribute() -> AttributeSpec {
    AttributeSpec {
        name: USER_ATTRIBUTE,
        min_args: 1,
        max_args: 1,
        argument: ArgumentKind::String,
        applies_to_decl: true,
        applies_to_type: false,
        applies_to_identifier: false,
        handler: handle_user_attribute,
    }
}

/// Attribute callback of the plugin
pub fn register_attributes(registry: &mut AttributeRegistry) -> Result<(), RegistryError> {
    registry.register(user_attribute())
}

#[cfg(test)]
mod tests {
    use {
        super::{register_attributes, USER_ATTRIBUTE},
        crate::frontend::attributes::{AttributeRegistry, AttributeTarget},
        common::{
            intern::InternedString,
            ir::{
                attribute::{Attribute, AttributeArgument},
                Declaration,
            },
        },
    };

    fn user(args: Vec<AttributeArgument>) -> Attribute {
        Attribute::new(InternedString::from_static(USER_ATTRIBUTE), args)
    }

    #[test]
    fn accepts_any_single_string() {
        let mut registry = AttributeRegistry::new();
        register_attributes(&mut registry).unwrap();
        let mut decl = Declaration::new("f".into(), None, vec![]);

        for value in ["alwayszero", "anything", ""] {
            registry
                .apply(&mut decl, user(vec![AttributeArgument::String(value.into())]))
                .unwrap();
        }

        // attached in order, nothing else about the declaration changes
        assert_eq!(decl.attributes().len(), 3);
        assert_eq!(decl.attributes()[1].args()[0].as_string().unwrap(), "anything");
        assert_eq!(decl.return_type(), None);
        assert!(decl.parameters().is_empty());
    }

    #[test]
    fn generic_checks_apply() {
        let mut registry = AttributeRegistry::new();
        register_attributes(&mut registry).unwrap();
        let one = user(vec![AttributeArgument::String("alwayszero".into())]);

        assert!(registry.check(&user(vec![]), AttributeTarget::Declaration).is_err());
        assert!(registry
            .check(
                &user(vec![
                    AttributeArgument::String("a".into()),
                    AttributeArgument::String("b".into())
                ]),
                AttributeTarget::Declaration
            )
            .is_err());
        assert!(registry
            .check(&user(vec![AttributeArgument::Integer(0)]), AttributeTarget::Declaration)
            .is_err());
        assert!(registry.check(&one, AttributeTarget::Type).is_err());
        assert!(registry.check(&one, AttributeTarget::Identifier).is_err());
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = AttributeRegistry::new();
        register_attributes(&mut registry).unwrap();
        assert!(register_attributes(&mut registry).is_err());
    }
}
