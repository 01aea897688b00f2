use {
    crate::intern::InternedString,
    core::fmt::{self, Display, Formatter},
    itertools::Itertools,
};

/// Argument of an attribute as written in the source
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AttributeArgument {
    String(InternedString),
    Integer(i64),
    Identifier(InternedString),
}

impl AttributeArgument {
    pub fn as_string(&self) -> Option<InternedString> {
        match self {
            Self::String(s) => Some(*s),
            _ => None,
        }
    }
}

impl Display for AttributeArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{:?}", s.as_ref()),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Identifier(i) => write!(f, "{i}"),
        }
    }
}

/// An annotation attached to a declaration, `#[name(args...)]`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    name: InternedString,
    args: Vec<AttributeArgument>,
}

impl Attribute {
    pub fn new(name: InternedString, args: Vec<AttributeArgument>) -> Self {
        Self { name, args }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn args(&self) -> &[AttributeArgument] {
        &self.args
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "#[{}]", self.name)
        } else {
            write!(f, "#[{}({})]", self.name, self.args.iter().join(", "))
        }
    }
}

/// Every attribute in `attributes` called `name`, in order of appearance
pub fn lookup_attribute<'a>(
    attributes: &'a [Attribute],
    name: &'a str,
) -> impl Iterator<Item = &'a Attribute> + 'a {
    attributes.iter().filter(move |attr| attr.name() == name)
}

#[cfg(test)]
mod tests {
    use {
        super::{lookup_attribute, Attribute, AttributeArgument},
        crate::intern::InternedString,
    };

    #[test]
    fn lookup_walks_every_match() {
        let attrs = vec![
            Attribute::new(
                "user".into(),
                vec![AttributeArgument::String("foo".into())],
            ),
            Attribute::new("noinline".into(), vec![]),
            Attribute::new(
                "user".into(),
                vec![AttributeArgument::String("alwayszero".into())],
            ),
        ];

        let found = lookup_attribute(&attrs, "user")
            .filter_map(|attr| attr.args().first()?.as_string())
            .collect::<Vec<_>>();

        assert_eq!(
            found,
            vec![InternedString::new("foo"), InternedString::new("alwayszero")]
        );
        assert_eq!(lookup_attribute(&attrs, "cold").count(), 0);
    }

    #[test]
    fn display() {
        let attr = Attribute::new(
            "user".into(),
            vec![AttributeArgument::String("alwayszero".into())],
        );
        assert_eq!(attr.to_string(), r#"#[user("alwayszero")]"#);
        assert_eq!(Attribute::new("cold".into(), vec![]).to_string(), "#[cold]");
    }
}
