use core::fmt::{self, Display, Formatter};

#[derive(Debug, Hash, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveType {
    UnsignedInteger(u16),
    SignedInteger(u16),
    FloatingPoint(u16),
}

impl PrimitiveType {
    pub fn width(&self) -> u16 {
        match self {
            Self::FloatingPoint(w) | Self::SignedInteger(w) | Self::UnsignedInteger(w) => *w,
        }
    }
}

#[derive(Debug, Hash, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Pointer(Box<Self>),
}

macro_rules! type_def_helper {
    ($name: ident, $cls: ident, $width: expr) => {
        pub fn $name() -> Self {
            Self::new_primitive(PrimitiveType::$cls($width))
        }
    };
}

impl Type {
    pub fn new_primitive(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }

    pub fn width_bits(&self) -> u16 {
        match self {
            Self::Primitive(p) => p.width(),
            Self::Pointer(_) => 64,
        }
    }

    type_def_helper!(u1, UnsignedInteger, 1);
    type_def_helper!(u8, UnsignedInteger, 8);
    type_def_helper!(u16, UnsignedInteger, 16);
    type_def_helper!(u32, UnsignedInteger, 32);
    type_def_helper!(u64, UnsignedInteger, 64);
    type_def_helper!(u128, UnsignedInteger, 128);
    type_def_helper!(s8, SignedInteger, 8);
    type_def_helper!(s16, SignedInteger, 16);
    type_def_helper!(s32, SignedInteger, 32);
    type_def_helper!(s64, SignedInteger, 64);
    type_def_helper!(s128, SignedInteger, 128);
    type_def_helper!(f32, FloatingPoint, 32);
    type_def_helper!(f64, FloatingPoint, 64);

    pub fn pointer_to(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    pub fn is_u1(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveType::UnsignedInteger(1)))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    /// Parses the textual name of a primitive type (`u32`, `i8`, `f64`, ...)
    pub fn from_primitive_name(name: &str) -> Option<Self> {
        let (class, width) = name.split_at(name.char_indices().nth(1)?.0);
        let width = width.parse::<u16>().ok()?;

        match (class, width) {
            ("u", 1 | 8 | 16 | 32 | 64 | 128) => {
                Some(Self::new_primitive(PrimitiveType::UnsignedInteger(width)))
            }
            ("i", 8 | 16 | 32 | 64 | 128) => {
                Some(Self::new_primitive(PrimitiveType::SignedInteger(width)))
            }
            ("f", 32 | 64) => Some(Self::new_primitive(PrimitiveType::FloatingPoint(width))),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self {
            Type::Primitive(p) => match &p {
                PrimitiveType::UnsignedInteger(_) => write!(f, "u{}", self.width_bits()),
                PrimitiveType::SignedInteger(_) => write!(f, "i{}", self.width_bits()),
                PrimitiveType::FloatingPoint(_) => write!(f, "f{}", self.width_bits()),
            },
            Type::Pointer(pointee) => write!(f, "*{pointee}"),
        }
    }
}

pub fn maybe_type_to_string(o: Option<&Type>) -> String {
    o.map(ToString::to_string).unwrap_or("void".to_owned())
}

#[cfg(test)]
mod tests {
    use super::Type;

    #[test]
    fn primitive_names() {
        assert_eq!(Type::from_primitive_name("i32"), Some(Type::s32()));
        assert_eq!(Type::from_primitive_name("u1"), Some(Type::u1()));
        assert_eq!(Type::from_primitive_name("f64"), Some(Type::f64()));
        assert_eq!(Type::from_primitive_name("i1"), None);
        assert_eq!(Type::from_primitive_name("x32"), None);
        assert_eq!(Type::from_primitive_name("u"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Type::s64().to_string(), "i64");
        assert_eq!(Type::u8().pointer_to().to_string(), "*u8");
    }
}
