use {
    crate::ir::types::{PrimitiveType, Type},
    core::fmt::{self, Display, Formatter},
};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ConstantValue {
    UnsignedInteger(u64),
    SignedInteger(i64),
    FloatingPoint(f64),
}

impl ConstantValue {
    pub fn zero(&self) -> bool {
        match self {
            ConstantValue::UnsignedInteger(v) => *v == 0,
            ConstantValue::SignedInteger(v) => *v == 0,
            ConstantValue::FloatingPoint(v) => *v == 0.,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, ConstantValue::UnsignedInteger(_))
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, ConstantValue::SignedInteger(_))
    }

    /// Whether this value can be held by a variable of type `typ`
    pub fn fits(&self, typ: &Type) -> bool {
        match (self, typ) {
            (ConstantValue::UnsignedInteger(v), Type::Primitive(PrimitiveType::UnsignedInteger(w))) => {
                *w >= 64 || *v < (1u64 << *w)
            }
            (ConstantValue::SignedInteger(v), Type::Primitive(PrimitiveType::SignedInteger(w))) => {
                *w >= 64 || {
                    let bound = 1i64 << (*w - 1);
                    (-bound..bound).contains(v)
                }
            }
            (ConstantValue::FloatingPoint(_), Type::Primitive(PrimitiveType::FloatingPoint(_))) => {
                true
            }
            (ConstantValue::UnsignedInteger(0), Type::Pointer(_)) => true,
            _ => false,
        }
    }
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::UnsignedInteger(v) => write!(f, "{v}"),
            ConstantValue::SignedInteger(v) => write!(f, "{v}"),
            ConstantValue::FloatingPoint(v) => write!(f, "{v:?}"),
        }
    }
}

/// A value together with the type it was built for
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Constant {
    typ: Type,
    value: ConstantValue,
}

impl Constant {
    pub fn new(typ: Type, value: ConstantValue) -> Self {
        Self { typ, value }
    }

    /// The zero value of `typ`: integer zero, `0.0`, or the null pointer
    pub fn zero(typ: Type) -> Self {
        let value = match &typ {
            Type::Primitive(PrimitiveType::UnsignedInteger(_)) | Type::Pointer(_) => {
                ConstantValue::UnsignedInteger(0)
            }
            Type::Primitive(PrimitiveType::SignedInteger(_)) => ConstantValue::SignedInteger(0),
            Type::Primitive(PrimitiveType::FloatingPoint(_)) => ConstantValue::FloatingPoint(0.),
        };

        Self { typ, value }
    }

    pub fn typ(&self) -> Type {
        self.typ.clone()
    }

    pub fn value(&self) -> ConstantValue {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.zero()
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
