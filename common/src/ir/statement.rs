use {
    crate::{
        arena::{Arena, Ref},
        intern::InternedString,
        ir::{block::Block, constant_value::Constant, function::Symbol, types::Type},
    },
    core::fmt::{self, Display, Formatter},
    itertools::Itertools,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperationKind {
    Not,
    Negate,
    Complement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperationKind {
    Add,
    Sub,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    Xor,
    CompareEqual,
    CompareNotEqual,
    CompareLessThan,
    CompareLessThanOrEqual,
    CompareGreaterThan,
    CompareGreaterThanOrEqual,
}

impl UnaryOperationKind {
    pub const ALL: [Self; 3] = [Self::Not, Self::Negate, Self::Complement];

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Complement => "cmpl",
            Self::Not => "not",
            Self::Negate => "neg",
        }
    }
}

impl BinaryOperationKind {
    pub const ALL: [Self; 14] = [
        Self::Add,
        Self::Sub,
        Self::Multiply,
        Self::Divide,
        Self::Modulo,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::CompareEqual,
        Self::CompareNotEqual,
        Self::CompareLessThan,
        Self::CompareLessThanOrEqual,
        Self::CompareGreaterThan,
        Self::CompareGreaterThanOrEqual,
    ];

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Multiply => "mul",
            Self::Divide => "div",
            Self::Modulo => "mod",
            Self::CompareEqual => "cmp-eq",
            Self::CompareNotEqual => "cmp-ne",
            Self::CompareLessThan => "cmp-lt",
            Self::CompareLessThanOrEqual => "cmp-le",
            Self::CompareGreaterThan => "cmp-gt",
            Self::CompareGreaterThanOrEqual => "cmp-ge",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::CompareEqual
                | Self::CompareNotEqual
                | Self::CompareLessThan
                | Self::CompareLessThanOrEqual
                | Self::CompareGreaterThan
                | Self::CompareGreaterThanOrEqual
        )
    }
}

/// A name in SSA form
///
/// `version` is `None` for parameters and for names that have been introduced
/// after SSA construction and not yet renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Variable {
    symbol: Symbol,
    version: Option<u32>,
}

impl Variable {
    pub fn new(symbol: Symbol, version: Option<u32>) -> Self {
        Self { symbol, version }
    }

    /// Unversioned reference to `symbol`
    pub fn unversioned(symbol: Symbol) -> Self {
        Self::new(symbol, None)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn name(&self) -> InternedString {
        self.symbol.name()
    }

    pub fn typ(&self) -> Type {
        self.symbol.typ()
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = Some(version);
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}_{version}", self.symbol.name()),
            None => write!(f, "{}", self.symbol.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Operand {
    Variable(Variable),
    Constant(Constant),
}

impl Operand {
    pub fn typ(&self) -> Type {
        match self {
            Self::Variable(v) => v.typ(),
            Self::Constant(c) => c.typ(),
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(v) => Some(v),
            Self::Constant(_) => None,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => write!(f, "{v}"),
            Self::Constant(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CallTarget {
    /// Call to a named function
    Direct(InternedString),
    /// Call through a computed function pointer
    Indirect(Operand),
}

impl Display for CallTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(name) => write!(f, "{name}"),
            Self::Indirect(pointer) => write!(f, "*{pointer}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Statement {
    Assign {
        destination: Variable,
        value: Operand,
    },
    UnaryOperation {
        destination: Variable,
        kind: UnaryOperationKind,
        value: Operand,
    },
    BinaryOperation {
        destination: Variable,
        kind: BinaryOperationKind,
        lhs: Operand,
        rhs: Operand,
    },
    Call {
        /// `None` when the result is discarded
        destination: Option<Variable>,
        target: CallTarget,
        args: Vec<Operand>,
        return_type: Option<Type>,
    },
    Phi {
        destination: Variable,
        members: Vec<(Ref<Block>, Operand)>,
    },
    Jump {
        target: Ref<Block>,
    },
    Branch {
        condition: Operand,
        true_target: Ref<Block>,
        false_target: Ref<Block>,
    },
    Return {
        value: Option<Operand>,
    },
}

impl Statement {
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call { .. })
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. } | Self::Branch { .. } | Self::Return { .. }
        )
    }

    /// Variable written by this statement, if any
    pub fn destination(&self) -> Option<&Variable> {
        match self {
            Self::Assign { destination, .. }
            | Self::UnaryOperation { destination, .. }
            | Self::BinaryOperation { destination, .. }
            | Self::Phi { destination, .. } => Some(destination),
            Self::Call { destination, .. } => destination.as_ref(),
            Self::Jump { .. } | Self::Branch { .. } | Self::Return { .. } => None,
        }
    }

    pub fn destination_mut(&mut self) -> Option<&mut Variable> {
        match self {
            Self::Assign { destination, .. }
            | Self::UnaryOperation { destination, .. }
            | Self::BinaryOperation { destination, .. }
            | Self::Phi { destination, .. } => Some(destination),
            Self::Call { destination, .. } => destination.as_mut(),
            Self::Jump { .. } | Self::Branch { .. } | Self::Return { .. } => None,
        }
    }

    /// Replaces the destination in place, leaving every other field untouched
    ///
    /// Returns the previous destination. Terminators have no destination and
    /// are left unchanged.
    pub fn set_destination(&mut self, variable: Variable) -> Option<Variable> {
        if let Self::Call { destination, .. } = self {
            return destination.replace(variable);
        }

        self.destination_mut()
            .map(|destination| core::mem::replace(destination, variable))
    }

    /// Every operand read by this statement
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Self::Assign { value, .. } | Self::UnaryOperation { value, .. } => vec![value],
            Self::BinaryOperation { lhs, rhs, .. } => vec![lhs, rhs],
            Self::Call { target, args, .. } => {
                let mut operands = match target {
                    CallTarget::Indirect(pointer) => vec![pointer],
                    CallTarget::Direct(_) => vec![],
                };
                operands.extend(args.iter());
                operands
            }
            Self::Phi { members, .. } => members.iter().map(|(_, value)| value).collect(),
            Self::Jump { .. } => vec![],
            Self::Branch { condition, .. } => vec![condition],
            Self::Return { value } => value.iter().collect(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Operand> {
        match self {
            Self::Assign { value, .. } | Self::UnaryOperation { value, .. } => vec![value],
            Self::BinaryOperation { lhs, rhs, .. } => vec![lhs, rhs],
            Self::Call { target, args, .. } => {
                let mut operands = match target {
                    CallTarget::Indirect(pointer) => vec![pointer],
                    CallTarget::Direct(_) => vec![],
                };
                operands.extend(args.iter_mut());
                operands
            }
            Self::Phi { members, .. } => members.iter_mut().map(|(_, value)| value).collect(),
            Self::Jump { .. } => vec![],
            Self::Branch { condition, .. } => vec![condition],
            Self::Return { value } => value.iter_mut().collect(),
        }
    }

    /// Every variable read by this statement
    pub fn uses(&self) -> Vec<&Variable> {
        self.operands()
            .into_iter()
            .filter_map(Operand::as_variable)
            .collect()
    }

    pub fn uses_mut(&mut self) -> Vec<&mut Variable> {
        self.operands_mut()
            .into_iter()
            .filter_map(|operand| match operand {
                Operand::Variable(v) => Some(v),
                Operand::Constant(_) => None,
            })
            .collect()
    }

    /// Successor blocks of a terminator
    pub fn targets(&self) -> Vec<Ref<Block>> {
        match self {
            Self::Jump { target } => vec![*target],
            Self::Branch {
                true_target,
                false_target,
                ..
            } => vec![*true_target, *false_target],
            _ => vec![],
        }
    }

    /// Type of the value produced by this statement
    pub fn typ(&self) -> Option<Type> {
        match self {
            Self::Assign { value, .. } | Self::UnaryOperation { value, .. } => Some(value.typ()),
            Self::BinaryOperation { kind, .. } if kind.is_comparison() => Some(Type::u1()),
            Self::BinaryOperation { lhs, .. } => Some(lhs.typ()),
            Self::Call { return_type, .. } => return_type.clone(),
            Self::Phi { members, .. } => members.first().map(|(_, value)| value.typ()),
            Self::Jump { .. } | Self::Branch { .. } | Self::Return { .. } => None,
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign { destination, value } => write!(f, "{destination} = {value}"),
            Self::UnaryOperation {
                destination,
                kind,
                value,
            } => write!(f, "{destination} = {} {value}", kind.mnemonic()),
            Self::BinaryOperation {
                destination,
                kind,
                lhs,
                rhs,
            } => write!(f, "{destination} = {} {lhs}, {rhs}", kind.mnemonic()),
            Self::Call {
                destination,
                target,
                args,
                ..
            } => {
                if let Some(destination) = destination {
                    write!(f, "{destination} = ")?;
                }
                write!(f, "call {target}({})", args.iter().join(", "))
            }
            Self::Phi {
                destination,
                members,
            } => write!(
                f,
                "{destination} = phi {}",
                members
                    .iter()
                    .map(|(block, value)| format!("[bb{}: {value}]", block.index()))
                    .join(", ")
            ),
            Self::Jump { target } => write!(f, "jump bb{}", target.index()),
            Self::Branch {
                condition,
                true_target,
                false_target,
            } => write!(
                f,
                "branch {condition}, bb{}, bb{}",
                true_target.index(),
                false_target.index()
            ),
            Self::Return { value: Some(value) } => write!(f, "return {value}"),
            Self::Return { value: None } => write!(f, "return"),
        }
    }
}

pub enum Location {
    End,
    Before(Ref<Statement>),
    After(Ref<Statement>),
}

/// Creates a new statement in the block's arena, and inserts it at the supplied
/// location
///
/// Returns `None` if the `Before`/`After` reference is not part of the block.
pub fn build_at(
    block: Ref<Block>,
    arena: &mut Arena<Block>,
    statement: Statement,
    location: Location,
) -> Option<Ref<Statement>> {
    let block = block.get_mut(arena);

    // check the anchor before allocating so a bad location leaves the block untouched
    let index = match location {
        Location::End => block.len(),
        Location::Before(before) => block.index_of_statement(before)?,
        Location::After(after) => block.index_of_statement(after)? + 1,
    };

    let r = block.arena_mut().insert(statement);
    block.insert_statement_at(index, r);
    Some(r)
}

/// Creates a new statement in the block's arena, and pushes it to the end of
/// the block's statements
pub fn build(block: Ref<Block>, arena: &mut Arena<Block>, statement: Statement) -> Ref<Statement> {
    let block = block.get_mut(arena);
    let r = block.arena_mut().insert(statement);
    block.append_statement(r);
    r
}
