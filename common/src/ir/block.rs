use {
    crate::{
        arena::{Arena, Ref},
        ir::statement::Statement,
    },
    core::fmt::{self, Display, Formatter},
};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Block {
    statement_arena: Arena<Statement>,
    statements: Vec<Ref<Statement>>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Ref<Statement>] {
        self.statements.as_slice()
    }

    pub fn terminator_statement(&self) -> Option<Ref<Statement>> {
        self.statements
            .last()
            .copied()
            .filter(|s| s.get(&self.statement_arena).is_terminator())
    }

    pub fn index_of_statement(&self, reference: Ref<Statement>) -> Option<usize> {
        self.statements
            .iter()
            .position(|candidate| *candidate == reference)
    }

    pub(crate) fn insert_statement_at(&mut self, index: usize, new: Ref<Statement>) {
        self.statements.insert(index, new);
    }

    /// Returns `false` if `reference` is not in this block
    pub fn insert_statement_before(&mut self, reference: Ref<Statement>, new: Ref<Statement>) -> bool {
        let Some(index) = self.index_of_statement(reference) else {
            return false;
        };
        self.statements.insert(index, new);
        true
    }

    /// Returns `false` if `reference` is not in this block
    pub fn insert_statement_after(&mut self, reference: Ref<Statement>, new: Ref<Statement>) -> bool {
        let Some(index) = self.index_of_statement(reference) else {
            return false;
        };
        self.statements.insert(index + 1, new);
        true
    }

    pub fn append_statement(&mut self, new: Ref<Statement>) {
        self.statements.push(new);
    }

    pub fn kill_statement(&mut self, stmt: Ref<Statement>) {
        if let Some(index) = self.index_of_statement(stmt) {
            self.statements.remove(index);
        }
    }

    /// Successor blocks, taken from the terminator
    pub fn targets(&self) -> Vec<Ref<Block>> {
        self.terminator_statement()
            .map(|s| s.get(&self.statement_arena).targets())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.statements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn arena_mut(&mut self) -> &mut Arena<Statement> {
        &mut self.statement_arena
    }

    pub fn arena(&self) -> &Arena<Statement> {
        &self.statement_arena
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for stmt in self.statements() {
            writeln!(f, "    {};", stmt.get(self.arena()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::Block,
        crate::{
            arena::Arena,
            ir::{
                constant_value::Constant,
                function::Symbol,
                statement::{build, build_at, Location, Operand, Statement, Variable},
                types::Type,
            },
        },
        pretty_assertions::assert_eq,
    };

    fn assign(name: &str, version: u32) -> Statement {
        Statement::Assign {
            destination: Variable::new(Symbol::new(name.into(), Type::s32()), Some(version)),
            value: Operand::Constant(Constant::zero(Type::s32())),
        }
    }

    #[test]
    fn insert_after_keeps_order() {
        let mut arena = Arena::new();
        let block = arena.insert(Block::new());

        let a = build(block, &mut arena, assign("a", 1));
        let c = build(block, &mut arena, assign("c", 1));
        let b = build_at(block, &mut arena, assign("b", 1), Location::After(a)).unwrap();
        let d = build_at(block, &mut arena, assign("d", 1), Location::After(c)).unwrap();

        assert_eq!(block.get(&arena).statements(), &[a, b, c, d]);
        assert_eq!(
            block.get(&arena).to_string(),
            "    a_1 = 0;\n    b_1 = 0;\n    c_1 = 0;\n    d_1 = 0;\n"
        );
    }

    #[test]
    fn build_at_unknown_anchor() {
        let mut arena = Arena::new();
        let block = arena.insert(Block::new());
        let other = arena.insert(Block::new());

        build(block, &mut arena, assign("y", 1));
        build(other, &mut arena, assign("x", 1));
        let foreign = build(other, &mut arena, assign("z", 1));

        assert!(build_at(block, &mut arena, assign("w", 1), Location::Before(foreign)).is_none());
        assert_eq!(block.get(&arena).len(), 1);
    }

    #[test]
    fn insert_and_kill() {
        let mut arena = Arena::new();
        let block = arena.insert(Block::new());

        let b = build(block, &mut arena, assign("b", 1));
        let block = block.get_mut(&mut arena);

        let a = block.arena_mut().insert(assign("a", 1));
        let c = block.arena_mut().insert(assign("c", 1));
        let orphan = block.arena_mut().insert(assign("z", 1));
        assert!(block.insert_statement_before(b, a));
        assert!(block.insert_statement_after(b, c));
        assert!(!block.insert_statement_after(orphan, c));
        assert_eq!(block.statements(), &[a, b, c]);

        block.kill_statement(b);
        assert_eq!(block.statements(), &[a, c]);
        assert_eq!(block.index_of_statement(b), None);
        assert_eq!(block.index_of_statement(c), Some(1));
    }
}
