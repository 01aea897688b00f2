use {
    crate::{
        arena::{Arena, Ref},
        intern::InternedString,
        ir::{block::Block, types::Type},
        HashMap, HashSet,
    },
    core::fmt::{self, Debug, Display, Formatter},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Symbol {
    name: InternedString,
    typ: Type,
}

impl Symbol {
    pub fn new(name: InternedString, typ: Type) -> Self {
        Self { name, typ }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn typ(&self) -> Type {
        self.typ.clone()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Function {
    // return type and parameters are read only
    return_type: Option<Type>,
    parameters: Vec<Symbol>,
    name: InternedString,
    local_variables: HashMap<InternedString, Symbol>,
    /// Symbols introduced after SSA construction that still need SSA names
    symbols_to_rename: HashSet<InternedString>,
    temporary_count: u32,
    block_arena: Arena<Block>,
    entry_block: Ref<Block>,
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Function {
    pub fn new(name: InternedString, return_type: Option<Type>, parameters: Vec<Symbol>) -> Self {
        let mut block_arena = Arena::new();
        let entry_block = block_arena.insert(Block::new());
        Self {
            name,
            local_variables: HashMap::default(),
            symbols_to_rename: HashSet::default(),
            temporary_count: 0,
            entry_block,
            block_arena,
            return_type,
            parameters,
        }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn add_local_variable(&mut self, symbol: Symbol) {
        self.local_variables.insert(symbol.name(), symbol);
    }

    pub fn get_local_variable(&self, name: InternedString) -> Option<Symbol> {
        self.local_variables.get(&name).cloned()
    }

    /// Local variables sorted by name
    pub fn local_variables(&self) -> Vec<Symbol> {
        let mut locals = self.local_variables.values().cloned().collect::<Vec<_>>();
        locals.sort_by(|a, b| a.name().as_ref().cmp(b.name().as_ref()));
        locals
    }

    pub fn get_parameter(&self, name: InternedString) -> Option<Symbol> {
        self.parameters
            .iter()
            .find(|sym| sym.name() == name)
            .cloned()
    }

    pub fn is_parameter(&self, symbol: &Symbol) -> bool {
        self.parameters.contains(symbol)
    }

    pub fn return_type(&self) -> Option<Type> {
        self.return_type.clone()
    }

    pub fn parameters(&self) -> Vec<Symbol> {
        self.parameters.clone()
    }

    /// Creates a symbol of type `typ` whose name (`prefix.N`) is not used by any
    /// parameter or local variable of this function
    ///
    /// The symbol is not registered; see [`Function::add_local_variable`].
    pub fn fresh_symbol(&mut self, typ: Type, prefix: &str) -> Symbol {
        loop {
            let name = InternedString::new(format!("{prefix}.{}", self.temporary_count));
            self.temporary_count += 1;

            if !self.local_variables.contains_key(&name) && self.get_parameter(name).is_none() {
                return Symbol::new(name, typ);
            }
        }
    }

    /// Marks `symbol` as needing SSA names on the next SSA update
    pub fn mark_for_renaming(&mut self, symbol: &Symbol) {
        self.symbols_to_rename.insert(symbol.name());
    }

    pub fn is_marked_for_renaming(&self, symbol: &Symbol) -> bool {
        self.symbols_to_rename.contains(&symbol.name())
    }

    pub fn symbols_to_rename(&self) -> Vec<InternedString> {
        self.symbols_to_rename.iter().copied().collect()
    }

    pub fn take_symbols_to_rename(&mut self) -> Vec<Symbol> {
        let names = core::mem::take(&mut self.symbols_to_rename);
        let mut symbols = names
            .into_iter()
            .filter_map(|name| self.get_local_variable(name))
            .collect::<Vec<_>>();
        symbols.sort_by(|a, b| a.name().as_ref().cmp(b.name().as_ref()));
        symbols
    }

    pub fn new_block(&mut self) -> Ref<Block> {
        self.block_arena.insert(Block::new())
    }

    pub fn arena(&self) -> &Arena<Block> {
        &self.block_arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena<Block> {
        &mut self.block_arena
    }

    pub fn entry_block(&self) -> Ref<Block> {
        self.entry_block
    }

    /// Every block of the function exactly once, in creation order
    pub fn blocks(&self) -> Vec<Ref<Block>> {
        self.block_arena.refs().collect()
    }

    /// Predecessors of every block, derived from the terminators
    pub fn predecessors(&self) -> HashMap<Ref<Block>, Vec<Ref<Block>>> {
        let mut predecessors: HashMap<Ref<Block>, Vec<Ref<Block>>> = HashMap::default();

        for block in self.blocks() {
            for target in block.get(self.arena()).targets() {
                predecessors.entry(target).or_default().push(block);
            }
        }

        predecessors
    }

    /// Total number of statements across all blocks
    pub fn statement_count(&self) -> usize {
        self.blocks()
            .into_iter()
            .map(|b| b.get(self.arena()).len())
            .sum()
    }
}
