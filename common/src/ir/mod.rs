use {
    crate::{
        intern::InternedString,
        ir::{
            attribute::{lookup_attribute, Attribute},
            function::Function,
            types::Type,
        },
        HashMap,
    },
    core::fmt::{self, Display, Formatter},
    itertools::Itertools,
};

pub mod attribute;
pub mod block;
pub mod constant_value;
pub mod function;
pub mod statement;
pub mod types;

/// Declaration of a function as seen by callers, carrying its attributes
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Declaration {
    name: InternedString,
    return_type: Option<Type>,
    parameters: Vec<Type>,
    attributes: Vec<Attribute>,
}

impl Declaration {
    pub fn new(name: InternedString, return_type: Option<Type>, parameters: Vec<Type>) -> Self {
        Self {
            name,
            return_type,
            parameters,
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn return_type(&self) -> Option<Type> {
        self.return_type.clone()
    }

    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Every attribute called `name`, in the order they were attached
    pub fn attributes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attribute> {
        lookup_attribute(&self.attributes, name)
    }
}

/// A translation unit: every declared function and the bodies of those that
/// are defined
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Model {
    declarations: HashMap<InternedString, Declaration>,
    functions: HashMap<InternedString, Function>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_declaration(&mut self, declaration: Declaration) {
        self.declarations.insert(declaration.name(), declaration);
    }

    pub fn add_function(&mut self, func: Function) {
        self.functions.insert(func.name(), func);
    }

    pub fn declarations(&self) -> &HashMap<InternedString, Declaration> {
        &self.declarations
    }

    pub fn declarations_mut(&mut self) -> &mut HashMap<InternedString, Declaration> {
        &mut self.declarations
    }

    pub fn functions(&self) -> &HashMap<InternedString, Function> {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut HashMap<InternedString, Function> {
        &mut self.functions
    }

    /// Read-only declarations alongside mutable function bodies, for passes
    /// that consult callee attributes while rewriting
    pub fn split_mut(
        &mut self,
    ) -> (
        &HashMap<InternedString, Declaration>,
        &mut HashMap<InternedString, Function>,
    ) {
        (&self.declarations, &mut self.functions)
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (name, declaration) in self
            .declarations
            .iter()
            .sorted_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()))
        {
            if !first {
                writeln!(f)?;
            }
            first = false;

            for attribute in declaration.attributes() {
                writeln!(f, "{attribute}")?;
            }

            match self.functions.get(name) {
                Some(function) => write!(f, "{function}")?,
                None => {
                    write!(
                        f,
                        "fn {name}({})",
                        declaration.parameters().iter().join(", ")
                    )?;
                    if let Some(typ) = declaration.return_type() {
                        write!(f, " -> {typ}")?;
                    }
                    writeln!(f, ";")?;
                }
            }
        }

        Ok(())
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parameters = self
            .parameters()
            .into_iter()
            .map(|sym| format!("{}: {}", sym.name(), sym.typ()))
            .join(", ");

        write!(f, "fn {}({parameters})", self.name())?;
        if let Some(typ) = self.return_type() {
            write!(f, " -> {typ}")?;
        }
        writeln!(f, " {{")?;

        for local in self.local_variables() {
            writeln!(f, "    let {}: {};", local.name(), local.typ())?;
        }

        // entry block first, the front end treats the first label as the entry
        let blocks = core::iter::once(self.entry_block()).chain(
            self.blocks()
                .into_iter()
                .filter(|b| *b != self.entry_block()),
        );

        for block in blocks {
            writeln!(f, "bb{}:", block.index())?;
            write!(f, "{}", block.get(self.arena()))?;
        }

        writeln!(f, "}}")
    }
}
