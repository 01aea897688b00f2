//! Incremental SSA update for names introduced after SSA construction

use {
    common::{intern::InternedString, ir::function::Function, HashMap, HashSet},
    log::trace,
};

/// Gives every unversioned definition of a symbol marked for renaming a fresh
/// SSA version, and rewrites the unversioned uses that follow it in the same
/// block
///
/// Returns the number of definitions renamed.
pub fn update(function: &mut Function) -> usize {
    let symbols = function
        .take_symbols_to_rename()
        .into_iter()
        .map(|symbol| symbol.name())
        .collect::<HashSet<_>>();

    if symbols.is_empty() {
        return 0;
    }

    let mut next_version = max_version(function) + 1;
    let mut renamed = 0;

    for block in function.blocks() {
        let block = block.get_mut(function.arena_mut());
        let mut current: HashMap<InternedString, u32> = HashMap::default();

        for statement in block.statements().to_vec() {
            let statement = statement.get_mut(block.arena_mut());

            for variable in statement.uses_mut() {
                if variable.version().is_none() {
                    if let Some(version) = current.get(&variable.name()) {
                        variable.set_version(*version);
                    }
                }
            }

            let Some(destination) = statement.destination_mut() else {
                continue;
            };

            if destination.version().is_none() && symbols.contains(&destination.name()) {
                destination.set_version(next_version);
                trace!("renamed definition of {}", destination);

                current.insert(destination.name(), next_version);
                next_version += 1;
                renamed += 1;
            }
        }
    }

    renamed
}

/// Largest SSA version used anywhere in the function, 0 if there is none
fn max_version(function: &Function) -> u32 {
    function
        .blocks()
        .into_iter()
        .flat_map(|block| {
            let block = block.get(function.arena());
            block
                .statements()
                .iter()
                .map(|s| s.get(block.arena()))
                .flat_map(|s| s.destination().into_iter().chain(s.uses()))
                .filter_map(|v| v.version())
                .collect::<Vec<_>>()
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use {
        super::update,
        common::ir::{
            constant_value::Constant,
            function::{Function, Symbol},
            statement::{build, BinaryOperationKind, Operand, Statement, Variable},
            types::Type,
        },
        pretty_assertions::assert_eq,
    };

    #[test]
    fn renames_marked_definitions_and_following_uses() {
        let x = Symbol::new("x".into(), Type::s32());
        let mut f = Function::new("f".into(), Some(Type::s32()), vec![]);
        f.add_local_variable(x.clone());
        let t = f.fresh_symbol(Type::s32(), "t");
        f.add_local_variable(t.clone());
        f.mark_for_renaming(&t);

        let entry = f.entry_block();
        build(
            entry,
            f.arena_mut(),
            Statement::Assign {
                destination: Variable::unversioned(t.clone()),
                value: Operand::Constant(Constant::zero(Type::s32())),
            },
        );
        build(
            entry,
            f.arena_mut(),
            Statement::BinaryOperation {
                destination: Variable::new(x.clone(), Some(4)),
                kind: BinaryOperationKind::Add,
                lhs: Operand::Variable(Variable::unversioned(t.clone())),
                rhs: Operand::Constant(Constant::zero(Type::s32())),
            },
        );
        build(
            entry,
            f.arena_mut(),
            Statement::Return {
                value: Some(Operand::Variable(Variable::new(x, Some(4)))),
            },
        );

        assert_eq!(update(&mut f), 1);
        assert_eq!(
            entry.get(f.arena()).to_string(),
            "    t.0_5 = 0;\n    x_4 = add t.0_5, 0;\n    return x_4;\n"
        );

        // marks are consumed
        assert_eq!(update(&mut f), 0);
    }

    #[test]
    fn unmarked_symbols_untouched() {
        let t = Symbol::new("t".into(), Type::u8());
        let mut f = Function::new("f".into(), None, vec![]);
        f.add_local_variable(t.clone());

        let entry = f.entry_block();
        build(
            entry,
            f.arena_mut(),
            Statement::Assign {
                destination: Variable::unversioned(t),
                value: Operand::Constant(Constant::zero(Type::u8())),
            },
        );

        assert_eq!(update(&mut f), 0);
        assert_eq!(entry.get(f.arena()).to_string(), "    t = 0;\n");
    }
}
