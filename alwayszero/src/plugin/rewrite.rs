//! The alwayszero pass
//!
//! Every `x = call f(...)` where `f` is annotated `user("alwayszero")` becomes
//!
//! ```text
//! dummy_var.N = call f(...);
//! x = 0;
//! ```
//!
//! The annotation is trusted. The call keeps its position and every field but
//! its destination, so later constant propagation sees `x` as the constant
//! zero and dead code elimination can drop the dummy.

use {
    crate::{
        pipeline::{FunctionPass, PassContext, Properties, TodoFlags},
        plugin::predicate::is_alwayszero_call,
    },
    common::{
        arena::Ref,
        ir::{
            block::Block,
            constant_value::Constant,
            function::{Function, Symbol},
            statement::{build_at, Location, Operand, Statement, Variable},
        },
    },
    log::{debug, trace},
};

/// Prefix of the temporaries absorbing the real return values
pub const DUMMY_PREFIX: &str = "dummy_var";

pub static ALWAYSZERO_PASS: FunctionPass = FunctionPass {
    name: "alwayszero",
    properties_required: Properties::CFG_SSA,
    properties_provided: Properties::NONE,
    todo_flags_finish: TodoFlags {
        dump_function: true,
        verify_ssa: true,
        update_ssa: true,
    },
    execute: run,
};

/// Returns `true` if any call was rewritten
pub fn run(ctx: &PassContext, f: &mut Function) -> bool {
    let mut changed = false;

    trace!("alwayszero on {}", f.name());

    for block in f.blocks() {
        // statements inserted below are not part of the snapshot, so they are
        // never visited and no original statement is skipped
        let statements = block.get(f.arena()).statements().to_vec();

        for stmt in statements {
            let statement = stmt.get(block.get(f.arena()).arena());

            if !is_alwayszero_call(ctx.declarations(), statement) {
                continue;
            }

            if let Some(dummy) = split_call(f, block, stmt) {
                debug!("{}: call result moved to {}", f.name(), dummy.name());
                changed = true;
            }
        }
    }

    changed
}

/// Rewrites `lhs = call ...` at `stmt` into `dummy = call ...; lhs = 0`
///
/// Returns the dummy, or `None` with `f` untouched if `stmt` is not a call
/// with a destination in `block`.
pub fn split_call(f: &mut Function, block: Ref<Block>, stmt: Ref<Statement>) -> Option<Symbol> {
    block.get(f.arena()).index_of_statement(stmt)?;

    let Statement::Call {
        destination: Some(lhs),
        ..
    } = stmt.get(block.get(f.arena()).arena())
    else {
        return None;
    };

    let lhs = lhs.clone();
    let typ = lhs.typ();

    let assign = Statement::Assign {
        destination: lhs.clone(),
        value: Operand::Constant(Constant::zero(typ.clone())),
    };

    // the zero is in place before the call loses its destination
    build_at(block, f.arena_mut(), assign, Location::After(stmt))?;

    let dummy = f.fresh_symbol(typ, DUMMY_PREFIX);
    f.add_local_variable(dummy.clone());
    f.mark_for_renaming(&dummy);

    stmt.get_mut(block.get_mut(f.arena_mut()).arena_mut())
        .set_destination(Variable::unversioned(dummy.clone()));

    trace!("`{lhs} = call` split into `{} = call; {lhs} = 0`", dummy.name());

    Some(dummy)
}
