use {
    crate::plugin::registrar::USER_ATTRIBUTE,
    common::{
        intern::InternedString,
        ir::{
            attribute::AttributeArgument,
            statement::{CallTarget, Statement},
            Declaration,
        },
        HashMap,
    },
};

/// Annotation value marking a function that always returns zero
pub const ALWAYSZERO: &str = "alwayszero";

/// Whether `statement` is a direct call to a function annotated
/// `user("alwayszero")`
///
/// Indirect calls and calls to functions without a declaration never match.
pub fn is_alwayszero_call(
    declarations: &HashMap<InternedString, Declaration>,
    statement: &Statement,
) -> bool {
    let Statement::Call {
        target: CallTarget::Direct(callee),
        ..
    } = statement
    else {
        return false;
    };

    declarations
        .get(callee)
        .is_some_and(|declaration| returns_constant_annotation(declaration, ALWAYSZERO))
}

/// Whether any `user` attribute of `declaration` has exactly `value` as its
/// argument (case sensitive)
pub fn returns_constant_annotation(declaration: &Declaration, value: &str) -> bool {
    declaration.attributes_named(USER_ATTRIBUTE).any(|attribute| {
        attribute
            .args()
            .first()
            .and_then(AttributeArgument::as_string)
            .is_some_and(|argument| argument == value)
    })
}
