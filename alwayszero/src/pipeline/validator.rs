use {
    common::{
        arena::Ref,
        intern::InternedString,
        ir::{
            block::Block,
            function::Function,
            statement::{CallTarget, Operand, Statement},
            types::maybe_type_to_string,
            Declaration,
        },
        HashMap,
    },
    std::fmt::Display,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

pub enum Scope<'f> {
    FunctionLevel(&'f Function),
    BlockLevel(&'f Function, Ref<Block>),
    StatementLevel(&'f Function, Ref<Block>, Statement),
}

pub struct ValidationMessage<'f>(Severity, Scope<'f>, String);

impl<'f> Display for ValidationMessage<'f> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.0 {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        };

        let scope = match &self.1 {
            Scope::FunctionLevel(f) => format!("{}", f.name()),
            Scope::BlockLevel(f, b) => format!("{} bb{}", f.name(), b.index()),
            Scope::StatementLevel(f, b, s) => format!("{} bb{} `{s}`", f.name(), b.index()),
        };

        write!(f, "{severity}: {scope}: {}", self.2)
    }
}

impl<'f> ValidationMessage<'f> {
    pub fn severity(&self) -> Severity {
        self.0
    }

    pub fn message(&self) -> &str {
        &self.2
    }

    pub fn stmt_msg<T: ToString>(
        f: &'f Function,
        b: Ref<Block>,
        s: &Statement,
        v: Severity,
        m: T,
    ) -> Self {
        Self(v, Scope::StatementLevel(f, b, s.clone()), m.to_string())
    }

    pub fn stmt_warn<T: ToString>(f: &'f Function, b: Ref<Block>, s: &Statement, m: T) -> Self {
        Self::stmt_msg(f, b, s, Severity::Warning, m)
    }

    pub fn stmt_err<T: ToString>(f: &'f Function, b: Ref<Block>, s: &Statement, m: T) -> Self {
        Self::stmt_msg(f, b, s, Severity::Error, m)
    }

    pub fn block_err<T: ToString>(f: &'f Function, b: Ref<Block>, m: T) -> Self {
        Self(Severity::Error, Scope::BlockLevel(f, b), m.to_string())
    }

    pub fn fn_note<T: ToString>(f: &'f Function, m: T) -> Self {
        Self(Severity::Note, Scope::FunctionLevel(f), m.to_string())
    }
}

/// Checks that `function` is in well-formed SSA form
pub fn verify<'f>(
    declarations: &HashMap<InternedString, Declaration>,
    function: &'f Function,
) -> Vec<ValidationMessage<'f>> {
    let messages = [
        check_terminators(function),
        check_definitions(function),
        check_types(declarations, function),
        check_constant_value_types(function),
        check_phi_predecessors(function),
    ];

    messages.into_iter().flatten().collect()
}

/// Every statement of the function with the block it lives in
fn statements(function: &Function) -> impl Iterator<Item = (Ref<Block>, &Statement)> {
    function.blocks().into_iter().flat_map(move |b| {
        let block = b.get(function.arena());
        block
            .statements()
            .iter()
            .map(move |s| (b, s.get(block.arena())))
    })
}

fn check_terminators(f: &Function) -> Vec<ValidationMessage> {
    let mut messages = Vec::new();
    let block_count = f.arena().len();

    for b in f.blocks() {
        let block = b.get(f.arena());

        if block.terminator_statement().is_none() {
            messages.push(ValidationMessage::block_err(
                f,
                b,
                "block does not end with a terminator",
            ));
        }

        let last = block.len().saturating_sub(1);
        for (index, s) in block.statements().iter().enumerate() {
            let s = s.get(block.arena());

            if s.is_terminator() && index != last {
                messages.push(ValidationMessage::stmt_err(
                    f,
                    b,
                    s,
                    "terminator in the middle of a block",
                ));
            }

            if s.targets().iter().any(|t| t.index() >= block_count) {
                messages.push(ValidationMessage::stmt_err(
                    f,
                    b,
                    s,
                    "branch to a block that does not exist",
                ));
            }
        }
    }

    messages
}

fn check_definitions(f: &Function) -> Vec<ValidationMessage> {
    let mut messages = Vec::new();
    let mut definitions: HashMap<(InternedString, u32), usize> = HashMap::default();

    for (b, s) in statements(f) {
        let Some(destination) = s.destination() else {
            continue;
        };

        match destination.version() {
            None => messages.push(ValidationMessage::stmt_err(
                f,
                b,
                s,
                format!("destination `{destination}` has no SSA version"),
            )),
            Some(version) => {
                let count = definitions
                    .entry((destination.name(), version))
                    .or_default();
                *count += 1;

                if *count == 2 {
                    messages.push(ValidationMessage::stmt_err(
                        f,
                        b,
                        s,
                        format!("`{destination}` defined more than once"),
                    ));
                }
            }
        }
    }

    for (b, s) in statements(f) {
        for variable in s.uses() {
            match variable.version() {
                Some(version) => {
                    if !definitions.contains_key(&(variable.name(), version)) {
                        messages.push(ValidationMessage::stmt_err(
                            f,
                            b,
                            s,
                            format!("`{variable}` used but never defined"),
                        ));
                    }
                }
                None => {
                    if !f.is_parameter(variable.symbol()) {
                        messages.push(ValidationMessage::stmt_err(
                            f,
                            b,
                            s,
                            format!("`{variable}` used without an SSA version"),
                        ));
                    }
                }
            }
        }
    }

    messages
}

fn check_types<'f>(
    declarations: &HashMap<InternedString, Declaration>,
    f: &'f Function,
) -> Vec<ValidationMessage<'f>> {
    let mut messages = Vec::new();

    for (b, s) in statements(f) {
        match s {
            Statement::BinaryOperation { lhs, rhs, .. } if lhs.typ() != rhs.typ() => {
                messages.push(ValidationMessage::stmt_err(
                    f,
                    b,
                    s,
                    "incompatible operand types in binary operation",
                ));
            }
            Statement::Call {
                destination,
                target,
                args,
                return_type,
            } => {
                if destination.is_some() && return_type.is_none() {
                    messages.push(ValidationMessage::stmt_err(
                        f,
                        b,
                        s,
                        "result of a call returning nothing is assigned",
                    ));
                }

                if let CallTarget::Direct(name) = target {
                    match declarations.get(name) {
                        None => messages.push(ValidationMessage::stmt_err(
                            f,
                            b,
                            s,
                            format!("call to undeclared function `{name}`"),
                        )),
                        Some(declaration) => {
                            let types_match = declaration.parameters().len() == args.len()
                                && declaration
                                    .parameters()
                                    .iter()
                                    .zip(args)
                                    .all(|(typ, arg)| *typ == arg.typ());

                            if !types_match {
                                messages.push(ValidationMessage::stmt_err(
                                    f,
                                    b,
                                    s,
                                    format!("arguments do not match the signature of `{name}`"),
                                ));
                            }

                            if declaration.return_type() != *return_type {
                                messages.push(ValidationMessage::stmt_err(
                                    f,
                                    b,
                                    s,
                                    format!(
                                        "return type {} does not match the signature of `{name}` ({})",
                                        maybe_type_to_string(return_type.as_ref()),
                                        maybe_type_to_string(declaration.return_type().as_ref())
                                    ),
                                ));
                            }
                        }
                    }
                }
            }
            Statement::Branch { condition, .. } if !condition.typ().is_u1() => {
                messages.push(ValidationMessage::stmt_err(
                    f,
                    b,
                    s,
                    "branch condition is not a u1",
                ));
            }
            Statement::Return { value } => {
                let returned = value.as_ref().map(Operand::typ);
                if returned != f.return_type() {
                    messages.push(ValidationMessage::stmt_err(
                        f,
                        b,
                        s,
                        format!(
                            "returns {} from a function returning {}",
                            maybe_type_to_string(returned.as_ref()),
                            maybe_type_to_string(f.return_type().as_ref())
                        ),
                    ));
                }
            }
            Statement::Phi {
                destination,
                members,
            } if members.iter().any(|(_, value)| value.typ() != destination.typ()) => {
                messages.push(ValidationMessage::stmt_err(
                    f,
                    b,
                    s,
                    "phi member type differs from the destination",
                ));
            }
            _ => (),
        }

        if let (Some(destination), Some(typ)) = (s.destination(), s.typ()) {
            if destination.typ() != typ {
                messages.push(ValidationMessage::stmt_err(
                    f,
                    b,
                    s,
                    format!(
                        "destination `{destination}` of type {} assigned a value of type {typ}",
                        destination.typ()
                    ),
                ));
            }
        }
    }

    messages
}

fn check_constant_value_types(f: &Function) -> Vec<ValidationMessage> {
    statements(f)
        .flat_map(|(b, s)| {
            s.operands()
                .into_iter()
                .filter_map(move |operand| match operand {
                    Operand::Constant(c) if !c.value().fits(&c.typ()) => Some(
                        ValidationMessage::stmt_warn(
                            f,
                            b,
                            s,
                            format!("constant {c} does not fit type {}", c.typ()),
                        ),
                    ),
                    _ => None,
                })
        })
        .collect()
}

fn check_phi_predecessors(f: &Function) -> Vec<ValidationMessage> {
    let predecessors = f.predecessors();
    let mut messages = Vec::new();

    for (b, s) in statements(f) {
        let Statement::Phi { members, .. } = s else {
            continue;
        };

        for (member, _) in members {
            let is_predecessor = predecessors
                .get(&b)
                .is_some_and(|preds| preds.contains(member));

            if !is_predecessor {
                messages.push(ValidationMessage::stmt_warn(
                    f,
                    b,
                    s,
                    format!("phi member bb{} is not a predecessor", member.index()),
                ));
            }
        }
    }

    if f.statement_count() == 0 {
        messages.push(ValidationMessage::fn_note(f, "function has no statements"));
    }

    messages
}

#[cfg(test)]
mod tests {
    use {
        super::{verify, Severity},
        crate::frontend::{parse, AttributeRegistry},
        common::intern::InternedString,
    };

    fn messages(source: &str) -> Vec<(Severity, String)> {
        let model = parse(source, &AttributeRegistry::new()).unwrap();
        let f = &model.functions()[&InternedString::from_static("f")];

        verify(model.declarations(), f)
            .into_iter()
            .map(|m| (m.severity(), m.message().to_owned()))
            .collect()
    }

    fn errors(source: &str) -> Vec<String> {
        messages(source)
            .into_iter()
            .filter(|(s, _)| *s == Severity::Error)
            .map(|(_, m)| m)
            .collect()
    }

    #[test]
    fn well_formed() {
        let source = r#"
fn g(i32) -> i32;

fn f(a: i32) -> i32 {
    let x: i32;
    let c: u1;
bb0:
    x_1 = call g(a);
    c_1 = cmp-eq x_1, 0;
    branch c_1, bb1, bb2;
bb1:
    x_2 = add x_1, 1;
    jump bb2;
bb2:
    x_3 = phi [bb0: x_1], [bb1: x_2];
    return x_3;
}
"#;
        let messages = messages(source);
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn unversioned_destination() {
        let found = errors("fn f() { let t: i32; bb0: t = 1; return; }");
        assert_eq!(found, vec!["destination `t` has no SSA version".to_owned()]);
    }

    #[test]
    fn double_definition_and_undefined_use() {
        let found = errors("fn f() -> i32 { let t: i32; bb0: t_1 = 1; t_1 = 2; return t_2; }");
        assert_eq!(
            found,
            vec![
                "`t_1` defined more than once".to_owned(),
                "`t_2` used but never defined".to_owned()
            ]
        );
    }

    #[test]
    fn terminators() {
        assert_eq!(
            errors("fn f() { let t: i32; bb0: t_1 = 1; }"),
            vec!["block does not end with a terminator".to_owned()]
        );
        assert_eq!(
            errors("fn f() { bb0: return; return; }"),
            vec!["terminator in the middle of a block".to_owned()]
        );
    }

    #[test]
    fn type_mismatch() {
        let found = errors("fn f(a: i64) -> i32 { let t: i32; bb0: t_1 = a; return t_1; }");
        assert_eq!(
            found,
            vec!["destination `t_1` of type i32 assigned a value of type i64".to_owned()]
        );

        assert_eq!(
            errors("fn f() -> i32 { bb0: return; }"),
            vec!["returns void from a function returning i32".to_owned()]
        );
    }

    #[test]
    fn phi_from_non_predecessor() {
        let warnings = messages(
            "fn f() -> i32 { let t: i32; bb0: jump bb1; bb1: t_1 = phi [bb2: 1]; return t_1; bb2: return 0; }",
        );
        assert_eq!(
            warnings,
            vec![(
                Severity::Warning,
                "phi member bb2 is not a predecessor".to_owned()
            )]
        );
    }
}
