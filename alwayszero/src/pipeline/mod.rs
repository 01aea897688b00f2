//! Pass manager
//!
//! A pipeline is an ordered list of [`FunctionPass`]es. Every function of a
//! model runs through the whole pipeline independently of the others, so
//! functions are processed in parallel. Each pass declares the properties it
//! needs and provides, and the follow-up work ([`TodoFlags`]) the manager must
//! perform once it has finished.

use {
    common::{
        intern::InternedString,
        ir::{function::Function, Declaration, Model},
        HashMap,
    },
    core::fmt::{self, Display, Formatter},
    itertools::Itertools,
    log::{debug, trace},
    rayon::iter::{IntoParallelRefMutIterator, ParallelIterator},
    std::path::{Path, PathBuf},
};

pub mod dot;
pub mod dump;
pub mod ssa;
pub mod validator;

/// Properties of a function's representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Properties {
    pub cfg: bool,
    pub ssa: bool,
}

impl Properties {
    pub const NONE: Self = Self {
        cfg: false,
        ssa: false,
    };
    pub const CFG: Self = Self {
        cfg: true,
        ssa: false,
    };
    pub const CFG_SSA: Self = Self {
        cfg: true,
        ssa: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            cfg: self.cfg || other.cfg,
            ssa: self.ssa || other.ssa,
        }
    }

    /// Properties in `required` that `self` lacks
    pub fn missing(self, required: Self) -> Self {
        Self {
            cfg: required.cfg && !self.cfg,
            ssa: required.ssa && !self.ssa,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

impl Display for Properties {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let names = [(self.cfg, "cfg"), (self.ssa, "ssa")]
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .join(", ");

        if names.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{names}")
        }
    }
}

/// Work requested by a pass, performed by the manager after the pass finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoFlags {
    pub dump_function: bool,
    pub verify_ssa: bool,
    pub update_ssa: bool,
}

impl TodoFlags {
    pub const NONE: Self = Self {
        dump_function: false,
        verify_ssa: false,
        update_ssa: false,
    };
}

/// Read-only view of the model handed to every pass
#[derive(Clone, Copy)]
pub struct PassContext<'m> {
    declarations: &'m HashMap<InternedString, Declaration>,
}

impl<'m> PassContext<'m> {
    pub fn new(declarations: &'m HashMap<InternedString, Declaration>) -> Self {
        Self { declarations }
    }

    pub fn declarations(&self) -> &'m HashMap<InternedString, Declaration> {
        self.declarations
    }

    pub fn declaration(&self, name: InternedString) -> Option<&'m Declaration> {
        self.declarations.get(&name)
    }
}

/// Returns `true` if the function was changed
pub type FunctionPassFn = fn(&PassContext, &mut Function) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct FunctionPass {
    pub name: &'static str,
    pub properties_required: Properties,
    pub properties_provided: Properties,
    pub todo_flags_finish: TodoFlags,
    pub execute: FunctionPassFn,
}

/// Input is delivered in SSA form by the front end, this pass only records
/// the fact and checks it
static SSA: FunctionPass = FunctionPass {
    name: "ssa",
    properties_required: Properties::CFG,
    properties_provided: Properties::CFG_SSA,
    todo_flags_finish: TodoFlags {
        verify_ssa: true,
        ..TodoFlags::NONE
    },
    execute: provide_ssa,
};

fn provide_ssa(_: &PassContext, _: &mut Function) -> bool {
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPosition {
    InsertAfter,
    InsertBefore,
    Replace,
}

/// Request to place `pass` relative to an existing pass of the pipeline
#[derive(Debug, Clone)]
pub struct PassRegistration {
    pub pass: FunctionPass,
    pub reference_pass_name: String,
    /// 1-based, `0` selects every instance of the reference pass
    pub ref_pass_instance_number: u32,
    pub position: PassPosition,
}

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum PassError {
    /// pass {pass:?} cannot be placed: reference pass {reference:?} instance {instance} not found
    ReferencePassNotFound {
        pass: &'static str,
        reference: String,
        instance: u32,
    },
    /// pass {pass:?} requires properties missing from {function}: {missing}
    MissingProperties {
        pass: &'static str,
        function: InternedString,
        missing: Properties,
    },
    /// SSA verification of {function} failed after pass {pass:?}: {report}
    Verification {
        pass: &'static str,
        function: InternedString,
        report: String,
    },
    /// failed to write dump of {function} to {path:?}: {report}
    Dump {
        function: InternedString,
        path: PathBuf,
        report: String,
    },
}

#[derive(Debug, Default)]
pub struct PassManager {
    passes: Vec<FunctionPass>,
    dump_dir: Option<PathBuf>,
}

impl PassManager {
    /// Empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The pipeline provided by the host: SSA form only
    pub fn host_default() -> Self {
        Self {
            passes: vec![SSA],
            dump_dir: None,
        }
    }

    pub fn push(&mut self, pass: FunctionPass) {
        self.passes.push(pass);
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name).collect()
    }

    pub fn set_dump_dir<P: AsRef<Path>>(&mut self, dir: Option<P>) {
        self.dump_dir = dir.map(|d| d.as_ref().to_owned());
    }

    /// Places `registration.pass` relative to the selected instances of the
    /// reference pass
    ///
    /// The pipeline is left untouched if no instance matches.
    pub fn register_pass(&mut self, registration: PassRegistration) -> Result<(), PassError> {
        let PassRegistration {
            pass,
            reference_pass_name,
            ref_pass_instance_number,
            position,
        } = registration;

        let mut passes = Vec::with_capacity(self.passes.len() + 1);
        let mut instance = 0;
        let mut matched = false;

        for existing in &self.passes {
            if existing.name != reference_pass_name {
                passes.push(*existing);
                continue;
            }

            instance += 1;
            if ref_pass_instance_number != 0 && instance != ref_pass_instance_number {
                passes.push(*existing);
                continue;
            }

            matched = true;
            match position {
                PassPosition::InsertAfter => passes.extend([*existing, pass]),
                PassPosition::InsertBefore => passes.extend([pass, *existing]),
                PassPosition::Replace => passes.push(pass),
            }
        }

        if !matched {
            return Err(PassError::ReferencePassNotFound {
                pass: pass.name,
                reference: reference_pass_name,
                instance: ref_pass_instance_number,
            });
        }

        debug!(
            "registered pass {:?} {position:?} {reference_pass_name:?} (instance {ref_pass_instance_number}), pipeline: {}",
            pass.name,
            passes.iter().map(|p| p.name).join(", ")
        );

        self.passes = passes;

        Ok(())
    }

    /// Runs every function of `model` through the pipeline
    pub fn run(&self, model: &mut Model) -> Result<(), PassError> {
        let (declarations, functions) = model.split_mut();
        let ctx = PassContext::new(declarations);

        functions
            .par_iter_mut()
            .try_for_each(|(_, function)| self.run_function(&ctx, function))
    }

    fn run_function(&self, ctx: &PassContext, function: &mut Function) -> Result<(), PassError> {
        trace!("running pipeline on {}", function.name());

        // the front end hands over a control flow graph
        let mut properties = Properties::CFG;

        for (index, pass) in self.passes.iter().enumerate() {
            let missing = properties.missing(pass.properties_required);
            if !missing.is_empty() {
                return Err(PassError::MissingProperties {
                    pass: pass.name,
                    function: function.name(),
                    missing,
                });
            }

            trace!("running pass {} on {}", pass.name, function.name());
            let changed = (pass.execute)(ctx, function);
            trace!("pass {} changed {}: {changed}", pass.name, function.name());

            properties = properties.union(pass.properties_provided);

            self.finish(ctx, index + 1, pass, function)?;
        }

        Ok(())
    }

    fn finish(
        &self,
        ctx: &PassContext,
        index: usize,
        pass: &FunctionPass,
        function: &mut Function,
    ) -> Result<(), PassError> {
        let todo = pass.todo_flags_finish;

        if todo.update_ssa {
            let renamed = ssa::update(function);
            trace!("SSA update renamed {renamed} definitions in {}", function.name());
        }

        if todo.verify_ssa {
            let messages = validator::verify(ctx.declarations(), function);

            let (errors, others): (Vec<_>, Vec<_>) = messages
                .iter()
                .partition(|m| m.severity() == validator::Severity::Error);

            for message in others {
                debug!("{message}");
            }

            if !errors.is_empty() {
                return Err(PassError::Verification {
                    pass: pass.name,
                    function: function.name(),
                    report: errors.iter().join("\n"),
                });
            }
        }

        if todo.dump_function {
            dump::dump_function(self.dump_dir.as_deref(), index, pass.name, function)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            FunctionPass, PassContext, PassError, PassManager, PassPosition, PassRegistration,
            Properties, TodoFlags,
        },
        crate::frontend::{parse, AttributeRegistry},
        common::ir::function::Function,
        pretty_assertions::assert_eq,
    };

    fn nop(_: &PassContext, _: &mut Function) -> bool {
        false
    }

    fn pass(name: &'static str) -> FunctionPass {
        FunctionPass {
            name,
            properties_required: Properties::NONE,
            properties_provided: Properties::NONE,
            todo_flags_finish: TodoFlags::NONE,
            execute: nop,
        }
    }

    fn manager(names: &[&'static str]) -> PassManager {
        let mut manager = PassManager::new();
        for name in names {
            manager.push(pass(name));
        }
        manager
    }

    fn registration(reference: &str, instance: u32, position: PassPosition) -> PassRegistration {
        PassRegistration {
            pass: pass("new"),
            reference_pass_name: reference.to_owned(),
            ref_pass_instance_number: instance,
            position,
        }
    }

    #[test]
    fn placement() {
        let mut m = manager(&["ssa", "ccp", "dce", "ccp"]);
        m.register_pass(registration("ccp", 1, PassPosition::InsertAfter))
            .unwrap();
        assert_eq!(m.pass_names(), vec!["ssa", "ccp", "new", "dce", "ccp"]);

        let mut m = manager(&["ssa", "ccp", "dce", "ccp"]);
        m.register_pass(registration("ccp", 2, PassPosition::InsertBefore))
            .unwrap();
        assert_eq!(m.pass_names(), vec!["ssa", "ccp", "dce", "new", "ccp"]);

        let mut m = manager(&["ssa", "ccp", "dce", "ccp"]);
        m.register_pass(registration("ccp", 0, PassPosition::Replace))
            .unwrap();
        assert_eq!(m.pass_names(), vec!["ssa", "new", "dce", "new"]);
    }

    #[test]
    fn missing_reference() {
        let mut m = manager(&["ssa", "ccp"]);

        assert!(matches!(
            m.register_pass(registration("ccp", 2, PassPosition::InsertAfter)),
            Err(PassError::ReferencePassNotFound { instance: 2, .. })
        ));
        assert!(matches!(
            m.register_pass(registration("vrp", 0, PassPosition::InsertAfter)),
            Err(PassError::ReferencePassNotFound { .. })
        ));
        assert_eq!(m.pass_names(), vec!["ssa", "ccp"]);
    }

    #[test]
    fn required_properties_enforced() {
        let mut model = parse(
            "fn f() { bb0: return; }",
            &AttributeRegistry::new(),
        )
        .unwrap();

        let mut m = PassManager::new();
        m.push(FunctionPass {
            properties_required: Properties::CFG_SSA,
            ..pass("needs-ssa")
        });

        assert!(matches!(
            m.run(&mut model),
            Err(PassError::MissingProperties {
                pass: "needs-ssa",
                missing: Properties {
                    cfg: false,
                    ssa: true
                },
                ..
            })
        ));

        let mut m = PassManager::host_default();
        m.push(FunctionPass {
            properties_required: Properties::CFG_SSA,
            ..pass("needs-ssa")
        });
        m.run(&mut model).unwrap();
    }

    #[test]
    fn verification_failure_reported() {
        // `x_1` is never defined
        let mut model = parse(
            "fn f() -> i32 { let x: i32; bb0: return x_1; }",
            &AttributeRegistry::new(),
        )
        .unwrap();

        let err = PassManager::host_default().run(&mut model).unwrap_err();
        assert!(matches!(err, PassError::Verification { pass: "ssa", .. }));
        assert!(err.to_string().contains("never defined"), "{err}");
    }

    #[test]
    fn properties_display() {
        assert_eq!(Properties::CFG_SSA.to_string(), "cfg, ssa");
        assert_eq!(Properties::NONE.to_string(), "(none)");
    }
}
