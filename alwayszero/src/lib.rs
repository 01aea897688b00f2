//! Compiler host for the alwayszero optimisation plugin
//!
//! A [`Session`] owns the attribute vocabulary of the front end and the pass
//! pipeline. Plugins are loaded into a session before any source is parsed.

use {
    crate::{
        frontend::{
            attributes::{AttributeRegistry, RegistryError},
            ParseError,
        },
        pipeline::{PassError, PassManager, PassRegistration},
        plugin::{Plugin, PluginArguments, PluginError},
    },
    common::ir::Model,
    log::{debug, info},
};

pub mod frontend;
pub mod pipeline;
pub mod plugin;
pub mod util;

/// Adds attributes to the front end, run once when the front end initialises
pub type AttributeCallback = fn(&mut AttributeRegistry) -> Result<(), RegistryError>;

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// Failed to parse input: {0}
    Parse(ParseError),
    /// Failed to register attribute: {0}
    Registry(RegistryError),
    /// {0}
    Pass(PassError),
    /// Failed to load plugin: {0}
    Plugin(PluginError),
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<RegistryError> for Error {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<PassError> for Error {
    fn from(value: PassError) -> Self {
        Self::Pass(value)
    }
}

impl From<PluginError> for Error {
    fn from(value: PluginError) -> Self {
        Self::Plugin(value)
    }
}

pub struct Session {
    attributes: AttributeRegistry,
    /// Callbacks not yet run against `attributes`
    pending_attributes: Vec<AttributeCallback>,
    passes: PassManager,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with the host pipeline and no extra attributes
    pub fn new() -> Self {
        Self::with_passes(PassManager::host_default())
    }

    pub fn with_passes(passes: PassManager) -> Self {
        Self {
            attributes: AttributeRegistry::new(),
            pending_attributes: vec![],
            passes,
        }
    }

    pub fn load_plugin(&mut self, plugin: &dyn Plugin, args: &PluginArguments) -> Result<(), Error> {
        info!("loading plugin {:?}", plugin.name());
        plugin.init(self, args)?;
        Ok(())
    }

    pub fn register_attributes(&mut self, callback: AttributeCallback) {
        self.pending_attributes.push(callback);
    }

    pub fn register_pass(&mut self, registration: PassRegistration) -> Result<(), PassError> {
        self.passes.register_pass(registration)
    }

    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    pub fn passes(&self) -> &PassManager {
        &self.passes
    }

    pub fn passes_mut(&mut self) -> &mut PassManager {
        &mut self.passes
    }

    /// Runs the attribute callbacks registered since the last call
    fn initialise_frontend(&mut self) -> Result<(), RegistryError> {
        for callback in self.pending_attributes.drain(..) {
            callback(&mut self.attributes)?;
        }
        Ok(())
    }

    pub fn parse(&mut self, source: &str) -> Result<Model, Error> {
        self.initialise_frontend()?;

        let model = frontend::parse(source, &self.attributes)?;
        debug!(
            "parsed {} declarations, {} function bodies",
            model.declarations().len(),
            model.functions().len()
        );

        Ok(model)
    }

    /// Runs every function of `model` through the pipeline
    pub fn compile(&self, model: &mut Model) -> Result<(), Error> {
        self.passes.run(model)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            pipeline::{FunctionPass, PassContext, PassManager, Properties, TodoFlags},
            plugin::{AlwaysZeroPlugin, PluginArguments},
            Error, Session,
        },
        common::ir::function::Function,
        pretty_assertions::assert_eq,
        std::fs,
    };

    const SCENARIO: &str = r#"
#[user("alwayszero")]
fn bar() -> i32;

fn foo() -> i32 {
    let x: i32;
    let y: i32;
bb0:
    x_1 = call bar();
    y_1 = add x_1, 1;
    return y_1;
}
"#;

    const REWRITTEN: &str = r#"#[user("alwayszero")]
fn bar() -> i32;

fn foo() -> i32 {
    let dummy_var.0: i32;
    let x: i32;
    let y: i32;
bb0:
    dummy_var.0_2 = call bar();
    x_1 = 0;
    y_1 = add x_1, 1;
    return y_1;
}
"#;

    fn nop(_: &PassContext, _: &mut Function) -> bool {
        false
    }

    static CCP: FunctionPass = FunctionPass {
        name: "ccp",
        properties_required: Properties::CFG_SSA,
        properties_provided: Properties::NONE,
        todo_flags_finish: TodoFlags::NONE,
        execute: nop,
    };

    /// Host pipeline extended with two constant propagation instances
    fn optimising_session() -> Session {
        let mut passes = PassManager::host_default();
        passes.push(CCP);
        passes.push(CCP);
        Session::with_passes(passes)
    }

    fn with_plugin(mut session: Session, args: &[&str]) -> Session {
        session
            .load_plugin(&AlwaysZeroPlugin, &PluginArguments::parse(args))
            .unwrap();
        session
    }

    #[test]
    fn default_placement() {
        let session = with_plugin(optimising_session(), &[]);

        assert_eq!(
            session.passes().pass_names(),
            vec!["ssa", "ccp", "alwayszero", "ccp"]
        );
    }

    #[test]
    fn placement_without_reference_pass_fails() {
        let mut session = Session::new();

        let err = session
            .load_plugin(&AlwaysZeroPlugin, &PluginArguments::default())
            .unwrap_err();

        assert!(matches!(err, Error::Plugin(_)), "{err}");
        assert_eq!(session.passes().pass_names(), vec!["ssa"]);
    }

    #[test]
    fn end_to_end() {
        let mut session = with_plugin(optimising_session(), &[]);

        let mut model = session.parse(SCENARIO).unwrap();
        session.compile(&mut model).unwrap();

        assert_eq!(model.to_string(), REWRITTEN);

        // the rewritten model is valid input again
        assert_eq!(session.parse(REWRITTEN).unwrap().to_string(), REWRITTEN);
    }

    #[test]
    fn placed_after_ssa_construction() {
        let mut session = with_plugin(Session::new(), &["ref-pass=ssa"]);

        let mut model = session.parse(SCENARIO).unwrap();
        session.compile(&mut model).unwrap();

        assert_eq!(model.to_string(), REWRITTEN);
    }

    #[test]
    fn placed_before_ssa_construction() {
        let mut session = with_plugin(Session::new(), &["ref-pass=ssa", "position=before"]);

        let mut model = session.parse(SCENARIO).unwrap();

        assert!(matches!(session.compile(&mut model), Err(Error::Pass(_))));
    }

    #[test]
    fn rewritten_function_dumped() {
        let dir = std::env::temp_dir().join(format!("alwayszero-session-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let mut session = with_plugin(Session::new(), &["ref-pass=ssa"]);
        session.passes_mut().set_dump_dir(Some(&dir));

        let mut model = session.parse(SCENARIO).unwrap();
        session.compile(&mut model).unwrap();

        let dumped = fs::read_to_string(dir.join("foo.002.alwayszero")).unwrap();
        assert!(
            dumped.contains("    dummy_var.0_2 = call bar();\n    x_1 = 0;\n"),
            "{dumped}"
        );

        // the host pass does not ask for a dump
        assert!(!dir.join("foo.001.ssa").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn recompiling_splits_again() {
        let mut session = with_plugin(Session::new(), &["ref-pass=ssa"]);

        let mut model = session.parse(SCENARIO).unwrap();
        session.compile(&mut model).unwrap();
        session.compile(&mut model).unwrap();

        let text = model.to_string();
        assert!(
            text.contains("    dummy_var.1_3 = call bar();\n    dummy_var.0_2 = 0;\n    x_1 = 0;\n"),
            "{text}"
        );
    }

    #[test]
    fn attribute_unknown_without_plugin() {
        let mut session = Session::new();

        // `user` is not part of the host vocabulary, the directive is dropped
        let mut model = session.parse(SCENARIO).unwrap();
        session.compile(&mut model).unwrap();

        assert_eq!(
            model.to_string(),
            SCENARIO.trim_start().replace("#[user(\"alwayszero\")]\n", "")
        );
    }
}
