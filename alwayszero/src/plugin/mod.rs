//! Compiler plugins and the alwayszero plugin
//!
//! A plugin is initialised once per [`Session`], before any source is parsed.
//! It may extend the attribute vocabulary of the front end and insert passes
//! into the pipeline.

use {
    crate::{
        pipeline::{PassError, PassPosition, PassRegistration},
        Session,
    },
    log::{debug, warn},
};

pub mod predicate;
pub mod registrar;
pub mod rewrite;

pub trait Plugin {
    fn name(&self) -> &'static str;

    fn init(&self, session: &mut Session, args: &PluginArguments) -> Result<(), PluginError>;
}

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum PluginError {
    /// plugin {plugin:?}: invalid value {value:?} for argument {key:?}, expected {expected}
    InvalidArgument {
        plugin: &'static str,
        key: String,
        value: String,
        expected: &'static str,
    },
    /// plugin {plugin:?}: argument {key:?} requires a value
    MissingValue { plugin: &'static str, key: String },
    /// plugin {0:?} could not register its pass: {1}
    Pass(&'static str, PassError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginArgument {
    pub key: String,
    pub value: Option<String>,
}

/// `key=value` (or bare `key`) arguments passed to a plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginArguments(Vec<PluginArgument>);

impl PluginArguments {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            args.into_iter()
                .map(|arg| match arg.as_ref().split_once('=') {
                    Some((key, value)) => PluginArgument {
                        key: key.trim().to_owned(),
                        value: Some(value.trim().to_owned()),
                    },
                    None => PluginArgument {
                        key: arg.as_ref().trim().to_owned(),
                        value: None,
                    },
                })
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginArgument> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where the alwayszero pass goes in the pipeline
///
/// Any position after SSA construction is correct. The default, right after
/// the first conditional constant propagation pass, lets that pass's later
/// instances and dead code elimination clean up after the rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub reference_pass: String,
    pub instance: u32,
    pub position: PassPosition,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            reference_pass: "ccp".to_owned(),
            instance: 1,
            position: PassPosition::InsertAfter,
        }
    }
}

impl Placement {
    /// Reads `ref-pass`, `ref-instance` and `position`, later occurrences of
    /// a key override earlier ones
    pub fn from_arguments(plugin: &'static str, args: &PluginArguments) -> Result<Self, PluginError> {
        let mut placement = Self::default();

        for PluginArgument { key, value } in args.iter() {
            let known = matches!(key.as_str(), "ref-pass" | "ref-instance" | "position");
            if !known {
                warn!("plugin {plugin:?}: ignoring unknown argument {key:?}");
                continue;
            }

            let Some(value) = value else {
                return Err(PluginError::MissingValue {
                    plugin,
                    key: key.clone(),
                });
            };

            let invalid = |expected| PluginError::InvalidArgument {
                plugin,
                key: key.clone(),
                value: value.clone(),
                expected,
            };

            match key.as_str() {
                "ref-pass" if value.is_empty() => return Err(invalid("a pass name")),
                "ref-pass" => placement.reference_pass = value.clone(),
                "ref-instance" => {
                    placement.instance = value
                        .parse()
                        .map_err(|_| invalid("an instance number, 0 for every instance"))?
                }
                _ => {
                    placement.position = match value.as_str() {
                        "after" => PassPosition::InsertAfter,
                        "before" => PassPosition::InsertBefore,
                        _ => return Err(invalid("`after` or `before`")),
                    }
                }
            }
        }

        Ok(placement)
    }
}

/// Rewrites calls to functions annotated `user("alwayszero")`
pub struct AlwaysZeroPlugin;

impl Plugin for AlwaysZeroPlugin {
    fn name(&self) -> &'static str {
        "alwayszero"
    }

    fn init(&self, session: &mut Session, args: &PluginArguments) -> Result<(), PluginError> {
        let placement = Placement::from_arguments(self.name(), args)?;
        debug!("plugin {:?}: {placement:?}", self.name());

        session
            .register_pass(PassRegistration {
                pass: rewrite::ALWAYSZERO_PASS,
                reference_pass_name: placement.reference_pass,
                ref_pass_instance_number: placement.instance,
                position: placement.position,
            })
            .map_err(|e| PluginError::Pass(self.name(), e))?;

        session.register_attributes(registrar::register_attributes);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{Placement, PluginArguments, PluginError},
        crate::pipeline::PassPosition,
        pretty_assertions::assert_eq,
    };

    fn placement(args: &[&str]) -> Result<Placement, PluginError> {
        Placement::from_arguments("test", &PluginArguments::parse(args))
    }

    #[test]
    fn defaults() {
        assert_eq!(
            placement(&[]).unwrap(),
            Placement {
                reference_pass: "ccp".to_owned(),
                instance: 1,
                position: PassPosition::InsertAfter,
            }
        );
    }

    #[test]
    fn overrides() {
        assert_eq!(
            placement(&["ref-pass=ssa", "position=before", "ref-instance=0", "ref-pass=vrp"])
                .unwrap(),
            Placement {
                reference_pass: "vrp".to_owned(),
                instance: 0,
                position: PassPosition::InsertBefore,
            }
        );
    }

    #[test]
    fn unknown_keys_ignored() {
        assert_eq!(placement(&["verbose", "color=red"]).unwrap(), Placement::default());
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            placement(&["ref-instance=first"]),
            Err(PluginError::InvalidArgument { .. })
        ));
        assert!(matches!(
            placement(&["position=replace"]),
            Err(PluginError::InvalidArgument { .. })
        ));
        assert!(matches!(
            placement(&["ref-pass="]),
            Err(PluginError::InvalidArgument { .. })
        ));
        assert!(matches!(
            placement(&["ref-pass"]),
            Err(PluginError::MissingValue { .. })
        ));
    }
}
