//! Session construction

use crate::bindings::{BindingOverride, BindingTable};
use crate::config::{ConfigDocument, ConfigScope};
use crate::error::{ConfigurationError, ConfigurationErrors, SessionError};
use crate::input::InputDevices;
use crate::notify::ChangeNotifier;
use crate::port::{DescriptorRecord, PortRegistry};
use crate::replay::PlaybackRecorder;
use crate::runtime::{CustomSource, FrameScheduler, TieBreak};

use super::Session;

/// Assembles a [`Session`] from descriptors and configuration
///
/// Bindings are layered as builtin, then platform customization, then the
/// system document, then the profile. Port overrides from the profile and
/// the session document are applied once the registry is built.
pub struct SessionBuilder {
    records: Vec<DescriptorRecord>,
    platform: Vec<BindingOverride>,
    system: Option<ConfigDocument>,
    profile: Option<ConfigDocument>,
    session: Option<ConfigDocument>,
    customs: Vec<(String, u32, CustomSource)>,
    tie_break: TieBreak,
}

impl SessionBuilder {
    pub fn new(records: impl IntoIterator<Item = DescriptorRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
            platform: Vec::new(),
            system: None,
            profile: None,
            session: None,
            customs: Vec::new(),
            tie_break: TieBreak::default(),
        }
    }

    /// Platform overrides applied before the backup baseline is taken
    pub fn customize(mut self, overrides: impl IntoIterator<Item = BindingOverride>) -> Self {
        self.platform.extend(overrides);
        self
    }

    /// Saved binding diff (`default.toml`)
    pub fn system_config(mut self, document: ConfigDocument) -> Self {
        self.system = Some(document);
        self
    }

    /// Device profile: remaps, default nodes and port nodes
    pub fn profile(mut self, document: ConfigDocument) -> Self {
        self.profile = Some(document);
        self
    }

    /// Per-session port overrides
    pub fn session_config(mut self, document: ConfigDocument) -> Self {
        self.session = Some(document);
        self
    }

    /// Callback for the custom field of `tag` with exactly `mask`
    pub fn custom_source(
        mut self,
        tag: impl Into<String>,
        mask: u32,
        source: impl FnMut() -> u32 + 'static,
    ) -> Self {
        let source: CustomSource = Box::new(source);
        self.customs.push((tag.into(), mask, source));
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn build<D: InputDevices>(self, devices: D) -> Result<Session<D>, SessionError> {
        let mut bindings = BindingTable::builtin();
        bindings.customize(self.platform);

        if let Some(system) = &self.system {
            log_warnings(system, ConfigScope::System);
            bindings.apply_diff(&system.binding_overrides());
        }
        // The system layer is what `binding_config` saves; the profile stays out of it
        let system_bindings = bindings.clone();
        if let Some(profile) = &self.profile {
            log_warnings(profile, ConfigScope::Profile);
            profile.apply_bindings(&mut bindings, ConfigScope::Profile);
        }

        let mut registry = PortRegistry::build(self.records, &bindings)?;

        let mut errors = Vec::new();
        for (document, scope) in [
            (&self.profile, ConfigScope::Profile),
            (&self.session, ConfigScope::Session),
        ] {
            if let Some(document) = document {
                if scope == ConfigScope::Session {
                    log_warnings(document, scope);
                }
                match document.apply_ports(&mut registry) {
                    Ok(applied) => {
                        tracing::debug!("Applied {} {} port override(s)", applied, scope)
                    }
                    Err(ConfigurationErrors(found)) => errors.extend(found),
                }
            }
        }

        let mut scheduler = FrameScheduler::new(&registry, self.tie_break);

        for (tag, mask, source) in self.customs {
            let bound = registry
                .lookup(&tag)
                .is_some_and(|port| scheduler.bind_custom(port, mask, source));
            if !bound {
                errors.push(ConfigurationError::UnboundCustomSource { tag, mask });
            }
        }
        if !errors.is_empty() {
            return Err(ConfigurationErrors(errors).into());
        }

        scheduler.prime();
        tracing::info!(
            "Session ready: {} group(s), {} binding(s)",
            registry.len(),
            bindings.len()
        );

        Ok(Session {
            devices,
            bindings,
            system_bindings,
            registry,
            scheduler,
            recorder: PlaybackRecorder::new(),
            notifier: ChangeNotifier::new(),
            events: Vec::new(),
        })
    }
}

fn log_warnings(document: &ConfigDocument, scope: ConfigScope) {
    for warning in document.validate(scope) {
        tracing::warn!("{} configuration: {}", scope, warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodeRemap;
    use crate::input::{InputCode, Key, SeqType, Sequence};
    use crate::port::{ControlDescriptor, ControlType, DescriptorStream};
    use crate::test_utils::ScriptedDevices;

    fn layout() -> DescriptorStream {
        DescriptorStream::new()
            .group("IN0")
            .control(ControlDescriptor::new(ControlType::Coin, 0x01).active_low())
            .control(ControlDescriptor::new(ControlType::Custom, 0xf0))
    }

    #[test]
    fn test_configuration_errors_abort() {
        let records = DescriptorStream::new()
            .group("IN0")
            .control(ControlDescriptor::new(ControlType::Start, 0))
            .control(ControlDescriptor::new(ControlType::Coin, 0x01).default_value(0x02));
        let err = SessionBuilder::new(records)
            .build(ScriptedDevices::new())
            .unwrap_err();
        let SessionError::Configuration(errors) = err else {
            panic!("expected configuration errors");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unbound_custom_source_is_an_error() {
        let err = SessionBuilder::new(layout())
            .custom_source("IN0", 0x0f, || 0)
            .custom_source("NOPE", 0xf0, || 0)
            .build(ScriptedDevices::new())
            .unwrap_err();
        let SessionError::Configuration(errors) = err else {
            panic!("expected configuration errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors.errors()[0],
            ConfigurationError::UnboundCustomSource { mask: 0x0f, .. }
        ));
    }

    #[test]
    fn test_custom_source_and_priming() {
        let mut session = SessionBuilder::new(layout())
            .custom_source("IN0", 0xf0, || 0xa)
            .build(ScriptedDevices::new())
            .unwrap();
        let port = session.lookup("IN0").unwrap();
        // Primed before the first frame
        assert_eq!(session.composite(port), Some(0xa1));
        assert_eq!(session.read(port, 0.0), Some(0xa1));
    }

    #[test]
    fn test_profile_remap_reaches_fields() {
        let profile = ConfigDocument {
            remap: vec![CodeRemap {
                from: InputCode::key(Key::Digit5),
                to: InputCode::key(Key::C),
            }],
            ..ConfigDocument::default()
        };
        let mut session = SessionBuilder::new(layout())
            .profile(profile)
            .build(ScriptedDevices::new())
            .unwrap();

        session.devices_mut().press(InputCode::key(Key::C));
        session.on_frame_start();
        assert_eq!(session.read_tag("IN0", 0.0), Some(0x00));
    }

    #[test]
    fn test_profile_stays_out_of_binding_config() {
        let profile = ConfigDocument {
            remap: vec![CodeRemap {
                from: InputCode::key(Key::Digit5),
                to: InputCode::key(Key::C),
            }],
            ..ConfigDocument::default()
        };
        let session = SessionBuilder::new(layout())
            .profile(profile)
            .build(ScriptedDevices::new())
            .unwrap();

        // The profile is live, but the system document has nothing to save
        assert_eq!(
            session
                .bindings()
                .default_sequence(ControlType::Coin, 0, SeqType::Standard),
            Sequence::single(InputCode::key(Key::C))
        );
        assert!(session.binding_config().is_empty());
    }

    #[test]
    fn test_unresolved_port_override_aborts() {
        let mut document = ConfigDocument::default();
        let mut node = crate::config::PortNode::new("IN0", 0x01, 0x01);
        node.sequence.push(crate::config::SequenceNode {
            seq_type: SeqType::Standard,
            sequence: Sequence::single(InputCode::key(Key::A)).with_default(),
        });
        document.port.push(node);

        let err = SessionBuilder::new(layout())
            .session_config(document)
            .custom_source("IN0", 0x0f, || 0)
            .build(ScriptedDevices::new())
            .unwrap_err();
        let SessionError::Configuration(errors) = err else {
            panic!("expected configuration errors");
        };
        // Reported together with the other build-time findings
        assert_eq!(errors.len(), 2, "{errors}");
        assert!(matches!(
            &errors.errors()[0],
            ConfigurationError::UnresolvedDefault { field, seq_type: SeqType::Standard }
                if field.group == "IN0" && field.control == ControlType::Coin
        ));
        assert!(matches!(
            errors.errors()[1],
            ConfigurationError::UnboundCustomSource { mask: 0x0f, .. }
        ));
    }

    #[test]
    fn test_system_diff_survives_into_binding_config() {
        let mut system = ConfigDocument::default();
        system.defaults.push(crate::config::BindingNode {
            control: ControlType::Coin,
            player: 0,
            sequence: vec![crate::config::SequenceNode {
                seq_type: SeqType::Standard,
                sequence: Sequence::single(InputCode::key(Key::V)),
            }],
        });
        let session = SessionBuilder::new(layout())
            .system_config(system.clone())
            .build(ScriptedDevices::new())
            .unwrap();
        assert_eq!(session.binding_config(), system);
        let field = &session.registry().groups()[0].fields()[0];
        assert_eq!(
            field.sequence(SeqType::Standard),
            &Sequence::single(InputCode::key(Key::V))
        );
    }
}
