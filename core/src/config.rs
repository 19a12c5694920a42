//! Persisted configuration documents
//!
//! One TOML document type serves three scopes:
//!
//! - **system** (`default.toml`): changed default bindings
//! - **session** (`sessions/<name>.toml`): per-session port overrides
//! - **profile** (`profiles/<name>.toml`): a device profile with code remaps,
//!   default bindings and port overrides
//!
//! ```toml
//! [[remap]]
//! from = "KEYCODE_LCONTROL"
//! to = "KEYCODE_Y"
//!
//! [[default]]
//! type = "BUTTON1"
//! player = 0
//! sequence = [{ type = "standard", sequence = "KEYCODE_Y OR JOYCODE_1_BUTTON1" }]
//!
//! [[port]]
//! tag = "DSW"
//! mask = 3
//! defvalue = 3
//! value = 1
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::bindings::{BindingOverride, BindingTable};
use crate::error::{ConfigError, ConfigurationErrors};
use crate::input::{InputCode, SeqType, Sequence};
use crate::port::{ControlType, MAX_PLAYERS, PortRegistry};

/// Which kind of document is being loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    System,
    Session,
    Profile,
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigScope::System => "system",
            ConfigScope::Session => "session",
            ConfigScope::Profile => "profile",
        })
    }
}

/// Replace one device code by another everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRemap {
    pub from: InputCode,
    pub to: InputCode,
}

/// One tagged sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceNode {
    #[serde(rename = "type")]
    pub seq_type: SeqType,
    pub sequence: Sequence,
}

/// Default sequences of one `(control type, player)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingNode {
    #[serde(rename = "type")]
    pub control: ControlType,
    #[serde(default)]
    pub player: u8,
    #[serde(default)]
    pub sequence: Vec<SequenceNode>,
}

/// Overrides for one field, addressed by group tag, mask and default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortNode {
    pub tag: String,
    pub mask: u32,
    pub defvalue: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centerdelta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<SequenceNode>,
}

impl PortNode {
    pub fn new(tag: impl Into<String>, mask: u32, defvalue: u32) -> Self {
        Self {
            tag: tag.into(),
            mask,
            defvalue,
            value: None,
            sensitivity: None,
            delta: None,
            centerdelta: None,
            reverse: None,
            sequence: Vec::new(),
        }
    }

    /// Apply to the matching registry field; `Ok(false)` if none matches.
    ///
    /// Sequences whose `DEFAULT` cannot be resolved are reported and left
    /// unapplied; the node's other overrides still take effect.
    pub fn apply(&self, registry: &mut PortRegistry) -> Result<bool, ConfigurationErrors> {
        let Some(field) = registry.find_field_mut(&self.tag, self.mask, self.defvalue) else {
            tracing::warn!(
                "No field matches port node {} mask {:#x} default {:#x}",
                self.tag,
                self.mask,
                self.defvalue
            );
            return Ok(false);
        };

        let mut errors = Vec::new();
        for node in &self.sequence {
            if let Err(error) = field.set_sequence(node.seq_type, node.sequence.clone()) {
                errors.push(error);
            }
        }
        if let Some(value) = self.value {
            field.set_value(value);
        }
        if let Some(params) = field.analog_mut() {
            if let Some(sensitivity) = self.sensitivity {
                params.sensitivity = sensitivity.max(1);
            }
            if let Some(delta) = self.delta {
                params.delta = delta;
            }
            if let Some(center_delta) = self.centerdelta {
                params.center_delta = center_delta;
            }
            if let Some(reverse) = self.reverse {
                params.reverse = reverse;
            }
        }
        if errors.is_empty() {
            Ok(true)
        } else {
            Err(ConfigurationErrors(errors))
        }
    }

    /// Whether the node overrides nothing
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.sensitivity.is_none()
            && self.delta.is_none()
            && self.centerdelta.is_none()
            && self.reverse.is_none()
            && self.sequence.is_empty()
    }
}

/// A configuration document of any scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remap: Vec<CodeRemap>,
    #[serde(default, rename = "default", skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<BindingNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port: Vec<PortNode>,
}

impl ConfigDocument {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or an empty document if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(io_error)?;
        tracing::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.remap.is_empty() && self.defaults.is_empty() && self.port.is_empty()
    }

    /// Default nodes from a binding table diff
    pub fn from_binding_diff(diff: &[BindingOverride]) -> Self {
        let mut defaults: Vec<BindingNode> = Vec::new();
        for o in diff {
            let node = match defaults.last_mut() {
                Some(node) if node.control == o.control && node.player == o.player => node,
                _ => {
                    defaults.push(BindingNode {
                        control: o.control,
                        player: o.player,
                        sequence: Vec::new(),
                    });
                    // Just pushed
                    let Some(node) = defaults.last_mut() else {
                        continue;
                    };
                    node
                }
            };
            node.sequence.push(SequenceNode {
                seq_type: o.seq_type,
                sequence: o.sequence.clone(),
            });
        }
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Flatten default nodes into binding overrides
    pub fn binding_overrides(&self) -> Vec<BindingOverride> {
        self.defaults
            .iter()
            .flat_map(|node| {
                node.sequence.iter().map(move |seq| BindingOverride {
                    control: node.control,
                    player: node.player,
                    seq_type: seq.seq_type,
                    sequence: seq.sequence.clone(),
                })
            })
            .collect()
    }

    /// Apply remaps (profile scope only) and default nodes to `table`
    pub fn apply_bindings(&self, table: &mut BindingTable, scope: ConfigScope) {
        if scope == ConfigScope::Profile {
            for remap in &self.remap {
                table.remap(remap.from, remap.to);
            }
        } else if !self.remap.is_empty() {
            tracing::warn!(
                "Ignoring {} remap(s) in {} configuration",
                self.remap.len(),
                scope
            );
        }
        for o in self.binding_overrides() {
            table.set_default(o.control, o.player, o.seq_type, o.sequence);
        }
    }

    /// Apply port nodes; returns how many matched a field.
    ///
    /// Every node is applied before failing, so the error lists all
    /// unresolvable sequences in the document.
    pub fn apply_ports(&self, registry: &mut PortRegistry) -> Result<usize, ConfigurationErrors> {
        let mut applied = 0;
        let mut errors = Vec::new();
        for node in self.port.iter().filter(|node| !node.is_empty()) {
            match node.apply(registry) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(ConfigurationErrors(found)) => errors.extend(found),
            }
        }
        if errors.is_empty() {
            Ok(applied)
        } else {
            Err(ConfigurationErrors(errors))
        }
    }

    /// Human-readable problems that do not prevent loading
    pub fn validate(&self, scope: ConfigScope) -> Vec<String> {
        let mut warnings = Vec::new();

        if scope != ConfigScope::Profile && !self.remap.is_empty() {
            warnings.push(format!(
                "{} remap(s) are only honoured in profile configuration",
                self.remap.len()
            ));
        }
        if scope == ConfigScope::Session && !self.defaults.is_empty() {
            warnings.push(format!(
                "{} default binding node(s) are ignored in session configuration",
                self.defaults.len()
            ));
        }
        if scope == ConfigScope::System && !self.port.is_empty() {
            warnings.push(format!(
                "{} port node(s) are ignored in system configuration",
                self.port.len()
            ));
        }

        for remap in &self.remap {
            if remap.from == remap.to {
                warnings.push(format!("remap of {} onto itself has no effect", remap.from));
            }
        }

        let mut seen_defaults = HashSet::new();
        for node in &self.defaults {
            if usize::from(node.player) >= MAX_PLAYERS {
                warnings.push(format!(
                    "default {} player {} is out of range",
                    node.control, node.player
                ));
            }
            if !seen_defaults.insert((node.control, node.player)) {
                warnings.push(format!(
                    "default {} player {} appears more than once",
                    node.control, node.player
                ));
            }
            check_sequences(&format!("default {}", node.control), &node.sequence, &mut warnings);
        }

        let mut seen_ports = HashSet::new();
        for node in &self.port {
            let name = format!("port {} mask {:#x}", node.tag, node.mask);
            if !seen_ports.insert((&node.tag, node.mask, node.defvalue)) {
                warnings.push(format!("{name} appears more than once"));
            }
            if node.mask == 0 {
                warnings.push(format!("{name} has an empty mask"));
            }
            if let Some(value) = node.value {
                if value & !node.mask != 0 {
                    warnings.push(format!("{name} value {value:#x} has bits outside the mask"));
                }
            }
            if let Some(sensitivity) = node.sensitivity {
                if sensitivity <= 0 {
                    warnings.push(format!("{name} sensitivity {sensitivity} must be positive"));
                }
            }
            check_sequences(&name, &node.sequence, &mut warnings);
        }

        warnings
    }
}

fn check_sequences(owner: &str, nodes: &[SequenceNode], warnings: &mut Vec<String>) {
    let mut seen = [false; 3];
    for node in nodes {
        let slot = &mut seen[node.seq_type.index()];
        if *slot {
            warnings.push(format!("{owner} has more than one {} sequence", node.seq_type));
        }
        *slot = true;
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Platform configuration directory
///
/// On Linux: `~/.config/IoPort`
/// On macOS: `~/Library/Application Support/io.ioport.IoPort`
/// On Windows: `%APPDATA%\IoPort\config`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.ioport", "", "IoPort")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default path of a document of `scope`; `name` is ignored for system scope
pub fn scope_path(base: &Path, scope: ConfigScope, name: &str) -> PathBuf {
    match scope {
        ConfigScope::System => base.join("default.toml"),
        ConfigScope::Session => base.join("sessions").join(format!("{name}.toml")),
        ConfigScope::Profile => base.join("profiles").join(format!("{name}.toml")),
    }
}

/// [`scope_path`] under [`config_dir`]
pub fn default_path(scope: ConfigScope, name: &str) -> Result<PathBuf, ConfigError> {
    config_dir()
        .map(|dir| scope_path(&dir, scope, name))
        .ok_or(ConfigError::NoConfigDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    fn key(k: Key) -> InputCode {
        InputCode::key(k)
    }

    // =============================================================
    // Parsing
    // =============================================================

    #[test]
    fn test_empty_document() {
        let doc = ConfigDocument::from_toml_str("").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.to_toml_string().unwrap().trim(), "");
    }

    #[test]
    fn test_parse_all_sections() {
        let text = r#"
[[remap]]
from = "KEYCODE_LCONTROL"
to = "KEYCODE_Y"

[[default]]
type = "BUTTON1"
sequence = [{ type = "standard", sequence = "KEYCODE_Y OR JOYCODE_1_BUTTON1" }]

[[port]]
tag = "DSW"
mask = 0x03
defvalue = 0x03
value = 0x01

[[port]]
tag = "PADDLE"
mask = 0xff
defvalue = 0x80
sensitivity = 40
reverse = true
sequence = [{ type = "increment", sequence = "KEYCODE_X" }]
"#;
        let doc = ConfigDocument::from_toml_str(text).unwrap();
        assert_eq!(
            doc.remap,
            vec![CodeRemap {
                from: key(Key::LControl),
                to: key(Key::Y)
            }]
        );
        assert_eq!(doc.defaults[0].player, 0);
        assert_eq!(doc.port[0].value, Some(1));
        assert_eq!(doc.port[1].sensitivity, Some(40));
        assert_eq!(doc.port[1].sequence[0].seq_type, SeqType::Increment);
        assert!(doc.validate(ConfigScope::Profile).is_empty());
    }

    #[test]
    fn test_bad_code_is_parse_error() {
        let text = "[[remap]]\nfrom = \"KEYCODE_NOPE\"\nto = \"KEYCODE_A\"\n";
        assert!(ConfigDocument::from_toml_str(text).is_err());
    }

    // =============================================================
    // Validation
    // =============================================================

    #[test]
    fn test_scope_warnings() {
        let doc = ConfigDocument {
            remap: vec![CodeRemap {
                from: key(Key::A),
                to: key(Key::B),
            }],
            defaults: vec![BindingNode {
                control: ControlType::Start,
                player: 0,
                sequence: Vec::new(),
            }],
            port: vec![PortNode::new("IN0", 1, 1)],
        };
        assert!(doc.validate(ConfigScope::Profile).is_empty());
        assert_eq!(doc.validate(ConfigScope::System).len(), 2);
        assert_eq!(doc.validate(ConfigScope::Session).len(), 2);
    }

    #[test]
    fn test_content_warnings() {
        let mut port = PortNode::new("IN0", 0x0f, 0);
        port.value = Some(0x10);
        port.sensitivity = Some(0);
        port.sequence = vec![
            SequenceNode {
                seq_type: SeqType::Standard,
                sequence: Sequence::empty(),
            },
            SequenceNode {
                seq_type: SeqType::Standard,
                sequence: Sequence::single(key(Key::A)),
            },
        ];
        let doc = ConfigDocument {
            remap: Vec::new(),
            defaults: vec![
                BindingNode {
                    control: ControlType::Coin,
                    player: 5,
                    sequence: Vec::new(),
                },
                BindingNode {
                    control: ControlType::Coin,
                    player: 5,
                    sequence: Vec::new(),
                },
            ],
            port: vec![port.clone(), port],
        };
        let warnings = doc.validate(ConfigScope::Profile);
        // 2x out of range, 1 duplicate default, 1 duplicate port, 2x (value, sensitivity, sequence)
        assert_eq!(warnings.len(), 10, "{warnings:#?}");
    }

    // =============================================================
    // Bindings round trip
    // =============================================================

    #[test]
    fn test_binding_diff_roundtrip_through_toml() {
        let mut table = BindingTable::builtin();
        table.customize(Vec::new());
        table.set_default(
            ControlType::Button(3),
            0,
            SeqType::Standard,
            Sequence::single(key(Key::Q)).not(key(Key::LShift)),
        );
        table.set_default(ControlType::Paddle, 1, SeqType::Increment, Sequence::empty());
        table.set_default(ControlType::Paddle, 1, SeqType::Decrement, Sequence::single(key(Key::K)));

        let doc = ConfigDocument::from_binding_diff(&table.diff());
        assert_eq!(doc.defaults.len(), 2);
        let text = doc.to_toml_string().unwrap();

        let loaded = ConfigDocument::from_toml_str(&text).unwrap();
        let mut restored = BindingTable::builtin();
        restored.customize(Vec::new());
        restored.apply_diff(&loaded.binding_overrides());
        assert_eq!(restored, table);
    }

    #[test]
    fn test_remaps_only_in_profile_scope() {
        let doc = ConfigDocument {
            remap: vec![CodeRemap {
                from: key(Key::Digit5),
                to: key(Key::C),
            }],
            ..ConfigDocument::default()
        };

        let mut table = BindingTable::builtin();
        doc.apply_bindings(&mut table, ConfigScope::System);
        assert_eq!(table, BindingTable::builtin());

        doc.apply_bindings(&mut table, ConfigScope::Profile);
        assert_eq!(
            table.default_sequence(ControlType::Coin, 0, SeqType::Standard),
            Sequence::single(key(Key::C))
        );
    }

    // =============================================================
    // Files and paths
    // =============================================================

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = scope_path(dir.path(), ConfigScope::Session, "pacman");
        assert!(path.ends_with("sessions/pacman.toml"));
        assert_eq!(
            ConfigDocument::load_or_default(&path).unwrap(),
            ConfigDocument::default()
        );

        let mut node = PortNode::new("DSW", 0x03, 0x03);
        node.value = Some(0x02);
        let doc = ConfigDocument {
            port: vec![node],
            ..ConfigDocument::default()
        };
        doc.save(&path).unwrap();
        assert_eq!(ConfigDocument::load(&path).unwrap(), doc);
    }

    #[test]
    fn test_load_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[[port]]\ntag = 3\n").unwrap();
        let err = ConfigDocument::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ConfigDocument::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_scope_paths() {
        let base = Path::new("/cfg");
        assert_eq!(
            scope_path(base, ConfigScope::System, "ignored"),
            PathBuf::from("/cfg/default.toml")
        );
        assert_eq!(
            scope_path(base, ConfigScope::Profile, "arcade-stick"),
            PathBuf::from("/cfg/profiles/arcade-stick.toml")
        );
    }
}
