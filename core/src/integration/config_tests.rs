//! Configuration persistence through a full session

use super::test_utils::frame;
use crate::config::{BindingNode, ConfigDocument, ConfigScope, PortNode, SequenceNode, scope_path};
use crate::input::{InputCode, Key, SeqType, Sequence};
use crate::port::{ControlType, DescriptorStream, PortLayout};
use crate::session::SessionBuilder;
use crate::test_utils::ScriptedDevices;

const LAYOUT: &str = r#"
[[group]]
tag = "IN0"

[[group.control]]
type = "COIN"
mask = 0x01
default = 0x01

[[group.control]]
type = "BUTTON1"
mask = 0x02
toggle = true

[[group]]
tag = "DSW"

[[group.control]]
type = "DIPSWITCH"
mask = 0x03
default = 0x03
location = "SW1:1,2"
sequences = { standard = "KEYCODE_F1" }
"#;

fn layout() -> DescriptorStream {
    PortLayout::from_toml_str(LAYOUT).unwrap().into_stream()
}

fn coin_on_v() -> ConfigDocument {
    ConfigDocument {
        defaults: vec![BindingNode {
            control: ControlType::Coin,
            player: 0,
            sequence: vec![SequenceNode {
                seq_type: SeqType::Standard,
                sequence: Sequence::single(InputCode::key(Key::V)),
            }],
        }],
        ..ConfigDocument::default()
    }
}

#[test]
fn test_saved_session_restores_identically() {
    let dir = tempfile::tempdir().unwrap();
    let system_path = scope_path(dir.path(), ConfigScope::System, "");
    let session_path = scope_path(dir.path(), ConfigScope::Session, "testmach");

    let mut first = SessionBuilder::new(layout())
        .system_config(coin_on_v())
        .build(ScriptedDevices::new())
        .unwrap();
    // Flip the DIP bank and latch the toggle button
    first.devices_mut().press(InputCode::key(Key::F1));
    first.devices_mut().press(InputCode::key(Key::LControl));
    assert_eq!(frame(&mut first, &["IN0", "DSW"]), vec![0x03, 0x00]);

    first.binding_config().save(&system_path).unwrap();
    first.port_config().save(&session_path).unwrap();

    let system = ConfigDocument::load(&system_path).unwrap();
    let saved = ConfigDocument::load(&session_path).unwrap();
    assert!(system.validate(ConfigScope::System).is_empty());
    assert!(saved.validate(ConfigScope::Session).is_empty());
    assert_eq!(saved.port.len(), 2);

    let mut second = SessionBuilder::new(layout())
        .system_config(system)
        .session_config(saved)
        .build(ScriptedDevices::new())
        .unwrap();
    assert_eq!(second.binding_config(), first.binding_config());
    assert_eq!(second.port_config(), first.port_config());
    assert_eq!(frame(&mut second, &["IN0", "DSW"]), vec![0x03, 0x00]);

    // The saved coin binding is live
    second.devices_mut().press(InputCode::key(Key::V));
    assert_eq!(frame(&mut second, &["IN0", "DSW"]), vec![0x02, 0x00]);
}

#[test]
fn test_profile_ports_apply_before_session_ports() {
    let mut profile_node = PortNode::new("DSW", 0x03, 0x03);
    profile_node.value = Some(0x01);
    let profile = ConfigDocument {
        port: vec![profile_node],
        ..ConfigDocument::default()
    };
    let mut session_node = PortNode::new("DSW", 0x03, 0x03);
    session_node.value = Some(0x02);
    let session_doc = ConfigDocument {
        port: vec![session_node],
        ..ConfigDocument::default()
    };

    let mut session = SessionBuilder::new(layout())
        .profile(profile)
        .session_config(session_doc)
        .build(ScriptedDevices::new())
        .unwrap();
    assert_eq!(frame(&mut session, &["DSW"]), vec![0x02]);
}

#[test]
fn test_unmatched_port_nodes_are_skipped() {
    let text = r#"
[[port]]
tag = "NOPE"
mask = 1
defvalue = 0
value = 1

[[port]]
tag = "DSW"
mask = 0x03
defvalue = 0x00
value = 0x01
"#;
    let doc = ConfigDocument::from_toml_str(text).unwrap();
    let mut session = SessionBuilder::new(layout())
        .session_config(doc)
        .build(ScriptedDevices::new())
        .unwrap();
    // Neither node matches a field, so DSW keeps its declared default
    assert_eq!(frame(&mut session, &["DSW"]), vec![0x03]);
    assert!(session.port_config().is_empty());
}

#[test]
fn test_profile_bindings_are_not_saved_as_system_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let system_path = scope_path(dir.path(), ConfigScope::System, "");
    let profile = ConfigDocument {
        remap: vec![crate::config::CodeRemap {
            from: InputCode::key(Key::V),
            to: InputCode::key(Key::C),
        }],
        ..ConfigDocument::default()
    };

    let mut with_profile = SessionBuilder::new(layout())
        .system_config(coin_on_v())
        .profile(profile)
        .build(ScriptedDevices::new())
        .unwrap();
    with_profile.devices_mut().press(InputCode::key(Key::C));
    assert_eq!(frame(&mut with_profile, &["IN0"]), vec![0x00]);

    with_profile.binding_config().save(&system_path).unwrap();
    let system = ConfigDocument::load(&system_path).unwrap();
    assert_eq!(system, coin_on_v());

    // Without the profile the coin is back on V
    let mut plain = SessionBuilder::new(layout())
        .system_config(system)
        .build(ScriptedDevices::new())
        .unwrap();
    plain.devices_mut().press(InputCode::key(Key::C));
    assert_eq!(frame(&mut plain, &["IN0"]), vec![0x01]);
    plain.devices_mut().press(InputCode::key(Key::V));
    assert_eq!(frame(&mut plain, &["IN0"]), vec![0x00]);
}
