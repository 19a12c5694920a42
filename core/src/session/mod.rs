//! A running machine's view of its controls
//!
//! [`Session`] owns every piece of per-session state: the device layer,
//! the binding table, the port registry and the runtime that drives it,
//! the playback log and the change subscribers. Build one with
//! [`SessionBuilder`] and drive it from the host's frame loop:
//!
//! ```ignore
//! session.on_frame_start();
//! // emulate; the machine reads its ports
//! let value = session.read(port, fraction);
//! session.on_frame_end();
//! for event in session.drain_events() { /* ... */ }
//! ```

mod builder;

use std::io::{Read, Write};

use crate::bindings::BindingTable;
use crate::config::{ConfigDocument, PortNode, SequenceNode};
use crate::input::{InputDevices, SeqType};
use crate::notify::{ChangeNotifier, PortChange, SubscriptionId};
use crate::port::{PortId, PortRegistry};
use crate::replay::{LogError, LogModeConflict, LogReader, LogWriter, PlaybackRecorder, RecorderMode};
use crate::runtime::{FrameScheduler, PortGroupState};

pub use builder::SessionBuilder;

/// Something the host should know about, raised outside the per-frame API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The playback log ran out; frames are live from here on
    PlaybackEnded {
        /// Values read before the log ended
        read: u64,
        reason: String,
    },
    /// Writing the recording failed; recording is off from here on
    RecordingStopped {
        /// Values written before the failure
        written: u64,
        reason: String,
    },
}

impl From<LogError> for SessionEvent {
    fn from(error: LogError) -> Self {
        match error {
            LogError::PlaybackTruncated { read, source } => SessionEvent::PlaybackEnded {
                read,
                reason: source.to_string(),
            },
            LogError::RecordWriteFailure { written, source } => SessionEvent::RecordingStopped {
                written,
                reason: source.to_string(),
            },
        }
    }
}

/// Every piece of control-input state for one running machine
pub struct Session<D: InputDevices> {
    devices: D,
    bindings: BindingTable,
    system_bindings: BindingTable,
    registry: PortRegistry,
    scheduler: FrameScheduler,
    recorder: PlaybackRecorder,
    notifier: ChangeNotifier,
    events: Vec<SessionEvent>,
}

impl<D: InputDevices> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("groups", &self.registry.len())
            .field("recorder", &self.recorder.mode())
            .field("subscribers", &self.notifier.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl<D: InputDevices> Session<D> {
    // ========================================================================
    // Frame hooks
    // ========================================================================

    /// Run edge logic and notify subscribers of changed composites
    pub fn on_frame_start(&mut self) {
        let changes = self.scheduler.on_frame_start(&self.devices);
        for change in changes {
            self.notifier.dispatch(change);
        }
    }

    /// Commit analog motion for the frame that just ended
    pub fn on_frame_end(&mut self) {
        self.scheduler.on_frame_end(&mut self.devices);
    }

    /// Value the machine sees when reading `port` at `fraction` of the frame
    ///
    /// Passes through the playback log. Returns `None` for an unknown port.
    pub fn read(&mut self, port: PortId, fraction: f64) -> Option<u32> {
        let live = self.scheduler.read(port, fraction)?;
        let (value, error) = self.recorder.process(live);
        if let Some(error) = error {
            self.events.push(error.into());
        }
        Some(value)
    }

    /// [`read`](Self::read) by group tag
    pub fn read_tag(&mut self, tag: &str, fraction: f64) -> Option<u32> {
        let port = self.registry.lookup(tag)?;
        self.read(port, fraction)
    }

    /// Events raised since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Playback log
    // ========================================================================

    /// Start recording every read
    ///
    /// Write a [`LogHeader`](crate::replay::LogHeader) through the writer
    /// first if the host wants one. Fails if this session has played back.
    pub fn record(&mut self, writer: impl Write + 'static) -> Result<(), LogModeConflict> {
        self.record_log(LogWriter::new(Box::new(writer)))
    }

    pub fn record_log(&mut self, writer: LogWriter<Box<dyn Write>>) -> Result<(), LogModeConflict> {
        self.recorder.record(writer)?;
        tracing::info!("Recording started");
        Ok(())
    }

    /// Start replaying logged values in place of live reads.
    ///
    /// Fails if this session has recorded.
    pub fn play(&mut self, reader: impl Read + 'static) -> Result<(), LogModeConflict> {
        self.play_log(LogReader::new(Box::new(reader)))
    }

    pub fn play_log(&mut self, reader: LogReader<Box<dyn Read>>) -> Result<(), LogModeConflict> {
        self.recorder.play(reader)?;
        tracing::info!("Playback started");
        Ok(())
    }

    /// Stop recording or playback
    pub fn stop_log(&mut self) {
        self.recorder.stop();
    }

    pub fn log_mode(&self) -> RecorderMode {
        self.recorder.mode()
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Call `callback` whenever bits of `mask` in `port` change at a frame start
    pub fn subscribe(
        &mut self,
        port: PortId,
        mask: u32,
        callback: impl FnMut(PortChange) + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(port, mask, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ========================================================================
    // Inspection and persistence
    // ========================================================================

    pub fn lookup(&self, tag: &str) -> Option<PortId> {
        self.registry.lookup(tag)
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Runtime state of a group
    pub fn group_state(&self, port: PortId) -> Option<&PortGroupState> {
        self.scheduler.group(port)
    }

    /// Composite computed at the last frame start
    pub fn composite(&self, port: PortId) -> Option<u32> {
        self.scheduler.composite(port)
    }

    pub fn devices(&self) -> &D {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut D {
        &mut self.devices
    }

    /// Binding table changes, as a system-scope document
    ///
    /// Profile remaps and defaults are left out; they belong to the profile.
    pub fn binding_config(&self) -> ConfigDocument {
        ConfigDocument::from_binding_diff(&self.system_bindings.diff())
    }

    /// Per-field overrides, as a session-scope document
    ///
    /// Values come from the running fields, so toggles and DIP settings
    /// changed during the session are saved as they stand.
    pub fn port_config(&self) -> ConfigDocument {
        let mut port = Vec::new();
        for (index, group) in self.registry.groups().iter().enumerate() {
            let state = self.scheduler.group(PortId::new(index));
            for (field_index, field) in group.fields().iter().enumerate() {
                let descriptor = field.descriptor();
                let mut node = PortNode::new(group.tag(), descriptor.mask, descriptor.default_value);

                for seq_type in SeqType::ALL {
                    let current = field.sequence(seq_type);
                    if current != field.default_sequence(seq_type) {
                        node.sequence.push(SequenceNode {
                            seq_type,
                            sequence: current.clone(),
                        });
                    }
                }

                let value = state
                    .and_then(|s| s.live_value(field_index))
                    .unwrap_or_else(|| field.value());
                if value != descriptor.default_value & descriptor.mask {
                    node.value = Some(value);
                }

                if let (Some(current), Some(declared)) = (field.analog(), descriptor.analog.as_ref()) {
                    if current.sensitivity != declared.sensitivity {
                        node.sensitivity = Some(current.sensitivity);
                    }
                    if current.delta != declared.delta {
                        node.delta = Some(current.delta);
                    }
                    if current.center_delta != declared.center_delta {
                        node.centerdelta = Some(current.center_delta);
                    }
                    if current.reverse != declared.reverse {
                        node.reverse = Some(current.reverse);
                    }
                }

                if !node.is_empty() {
                    port.push(node);
                }
            }
        }
        ConfigDocument {
            port,
            ..ConfigDocument::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::input::{InputCode, Key, Sequence};
    use crate::port::{ControlDescriptor, ControlType, DescriptorStream};
    use crate::test_utils::ScriptedDevices;

    const A: InputCode = InputCode::key(Key::A);
    const B: InputCode = InputCode::key(Key::B);

    fn layout() -> DescriptorStream {
        DescriptorStream::new()
            .group("IN0")
            .control(ControlDescriptor::new(ControlType::Button(1), 0x01).bind(A))
            .control(ControlDescriptor::new(ControlType::Button(2), 0x02).bind(B).toggle())
            .group("DSW")
            .control(ControlDescriptor::new(ControlType::DipSwitch, 0x03).default_value(0x03))
    }

    fn session() -> Session<ScriptedDevices> {
        SessionBuilder::new(layout())
            .build(ScriptedDevices::new())
            .unwrap()
    }

    #[test]
    fn test_read_by_id_and_tag() {
        let mut session = session();
        let port = session.lookup("IN0").unwrap();
        session.devices_mut().press(A);
        session.on_frame_start();
        assert_eq!(session.read(port, 0.0), Some(0x01));
        assert_eq!(session.read_tag("IN0", 0.0), Some(0x01));
        assert_eq!(session.read_tag("DSW", 0.0), Some(0x03));
        assert_eq!(session.read_tag("NOPE", 0.0), None);
    }

    #[test]
    fn test_notifications_are_edge_triggered() {
        let mut session = session();
        let port = session.lookup("IN0").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.subscribe(port, 0x01, move |change| sink.borrow_mut().push(change.new));

        session.devices_mut().press(A);
        session.on_frame_start();
        session.on_frame_start();
        session.devices_mut().release(A);
        session.on_frame_start();
        assert_eq!(*seen.borrow(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_port_config_saves_live_toggle() {
        let mut session = session();
        assert!(session.port_config().is_empty());

        session.devices_mut().press(B);
        session.on_frame_start();
        let doc = session.port_config();
        assert_eq!(doc.port.len(), 1);
        assert_eq!(doc.port[0].tag, "IN0");
        assert_eq!(doc.port[0].mask, 0x02);
        assert_eq!(doc.port[0].value, Some(0x02));
    }

    #[test]
    fn test_port_config_reapplies() {
        let mut node = PortNode::new("IN0", 0x01, 0);
        node.sequence.push(SequenceNode {
            seq_type: SeqType::Standard,
            sequence: Sequence::single(InputCode::key(Key::C)),
        });
        let mut dip = PortNode::new("DSW", 0x03, 0x03);
        dip.value = Some(0x01);
        let doc = ConfigDocument {
            port: vec![node, dip],
            ..ConfigDocument::default()
        };

        let mut session = SessionBuilder::new(layout())
            .session_config(doc.clone())
            .build(ScriptedDevices::new())
            .unwrap();
        assert_eq!(session.port_config(), doc);
        assert_eq!(session.read_tag("DSW", 0.0), Some(0x01));
    }

    #[test]
    fn test_truncated_playback_raises_event() {
        let mut session = session();
        session.play(std::io::Cursor::new(vec![0x01, 0, 0, 0])).unwrap();
        assert_eq!(session.read_tag("IN0", 0.0), Some(0x01));
        assert!(session.drain_events().is_empty());

        assert_eq!(session.read_tag("IN0", 0.0), Some(0x00));
        let events = session.drain_events();
        assert!(matches!(events[..], [SessionEvent::PlaybackEnded { read: 1, .. }]));
        assert_eq!(session.log_mode(), RecorderMode::Idle);
        assert!(session.drain_events().is_empty());
    }
}
