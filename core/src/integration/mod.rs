//! Integration tests for the port engine
//!
//! Drive whole sessions through the frame hooks: composition with the
//! builtin bindings, conditions and joysticks, playback logs and
//! configuration persistence.

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod frame_tests;

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::input::InputDevices;
    use crate::port::DescriptorStream;
    use crate::session::{Session, SessionBuilder};
    use crate::test_utils::ScriptedDevices;

    /// Build a session over scripted devices, panicking on configuration errors
    pub fn scripted_session(layout: DescriptorStream) -> Session<ScriptedDevices> {
        SessionBuilder::new(layout)
            .build(ScriptedDevices::new())
            .unwrap()
    }

    /// Run one frame and read every listed group at the start of it
    pub fn frame<D: InputDevices>(session: &mut Session<D>, tags: &[&str]) -> Vec<u32> {
        session.on_frame_start();
        let values = tags
            .iter()
            .map(|tag| session.read_tag(tag, 0.0).unwrap())
            .collect();
        session.on_frame_end();
        values
    }
}
