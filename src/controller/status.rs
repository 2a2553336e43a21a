//! Controller state as seen by the UI

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::DeviceList;

/// Which session, if any, the controller is running
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    #[default]
    Idle,
    /// Recording while the hold button is pressed
    HoldRecording,
    /// Recording started by a toggle, from the window or over D-Bus
    ToggleRecording,
    /// Input echoed to the output while the play button is pressed
    Playing,
}

impl ControllerState {
    pub fn is_recording(&self) -> bool {
        matches!(
            self,
            ControllerState::HoldRecording | ControllerState::ToggleRecording
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControllerState::Idle => "Idle",
            ControllerState::HoldRecording => "Recording (hold)",
            ControllerState::ToggleRecording => "Recording",
            ControllerState::Playing => "Playing through",
        }
    }
}

/// Snapshot published after every processed intent
#[derive(Clone, Debug, Default)]
pub struct StatusSnapshot {
    pub state: ControllerState,
    pub devices: DeviceList,
    pub selected_input: Option<usize>,
    pub selected_output: Option<usize>,
    pub last_artifact: Option<PathBuf>,
    pub last_error: Option<String>,
}

impl StatusSnapshot {
    pub fn is_toggle_recording(&self) -> bool {
        self.state == ControllerState::ToggleRecording
    }
}

/// Shared status - written by the controller thread, read by the window
#[derive(Clone, Default)]
pub struct SharedStatus {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> StatusSnapshot {
        self.inner.lock().clone()
    }

    pub(super) fn publish(&self, snapshot: StatusSnapshot) {
        *self.inner.lock() = snapshot;
    }
}
