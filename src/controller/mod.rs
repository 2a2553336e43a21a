//! Session controller
//!
//! Owns device selection and the record/playthrough state machine. A single
//! controller lives on its own thread (see [`spawn`]); the window and the
//! D-Bus service talk to it through a [`ControllerHandle`].

mod handle;
mod status;

pub use handle::{spawn, ControllerHandle};
pub use status::{ControllerState, SharedStatus, StatusSnapshot};

use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::{
    enumerate, AudioBackend, DeviceDescriptor, DeviceList, SessionMode, StreamingSession,
    WavRecorder,
};
use crate::config::RecorderConfig;
use crate::error::{ArtifactError, AudioError};

pub struct Controller {
    backend: Arc<dyn AudioBackend>,
    session: StreamingSession,
    recorder: WavRecorder,
    state: ControllerState,
    devices: DeviceList,
    selected_input: Option<usize>,
    selected_output: Option<usize>,
    last_artifact: Option<PathBuf>,
    last_error: Option<String>,
    status: SharedStatus,
}

impl Controller {
    /// Create a controller and populate the device lists
    pub fn new(backend: Arc<dyn AudioBackend>, config: &RecorderConfig) -> Self {
        let mut controller = Self {
            session: StreamingSession::new(backend.clone(), config.stream),
            backend,
            recorder: WavRecorder::new(&config.output_dir, &config.stream),
            state: ControllerState::Idle,
            devices: DeviceList::default(),
            selected_input: None,
            selected_output: None,
            last_artifact: None,
            last_error: None,
            status: SharedStatus::new(),
        };
        info!(
            "Recordings will be written to {}",
            controller.recorder.recordings_dir().display()
        );
        controller.refresh_devices();
        controller
    }

    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    #[cfg(test)]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[cfg(test)]
    pub fn devices(&self) -> &DeviceList {
        &self.devices
    }

    #[cfg(test)]
    pub fn selected_input(&self) -> Option<usize> {
        self.selected_input
    }

    #[cfg(test)]
    pub fn selected_output(&self) -> Option<usize> {
        self.selected_output
    }

    /// True while a toggle-initiated recording is running
    pub fn is_toggle_recording(&self) -> bool {
        self.state == ControllerState::ToggleRecording
    }

    /// Start echoing the selected input to the selected output
    pub fn start_playback(&mut self) -> Result<(), AudioError> {
        if self.state != ControllerState::Idle {
            debug!("Ignoring playback start while {:?}", self.state);
            return Ok(());
        }

        let input = self.input_device()?;
        let output = self
            .selected_output
            .and_then(|index| self.devices.output(index))
            .cloned()
            .ok_or(AudioError::NoOutputSelected)?;

        self.start_session(
            SessionMode::Playthrough { input, output },
            ControllerState::Playing,
        )
    }

    pub fn stop_playback(&mut self) {
        if self.state != ControllerState::Playing {
            return;
        }
        if let Some(failure) = self.end_session() {
            self.last_error = Some(failure);
        }
        self.state = ControllerState::Idle;
        self.publish();
    }

    /// Start recording from the selected input
    ///
    /// A toggle start while toggle recording is already active does nothing.
    pub fn start_recording(&mut self, hold: bool) -> Result<(), AudioError> {
        if !hold && self.is_toggle_recording() {
            return Ok(());
        }
        if self.state != ControllerState::Idle {
            debug!("Ignoring record start while {:?}", self.state);
            return Ok(());
        }

        let input = self.input_device()?;
        let next = if hold {
            ControllerState::HoldRecording
        } else {
            ControllerState::ToggleRecording
        };
        self.start_session(SessionMode::Record { input }, next)
    }

    /// Stop recording and write the captured audio, if any
    ///
    /// The state returns to idle even when writing fails.
    pub fn stop_recording(&mut self) -> Result<Option<PathBuf>, ArtifactError> {
        if !self.state.is_recording() {
            return Ok(None);
        }

        let stream_failure = self.end_session();
        let samples = self.session.take_recording();
        self.state = ControllerState::Idle;
        self.publish();

        let saved = self.recorder.save(&samples);
        match &saved {
            Ok(Some(path)) => {
                info!(
                    "Recording saved to {} ({:.1}s, {} samples)",
                    path.display(),
                    self.recorder.duration_seconds(samples.len()),
                    samples.len()
                );
                self.last_artifact = Some(path.clone());
                self.last_error = stream_failure;
            }
            Ok(None) => {
                debug!("Recording was empty, nothing written");
                if stream_failure.is_some() {
                    self.last_error = stream_failure;
                }
            }
            Err(e) => {
                error!("Failed to save recording: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        self.publish();
        saved
    }

    /// Release of the hold-to-record button; never ends a toggle recording
    pub fn release_hold_recording(&mut self) -> Result<Option<PathBuf>, ArtifactError> {
        if self.state != ControllerState::HoldRecording {
            return Ok(None);
        }
        self.stop_recording()
    }

    /// Start or stop a toggle recording, returning whether one is now active
    pub fn toggle_recording(&mut self) -> bool {
        if !self.is_toggle_recording() {
            if let Err(e) = self.start_recording(false) {
                self.report_error(&e);
            }
        } else {
            // Write failures are already reported; the toggle is off either way
            let _ = self.stop_recording();
        }
        self.is_toggle_recording()
    }

    /// Re-enumerate devices; a running session keeps its devices
    pub fn refresh_devices(&mut self) {
        let devices = enumerate(self.backend.as_ref());

        self.selected_input = self
            .selected_input
            .filter(|index| devices.input(*index).is_some())
            .or_else(|| devices.inputs.first().map(|d| d.index));

        self.selected_output = devices.default_output.or_else(|| {
            self.selected_output
                .filter(|index| devices.output(*index).is_some())
        });

        info!(
            "Found {} input and {} output devices",
            devices.inputs.len(),
            devices.outputs.len()
        );
        self.devices = devices;
        self.publish();
    }

    pub fn select_input(&mut self, index: usize) {
        if self.devices.input(index).is_some() {
            self.selected_input = Some(index);
            self.publish();
        } else {
            warn!("Ignoring selection of unknown input device {}", index);
        }
    }

    pub fn select_output(&mut self, index: usize) {
        if self.devices.output(index).is_some() {
            self.selected_output = Some(index);
            self.publish();
        } else {
            warn!("Ignoring selection of unknown output device {}", index);
        }
    }

    /// Stop whatever is running; a recording in progress is saved
    pub fn shutdown(&mut self) {
        match self.state {
            ControllerState::HoldRecording | ControllerState::ToggleRecording => {
                let _ = self.stop_recording();
            }
            ControllerState::Playing => self.stop_playback(),
            ControllerState::Idle => {}
        }
        self.session.stop();
        info!("Session controller shut down");
    }

    /// Stop the worker, returning a user-facing message if the stream failed
    fn end_session(&mut self) -> Option<String> {
        let report = self.session.stop()?;
        let failure = report.error?;
        Some(format!(
            "Audio stream failed after {} blocks: {}",
            report.blocks, failure
        ))
    }

    fn input_device(&self) -> Result<DeviceDescriptor, AudioError> {
        self.selected_input
            .and_then(|index| self.devices.input(index))
            .cloned()
            .ok_or(AudioError::NoInputSelected)
    }

    fn start_session(
        &mut self,
        mode: SessionMode,
        next: ControllerState,
    ) -> Result<(), AudioError> {
        self.session.start(mode)?;
        self.state = next;
        self.last_error = None;
        self.publish();
        Ok(())
    }

    fn report_error(&mut self, e: &AudioError) {
        error!("Audio session failed to start: {}", e);
        self.last_error = Some(e.to_string());
        self.publish();
    }

    fn publish(&self) {
        self.status.publish(StatusSnapshot {
            state: self.state,
            devices: self.devices.clone(),
            selected_input: self.selected_input,
            selected_output: self.selected_output,
            last_artifact: self.last_artifact.clone(),
            last_error: self.last_error.clone(),
        });
    }
}
