//! Intent queue in front of the controller thread
//!
//! The window and the D-Bus service never touch the controller directly. They
//! enqueue intents, which the controller thread applies one at a time.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, warn};
use std::thread;
use tokio::sync::oneshot;

use super::{Controller, SharedStatus, StatusSnapshot};
use crate::error::ControllerError;

/// A request for the controller thread
#[derive(Debug)]
pub enum Intent {
    StartPlayback,
    StopPlayback,
    StartRecording { hold: bool },
    /// Ends a recording of either kind
    StopRecording,
    ReleaseHoldRecording,
    /// `reply` receives the resulting toggle state
    ToggleRecording { reply: Option<oneshot::Sender<bool>> },
    ReloadDevices,
    SelectInput(usize),
    SelectOutput(usize),
    /// `done` is signalled once the session has stopped
    Shutdown { done: Sender<()> },
}

/// Cloneable sender side of the controller thread
#[derive(Clone)]
pub struct ControllerHandle {
    intents: Sender<Intent>,
    status: SharedStatus,
}

/// Move `controller` onto its own thread
pub fn spawn(controller: Controller) -> std::io::Result<ControllerHandle> {
    let (intents, receiver) = unbounded();
    let status = controller.status();

    thread::Builder::new()
        .name("session-controller".to_string())
        .spawn(move || run(controller, receiver))?;

    Ok(ControllerHandle { intents, status })
}

fn run(mut controller: Controller, receiver: Receiver<Intent>) {
    for intent in receiver.iter() {
        debug!("Applying {:?}", intent);
        match intent {
            Intent::StartPlayback => {
                if let Err(e) = controller.start_playback() {
                    controller.report_error(&e);
                }
            }
            Intent::StopPlayback => controller.stop_playback(),
            Intent::StartRecording { hold } => {
                if let Err(e) = controller.start_recording(hold) {
                    controller.report_error(&e);
                }
            }
            Intent::StopRecording => {
                let _ = controller.stop_recording();
            }
            Intent::ReleaseHoldRecording => {
                let _ = controller.release_hold_recording();
            }
            Intent::ToggleRecording { reply } => {
                let active = controller.toggle_recording();
                if let Some(reply) = reply {
                    let _ = reply.send(active);
                }
            }
            Intent::ReloadDevices => controller.refresh_devices(),
            Intent::SelectInput(index) => controller.select_input(index),
            Intent::SelectOutput(index) => controller.select_output(index),
            Intent::Shutdown { done } => {
                controller.shutdown();
                let _ = done.send(());
                return;
            }
        }
    }

    // Every handle is gone
    controller.shutdown();
}

impl ControllerHandle {
    /// Latest published controller status
    pub fn status(&self) -> StatusSnapshot {
        self.status.get()
    }

    pub fn send(&self, intent: Intent) -> Result<(), ControllerError> {
        self.intents
            .send(intent)
            .map_err(|_| ControllerError::Disconnected)
    }

    fn post(&self, intent: Intent) {
        if let Err(e) = self.send(intent) {
            warn!("Dropping intent: {}", e);
        }
    }

    pub fn start_playback(&self) {
        self.post(Intent::StartPlayback);
    }

    pub fn stop_playback(&self) {
        self.post(Intent::StopPlayback);
    }

    pub fn start_hold_recording(&self) {
        self.post(Intent::StartRecording { hold: true });
    }

    pub fn release_hold_recording(&self) {
        self.post(Intent::ReleaseHoldRecording);
    }

    pub fn stop_recording(&self) {
        self.post(Intent::StopRecording);
    }

    pub fn reload_devices(&self) {
        self.post(Intent::ReloadDevices);
    }

    pub fn select_input(&self, index: usize) {
        self.post(Intent::SelectInput(index));
    }

    pub fn select_output(&self, index: usize) {
        self.post(Intent::SelectOutput(index));
    }

    /// Toggle without waiting for the result
    pub fn toggle(&self) {
        self.post(Intent::ToggleRecording { reply: None });
    }

    /// Toggle and wait for the resulting toggle state
    pub async fn toggle_recording(&self) -> Result<bool, ControllerError> {
        let (reply, result) = oneshot::channel();
        self.send(Intent::ToggleRecording { reply: Some(reply) })?;
        result.await.map_err(|_| ControllerError::Disconnected)
    }

    /// Stop any running session and the controller thread, blocking until done
    pub fn shutdown(&self) {
        let (done, finished) = bounded(1);
        if self.send(Intent::Shutdown { done }).is_ok() {
            let _ = finished.recv();
        }
    }
}
