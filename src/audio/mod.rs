//! Audio devices, duplex streaming and WAV output
//!
//! This module provides:
//! - Device enumeration split by direction
//! - A streaming session running playthrough or record on a worker thread
//! - WAV file recording via hound

mod cpal_backend;
mod device;
mod recorder;
mod session;
#[cfg(test)]
pub mod testing;

pub use cpal_backend::CpalBackend;
pub use device::{enumerate, AudioBackend, DeviceDescriptor, DeviceList};
pub use recorder::WavRecorder;
pub use session::{SessionMode, StreamingSession};
