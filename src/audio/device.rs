//! Audio endpoint descriptors and the backend seam

use log::warn;
use std::time::Duration;

use crate::config::StreamSpec;
use crate::error::AudioError;

/// Represents an audio endpoint reported by the host driver
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Position in the driver's device enumeration
    pub index: usize,
    pub name: String,
    pub can_input: bool,
    pub can_output: bool,
}

/// Input- and output-capable devices as seen at one refresh
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceList {
    pub inputs: Vec<DeviceDescriptor>,
    pub outputs: Vec<DeviceDescriptor>,
    /// Index of the driver's default output, if it is among `outputs`
    pub default_output: Option<usize>,
}

impl DeviceList {
    pub fn input(&self, index: usize) -> Option<&DeviceDescriptor> {
        self.inputs.iter().find(|d| d.index == index)
    }

    pub fn output(&self, index: usize) -> Option<&DeviceDescriptor> {
        self.outputs.iter().find(|d| d.index == index)
    }
}

/// Result of one bounded-blocking read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The block was filled; `overflowed` is set when input was dropped since the last read
    Block { overflowed: bool },
    /// No full block arrived before the timeout
    TimedOut,
}

/// An open duplex connection, used only from the session worker thread
pub trait DuplexStream {
    /// Fill `block` with the next samples, waiting at most `timeout`.
    fn read(&mut self, block: &mut [f32], timeout: Duration) -> Result<ReadOutcome, AudioError>;

    /// Queue `block` for playback on the output side.
    fn write(&mut self, block: &[f32]) -> Result<(), AudioError>;
}

/// Host audio driver: device enumeration and stream opening
pub trait AudioBackend: Send + Sync {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, AudioError>;

    fn default_output(&self) -> Option<usize>;

    /// Open a stream on the calling thread. `output` is `None` for capture-only sessions.
    fn open_duplex(
        &self,
        spec: &StreamSpec,
        input: &DeviceDescriptor,
        output: Option<&DeviceDescriptor>,
    ) -> Result<Box<dyn DuplexStream>, AudioError>;
}

/// Enumerate devices, splitting them by direction
///
/// Never fails: a driver error is logged and yields an empty list.
pub fn enumerate(backend: &dyn AudioBackend) -> DeviceList {
    let devices = match backend.devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate audio devices: {}", e);
            Vec::new()
        }
    };

    let inputs: Vec<_> = devices.iter().filter(|d| d.can_input).cloned().collect();
    let outputs: Vec<_> = devices.into_iter().filter(|d| d.can_output).collect();
    let default_output = backend
        .default_output()
        .filter(|index| outputs.iter().any(|d| d.index == *index));

    DeviceList {
        inputs,
        outputs,
        default_output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{device, FakeBackend};

    #[test]
    fn test_enumerate_splits_by_direction() {
        let backend = FakeBackend::new(vec![
            device(0, "Mic", true, false),
            device(1, "Headset", true, true),
            device(2, "Speakers", false, true),
        ])
        .with_default_output(Some(2));

        let list = enumerate(&backend);
        let names = |v: &[DeviceDescriptor]| v.iter().map(|d| d.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&list.inputs), vec!["Mic", "Headset"]);
        assert_eq!(names(&list.outputs), vec!["Headset", "Speakers"]);
        assert_eq!(list.default_output, Some(2));
    }

    #[test]
    fn test_enumerate_empty_device_set() {
        let backend = FakeBackend::new(Vec::new()).with_default_output(None);
        let list = enumerate(&backend);
        assert!(list.inputs.is_empty());
        assert!(list.outputs.is_empty());
        assert_eq!(list.default_output, None);
    }

    #[test]
    fn test_default_output_must_be_output_capable() {
        let backend =
            FakeBackend::new(vec![device(0, "Mic", true, false)]).with_default_output(Some(0));
        assert_eq!(enumerate(&backend).default_output, None);
    }

    #[test]
    fn test_enumeration_error_yields_empty_list() {
        let backend = FakeBackend::new(vec![device(0, "Mic", true, false)]).failing_enumeration();
        assert_eq!(enumerate(&backend), DeviceList::default());
    }
}
