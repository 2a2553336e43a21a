//! Scripted backend for exercising sessions without audio hardware

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::device::{AudioBackend, DeviceDescriptor, DuplexStream, ReadOutcome};
use crate::config::StreamSpec;
use crate::error::AudioError;

pub fn device(index: usize, name: &str, can_input: bool, can_output: bool) -> DeviceDescriptor {
    DeviceDescriptor {
        index,
        name: name.to_string(),
        can_input,
        can_output,
    }
}

/// A tiny block size so tests deal in handfuls of samples
pub fn tiny_spec() -> StreamSpec {
    StreamSpec {
        sample_rate: 44100,
        channels: 1,
        block_frames: 4,
    }
}

/// Observations shared between a test and the streams it caused to be opened
#[derive(Default)]
pub struct Probe {
    opened: AtomicUsize,
    live_streams: AtomicUsize,
    blocks_read: AtomicUsize,
    failures: AtomicUsize,
    written: Mutex<Vec<f32>>,
}

impl Probe {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    pub fn blocks_read(&self) -> usize {
        self.blocks_read.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<f32> {
        self.written.lock().clone()
    }

    /// Wait until `count` blocks in total have been read
    pub fn wait_for_blocks(&self, count: usize) -> bool {
        wait_until(|| self.blocks_read() >= count)
    }

    /// Wait until a stream has returned its scripted failure
    pub fn wait_for_failure(&self) -> bool {
        wait_until(|| self.failures() > 0)
    }
}

fn wait_until(done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        if Instant::now() > deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

/// Backend whose streams produce a fixed number of ramp blocks per session
///
/// Block `k` of a session holds the samples `k * n .. (k + 1) * n` as f32,
/// where `n` is the block length, so captured audio is easy to predict.
pub struct FakeBackend {
    devices: Vec<DeviceDescriptor>,
    default_output: Option<usize>,
    fail_enumeration: bool,
    fail_open: bool,
    blocks_per_session: usize,
    overflow_on_block: Option<usize>,
    fail_after_blocks: Option<usize>,
    probe: Arc<Probe>,
}

impl FakeBackend {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices,
            default_output: None,
            fail_enumeration: false,
            fail_open: false,
            blocks_per_session: 0,
            overflow_on_block: None,
            fail_after_blocks: None,
            probe: Arc::new(Probe::default()),
        }
    }

    /// Mic at index 0, speakers at index 1, speakers as the default output
    pub fn standard() -> Self {
        Self::new(vec![device(0, "Mic", true, false), device(1, "Speakers", false, true)])
            .with_default_output(Some(1))
    }

    pub fn with_default_output(mut self, index: Option<usize>) -> Self {
        self.default_output = index;
        self
    }

    pub fn with_blocks(mut self, blocks: usize) -> Self {
        self.blocks_per_session = blocks;
        self
    }

    pub fn with_overflow_on_block(mut self, block: usize) -> Self {
        self.overflow_on_block = Some(block);
        self
    }

    pub fn with_failure_after_blocks(mut self, blocks: usize) -> Self {
        self.fail_after_blocks = Some(blocks);
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn probe(&self) -> Arc<Probe> {
        self.probe.clone()
    }
}

impl AudioBackend for FakeBackend {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, AudioError> {
        if self.fail_enumeration {
            return Err(AudioError::StreamOpen("driver unavailable".to_string()));
        }
        Ok(self.devices.clone())
    }

    fn default_output(&self) -> Option<usize> {
        self.default_output
    }

    fn open_duplex(
        &self,
        _spec: &StreamSpec,
        input: &DeviceDescriptor,
        _output: Option<&DeviceDescriptor>,
    ) -> Result<Box<dyn DuplexStream>, AudioError> {
        if self.fail_open {
            return Err(AudioError::StreamOpen(format!("{} is busy", input.name)));
        }
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        self.probe.live_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            produced: 0,
            limit: self.blocks_per_session,
            overflow_on_block: self.overflow_on_block,
            fail_after_blocks: self.fail_after_blocks,
            probe: self.probe.clone(),
        }))
    }
}

struct FakeStream {
    produced: usize,
    limit: usize,
    overflow_on_block: Option<usize>,
    fail_after_blocks: Option<usize>,
    probe: Arc<Probe>,
}

impl DuplexStream for FakeStream {
    fn read(&mut self, block: &mut [f32], timeout: Duration) -> Result<ReadOutcome, AudioError> {
        if self.fail_after_blocks == Some(self.produced) {
            self.probe.failures.fetch_add(1, Ordering::SeqCst);
            return Err(AudioError::Stream("device unplugged".to_string()));
        }
        if self.produced >= self.limit {
            thread::sleep(timeout.min(Duration::from_millis(1)));
            return Ok(ReadOutcome::TimedOut);
        }

        let base = self.produced * block.len();
        for (i, sample) in block.iter_mut().enumerate() {
            *sample = (base + i) as f32;
        }
        let overflowed = self.overflow_on_block == Some(self.produced);
        self.produced += 1;
        self.probe.blocks_read.fetch_add(1, Ordering::SeqCst);
        Ok(ReadOutcome::Block { overflowed })
    }

    fn write(&mut self, block: &[f32]) -> Result<(), AudioError> {
        self.probe.written.lock().extend_from_slice(block);
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.probe.live_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The samples a fake session of `blocks` blocks captures
pub fn ramp(blocks: usize, spec: &StreamSpec) -> Vec<f32> {
    (0..blocks * spec.samples_per_block())
        .map(|i| i as f32)
        .collect()
}
