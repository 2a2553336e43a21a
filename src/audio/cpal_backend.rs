//! Host audio through cpal
//!
//! cpal streams are callback driven. The callbacks push into bounded queues
//! so the session worker can treat the pair as a blocking duplex stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{error, trace, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::device::{AudioBackend, DeviceDescriptor, DuplexStream, ReadOutcome};
use crate::config::StreamSpec;
use crate::error::AudioError;

/// Callback chunks buffered between the input callback and the worker
const CAPTURE_QUEUE_CHUNKS: usize = 64;
/// Blocks buffered ahead of the output callback; keeps playthrough latency bounded
const PLAYBACK_QUEUE_BLOCKS: usize = 2;

/// The default cpal host
#[derive(Clone, Copy, Debug, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    fn find_device(&self, descriptor: &DeviceDescriptor) -> Result<cpal::Device, AudioError> {
        let devices = cpal::default_host().devices()?;
        pick_device(devices, descriptor, device_name)
    }
}

fn device_name(index: usize, device: &cpal::Device) -> String {
    device
        .name()
        .unwrap_or_else(|_| format!("Unknown device {}", index))
}

/// The device at `descriptor.index`, as long as it is still the one that was listed
///
/// Hotplug between a refresh and a session start shifts indexes.
fn pick_device<D>(
    devices: impl IntoIterator<Item = D>,
    descriptor: &DeviceDescriptor,
    name_of: impl Fn(usize, &D) -> String,
) -> Result<D, AudioError> {
    let device = devices
        .into_iter()
        .nth(descriptor.index)
        .ok_or(AudioError::DeviceNotFound(descriptor.index))?;

    let name = name_of(descriptor.index, &device);
    if name != descriptor.name {
        warn!(
            "Device {} is now '{}', expected '{}'; reload devices",
            descriptor.index, name, descriptor.name
        );
        return Err(AudioError::DeviceNotFound(descriptor.index));
    }
    Ok(device)
}

fn describe(index: usize, device: &cpal::Device) -> DeviceDescriptor {
    let name = device_name(index, device);
    let can_input = device
        .supported_input_configs()
        .map(|mut configs| configs.next().is_some())
        .unwrap_or(false);
    let can_output = device
        .supported_output_configs()
        .map(|mut configs| configs.next().is_some())
        .unwrap_or(false);

    DeviceDescriptor {
        index,
        name,
        can_input,
        can_output,
    }
}

impl AudioBackend for CpalBackend {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, AudioError> {
        let host = cpal::default_host();
        Ok(host
            .devices()?
            .enumerate()
            .map(|(index, device)| describe(index, &device))
            .collect())
    }

    fn default_output(&self) -> Option<usize> {
        let host = cpal::default_host();
        let default_name = host.default_output_device()?.name().ok()?;
        host.devices()
            .ok()?
            .position(|d| d.name().is_ok_and(|n| n == default_name))
    }

    fn open_duplex(
        &self,
        spec: &StreamSpec,
        input: &DeviceDescriptor,
        output: Option<&DeviceDescriptor>,
    ) -> Result<Box<dyn DuplexStream>, AudioError> {
        let config = StreamConfig {
            channels: spec.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (error_tx, error_rx) = bounded::<String>(4);

        // Input side
        let input_device = self.find_device(input)?;
        let (captured_tx, captured_rx) = bounded::<Vec<f32>>(CAPTURE_QUEUE_CHUNKS);
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflow_flag = overflowed.clone();
        let input_errors = error_tx.clone();

        let input_stream = input_device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if captured_tx.try_send(data.to_vec()).is_err() {
                    overflow_flag.store(true, Ordering::Relaxed);
                }
            },
            move |err| {
                error!("Input stream error: {}", err);
                let _ = input_errors.try_send(err.to_string());
            },
            None,
        )?;

        // Output side, playthrough only
        let (output_stream, playback) = match output {
            Some(descriptor) => {
                let output_device = self.find_device(descriptor)?;
                let (playback_tx, playback_rx) = bounded::<Vec<f32>>(PLAYBACK_QUEUE_BLOCKS);
                let mut current: Vec<f32> = Vec::new();
                let mut position = 0;

                let stream = output_device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for sample in data.iter_mut() {
                            if position >= current.len() {
                                match playback_rx.try_recv() {
                                    Ok(block) => {
                                        current = block;
                                        position = 0;
                                    }
                                    Err(_) => {
                                        // Underrun - output silence
                                        *sample = 0.0;
                                        continue;
                                    }
                                }
                            }
                            *sample = current[position];
                            position += 1;
                        }
                    },
                    move |err| {
                        error!("Output stream error: {}", err);
                        let _ = error_tx.try_send(err.to_string());
                    },
                    None,
                )?;
                stream.play()?;
                (Some(stream), Some(playback_tx))
            }
            None => (None, None),
        };

        input_stream.play()?;

        Ok(Box::new(CpalDuplex {
            _input: input_stream,
            _output: output_stream,
            capture: CaptureQueue::new(captured_rx, overflowed, error_rx),
            playback,
        }))
    }
}

/// Callback chunks reassembled into fixed-size blocks
struct CaptureQueue {
    chunks: Receiver<Vec<f32>>,
    /// Samples received but not yet handed out as a full block
    pending: VecDeque<f32>,
    overflowed: Arc<AtomicBool>,
    errors: Receiver<String>,
}

impl CaptureQueue {
    fn new(
        chunks: Receiver<Vec<f32>>,
        overflowed: Arc<AtomicBool>,
        errors: Receiver<String>,
    ) -> Self {
        Self {
            chunks,
            pending: VecDeque::new(),
            overflowed,
            errors,
        }
    }

    /// Fill `block` completely, or time out keeping what has arrived so far
    fn read(&mut self, block: &mut [f32], timeout: Duration) -> Result<ReadOutcome, AudioError> {
        if let Ok(message) = self.errors.try_recv() {
            return Err(AudioError::Stream(message));
        }

        let deadline = Instant::now() + timeout;
        while self.pending.len() < block.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.chunks.recv_timeout(remaining) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(ReadOutcome::TimedOut),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AudioError::Stream("input stream closed".to_string()))
                }
            }
        }

        let len = block.len();
        for (dst, src) in block.iter_mut().zip(self.pending.drain(..len)) {
            *dst = src;
        }

        Ok(ReadOutcome::Block {
            overflowed: self.overflowed.swap(false, Ordering::Relaxed),
        })
    }
}

/// An input stream and an optional output stream bridged by queues
struct CpalDuplex {
    _input: cpal::Stream,
    _output: Option<cpal::Stream>,
    capture: CaptureQueue,
    playback: Option<Sender<Vec<f32>>>,
}

impl DuplexStream for CpalDuplex {
    fn read(&mut self, block: &mut [f32], timeout: Duration) -> Result<ReadOutcome, AudioError> {
        self.capture.read(block, timeout)
    }

    fn write(&mut self, block: &[f32]) -> Result<(), AudioError> {
        let Some(playback) = &self.playback else {
            return Err(AudioError::Stream("stream has no output side".to_string()));
        };
        if playback.try_send(block.to_vec()).is_err() {
            trace!("Playback queue full, dropping block");
        }
        Ok(())
    }
}
