//! Duplex streaming session
//!
//! One worker thread per running session reads fixed-size blocks and either
//! echoes them to the output or appends them to a capture buffer. The buffer
//! is owned by the worker and comes back through the thread join.

use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::device::{AudioBackend, DeviceDescriptor, DuplexStream, ReadOutcome};
use crate::config::StreamSpec;
use crate::error::AudioError;

/// What a session does with the blocks it reads
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// Echo input blocks to the output device
    Playthrough {
        input: DeviceDescriptor,
        output: DeviceDescriptor,
    },
    /// Accumulate input blocks for writing to disk
    Record { input: DeviceDescriptor },
}

impl SessionMode {
    pub fn input(&self) -> &DeviceDescriptor {
        match self {
            SessionMode::Playthrough { input, .. } | SessionMode::Record { input } => input,
        }
    }

    pub fn output(&self) -> Option<&DeviceDescriptor> {
        match self {
            SessionMode::Playthrough { output, .. } => Some(output),
            SessionMode::Record { .. } => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, SessionMode::Record { .. })
    }

    fn validate(&self) -> Result<(), AudioError> {
        let input = self.input();
        if !input.can_input {
            return Err(AudioError::NotInputCapable(input.name.clone()));
        }
        if let Some(output) = self.output() {
            if !output.can_output {
                return Err(AudioError::NotOutputCapable(output.name.clone()));
            }
        }
        Ok(())
    }
}

/// Summary of one finished session
#[derive(Debug, Default)]
pub struct SessionReport {
    pub blocks: usize,
    /// Blocks read after the driver dropped input
    pub overflowed_blocks: usize,
    /// Set when the stream failed and ended the session early
    pub error: Option<AudioError>,
}

#[derive(Default)]
struct WorkerOutcome {
    report: SessionReport,
    captured: Vec<f32>,
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<WorkerOutcome>,
}

/// Manages one duplex audio connection and its worker thread
pub struct StreamingSession {
    backend: Arc<dyn AudioBackend>,
    spec: StreamSpec,
    worker: Option<Worker>,
    mode: Option<SessionMode>,
    /// Samples from the last record session, until taken
    recording: Vec<f32>,
}

impl StreamingSession {
    pub fn new(backend: Arc<dyn AudioBackend>, spec: StreamSpec) -> Self {
        Self {
            backend,
            spec,
            worker: None,
            mode: None,
            recording: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Mode of the running session
    #[cfg(test)]
    pub fn mode(&self) -> Option<&SessionMode> {
        self.worker.as_ref().and(self.mode.as_ref())
    }

    /// Open the stream and start the processing loop
    ///
    /// Returns once the stream is open. On failure no worker is left behind.
    pub fn start(&mut self, mode: SessionMode) -> Result<(), AudioError> {
        if self.worker.is_some() {
            return Err(AudioError::AlreadyRunning);
        }
        mode.validate()?;

        if mode.is_record() {
            self.recording.clear();
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), AudioError>>(1);

        let backend = self.backend.clone();
        let spec = self.spec;
        let worker_mode = mode.clone();
        let worker_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("audio-session".to_string())
            .spawn(move || {
                let stream =
                    match backend.open_duplex(&spec, worker_mode.input(), worker_mode.output()) {
                        Ok(stream) => {
                            let _ = ready_tx.send(Ok(()));
                            stream
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return WorkerOutcome::default();
                        }
                    };
                run_loop(stream, &spec, worker_mode.is_record(), &worker_stop)
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(
                    "Audio session started ({}) on '{}'",
                    if mode.is_record() { "record" } else { "playthrough" },
                    mode.input().name
                );
                self.worker = Some(Worker { stop, handle });
                self.mode = Some(mode);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::WorkerLost)
            }
        }
    }

    /// Stop the loop and wait for the worker to exit
    ///
    /// Returns `None` without blocking when nothing is running.
    pub fn stop(&mut self) -> Option<SessionReport> {
        let worker = self.worker.take()?;
        worker.stop.store(true, Ordering::Release);

        let outcome = match worker.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Audio worker panicked");
                WorkerOutcome::default()
            }
        };

        let report = outcome.report;
        if report.overflowed_blocks > 0 {
            warn!(
                "Input overflowed in {} of {} blocks; some audio was dropped",
                report.overflowed_blocks, report.blocks
            );
        }
        if let Some(e) = &report.error {
            error!("Audio session ended early: {}", e);
        }

        if self.mode.take().is_some_and(|m| m.is_record()) {
            self.recording = outcome.captured;
        }

        info!("Audio session stopped after {} blocks", report.blocks);
        Some(report)
    }

    /// Hand over the samples captured by the last record session
    pub fn take_recording(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.recording)
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read blocks until `stop` is set or the stream fails
fn run_loop(
    mut stream: Box<dyn DuplexStream>,
    spec: &StreamSpec,
    record: bool,
    stop: &AtomicBool,
) -> WorkerOutcome {
    let timeout = spec.read_timeout();
    let mut block = vec![0.0f32; spec.samples_per_block()];
    let mut outcome = WorkerOutcome::default();

    while !stop.load(Ordering::Acquire) {
        match stream.read(&mut block, timeout) {
            Ok(ReadOutcome::Block { overflowed }) => {
                outcome.report.blocks += 1;
                if overflowed {
                    outcome.report.overflowed_blocks += 1;
                    debug!("Input overflow before block {}", outcome.report.blocks);
                }

                if record {
                    outcome.captured.extend_from_slice(&block);
                } else if let Err(e) = stream.write(&block) {
                    outcome.report.error = Some(e);
                    break;
                }
            }
            Ok(ReadOutcome::TimedOut) => continue,
            Err(e) => {
                outcome.report.error = Some(e);
                break;
            }
        }
    }

    outcome
}
