//! Fixed stream format and recorder configuration
//!
//! Nothing here is persisted; the output directory comes from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 44100;
pub const CHANNELS: u16 = 1;
pub const BLOCK_FRAMES: usize = 1024;
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Audio stream configuration shared by the session and the artifact writer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames exchanged per read/write call
    pub block_frames: usize,
}

impl StreamSpec {
    /// Number of interleaved f32 samples in one block
    pub fn samples_per_block(&self) -> usize {
        self.block_frames * self.channels as usize
    }

    /// Wall-clock length of one block
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_frames as f64 / self.sample_rate as f64)
    }

    /// Upper bound for a single blocking read before the stop flag is rechecked
    pub fn read_timeout(&self) -> Duration {
        self.block_duration() * 2
    }
}

impl Default for StreamSpec {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            block_frames: BLOCK_FRAMES,
        }
    }
}

/// Everything the session controller needs to know at startup
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    pub stream: StreamSpec,
    pub output_dir: PathBuf,
}

impl RecorderConfig {
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            stream: StreamSpec::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_mono_44k_1024() {
        let spec = StreamSpec::default();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.samples_per_block(), 1024);
    }

    #[test]
    fn test_block_duration() {
        let spec = StreamSpec {
            sample_rate: 1000,
            channels: 1,
            block_frames: 250,
        };
        assert_eq!(spec.block_duration(), Duration::from_millis(250));
        assert_eq!(spec.read_timeout(), Duration::from_millis(500));
    }
}
