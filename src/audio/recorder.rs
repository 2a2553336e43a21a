//! WAV file recording using hound
//!
//! Writes captured sessions as mono 32-bit float WAV files named after the
//! local time the session was saved.

use chrono::{DateTime, Local};
use hound::{WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::StreamSpec;
use crate::error::ArtifactError;

/// WAV file recorder
pub struct WavRecorder {
    spec: WavSpec,
    recordings_dir: PathBuf,
}

impl WavRecorder {
    /// Create a recorder writing `stream`-formatted float WAVs into `dir`
    pub fn new(dir: impl AsRef<Path>, stream: &StreamSpec) -> Self {
        Self {
            spec: WavSpec {
                channels: stream.channels,
                sample_rate: stream.sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
            recordings_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the recordings directory
    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    /// Path for a recording saved at `timestamp`
    ///
    /// An existing file is never reused; a numeric suffix is appended instead.
    pub fn filename_for(&self, timestamp: DateTime<Local>) -> PathBuf {
        let stem = format!("recording_{}", timestamp.format("%Y%m%d_%H%M%S"));
        let mut path = self.recordings_dir.join(format!("{}.wav", stem));
        let mut suffix = 1;
        while path.exists() {
            path = self.recordings_dir.join(format!("{}_{}.wav", stem, suffix));
            suffix += 1;
        }
        path
    }

    /// Save samples to a new WAV file
    ///
    /// Returns `None` when there is nothing to save.
    pub fn save(&self, samples: &[f32]) -> Result<Option<PathBuf>, ArtifactError> {
        if samples.is_empty() {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.recordings_dir).map_err(|source| {
            ArtifactError::CreateDir {
                path: self.recordings_dir.clone(),
                source,
            }
        })?;

        let path = self.filename_for(Local::now());
        self.write(&path, samples)
            .map_err(|source| ArtifactError::Wav {
                path: path.clone(),
                source,
            })?;

        Ok(Some(path))
    }

    fn write(&self, path: &Path, samples: &[f32]) -> Result<(), hound::Error> {
        let writer = BufWriter::new(File::create(path)?);
        let mut wav_writer = WavWriter::new(writer, self.spec)?;
        for &sample in samples {
            wav_writer.write_sample(sample)?;
        }
        wav_writer.finalize()
    }

    /// Get duration of samples in seconds
    pub fn duration_seconds(&self, sample_count: usize) -> f64 {
        let frames = sample_count / self.spec.channels.max(1) as usize;
        frames as f64 / self.spec.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn recorder(dir: &Path) -> WavRecorder {
        WavRecorder::new(dir, &StreamSpec::default())
    }

    #[test]
    fn test_duration_calculation() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(dir.path());
        assert_eq!(recorder.duration_seconds(44100), 1.0);
        assert_eq!(recorder.duration_seconds(22050), 0.5);
    }

    #[test]
    fn test_filename_uses_local_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(dir.path());
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

        assert_eq!(
            recorder.filename_for(timestamp),
            dir.path().join("recording_20240309_070501.wav")
        );
    }

    #[test]
    fn test_filename_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(dir.path());
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();

        std::fs::write(dir.path().join("recording_20240309_070501.wav"), b"").unwrap();
        std::fs::write(dir.path().join("recording_20240309_070501_1.wav"), b"").unwrap();

        assert_eq!(
            recorder.filename_for(timestamp),
            dir.path().join("recording_20240309_070501_2.wav")
        );
    }

    #[test]
    fn test_empty_recording_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        let recorder = recorder(&out);

        assert!(recorder.save(&[]).unwrap().is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_saved_file_reads_back_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        let recorder = recorder(&out);
        let samples = vec![0.0, 0.25, -0.5, 1.0, f32::MIN_POSITIVE, -1.0];

        let path = recorder.save(&samples).unwrap().unwrap();
        assert_eq!(path.parent(), Some(out.as_path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("recording_") && name.ends_with(".wav"));

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let read: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let recorder = recorder(&blocker);

        assert!(matches!(
            recorder.save(&[0.5]),
            Err(ArtifactError::CreateDir { .. })
        ));
    }
}
