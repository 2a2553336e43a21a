//! Command-line interface for the audio recorder
//!
//! Handles argument parsing and logging configuration.

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::{RecorderConfig, DEFAULT_OUTPUT_DIR};

/// Audio recorder with live playthrough and D-Bus remote control
#[derive(Parser, Debug)]
#[command(name = "audio-recorder")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace, -vvvv = all deps
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Toggle recording in the running instance and print the new state
    #[arg(long, conflicts_with_all = ["reload_devices", "list_devices"])]
    pub toggle_recording: bool,

    /// Ask the running instance to re-enumerate audio devices
    #[arg(long, conflicts_with = "list_devices")]
    pub reload_devices: bool,

    /// Print the available audio devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Directory recordings are written to
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

/// What the process should do after parsing arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleRecording,
    ReloadDevices,
    ListDevices,
    Launch,
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    pub fn command(&self) -> Command {
        if self.toggle_recording {
            Command::ToggleRecording
        } else if self.reload_devices {
            Command::ReloadDevices
        } else if self.list_devices {
            Command::ListDevices
        } else {
            Command::Launch
        }
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig::default().with_output_dir(&self.output_dir)
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);

    builder.filter_module("audio_recorder", args.log_level());

    // GUI, audio and bus internals only at -vvvv
    if args.verbose >= 4 {
        builder.filter_module("gpui", args.log_level());
        builder.filter_module("zbus", args.log_level());
        builder.filter_module("cpal", args.log_level());
    }

    builder.format_timestamp_millis().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_launch_the_window() {
        let args = Args::parse_from(["audio-recorder"]);
        assert_eq!(args.command(), Command::Launch);
        assert_eq!(args.output_dir, PathBuf::from("data"));
        assert_eq!(args.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_toggle_flag_selects_remote_toggle() {
        let args = Args::parse_from(["audio-recorder", "--toggle-recording"]);
        assert_eq!(args.command(), Command::ToggleRecording);
    }

    #[test]
    fn test_toggle_conflicts_with_reload() {
        let result =
            Args::try_parse_from(["audio-recorder", "--toggle-recording", "--reload-devices"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["audio-recorder", "-vv"]);
        assert_eq!(args.log_level(), LevelFilter::Debug);

        let args = Args::parse_from(["audio-recorder", "-vvv", "--quiet"]);
        assert_eq!(args.log_level(), LevelFilter::Error);
    }

    #[test]
    fn test_output_dir_flows_into_config() {
        let args = Args::parse_from(["audio-recorder", "--output-dir", "/tmp/takes"]);
        assert_eq!(
            args.recorder_config().output_dir,
            PathBuf::from("/tmp/takes")
        );
    }
}
