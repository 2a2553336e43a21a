//! Audio Recorder - live playthrough and recording for the Linux desktop
//!
//! This is the main entry point. Depending on the flags it either talks to a
//! running instance over D-Bus or launches the window.

mod app;
mod audio;
mod cli;
mod config;
mod controller;
mod error;
mod remote;
mod tokio_runtime;

use anyhow::Context as _;
use app::RecorderWindow;
use audio::{AudioBackend, CpalBackend};
use clap::Parser;
use cli::Command;
use controller::Controller;
use gpui::prelude::*;
use gpui::*;
use log::{error, info};
use std::sync::Arc;

const APP_ID: &str = "com.violet.AudioRecorder";

fn main() {
    // Parse command-line arguments and initialize logging
    let args = cli::Args::parse();
    cli::init_logging(&args);

    let result = match args.command() {
        Command::ToggleRecording => toggle_remote(),
        Command::ReloadDevices => reload_remote(),
        Command::ListDevices => {
            list_devices();
            Ok(())
        }
        Command::Launch => launch(&args),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn toggle_remote() -> anyhow::Result<()> {
    let active = tokio_runtime::block_on(remote::request_toggle())??;
    println!("{}", active);
    Ok(())
}

fn reload_remote() -> anyhow::Result<()> {
    tokio_runtime::block_on(remote::request_reload())??;
    Ok(())
}

fn list_devices() {
    let devices = audio::enumerate(&CpalBackend::new());

    println!("Inputs:");
    for device in &devices.inputs {
        println!("  [{}] {}", device.index, device.name);
    }
    println!("Outputs:");
    for device in &devices.outputs {
        let marker = if devices.default_output == Some(device.index) {
            " (default)"
        } else {
            ""
        };
        println!("  [{}] {}{}", device.index, device.name, marker);
    }
}

fn launch(args: &cli::Args) -> anyhow::Result<()> {
    info!("Starting audio recorder");

    tokio_runtime::init().context("Failed to start async runtime")?;

    let backend: Arc<dyn AudioBackend> = Arc::new(CpalBackend::new());
    let controller = Controller::new(backend, &args.recorder_config());
    let handle = controller::spawn(controller).context("Failed to start session controller")?;

    Application::new().run(move |cx: &mut App| {
        // Quit once the window is gone so the controller is shut down with it
        cx.on_window_closed(|cx| {
            if cx.windows().is_empty() {
                cx.quit();
            }
        })
        .detach();

        let bounds = Bounds::centered(None, size(px(420.0), px(620.0)), cx);
        let opened = cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                // No titlebar - we'll draw our own
                titlebar: None,
                // Use client-side decorations so we can draw our own titlebar
                window_decorations: Some(WindowDecorations::Client),
                app_id: Some(APP_ID.to_string()),
                ..Default::default()
            },
            |window, cx| {
                window.set_app_id(APP_ID);
                cx.new(|cx| RecorderWindow::new(handle.clone(), cx))
            },
        );

        if let Err(e) = opened {
            error!("Failed to open window: {:#}", e);
            handle.shutdown();
            cx.quit();
        }
    });

    Ok(())
}
