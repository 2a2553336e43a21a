//! D-Bus remote control
//!
//! The running window publishes `com.violet.AudioRecorder` on the session bus.
//! The same binary acts as the client when started with `--toggle-recording`
//! or `--reload-devices`.

use anyhow::Context;
use log::info;
use zbus::{connection, interface, proxy, Connection};

use crate::controller::ControllerHandle;

pub const BUS_NAME: &str = "com.violet.AudioRecorder";
pub const OBJECT_PATH: &str = "/com/violet/AudioRecorder";

/// Object served at [`OBJECT_PATH`]; forwards calls to the controller thread
pub struct RemoteControl {
    controller: ControllerHandle,
}

#[interface(name = "com.violet.AudioRecorder")]
impl RemoteControl {
    /// Start or stop a toggle recording; returns whether recording is now active
    async fn toggle_recording(&self) -> zbus::fdo::Result<bool> {
        self.controller
            .toggle_recording()
            .await
            .map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Re-enumerate audio devices
    async fn reload_devices(&self) {
        self.controller.reload_devices();
    }
}

/// Register the service; the returned connection must be kept alive
pub async fn serve(controller: ControllerHandle) -> zbus::Result<Connection> {
    let connection = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, RemoteControl { controller })?
        .build()
        .await?;
    info!("Remote control registered as {} at {}", BUS_NAME, OBJECT_PATH);
    Ok(connection)
}

#[proxy(
    interface = "com.violet.AudioRecorder",
    default_service = "com.violet.AudioRecorder",
    default_path = "/com/violet/AudioRecorder"
)]
trait AudioRecorder {
    fn toggle_recording(&self) -> zbus::Result<bool>;

    fn reload_devices(&self) -> zbus::Result<()>;
}

async fn proxy() -> anyhow::Result<AudioRecorderProxy<'static>> {
    let connection = Connection::session()
        .await
        .context("Failed to connect to the session bus")?;
    let proxy = AudioRecorderProxy::new(&connection)
        .await
        .context("Failed to create remote control proxy")?;
    Ok(proxy)
}

/// Ask the running instance to toggle recording
pub async fn request_toggle() -> anyhow::Result<bool> {
    proxy()
        .await?
        .toggle_recording()
        .await
        .with_context(|| format!("No audio recorder is answering on {}", BUS_NAME))
}

/// Ask the running instance to reload its device lists
pub async fn request_reload() -> anyhow::Result<()> {
    proxy()
        .await?
        .reload_devices()
        .await
        .with_context(|| format!("No audio recorder is answering on {}", BUS_NAME))
}
