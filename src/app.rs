//! Main window for the audio recorder

use crate::audio::DeviceDescriptor;
use crate::controller::{ControllerHandle, ControllerState, StatusSnapshot};
use crate::{remote, tokio_runtime};
use gpui::prelude::*;
use gpui::*;
use log::{info, warn};
use std::time::Duration;

/// The root application view
pub struct RecorderWindow {
    controller: ControllerHandle,
    /// Session bus connection serving the remote control, once registered
    remote: Option<zbus::Connection>,
    _ui_refresh_task: Task<()>,
    _remote_task: Option<Task<()>>,
}

impl RecorderWindow {
    pub fn new(controller: ControllerHandle, cx: &mut Context<Self>) -> Self {
        // Poll the controller status; it changes from the D-Bus side too
        let ui_refresh_task = cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            loop {
                cx.background_executor()
                    .timer(Duration::from_millis(50))
                    .await;

                let Some(this) = this.upgrade() else {
                    break;
                };
                let result = cx.update_entity(&this, |_, cx| {
                    cx.notify();
                });
                if result.is_err() {
                    break;
                }
            }
        });

        let remote_task = Self::register_remote(controller.clone(), cx);

        Self {
            controller,
            remote: None,
            _ui_refresh_task: ui_refresh_task,
            _remote_task: remote_task,
        }
    }

    /// Publish the remote control; failure leaves the window fully usable
    fn register_remote(controller: ControllerHandle, cx: &mut Context<Self>) -> Option<Task<()>> {
        let serve = match tokio_runtime::spawn(cx, remote::serve(controller)) {
            Ok(task) => task,
            Err(e) => {
                warn!("Remote control disabled, no async runtime: {}", e);
                return None;
            }
        };

        Some(cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let connection = match serve.await {
                Ok(Ok(connection)) => connection,
                Ok(Err(e)) => {
                    warn!("Remote control disabled, session bus unavailable: {}", e);
                    return;
                }
                Err(e) => {
                    warn!("Remote control registration aborted: {}", e);
                    return;
                }
            };

            let Some(this) = this.upgrade() else {
                return;
            };
            let _ = cx.update_entity(&this, |view, _cx| {
                view.remote = Some(connection);
            });
        }))
    }

    fn close(&mut self, window: &mut Window) {
        info!("Closing window");
        self.controller.shutdown();
        window.remove_window();
    }

    fn render_device_list(
        &self,
        title: &str,
        devices: &[DeviceDescriptor],
        selected: Option<usize>,
        is_input: bool,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let prefix = if is_input { "input" } else { "output" };

        section(
            title,
            div()
                .flex()
                .flex_col()
                .gap_1()
                .when(devices.is_empty(), |el| {
                    el.child(
                        div()
                            .text_sm()
                            .text_color(rgb(0x666666))
                            .child("No devices found"),
                    )
                })
                .children(devices.iter().map(|device| {
                    let index = device.index;
                    let is_selected = selected == Some(index);

                    div()
                        .id(SharedString::from(format!("{}-{}", prefix, index)))
                        .px_3()
                        .py_1()
                        .rounded_md()
                        .bg(if is_selected {
                            rgb(0x2d2d44)
                        } else {
                            rgb(0x1a1a2e)
                        })
                        .text_sm()
                        .text_color(if is_selected {
                            rgb(0xe94560)
                        } else {
                            rgb(0xcccccc)
                        })
                        .cursor_pointer()
                        .hover(|style| style.bg(rgb(0x2d2d44)))
                        .on_click(cx.listener(move |this, _, _w, _cx| {
                            if is_input {
                                this.controller.select_input(index);
                            } else {
                                this.controller.select_output(index);
                            }
                        }))
                        .child(device.name.clone())
                })),
        )
    }

    fn render_controls(&self, status: &StatusSnapshot, cx: &mut Context<Self>) -> impl IntoElement {
        let state = status.state;
        let is_playing = state == ControllerState::Playing;
        let is_hold_recording = state == ControllerState::HoldRecording;
        let is_toggle_recording = status.is_toggle_recording();

        div()
            .flex()
            .flex_col()
            .gap_2()
            .child(
                button("play-button", "Hold to Play", is_playing)
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this, _event: &MouseDownEvent, _w, _cx| {
                            this.controller.start_playback();
                        }),
                    )
                    .on_mouse_up(
                        MouseButton::Left,
                        cx.listener(|this, _event: &MouseUpEvent, _w, _cx| {
                            this.controller.stop_playback();
                        }),
                    )
                    .on_mouse_up_out(
                        MouseButton::Left,
                        cx.listener(|this, _event: &MouseUpEvent, _w, _cx| {
                            this.controller.stop_playback();
                        }),
                    ),
            )
            .child(
                button("hold-record-button", "Hold to Record", is_hold_recording)
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this, _event: &MouseDownEvent, _w, _cx| {
                            this.controller.start_hold_recording();
                        }),
                    )
                    .on_mouse_up(
                        MouseButton::Left,
                        cx.listener(|this, _event: &MouseUpEvent, _w, _cx| {
                            this.controller.release_hold_recording();
                        }),
                    )
                    .on_mouse_up_out(
                        MouseButton::Left,
                        cx.listener(|this, _event: &MouseUpEvent, _w, _cx| {
                            this.controller.release_hold_recording();
                        }),
                    ),
            )
            .child(
                button(
                    "toggle-record-button",
                    if is_toggle_recording {
                        "Stop Recording"
                    } else {
                        "Toggle Recording"
                    },
                    is_toggle_recording,
                )
                .on_click(cx.listener(|this, _, _w, _cx| {
                    this.controller.toggle();
                })),
            )
            .child(
                button("reload-button", "Reload Devices", false).on_click(cx.listener(
                    |this, _, _w, _cx| {
                        this.controller.reload_devices();
                    },
                )),
            )
    }

    fn render_status(&self, status: &StatusSnapshot) -> impl IntoElement {
        let remote_label = if self.remote.is_some() {
            "Remote control: on"
        } else {
            "Remote control: off"
        };

        div()
            .flex()
            .flex_col()
            .gap_1()
            .px_4()
            .py_2()
            .border_t_1()
            .border_color(rgb(0x2d2d44))
            .bg(rgb(0x12121f))
            .child(
                div()
                    .flex()
                    .justify_between()
                    .child(
                        div()
                            .text_sm()
                            .font_weight(FontWeight::SEMIBOLD)
                            .text_color(if status.state.is_recording() {
                                rgb(0xe94560)
                            } else {
                                rgb(0xcccccc)
                            })
                            .child(status.state.label()),
                    )
                    .child(
                        div()
                            .text_xs()
                            .text_color(rgb(0x666666))
                            .child(remote_label),
                    ),
            )
            .when_some(status.last_artifact.clone(), |el, path| {
                el.child(
                    div()
                        .text_xs()
                        .text_color(rgb(0x4CAF50))
                        .child(format!("Saved {}", path.display())),
                )
            })
            .when_some(status.last_error.clone(), |el, err| {
                el.child(div().text_xs().text_color(rgb(0xf44336)).child(err))
            })
    }
}

impl Drop for RecorderWindow {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}

impl Render for RecorderWindow {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let status = self.controller.status();

        div()
            .size_full()
            .flex()
            .flex_col()
            .bg(rgb(0x0f0f1a))
            .key_context("RecorderWindow")
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, _cx| {
                match event.keystroke.key.as_str() {
                    "space" => this.controller.toggle(),
                    "f5" => this.controller.reload_devices(),
                    "escape" => this.controller.stop_recording(),
                    "q" if event.keystroke.modifiers.control => this.close(window),
                    _ => {}
                }
            }))
            // Custom titlebar
            .child(
                div()
                    .id("titlebar")
                    .flex()
                    .items_center()
                    .justify_between()
                    .w_full()
                    .h(px(36.0))
                    .bg(rgb(0x12121f))
                    .border_b_1()
                    .border_color(rgb(0x2d2d44))
                    .child(
                        // Window title (left side) - draggable area
                        div()
                            .id("titlebar-drag-area")
                            .flex()
                            .flex_grow()
                            .items_center()
                            .h_full()
                            .px_4()
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(|_this, _event: &MouseDownEvent, window, _cx| {
                                    window.start_window_move();
                                }),
                            )
                            .child(
                                div()
                                    .text_sm()
                                    .font_weight(FontWeight::SEMIBOLD)
                                    .text_color(rgb(0xcccccc))
                                    .child("Audio Recorder"),
                            ),
                    )
                    .child(
                        // Close button (right side) - NOT draggable
                        div()
                            .id("close-button")
                            .w(px(46.0))
                            .h(px(36.0))
                            .flex()
                            .items_center()
                            .justify_center()
                            .cursor_pointer()
                            .hover(|style| style.bg(rgb(0xe81123)))
                            .on_click(cx.listener(|this, _, window, _cx| {
                                this.close(window);
                            }))
                            .child(div().text_lg().text_color(rgb(0xcccccc)).child("×")),
                    ),
            )
            .child(
                div()
                    .id("content")
                    .flex()
                    .flex_col()
                    .flex_grow()
                    .gap_4()
                    .p_4()
                    .overflow_y_scroll()
                    .child(self.render_device_list(
                        "Input",
                        &status.devices.inputs,
                        status.selected_input,
                        true,
                        cx,
                    ))
                    .child(self.render_device_list(
                        "Output",
                        &status.devices.outputs,
                        status.selected_output,
                        false,
                        cx,
                    ))
                    .child(self.render_controls(&status, cx)),
            )
            .child(self.render_status(&status))
    }
}

fn section(title: &str, content: impl IntoElement) -> impl IntoElement {
    div()
        .flex()
        .flex_col()
        .gap_2()
        .child(
            div()
                .text_base()
                .font_weight(FontWeight::SEMIBOLD)
                .text_color(rgb(0xe94560))
                .child(title.to_string()),
        )
        .child(
            div()
                .p_2()
                .rounded_lg()
                .bg(rgb(0x1a1a2e))
                .border_1()
                .border_color(rgb(0x2d2d44))
                .child(content),
        )
}

fn button(id: &'static str, label: &str, is_active: bool) -> Stateful<Div> {
    div()
        .id(id)
        .px_4()
        .py_2()
        .rounded_md()
        .flex()
        .justify_center()
        .bg(if is_active {
            rgb(0xe94560)
        } else {
            rgb(0x2d2d44)
        })
        .text_sm()
        .font_weight(FontWeight::SEMIBOLD)
        .text_color(rgb(0xffffff))
        .cursor_pointer()
        .hover(|style| style.opacity(0.9))
        .child(label.to_string())
}
