use std::sync::Arc;

use log::{debug, info};
use pixels::Pixels;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent},
    window::Window,
};

use crate::{
    bubble::Rgba,
    config::{SimulationConfig, Viewport},
    draw::Canvas,
    error::{Error, Result},
    scene::{ContentPanel, Scene},
    tasks::{FrameHandle, FrameLoop},
    vectors::Vector2D,
};

const FPS_LOG_INTERVAL: u64 = 600;
const CONTENT_COLOR: Rgba = Rgba::new(250, 250, 250, 0.85);

fn default_scene(viewport: Viewport) -> Scene {
    Scene::new(viewport, SimulationConfig::default()).with_panel(ContentPanel::centered(
        0.6,
        0.5,
        CONTENT_COLOR,
    ))
}

/// Pixel-buffer extent for a surface: the surface size in logical pixels.
/// Bubbles, breakpoints and pointer positions all live in this space; pixels
/// scales the buffer up to the physical surface.
pub fn logical_extent(size: PhysicalSize<u32>, scale_factor: f64) -> (u32, u32) {
    let logical = size.to_logical::<f64>(scale_factor);
    (logical.width.round() as u32, logical.height.round() as u32)
}

/// Drives a [`Scene`] against a window and its pixel buffer. Shared by the
/// native and web entry points.
pub struct Renderer<'a> {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'a>>,
    scene: Scene,
    scale_factor: f64,
    frame_loop: Option<FrameLoop>,
    frame_handle: Option<FrameHandle>,
    fps: f32,
    frame_times: Vec<f32>,
}

impl<'a> Default for Renderer<'a> {
    fn default() -> Self {
        Self {
            window: None,
            pixels: None,
            scene: default_scene(Viewport::default()),
            scale_factor: 1.0,
            frame_loop: None,
            frame_handle: None,
            fps: 0.0,
            frame_times: Vec::with_capacity(100),
        }
    }
}

impl<'a> Renderer<'a> {
    /// `pixels` must have been built with a buffer of
    /// [`logical_extent`]`(size, scale_factor)` over a surface of `size`.
    pub fn init(
        &mut self,
        size: PhysicalSize<u32>,
        scale_factor: f64,
        window: Arc<Window>,
        pixels: Pixels<'a>,
    ) {
        let (width, height) = logical_extent(size, scale_factor);
        info!(
            "mounting bubble layers at {width}x{height} (surface {}x{}, scale {scale_factor})",
            size.width, size.height
        );
        self.scale_factor = scale_factor;
        self.scene = default_scene(Viewport::new(width as f32, height as f32));
        self.pixels = Some(pixels);
        self.window = Some(window);

        let (frame_loop, frame_handle) = FrameLoop::start();
        self.frame_loop = Some(frame_loop);
        self.frame_handle = Some(frame_handle);
    }

    pub(crate) fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Takes effect for the pointer right away and for the buffer on the
    /// next [`Renderer::resize`], which winit sends after a scale change.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    pub fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    /// `size` is the new physical surface size.
    pub fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        let (width, height) = logical_extent(size, self.scale_factor);
        // A zero-sized surface is rejected by pixels; keep the old buffer
        // and let the scene shrink to nothing.
        if width > 0 && height > 0 {
            if let Some(pixels) = self.pixels.as_mut() {
                pixels.resize_surface(size.width, size.height)?;
                pixels.resize_buffer(width, height)?;
            }
        }
        self.scene
            .resize(Viewport::new(width as f32, height as f32));
        Ok(())
    }

    /// Feeds pointer, touch and click events to the scene. Returns whether
    /// the event was consumed.
    pub fn handle_input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let at = position.to_logical::<f32>(self.scale_factor);
                self.scene
                    .pointer_mut()
                    .pointer_moved(Vector2D::new(at.x, at.y));
                true
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
                false
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let at = self.scene.pointer().position();
                self.scene.click(at);
                true
            }
            WindowEvent::Touch(Touch {
                phase, location, id, ..
            }) => {
                let location = location.to_logical::<f32>(self.scale_factor);
                let at = Vector2D::new(location.x, location.y);
                let pointer = self.scene.pointer_mut();
                match phase {
                    TouchPhase::Started => {
                        // a tap on a bubble pops it, like a click
                        if pointer.touch_started(*id, at) {
                            self.scene.click(at);
                        }
                    }
                    TouchPhase::Moved => pointer.touch_moved(*id, at),
                    TouchPhase::Ended | TouchPhase::Cancelled => pointer.touch_ended(*id),
                }
                true
            }
            _ => false,
        }
    }

    /// Runs one animation frame. Returns `Ok(false)` once the frame loop has
    /// been cancelled, in which case no further redraw should be requested.
    pub fn update_and_draw(&mut self) -> Result<bool> {
        let Some(tick) = self.frame_loop.as_mut().and_then(FrameLoop::next_frame) else {
            return Ok(false);
        };
        self.scene.update(tick.elapsed);
        self.update_fps(tick.delta.as_secs_f32());
        if tick.frame > 0 && tick.frame % FPS_LOG_INTERVAL == 0 {
            debug!(
                "frame {}: {:.1} fps, {} bubbles",
                tick.frame,
                self.fps,
                self.scene.bubble_count()
            );
        }

        let pixels = self.pixels.as_mut().ok_or(Error::NotInitialized)?;
        let texture = pixels.texture();
        let (width, height) = (texture.width() as usize, texture.height() as usize);
        let mut canvas = Canvas::new(pixels.frame_mut(), width, height);
        self.scene.draw(&mut canvas);

        pixels.render()?;
        Ok(true)
    }

    /// Cancels the frame loop and every pending respawn.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.frame_handle.take() {
            handle.cancel();
        }
        self.scene.shutdown();
        info!("bubble layers torn down");
    }

    fn update_fps(&mut self, frame_time: f32) {
        self.frame_times.push(frame_time);

        if self.frame_times.len() > 100 {
            self.frame_times.remove(0);
        }

        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.fps = if avg_frame_time > 0.0 {
            1.0 / avg_frame_time
        } else {
            0.0
        };
    }
}
