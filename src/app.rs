use std::sync::Arc;

use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use crate::{
    error::Result,
    renderer::{Renderer, logical_extent},
};

const TITLE: &str = "bubbles";

/// Desktop host: one window, both bubble layers.
#[derive(Default)]
pub struct NativeApp<'a> {
    window: Option<Arc<Window>>,
    renderer: Renderer<'a>,
}

impl<'a> NativeApp<'a> {
    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title(TITLE))?,
        );

        let window_size = window.inner_size();
        let scale_factor = window.scale_factor();
        let (width, height) = logical_extent(window_size, scale_factor);
        let surface_texture =
            SurfaceTexture::new(window_size.width, window_size.height, Arc::clone(&window));
        let pixels = Pixels::new(width.max(1), height.max(1), surface_texture)?;

        self.renderer
            .init(window_size, scale_factor, window.clone(), pixels);
        self.window = Some(window);
        Ok(())
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.renderer.teardown();
        event_loop.exit();
    }
}

impl<'a> ApplicationHandler for NativeApp<'a> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_surface(event_loop) {
            error!("Error creating window surface: {e}");
            event_loop.exit();
            return;
        }
        self.renderer.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.renderer.handle_input(&event) {
            return;
        }
        match event {
            WindowEvent::Resized(size) => {
                if let Err(e) = self.renderer.resize(size) {
                    error!("Error resizing: {e}");
                    self.shut_down(event_loop);
                    return;
                }
                self.renderer.request_redraw();
            }
            WindowEvent::CloseRequested => {
                info!("The close button was pressed; stopping");
                self.shut_down(event_loop);
            }
            WindowEvent::RedrawRequested => {
                // Notify that you're about to draw.
                if let Some(window) = self.window.as_ref() {
                    window.pre_present_notify();
                }
                match self.renderer.update_and_draw() {
                    Ok(true) => self.renderer.request_redraw(),
                    Ok(false) => {}
                    Err(e) => {
                        error!("Error drawing frame: {e}");
                        self.shut_down(event_loop);
                    }
                }
            }
            _ => (),
        }
    }
}
