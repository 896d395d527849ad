use std::sync::Arc;

use crate::error::Error;
use crate::renderer::Renderer;
use log::{error, info, warn};
use pixels::wgpu::{DeviceDescriptor, Features, Limits, PowerPreference, RequestAdapterOptions};
use pixels::{PixelsBuilder, SurfaceTexture, wgpu::Backends};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use winit::platform::web::WindowExtWebSys;
use winit::{application::ApplicationHandler, event::WindowEvent, window::Window};
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event_loop::{ControlFlow, EventLoop},
};

const FALLBACK_SIZE: LogicalSize<u32> = LogicalSize::new(1024, 768);

fn to_js(e: Error) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Browser viewport in CSS pixels, or the fallback before layout.
fn viewport_size() -> LogicalSize<u32> {
    let Some(win) = web_sys::window() else {
        return FALLBACK_SIZE;
    };
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).map(|v| v as u32)
    };
    match (dimension(win.inner_width()), dimension(win.inner_height())) {
        (Some(width), Some(height)) if width > 0 && height > 0 => LogicalSize::new(width, height),
        _ => FALLBACK_SIZE,
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    spawn_local(async {
        if let Err(e) = run().await {
            web_sys::console::error_1(&e);
        }
    });
}

#[wasm_bindgen]
pub async fn run() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger already initialized: {e}").into());
    }

    info!("setting up event loop");

    let event_loop = EventLoop::new().map_err(|e| to_js(e.into()))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    #[allow(deprecated)]
    let window = Arc::new(
        event_loop
            .create_window(Window::default_attributes())
            .map_err(|e| to_js(e.into()))?,
    );

    // Attach winit canvas to body element
    web_sys::window()
        .and_then(|win| win.document())
        .and_then(|doc| doc.body())
        .and_then(|body| {
            body.append_child(&web_sys::Element::from(window.canvas()?))
                .ok()
        })
        .ok_or_else(|| JsValue::from_str("couldn't append canvas to document body"))?;

    let size = viewport_size();
    let _ = window.request_inner_size(size);
    let scale_factor = window.scale_factor();
    let surface_size: PhysicalSize<u32> = size.to_physical(scale_factor);
    let surface_texture =
        SurfaceTexture::new(surface_size.width, surface_size.height, Arc::clone(&window));

    let texture_format = pixels::wgpu::TextureFormat::Rgba8Unorm;

    let adapter_options = RequestAdapterOptions {
        power_preference: PowerPreference::LowPower,
        ..RequestAdapterOptions::default()
    };

    let mut device_descriptor = DeviceDescriptor::default();
    device_descriptor.required_features = Features::empty();
    device_descriptor.required_limits = Limits::downlevel_webgl2_defaults();

    let pixels = match PixelsBuilder::new(size.width, size.height, surface_texture)
        .request_adapter_options(adapter_options)
        .device_descriptor(device_descriptor)
        .texture_format(texture_format)
        .surface_texture_format(texture_format)
        .wgpu_backend(Backends::GL)
        .build_async()
        .await
    {
        Ok(pixels) => pixels,
        Err(e) => {
            error!("Error building pixels: {e}");
            return Err(to_js(e.into()));
        }
    };

    let mut app = WebApp::default();
    app.renderer
        .init(surface_size, scale_factor, window.clone(), pixels);
    app.window = Some(window);
    app.requested = size;

    event_loop.run_app(&mut app).map_err(|e| to_js(e.into()))
}

#[derive(Default)]
pub struct WebApp<'a> {
    window: Option<Arc<Window>>,
    renderer: Renderer<'a>,
    requested: LogicalSize<u32>,
}

impl<'a> WebApp<'a> {
    /// The canvas does not follow the browser window by itself; ask for the
    /// new size and let winit report it back as `Resized`.
    fn follow_viewport(&mut self) {
        let size = viewport_size();
        if size == self.requested {
            return;
        }
        if let Some(window) = self.window.as_ref() {
            info!("viewport changed to {}x{}", size.width, size.height);
            let _ = window.request_inner_size(size);
            self.requested = size;
        }
    }
}

impl<'a> ApplicationHandler for WebApp<'a> {
    fn resumed(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        self.renderer.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.renderer.handle_input(&event) {
            return;
        }
        match event {
            WindowEvent::Resized(size) => {
                if let Err(e) = self.renderer.resize(size) {
                    warn!("Error resizing: {e}");
                }
                self.renderer.request_redraw();
            }
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.renderer.teardown();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.follow_viewport();
                if let Some(window) = self.window.as_ref() {
                    window.pre_present_notify();
                }
                match self.renderer.update_and_draw() {
                    Ok(true) => self.renderer.request_redraw(),
                    Ok(false) => {}
                    Err(e) => {
                        error!("Error drawing frame: {e}");
                        self.renderer.teardown();
                    }
                }
            }
            _ => (),
        }
    }
}
