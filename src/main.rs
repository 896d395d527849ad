#[cfg(not(target_arch = "wasm32"))]
fn main() -> bubbles::error::Result<()> {
    use bubbles::app::NativeApp;
    use winit::event_loop::{ControlFlow, EventLoop};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;

    // ControlFlow::Poll continuously runs the event loop, even if the OS hasn't
    // dispatched any events. The redraw chain keeps the animation going.
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut NativeApp::default())?;
    Ok(())
}

// The browser build starts from `bubbles::web::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
