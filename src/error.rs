use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("pixels: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("pixels texture: {0}")]
    Texture(#[from] pixels::TextureError),
    #[error("renderer used before a surface was attached")]
    NotInitialized,
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
