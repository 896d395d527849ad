pub mod bubble;
pub mod config;
pub mod draw;
pub mod error;
pub mod pointer;
pub mod pool;
pub mod renderer;
pub mod scene;
pub mod simulation;
pub mod tasks;
pub mod vectors;

#[cfg(not(target_arch = "wasm32"))]
pub mod app;

#[cfg(target_arch = "wasm32")]
pub mod web;
