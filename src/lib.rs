//! Driver library for chains of Minishift 8-row LED shift displays.
//!
//! Text is drawn onto a `Canvas`, which a `Display` sends to the hardware through any
//! `DisplayInterface`. For a long-running display, a `Driver` owns the `Display` on a worker
//! thread and keeps it showing static or scrolling text, switching the moment it is handed
//! something new; the `control` module exposes that over HTTP.

extern crate embedded_hal as hal;

pub mod canvas;
pub mod command;
pub mod config;
pub mod control;
pub mod display;
pub mod font;
pub mod interface;

// Re-exports for primary API.
pub use canvas::{Canvas, Rendered};
pub use command::Command;
pub use config::Config;
pub use display::driver::{Animation, Driver, Handle, Request};
pub use display::Display;
pub use interface::DisplayInterface;
