pub mod main;
mod signal;

pub use main::{run, run_server, serve_with};
