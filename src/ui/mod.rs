// src/ui/mod.rs

//! Display layer: retained output, escape-sequence cleanup and the console.

pub mod buffer;
pub mod console;
pub mod sanitize;

pub use buffer::OutputBuffer;
pub use console::{Console, ConsoleInput, parse_input};
pub use sanitize::sanitize_ansi;
