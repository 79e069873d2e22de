//! Shared types for the 680x0 emulation cores.
//!
//! Components report elapsed time in [`Ticks`] and expose their internal
//! state through [`Observable`] for debuggers and tests.

mod observable;
mod ticks;

pub use observable::{Observable, Value};
pub use ticks::Ticks;
