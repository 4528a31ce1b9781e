//! ClassDJ Player Library
//!
//! Headless playlist player for the ClassDJ song server: configuration,
//! the clock-driven media output, and console rendering.
//!
//! This library exposes the player's components for testing purposes.

pub mod config;
pub mod console;
pub mod error;
pub mod output;

// Re-export commonly used types for convenience
pub use config::PlayerConfig;
pub use console::ConsoleCommand;
pub use error::{PlayerError, Result};
pub use output::{Clock, ClockOutput, ClockReading};
