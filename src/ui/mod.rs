//! Terminal user interface.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling per context
//! - `events` - Background task results
//! - `helpers` - Task spawning shared by input and events
//! - `render` - View dispatch and layout
//! - `cards`, `filter_bar`, `detail` - List and detail widgets
//! - `help`, `settings`, `status` - Overlays and the status bar

mod cards;
mod detail;
mod events;
mod filter_bar;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod settings;
mod status;

pub use loop_runner::{run, Action};
