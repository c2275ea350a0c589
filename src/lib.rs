//! dexterm: a terminal browser for the PokeAPI species catalog.
//!
//! The binary in `main.rs` wires these modules into a ratatui application;
//! everything below the UI is usable and testable on its own.

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod keybindings;
pub mod preferences;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
