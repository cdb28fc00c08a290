//! TUI debugger for TINYAC.
//!
//! Provides an interactive terminal-based debugger with:
//! - Disassembly view separating code from data
//! - Register and flag view
//! - Memory view with cell selection
//! - Auto/step/stop controls and a breakpoint on the selected cell

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
