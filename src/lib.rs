//! # TINYAC
//!
//! A simulator of the TINYAC family of three-address school computers: the
//! 8-word Krokha and the 16-word TINIAC.
//!
//! Each instruction is one 16-bit word holding an opcode and three cell
//! addresses. The crate provides the execution engine, a line assembler, a
//! disassembler that tells code from data, binary memory images, an operator
//! console and a terminal debugger.

pub mod cpu;
pub mod asm;
pub mod control;
pub mod console;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Machine, Model, Memory, Registers, Instruction, Opcode, Word, DecodeError, Step, Run};
pub use asm::{assemble, assemble_source, disassemble, AssembleError, ImageError, load_image, save_image};
pub use control::{Control, RunMode};
pub use console::{Console, ConsoleError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
