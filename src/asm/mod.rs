//! Assembler and disassembler for TINYAC programs.
//!
//! This module provides:
//! - a line assembler (mnemonics → memory words)
//! - a disassembler with code/data discrimination (memory → listing)
//! - raw binary memory images

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, assemble_source, AssembleError, Assembler, Assembly, Feed, LineError};
pub use disasm::{disassemble, Cell, Listing};
pub use image::{load_image, save_image, ImageError};
