//! CPU emulation for the TINYAC computer.
//!
//! This module implements the three-address machine:
//! - 8 or 16 sixteen-bit memory cells, depending on the [`Model`]
//! - registers IP, CR, OP1, OP2, SM and the W, OV, D0 flags
//! - the Krokha 8-opcode set or the TINIAC 16-opcode set

pub mod model;
pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use model::{Model, Opcode};
pub use memory::{Memory, Word};
pub use registers::Registers;
pub use decode::{Instruction, DecodeError};
pub use execute::{Machine, Run, Signal, Step, Trace};
