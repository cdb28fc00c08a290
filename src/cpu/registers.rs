//! TINYAC processor registers.
//!
//! - IP: address of the next instruction
//! - CR: the instruction word being executed
//! - OP1, OP2: operands read by the last instruction
//! - SM: result register (adder)
//! - W: sign flag, set when the last result was negative
//! - OV: overflow flag, sticky
//! - D0: division by zero flag, sticky
//! - BR1, BR2: breakpoint addresses, 0 disables

use super::memory::Word;
use serde::{Serialize, Deserialize};

/// The TINYAC register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Instruction pointer.
    pub ip: usize,
    /// Command register (the fetched word).
    pub cr: Word,
    /// First operand.
    pub op1: Word,
    /// Second operand.
    pub op2: Word,
    /// Adder: the last computed result.
    pub sm: Word,
    /// Sign flag.
    pub w: bool,
    /// Overflow flag. Only a reset clears it.
    pub ov: bool,
    /// Division by zero flag. Only a reset clears it.
    pub d0: bool,
    /// First breakpoint address.
    pub br1: usize,
    /// Second breakpoint address.
    pub br2: usize,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a result in SM and update the sign flag.
    pub fn set_result(&mut self, value: Word) {
        self.sm = value;
        self.w = value < 0;
    }

    /// Increment IP, wrapping at `size`. Returns the old value.
    pub fn advance_ip(&mut self, size: usize) -> usize {
        let old = self.ip;
        self.ip = (self.ip + 1) % size;
        old
    }

    /// True if IP sits on an armed breakpoint.
    pub fn at_breakpoint(&self) -> bool {
        (self.br1 != 0 && self.ip == self.br1) || (self.br2 != 0 && self.ip == self.br2)
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IP:{:02X} CR:{:04X} OP1:{:04X} OP2:{:04X} SM:{:04X} {} {} {}",
            self.ip,
            self.cr as u16,
            self.op1 as u16,
            self.op2 as u16,
            self.sm as u16,
            if self.w { "W-" } else { "W+" },
            if self.ov { "OV" } else { "NO" },
            if self.d0 { "D0" } else { "ND" },
        )
    }
}
