//! Machine models and their opcode tables.
//!
//! Two historical machines share the word format but not the instruction
//! set:
//! - Krokha: 8 cells, 3-bit addresses, 8 opcodes, code 7 prints three cells
//!   and stops.
//! - TINIAC: 16 cells, 4-bit addresses, 16 opcodes, code 7 only stops and
//!   printing moved to code 8.
//!
//! A machine is built for exactly one model; the tables are never merged.

use super::memory::Word;
use serde::{Serialize, Deserialize};

/// Machine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Model {
    /// The 8-word school textbook machine.
    #[default]
    Krokha,
    /// The 16-word extended machine.
    Tiniac,
}

/// A machine operation, independent of its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Copy,
    Add,
    Div,
    Sub,
    TrEq,
    Mpy,
    TrGt,
    /// Print three cells and stop (Krokha).
    Prst,
    /// Stop (TINIAC).
    Stop,
    /// Print one cell (TINIAC).
    Prnt,
    Read,
    Write,
    Rewind,
    TrOv,
    TrLt,
    Noop,
}

impl Opcode {
    /// Canonical mnemonic, as printed by the disassembler.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Copy => "COPY",
            Opcode::Add => "ADD",
            Opcode::Div => "DIV",
            Opcode::Sub => "SUB",
            Opcode::TrEq => "TREQ",
            Opcode::Mpy => "MPY",
            Opcode::TrGt => "TRGT",
            Opcode::Prst => "PRST",
            Opcode::Stop => "STOP",
            Opcode::Prnt => "PRNT",
            Opcode::Read => "READ",
            Opcode::Write => "WRTE",
            Opcode::Rewind => "RWND",
            Opcode::TrOv => "TROV",
            Opcode::TrLt => "TRLT",
            Opcode::Noop => "NOOP",
        }
    }

    /// Look up a mnemonic (already upper-cased), including the TINIAC
    /// spellings of the Krokha operations.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        let op = match text {
            "COPY" | "MOVE" => Opcode::Copy,
            "ADD" | "IADD" => Opcode::Add,
            "DIV" | "IDIV" => Opcode::Div,
            "SUB" | "ISUB" => Opcode::Sub,
            "TREQ" => Opcode::TrEq,
            "MPY" | "IMPY" => Opcode::Mpy,
            "TRGT" => Opcode::TrGt,
            "PRST" => Opcode::Prst,
            "STOP" => Opcode::Stop,
            "PRNT" => Opcode::Prnt,
            "READ" => Opcode::Read,
            "WRTE" | "WRITE" => Opcode::Write,
            "RWND" => Opcode::Rewind,
            "TROV" => Opcode::TrOv,
            "TRLT" => Opcode::TrLt,
            "NOOP" | "NOP" => Opcode::Noop,
            _ => return None,
        };
        Some(op)
    }

    /// Operand fields that name memory cells read or written as data.
    ///
    /// Branch targets are code addresses and are not listed. READ/WRTE take
    /// a word count in `a1`, so only `a3` is a cell.
    pub fn data_fields(self) -> (bool, bool, bool) {
        match self {
            Opcode::Copy => (true, false, true),
            Opcode::Add | Opcode::Div | Opcode::Sub | Opcode::Mpy | Opcode::Prst => {
                (true, true, true)
            }
            Opcode::TrEq | Opcode::TrGt | Opcode::TrLt => (true, true, false),
            Opcode::Prnt | Opcode::Read | Opcode::Write => (false, false, true),
            Opcode::Stop | Opcode::Rewind | Opcode::TrOv | Opcode::Noop => (false, false, false),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl Model {
    /// Number of memory cells.
    pub const fn memory_size(self) -> usize {
        match self {
            Model::Krokha => 8,
            Model::Tiniac => 16,
        }
    }

    /// Highest valid address.
    pub const fn last_address(self) -> usize {
        self.memory_size() - 1
    }

    /// Mask applied to an address field before it is used as a cell index.
    pub const fn address_mask(self) -> u8 {
        match self {
            Model::Krokha => 0x7,
            Model::Tiniac => 0xF,
        }
    }

    /// The instruction that ends a program: the disassembler's code/data
    /// boundary.
    pub const fn halt(self) -> Opcode {
        match self {
            Model::Krokha => Opcode::Prst,
            Model::Tiniac => Opcode::Stop,
        }
    }

    /// Map a 4-bit opcode field to an operation.
    ///
    /// Returns `None` for codes this model does not define (8-15 on Krokha).
    pub fn opcode(self, code: u8) -> Option<Opcode> {
        let op = match (self, code & 0xF) {
            (_, 0x0) => Opcode::Copy,
            (_, 0x1) => Opcode::Add,
            (_, 0x2) => Opcode::Div,
            (_, 0x3) => Opcode::Sub,
            (_, 0x4) => Opcode::TrEq,
            (_, 0x5) => Opcode::Mpy,
            (_, 0x6) => Opcode::TrGt,
            (Model::Krokha, 0x7) => Opcode::Prst,
            (Model::Krokha, _) => return None,
            (Model::Tiniac, 0x7) => Opcode::Stop,
            (Model::Tiniac, 0x8) => Opcode::Prnt,
            (Model::Tiniac, 0x9) => Opcode::Read,
            (Model::Tiniac, 0xA) => Opcode::Write,
            (Model::Tiniac, 0xB) => Opcode::Rewind,
            (Model::Tiniac, 0xC) => Opcode::TrOv,
            (Model::Tiniac, 0xD) => Opcode::TrLt,
            (Model::Tiniac, _) => Opcode::Noop,
        };
        Some(op)
    }

    /// Numeric code of an operation, or `None` if this model lacks it.
    pub fn code(self, op: Opcode) -> Option<u8> {
        let code = match (self, op) {
            (_, Opcode::Copy) => 0x0,
            (_, Opcode::Add) => 0x1,
            (_, Opcode::Div) => 0x2,
            (_, Opcode::Sub) => 0x3,
            (_, Opcode::TrEq) => 0x4,
            (_, Opcode::Mpy) => 0x5,
            (_, Opcode::TrGt) => 0x6,
            (Model::Krokha, Opcode::Prst) => 0x7,
            (Model::Tiniac, Opcode::Stop) => 0x7,
            (Model::Tiniac, Opcode::Prnt) => 0x8,
            (Model::Tiniac, Opcode::Read) => 0x9,
            (Model::Tiniac, Opcode::Write) => 0xA,
            (Model::Tiniac, Opcode::Rewind) => 0xB,
            (Model::Tiniac, Opcode::TrOv) => 0xC,
            (Model::Tiniac, Opcode::TrLt) => 0xD,
            (Model::Tiniac, Opcode::Noop) => 0xE,
            _ => return None,
        };
        Some(code)
    }

    /// The built-in test program: adds two numbers, doubles the sum and
    /// prints A, B and the result (2 1 6).
    pub fn demo_program(self) -> Vec<Word> {
        match self {
            Model::Krokha => vec![
                0x1675, // ADD  6 7 5
                0x1555, // ADD  5 5 5
                0x7675, // PRST 6 7 5
                0, 0, 0,
                2,      // A
                1,      // B
            ],
            Model::Tiniac => vec![
                0x19A8,            // ADD  9 10 8
                0x1888,            // ADD  8 8 8
                0x8009u16 as Word, // PRNT 0 0 9
                0x800Au16 as Word, // PRNT 0 0 10
                0x8008u16 as Word, // PRNT 0 0 8
                0x7000,            // STOP
                0, 0, 0,
                2,                 // A
                1,                 // B
            ],
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Model::Krokha => "Krokha",
            Model::Tiniac => "TINIAC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_table_roundtrip() {
        for model in [Model::Krokha, Model::Tiniac] {
            for code in 0u8..16 {
                if let Some(op) = model.opcode(code) {
                    let back = model.code(op).unwrap();
                    // Both NOOP codes fold onto 0xE.
                    if op == Opcode::Noop {
                        assert_eq!(back, 0xE);
                    } else {
                        assert_eq!(back, code);
                    }
                }
            }
        }
    }

    #[test]
    fn test_krokha_has_eight_opcodes() {
        let defined = (0u8..16).filter(|&c| Model::Krokha.opcode(c).is_some()).count();
        assert_eq!(defined, 8);
        assert_eq!(Model::Krokha.opcode(7), Some(Opcode::Prst));
        assert_eq!(Model::Krokha.code(Opcode::TrLt), None);
    }

    #[test]
    fn test_tiniac_splits_print_and_stop() {
        assert_eq!(Model::Tiniac.opcode(7), Some(Opcode::Stop));
        assert_eq!(Model::Tiniac.opcode(8), Some(Opcode::Prnt));
        assert_eq!(Model::Tiniac.code(Opcode::Prst), None);
        assert_eq!(Model::Tiniac.halt(), Opcode::Stop);
    }

    #[test]
    fn test_demo_programs_fit() {
        for model in [Model::Krokha, Model::Tiniac] {
            assert!(model.demo_program().len() <= model.memory_size());
        }
    }

    #[test]
    fn test_mnemonic_aliases() {
        assert_eq!(Opcode::from_mnemonic("MOVE"), Some(Opcode::Copy));
        assert_eq!(Opcode::from_mnemonic("IMPY"), Some(Opcode::Mpy));
        assert_eq!(Opcode::from_mnemonic("JUMP"), None);
        for op in [Opcode::Copy, Opcode::TrLt, Opcode::Write, Opcode::Prst] {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
    }
}
