//! Disassembler for TINYAC memory images.
//!
//! Memory carries no tag separating code from data, so the listing is built
//! in three passes over every cell:
//!
//! 1. find the last halt instruction (PRST on Krokha, STOP on TINIAC);
//! 2. decode every cell up to that boundary, marking every cell its
//!    operands read or write as data, and mark everything after the
//!    boundary as data;
//! 3. render code cells as mnemonics and data cells as `DEFH` literals.
//!
//! Pass 2 finishes before pass 3 begins.

use crate::cpu::{Instruction, Memory, Model, Word};
use crate::cpu::decode::decode;

/// How a cell was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Code(Instruction),
    Data(Word),
}

/// One line of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub address: usize,
    pub word: Word,
    pub cell: Cell,
}

impl Listing {
    /// The cell contents as four hex digits.
    pub fn hex(&self) -> String {
        format!("{:04X}", self.word as u16)
    }

    /// The assembly part of the line, without address and word.
    pub fn source(&self) -> String {
        match self.cell {
            Cell::Code(instr) => instr.to_string(),
            Cell::Data(word) => format!("DEFH {:04X}", word as u16),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self.cell, Cell::Code(_))
    }
}

impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}: {}    {}", self.address, self.hex(), self.source())
    }
}

/// Address of the last halt instruction, if any.
pub fn find_terminal(model: Model, mem: &Memory) -> Option<usize> {
    mem.cells()
        .iter()
        .rposition(|&word| matches!(decode(model, word), Ok(i) if i.opcode == model.halt()))
}

/// Mark each cell as code (`true`) or data (`false`).
///
/// Without a halt instruction the whole memory is treated as code and only
/// referenced cells become data.
pub fn classify(model: Model, mem: &Memory) -> Vec<bool> {
    let terminal = find_terminal(model, mem);
    let mut code = vec![true; mem.len()];

    for addr in 0..mem.len() {
        let in_code = terminal.map_or(true, |end| addr <= end);
        if !in_code {
            code[addr] = false;
            continue;
        }
        // Every cell up to the boundary contributes its references, even
        // one already marked as data.
        match decode(model, mem.read(addr)) {
            Ok(instr) => {
                let (r1, r2, r3) = instr.opcode.data_fields();
                for (referenced, field) in [(r1, instr.a1), (r2, instr.a2), (r3, instr.a3)] {
                    if referenced {
                        code[mem.wrap(field as usize)] = false;
                    }
                }
            }
            // No mnemonic to print.
            Err(_) => code[addr] = false,
        }
    }

    code
}

/// Disassemble the whole memory.
pub fn disassemble(model: Model, mem: &Memory) -> Vec<Listing> {
    let code = classify(model, mem);

    mem.cells()
        .iter()
        .zip(code)
        .enumerate()
        .map(|(address, (&word, is_code))| {
            let cell = match decode(model, word) {
                Ok(instr) if is_code => Cell::Code(instr),
                _ => Cell::Data(word),
            };
            Listing { address, word, cell }
        })
        .collect()
}

/// Disassemble a single word, ignoring any code/data context.
pub fn disassemble_word(model: Model, word: Word) -> String {
    match decode(model, word) {
        Ok(instr) => instr.to_string(),
        Err(_) => format!("DEFH {:04X}", word as u16),
    }
}

/// Render a listing as text, one line per cell.
pub fn render(listing: &[Listing]) -> String {
    listing.iter().map(|l| format!("{}\n", l)).collect()
}
