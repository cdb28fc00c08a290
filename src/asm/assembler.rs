//! Line assembler for TINYAC programs.
//!
//! Syntax, one instruction per line:
//! ```text
//! ADD  6 7 5     ; [5] := [6] + [7]
//! PRST 6 7 5     ; print [6] [7] [5] and stop
//! DEFD -17       ; decimal literal
//! DEFH 0FFF      ; hexadecimal literal
//! ```
//!
//! Instructions always take three decimal operands. Each assembled line is
//! stored at the cursor, which then advances and wraps at the end of memory.
//! A bad line is reported and the cursor stays put. An empty line ends the
//! session.

use crate::cpu::{Machine, Memory, Model, Opcode, Word};
use crate::cpu::decode::{encode, Instruction};
use log::warn;
use thiserror::Error;

/// Result of feeding one line to an [`Assembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// The empty line: the session is over.
    Done,
    /// A comment-only line; nothing written.
    Skipped,
    /// A word was stored at `address`.
    Wrote { address: usize, word: Word },
    /// The line was rejected; the cursor did not move.
    Illegal(LineError),
}

/// Summary of a batch assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    /// Words stored.
    pub written: usize,
    /// Cursor after the last stored word.
    pub next: usize,
    /// Lines that were rejected.
    pub diagnostics: Vec<LineError>,
}

impl Assembly {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Assembly session state.
#[derive(Debug, Clone)]
pub struct Assembler {
    model: Model,
    cursor: usize,
    line: usize,
}

impl Assembler {
    /// Start a session at `origin`.
    ///
    /// Fails if `origin` is not a valid address for `model`.
    pub fn new(model: Model, origin: i32) -> Result<Self, AssembleError> {
        let cursor = usize::try_from(origin)
            .ok()
            .filter(|&o| o <= model.last_address())
            .ok_or(AssembleError::IllegalAddress(origin))?;

        Ok(Self {
            model,
            cursor,
            line: 0,
        })
    }

    /// Address the next word will be stored at.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Assemble one line into `mem`.
    pub fn feed(&mut self, mem: &mut Memory, text: &str) -> Feed {
        self.line += 1;
        if text.trim().is_empty() {
            return Feed::Done;
        }

        match encode_line(self.model, text) {
            Ok(None) => Feed::Skipped,
            Ok(Some(word)) => {
                let address = self.cursor;
                mem.write(address, word);
                self.cursor = (self.cursor + 1) % mem.len();
                Feed::Wrote { address, word }
            }
            Err(reason) => {
                let err = LineError {
                    line: self.line,
                    address: self.cursor,
                    text: text.trim().to_string(),
                    reason,
                };
                warn!("{}", err);
                Feed::Illegal(err)
            }
        }
    }
}

/// Assemble `lines` into the machine's memory starting at `origin`.
///
/// Stops at the first empty line or when the lines run out. Rejected lines
/// are collected in [`Assembly::diagnostics`]; everything assembled before
/// and after them stays in memory.
pub fn assemble<I>(machine: &mut Machine, origin: i32, lines: I) -> Result<Assembly, AssembleError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut asm = Assembler::new(machine.model(), origin)?;
    let mut result = Assembly {
        next: asm.cursor(),
        ..Assembly::default()
    };

    for line in lines {
        match asm.feed(&mut machine.mem, line.as_ref()) {
            Feed::Done => break,
            Feed::Skipped => {}
            Feed::Wrote { .. } => result.written += 1,
            Feed::Illegal(err) => result.diagnostics.push(err),
        }
    }

    result.next = asm.cursor();
    Ok(result)
}

/// Assemble a whole source file at address 0.
///
/// Blank lines in a file are layout, not the end-of-session marker, so
/// they are dropped before assembly.
pub fn assemble_source(machine: &mut Machine, source: &str) -> Result<Assembly, AssembleError> {
    let lines = source.lines().filter(|l| !l.trim().is_empty());
    assemble(machine, 0, lines)
}

/// Encode a single line without storing it.
///
/// Returns `Ok(None)` for a line holding only a comment.
pub fn encode_line(model: Model, text: &str) -> Result<Option<Word>, Reason> {
    let code = text.split(';').next().unwrap_or_default();
    let tokens: Vec<&str> = code.split_whitespace().collect();
    let Some((head, operands)) = tokens.split_first() else {
        return Ok(None);
    };

    let mnemonic = head.to_uppercase();
    let word = match (mnemonic.as_str(), operands) {
        ("DEFD", [value]) => parse_decimal(value)?,
        ("DEFH", [value]) => parse_hex(value)?,
        ("DEFD" | "DEFH", _) => return Err(Reason::OperandCount(mnemonic.clone(), 1)),
        (name, _) => {
            let op = Opcode::from_mnemonic(name)
                .ok_or_else(|| Reason::UnknownMnemonic(mnemonic.clone()))?;
            let [a1, a2, a3] = operands else {
                return Err(Reason::OperandCount(mnemonic.clone(), 3));
            };
            let last = model.address_mask();
            let instr = Instruction::new(
                op,
                parse_operand(a1, last)?,
                parse_operand(a2, last)?,
                parse_operand(a3, last)?,
            );
            encode(model, &instr).map_err(|_| Reason::NotInModel(op, model))?
        }
    };

    Ok(Some(word))
}

/// An operand must name a cell of the model: 0..=7 on Krokha, 0..=15 on
/// TINIAC.
fn parse_operand(text: &str, last: u8) -> Result<u8, Reason> {
    text.parse::<u8>()
        .ok()
        .filter(|&v| v <= last)
        .ok_or_else(|| Reason::BadOperand(text.to_string(), last))
}

fn parse_decimal(text: &str) -> Result<Word, Reason> {
    text.parse::<Word>()
        .map_err(|_| Reason::BadLiteral(text.to_string()))
}

fn parse_hex(text: &str) -> Result<Word, Reason> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16)
        .map(|bits| bits as Word)
        .map_err(|_| Reason::BadLiteral(text.to_string()))
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Reason {
    #[error("unknown mnemonic {0}")]
    UnknownMnemonic(String),

    #[error("{0} is not available on the {} model", .1.name())]
    NotInModel(Opcode, Model),

    #[error("{0} takes {1} operand(s)")]
    OperandCount(String, usize),

    #[error("operand {0} is not an address 0..{1}")]
    BadOperand(String, u8),

    #[error("bad literal {0}")]
    BadLiteral(String),
}

/// A rejected source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal instruction on line {line} at {address:02X}: {text} ({reason})")]
pub struct LineError {
    pub line: usize,
    pub address: usize,
    pub text: String,
    pub reason: Reason,
}

/// Errors that abort a whole assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("illegal address {0}")]
    IllegalAddress(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_demo_program() {
        let mut m = Machine::new(Model::Krokha);
        let source = ["ADD 6 7 5", "add 5 5 5", "PRST 6 7 5", "DEFD 0", "DEFD 0", "DEFD 0", "DEFD 2", "DEFH 1"];
        let result = assemble(&mut m, 0, source).unwrap();

        assert_eq!(result.written, 8);
        assert_eq!(result.next, 0);
        assert!(result.is_clean());
        assert_eq!(m.mem.cells(), &[0x1675, 0x1555, 0x7675, 0, 0, 0, 2, 1]);
    }

    #[test]
    fn test_empty_line_ends_session() {
        let mut m = Machine::new(Model::Krokha);
        let result = assemble(&mut m, 2, ["DEFD 5", "", "DEFD 9"]).unwrap();
        assert_eq!(result.written, 1);
        assert_eq!(result.next, 3);
        assert_eq!(m.peek(2), 5);
        assert_eq!(m.peek(3), 0);
    }

    #[test]
    fn test_illegal_line_keeps_address() {
        let mut m = Machine::new(Model::Krokha);
        let result = assemble(&mut m, 0, ["JUMP 1 2 3", "ADD 1 2", "DEFD 7"]).unwrap();

        assert_eq!(result.written, 1);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.diagnostics[0].address, 0);
        assert_eq!(result.diagnostics[1].line, 2);
        assert_eq!(m.peek(0), 7);
    }

    #[test]
    fn test_illegal_origin_writes_nothing() {
        let mut m = Machine::new(Model::Krokha);
        assert_eq!(assemble(&mut m, 8, ["DEFD 1"]), Err(AssembleError::IllegalAddress(8)));
        assert_eq!(assemble(&mut m, -1, ["DEFD 1"]), Err(AssembleError::IllegalAddress(-1)));
        assert!(m.mem.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_cursor_wraps() {
        let mut m = Machine::new(Model::Krokha);
        let result = assemble(&mut m, 7, ["DEFD 1", "DEFD 2"]).unwrap();
        assert_eq!(result.next, 1);
        assert_eq!(m.peek(7), 1);
        assert_eq!(m.peek(0), 2);
    }

    #[test]
    fn test_literals() {
        assert_eq!(encode_line(Model::Krokha, "DEFH FFFF"), Ok(Some(-1)));
        assert_eq!(encode_line(Model::Krokha, "defh 0x7f"), Ok(Some(0x7F)));
        assert_eq!(encode_line(Model::Krokha, "DEFD -32768"), Ok(Some(Word::MIN)));
        assert!(encode_line(Model::Krokha, "DEFD 40000").is_err());
        assert!(encode_line(Model::Krokha, "DEFH 10000").is_err());
        assert!(encode_line(Model::Krokha, "DEFD 1 2").is_err());
    }

    #[test]
    fn test_operands_are_decimal_nibbles() {
        assert_eq!(encode_line(Model::Tiniac, "TRLT 10 11 15"), Ok(Some(0xDABFu16 as Word)));
        assert!(encode_line(Model::Tiniac, "ADD 0A 1 2").is_err());
        assert!(encode_line(Model::Tiniac, "ADD 16 1 2").is_err());
    }

    #[test]
    fn test_krokha_operands_stop_at_seven() {
        assert_eq!(encode_line(Model::Krokha, "ADD 7 1 2"), Ok(Some(0x1712)));
        assert_eq!(
            encode_line(Model::Krokha, "ADD 15 1 2"),
            Err(Reason::BadOperand("15".to_string(), 7))
        );

        let mut m = Machine::new(Model::Krokha);
        let result = assemble(&mut m, 0, ["ADD 6 8 5", "ADD 6 7 5"]).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(m.peek(0), 0x1675);
    }

    #[test]
    fn test_model_specific_mnemonics() {
        assert!(matches!(
            encode_line(Model::Krokha, "TRLT 1 2 3"),
            Err(Reason::NotInModel(Opcode::TrLt, Model::Krokha))
        ));
        assert_eq!(encode_line(Model::Tiniac, "STOP 0 0 0"), Ok(Some(0x7000)));
        assert!(encode_line(Model::Tiniac, "PRST 6 7 5").is_err());
        assert_eq!(encode_line(Model::Tiniac, "MOVE 5 0 2"), Ok(Some(0x0502)));
    }

    #[test]
    fn test_comments() {
        assert_eq!(encode_line(Model::Krokha, "; just a note"), Ok(None));
        assert_eq!(encode_line(Model::Krokha, "SUB 1 2 3 ; diff"), Ok(Some(0x3123)));

        let mut m = Machine::new(Model::Krokha);
        let result = assemble(&mut m, 0, ["; header", "DEFD 4"]).unwrap();
        assert_eq!(result.written, 1);
        assert_eq!(m.peek(0), 4);
    }

    #[test]
    fn test_assemble_source_skips_blank_lines() {
        let mut m = Machine::new(Model::Krokha);
        let source = "ADD 6 7 5\n\nPRST 6 7 5\n";
        let result = assemble_source(&mut m, source).unwrap();
        assert_eq!(result.written, 2);
        assert_eq!(m.peek(1), 0x7675);
    }
}
