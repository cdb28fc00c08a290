//! Instruction decoder for TINYAC.
//!
//! The word format has no tag bit; any word decodes as an instruction:
//!
//! ```text
//! 15..12  11..8  7..4  3..0
//! opcode  addr1  addr2 addr3
//! ```

use super::memory::Word;
use super::model::{Model, Opcode};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The four raw nibbles of a word, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub code: u8,
    pub a1: u8,
    pub a2: u8,
    pub a3: u8,
}

/// Split a word into its four nibbles.
pub fn fields(word: Word) -> Fields {
    let bits = word as u16;
    Fields {
        code: ((bits >> 12) & 0xF) as u8,
        a1: ((bits >> 8) & 0xF) as u8,
        a2: ((bits >> 4) & 0xF) as u8,
        a3: (bits & 0xF) as u8,
    }
}

/// A decoded instruction with addresses already masked for its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a1: u8,
    pub a2: u8,
    pub a3: u8,
}

impl Instruction {
    pub fn new(opcode: Opcode, a1: u8, a2: u8, a3: u8) -> Self {
        Self { opcode, a1, a2, a3 }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:02X} {:02X} {:02X}", self.opcode, self.a1, self.a2, self.a3)
    }
}

/// Decode a word for `model`.
pub fn decode(model: Model, word: Word) -> Result<Instruction, DecodeError> {
    let Fields { code, a1, a2, a3 } = fields(word);
    let opcode = model.opcode(code).ok_or(DecodeError::InvalidOpcode(code))?;
    let mask = model.address_mask();

    Ok(Instruction {
        opcode,
        a1: a1 & mask,
        a2: a2 & mask,
        a3: a3 & mask,
    })
}

/// Encode an instruction back to a word.
pub fn encode(model: Model, instr: &Instruction) -> Result<Word, DecodeError> {
    let code = model
        .code(instr.opcode)
        .ok_or(DecodeError::Unsupported(instr.opcode, model))?;
    Ok(pack(code, instr.a1, instr.a2, instr.a3))
}

/// Pack four nibbles into a word. Each argument keeps only its low 4 bits.
pub fn pack(code: u8, a1: u8, a2: u8, a3: u8) -> Word {
    let bits = (u16::from(code & 0xF) << 12)
        | (u16::from(a1 & 0xF) << 8)
        | (u16::from(a2 & 0xF) << 4)
        | u16::from(a3 & 0xF);
    bits as Word
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:X}")]
    InvalidOpcode(u8),

    #[error("{0} is not an instruction of the {} model", .1.name())]
    Unsupported(Opcode, Model),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_most_significant_first() {
        let f = fields(0x1675);
        assert_eq!(f, Fields { code: 1, a1: 6, a2: 7, a3: 5 });
    }

    #[test]
    fn test_fields_of_negative_word() {
        let f = fields(-1);
        assert_eq!(f, Fields { code: 0xF, a1: 0xF, a2: 0xF, a3: 0xF });
    }

    #[test]
    fn test_krokha_masks_top_address_bit() {
        let instr = decode(Model::Krokha, 0x1FAB).unwrap();
        assert_eq!(instr, Instruction::new(Opcode::Add, 7, 2, 3));
    }

    #[test]
    fn test_krokha_rejects_extended_codes() {
        let word = 0xD123u16 as Word;
        assert_eq!(decode(Model::Krokha, word), Err(DecodeError::InvalidOpcode(0xD)));
        let trlt = decode(Model::Tiniac, word).unwrap();
        assert_eq!(trlt.opcode, Opcode::TrLt);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let instr = Instruction::new(Opcode::TrGt, 5, 4, 0xC);
        let word = encode(Model::Tiniac, &instr).unwrap();
        assert_eq!(word, 0x654C);
        assert_eq!(decode(Model::Tiniac, word).unwrap(), instr);
    }

    #[test]
    fn test_encode_unsupported() {
        let prnt = Instruction::new(Opcode::Prnt, 0, 0, 3);
        assert!(encode(Model::Krokha, &prnt).is_err());
    }

    #[test]
    fn test_display() {
        let instr = Instruction::new(Opcode::Prst, 6, 7, 5);
        assert_eq!(instr.to_string(), "PRST 06 07 05");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn tiniac_decodes_every_word(word in any::<i16>()) {
            prop_assert!(decode(Model::Tiniac, word).is_ok());
        }

        #[test]
        fn krokha_addresses_stay_in_memory(word in any::<i16>()) {
            let code = fields(word).code;
            match decode(Model::Krokha, word) {
                Ok(i) => {
                    prop_assert!(code < 8);
                    prop_assert!(i.a1 < 8 && i.a2 < 8 && i.a3 < 8);
                }
                Err(e) => prop_assert_eq!(e, DecodeError::InvalidOpcode(code)),
            }
        }

        #[test]
        fn fields_pack_inverse(word in any::<i16>()) {
            let f = fields(word);
            prop_assert_eq!(pack(f.code, f.a1, f.a2, f.a3), word);
        }
    }
}
