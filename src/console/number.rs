//! Console number syntax.
//!
//! A number starting with `0` is hexadecimal (`0FF`, `07FFF`, `0`); anything
//! else is signed decimal (`12`, `-3`).

use crate::cpu::Word;
use super::ConsoleError;

/// Parse a console number.
pub fn parse_number(text: &str) -> Result<i32, ConsoleError> {
    let text = text.trim();
    let parsed = if text.starts_with('0') {
        i32::from_str_radix(text, 16)
    } else {
        text.parse::<i32>()
    };
    parsed.map_err(|_| ConsoleError::BadNumber(text.to_string()))
}

/// Parse a number as a word, keeping the low 16 bits.
///
/// Both `0FFFF` and `-1` give the word `-1`.
pub fn parse_word(text: &str) -> Result<Word, ConsoleError> {
    let value = parse_number(text)?;
    if !(i32::from(Word::MIN)..=0xFFFF).contains(&value) {
        return Err(ConsoleError::BadNumber(text.trim().to_string()));
    }
    Ok(value as u16 as Word)
}

/// Parse a number as an address; negative values clamp to 0.
pub fn parse_address(text: &str) -> Result<usize, ConsoleError> {
    Ok(parse_number(text)?.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_zero_means_hex() {
        assert_eq!(parse_number("010").unwrap(), 16);
        assert_eq!(parse_number("0").unwrap(), 0);
        assert_eq!(parse_number("10").unwrap(), 10);
        assert_eq!(parse_number("-7").unwrap(), -7);
        assert!(parse_number("0xyz").is_err());
        assert!(parse_number("abc").is_err());
    }

    #[test]
    fn test_words() {
        assert_eq!(parse_word("0FFFF").unwrap(), -1);
        assert_eq!(parse_word("-1").unwrap(), -1);
        assert_eq!(parse_word("07675").unwrap(), 0x7675);
        assert!(parse_word("70000").is_err());
    }

    #[test]
    fn test_addresses_clamp_negative() {
        assert_eq!(parse_address("-4").unwrap(), 0);
        assert_eq!(parse_address("0A").unwrap(), 10);
    }
}
