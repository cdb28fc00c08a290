//! Binary memory images.
//!
//! An image is a raw dump of the whole memory: exactly N words, no header,
//! each word stored as two bytes in little-endian order.
//!
//! Loading writes words into memory as they arrive. If the file is short,
//! the words that were read stay in memory and the rest keep their old
//! values; the caller gets [`ImageError::ShortRead`]. Nothing is rolled back.

use crate::cpu::{Memory, Word};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Bytes per stored word.
pub const WORD_BYTES: usize = 2;

/// Encode memory as image bytes.
pub fn to_bytes(mem: &Memory) -> Vec<u8> {
    mem.cells().iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Write the whole memory to `writer`.
pub fn write_image<W: Write>(mut writer: W, mem: &Memory) -> Result<usize, ImageError> {
    writer.write_all(&to_bytes(mem))?;
    writer.flush()?;
    Ok(mem.len())
}

/// Read an image from `reader` into memory, starting at address 0.
///
/// Returns the number of words loaded. Bytes past the last cell are
/// ignored.
pub fn read_image<R: Read>(reader: R, mem: &mut Memory) -> Result<usize, ImageError> {
    let expected = mem.len();
    let mut bytes = Vec::with_capacity(expected * WORD_BYTES);
    reader.take((expected * WORD_BYTES) as u64).read_to_end(&mut bytes)?;

    let mut loaded = 0;
    for (addr, pair) in bytes.chunks_exact(WORD_BYTES).enumerate() {
        mem.write(addr, Word::from_le_bytes([pair[0], pair[1]]));
        loaded += 1;
    }

    if loaded < expected {
        return Err(ImageError::ShortRead { loaded, expected });
    }
    Ok(loaded)
}

/// Save memory to a file, replacing it.
pub fn save_image<P: AsRef<Path>>(path: P, mem: &Memory) -> Result<usize, ImageError> {
    let file = std::fs::File::create(path.as_ref())?;
    write_image(std::io::BufWriter::new(file), mem)
}

/// Load a file into memory.
pub fn load_image<P: AsRef<Path>>(path: P, mem: &mut Memory) -> Result<usize, ImageError> {
    let file = std::fs::File::open(path.as_ref())?;
    read_image(std::io::BufReader::new(file), mem)
}

/// Errors that can occur while moving images.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of file: {loaded} of {expected} words read")]
    ShortRead { loaded: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Model;

    #[test]
    fn test_words_are_little_endian() {
        let mut mem = Memory::new(Model::Krokha);
        mem.write(0, 0x1675);
        mem.write(7, -2);
        let bytes = to_bytes(&mem);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..2], &[0x75, 0x16]);
        assert_eq!(&bytes[14..], &[0xFE, 0xFF]);
    }

    #[test]
    fn test_write_then_read() {
        let mut mem = Memory::new(Model::Tiniac);
        mem.load(0, &[1, -1, 0x7000, Word::MIN]);
        let mut buf = Vec::new();
        assert_eq!(write_image(&mut buf, &mem).unwrap(), 16);

        let mut back = Memory::new(Model::Tiniac);
        assert_eq!(read_image(buf.as_slice(), &mut back).unwrap(), 16);
        assert_eq!(back, mem);
    }

    #[test]
    fn test_short_read_keeps_partial_load() {
        // Legacy behavior: the words that arrived are not rolled back.
        let mut mem = Memory::new(Model::Krokha);
        mem.fill(0, 7, 9);
        let bytes = [0x01, 0x00, 0x02, 0x00, 0x03];

        let err = read_image(&bytes[..], &mut mem).unwrap_err();
        assert!(matches!(err, ImageError::ShortRead { loaded: 2, expected: 8 }));
        assert_eq!(&mem.cells()[..3], &[1, 2, 9]);
    }

    #[test]
    fn test_extra_bytes_ignored() {
        let mut mem = Memory::new(Model::Krokha);
        let bytes = vec![0xAA; 40];
        assert_eq!(read_image(bytes.as_slice(), &mut mem).unwrap(), 8);
        assert_eq!(mem.read(0), 0xAAAAu16 as Word);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("tinyac-image-{}.bin", std::process::id()));
        let mut mem = Memory::new(Model::Krokha);
        mem.load(0, &[0x1675, 0x1555, 0x7675, 0, 0, 0, 2, 1]);
        save_image(&path, &mem).unwrap();

        let mut back = Memory::new(Model::Krokha);
        load_image(&path, &mut back).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, mem);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut mem = Memory::new(Model::Krokha);
        let err = load_image("/nonexistent/tinyac.bin", &mut mem).unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }
}
