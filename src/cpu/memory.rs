//! TINYAC memory subsystem.
//!
//! A flat array of signed 16-bit cells. Every address is reduced modulo the
//! memory size, so out-of-range addresses wrap instead of failing.

use super::model::Model;
use serde::{Serialize, Deserialize};

/// The machine word: a signed 16-bit value that is also an instruction.
pub type Word = i16;

/// Word-addressed memory of a fixed, model-dependent size.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Create a zeroed memory sized for `model`.
    pub fn new(model: Model) -> Self {
        Self::with_size(model.memory_size())
    }

    /// Create a zeroed memory of `size` cells.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn with_size(size: usize) -> Self {
        assert!(size > 0, "memory must have at least one cell");
        Self {
            cells: vec![0; size],
        }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; memory has at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest valid address.
    #[inline]
    pub fn last_address(&self) -> usize {
        self.cells.len() - 1
    }

    /// Reduce any address to a cell index.
    #[inline]
    pub fn wrap(&self, addr: usize) -> usize {
        addr % self.cells.len()
    }

    /// Read a cell; the address wraps.
    #[inline]
    pub fn read(&self, addr: usize) -> Word {
        self.cells[self.wrap(addr)]
    }

    /// Write a cell; the address wraps.
    #[inline]
    pub fn write(&mut self, addr: usize, value: Word) {
        let index = self.wrap(addr);
        self.cells[index] = value;
    }

    /// All cells in address order.
    pub fn cells(&self) -> &[Word] {
        &self.cells
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load words starting at `start`, wrapping past the last cell.
    ///
    /// Returns the number of words written. Words beyond one full pass over
    /// memory overwrite earlier ones.
    pub fn load(&mut self, start: usize, words: &[Word]) -> usize {
        for (i, &word) in words.iter().enumerate() {
            self.write(start + i, word);
        }
        words.len()
    }

    /// Fill the inclusive range `[from, to]` with `value`.
    ///
    /// Bounds are clamped to the last address and swapped when reversed.
    /// Returns the number of cells written.
    pub fn fill(&mut self, from: usize, to: usize, value: Word) -> usize {
        let (from, to) = self.span(from, to);
        self.cells[from..=to].fill(value);
        to - from + 1
    }

    /// Copy the inclusive range `[from, to]` to `target`.
    ///
    /// Source bounds are normalized like [`Memory::fill`]. The source is
    /// snapshotted first, so overlapping ranges copy as if through a buffer.
    /// Destination addresses wrap. Returns the number of cells copied.
    pub fn move_block(&mut self, from: usize, to: usize, target: usize) -> usize {
        let (from, to) = self.span(from, to);
        let block: Vec<Word> = self.cells[from..=to].to_vec();
        self.load(target, &block)
    }

    /// Rows for a memory dump, one per cell in `[from, to]`.
    pub fn dump(&self, from: usize, to: usize) -> Vec<(usize, Word)> {
        let (from, to) = self.span(from, to);
        (from..=to).map(|i| (i, self.cells[i])).collect()
    }

    fn span(&self, from: usize, to: usize) -> (usize, usize) {
        let last = self.last_address();
        let (from, to) = (from.min(last), to.min(last));
        if from > to { (to, from) } else { (from, to) }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&c| c != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new(Model::Krokha);
        mem.write(3, 42);
        assert_eq!(mem.read(3), 42);
        assert_eq!(mem.len(), 8);
    }

    #[test]
    fn test_addresses_wrap() {
        let mut mem = Memory::new(Model::Krokha);
        mem.write(9, -5);
        assert_eq!(mem.read(1), -5);
        assert_eq!(mem.read(17), -5);
    }

    #[test]
    fn test_fill_swaps_reversed_bounds() {
        let mut mem = Memory::new(Model::Krokha);
        let written = mem.fill(5, 2, 7);
        assert_eq!(written, 4);
        assert_eq!(mem.cells(), &[0, 0, 7, 7, 7, 7, 0, 0]);
    }

    #[test]
    fn test_fill_clamps_to_last_address() {
        let mut mem = Memory::new(Model::Krokha);
        assert_eq!(mem.fill(6, 100, -1), 2);
        assert_eq!(mem.read(7), -1);
        assert_eq!(mem.read(5), 0);
    }

    #[test]
    fn test_move_block_overlapping() {
        let mut mem = Memory::new(Model::Krokha);
        mem.load(0, &[1, 2, 3]);
        assert_eq!(mem.move_block(0, 2, 1), 3);
        assert_eq!(&mem.cells()[..4], &[1, 1, 2, 3]);
    }

    #[test]
    fn test_move_block_wraps_destination() {
        let mut mem = Memory::new(Model::Krokha);
        mem.load(0, &[10, 20]);
        mem.move_block(0, 1, 7);
        assert_eq!(mem.read(7), 10);
        assert_eq!(mem.read(0), 20);
    }

    #[test]
    fn test_load_and_clear() {
        let mut mem = Memory::new(Model::Tiniac);
        mem.load(14, &[1, 2, 3]);
        assert_eq!(mem.read(15), 2);
        assert_eq!(mem.read(0), 3);
        mem.clear();
        assert!(mem.cells().iter().all(|&c| c == 0));
    }
}
