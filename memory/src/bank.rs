use crate::error::Error;
use crate::range::Range;
use std::fmt::Debug;

/// Number of addressable entries of every bank (addresses `0..=65535`)
pub const BANK_SIZE: usize = 65536;

/// Fixed-size bank of `BANK_SIZE` values
///
/// The bank is allocated once and never resized. Every access is bounds checked so a request
/// that leaves the address space is reported as `Error::OutOfBounds` instead of panicking.
#[derive(Clone)]
pub struct Bank<T>
where
    T: Copy + Default + Debug,
{
    cells: Box<[T]>,
}

impl<T> Default for Bank<T>
where
    T: Copy + Default + Debug,
{
    fn default() -> Self {
        Self {
            cells: vec![T::default(); BANK_SIZE].into_boxed_slice(),
        }
    }
}

impl<T> Debug for Bank<T>
where
    T: Copy + Default + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank").field("size", &self.cells.len()).finish()
    }
}

impl<T> Bank<T>
where
    T: Copy + Default + Debug,
{
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, address: usize) -> Result<T, Error> {
        self.cells
            .get(address)
            .copied()
            .ok_or(Error::OutOfBounds(Range::new(address, 1)))
    }

    pub fn set(&mut self, address: usize, value: T) -> Result<(), Error> {
        match self.cells.get_mut(address) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::OutOfBounds(Range::new(address, 1))),
        }
    }

    pub fn read(&self, range: &Range) -> Result<&[T], Error> {
        if !range.fits(self.cells.len()) {
            return Err(Error::OutOfBounds(*range));
        }
        Ok(&self.cells[range.start..range.end])
    }

    /// Write `values` to the range, either all values are written or none
    pub fn write(&mut self, range: &Range, values: &[T]) -> Result<(), Error> {
        if !range.fits(self.cells.len()) {
            return Err(Error::OutOfBounds(*range));
        }
        if range.length() != values.len() {
            return Err(Error::LengthMismatch {
                expected: range.length(),
                actual: values.len(),
            });
        }
        self.cells[range.start..range.end].copy_from_slice(values);
        Ok(())
    }
}
