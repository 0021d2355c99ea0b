use std::ops::Range;

/// Mapping between UTF-16 offsets and byte offsets of a text
#[derive(Debug, Clone)]
pub struct TextIndex {
    /// Byte offset for every UTF-16 position, plus one entry for the end.
    /// Both units of a surrogate pair point at the same byte.
    boundaries: Vec<usize>,
}

impl TextIndex {
    pub fn new(text: &str) -> Self {
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            for _ in 0..ch.len_utf16() {
                boundaries.push(byte);
            }
        }
        boundaries.push(text.len());
        Self { boundaries }
    }

    pub fn len_utf16(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of a UTF-16 position, `None` when out of range or inside
    /// a surrogate pair
    pub fn byte_offset(&self, utf16: usize) -> Option<usize> {
        let byte = *self.boundaries.get(utf16)?;
        if utf16 > 0 && self.boundaries[utf16 - 1] == byte {
            return None;
        }
        Some(byte)
    }

    /// UTF-16 position of a byte offset on a char boundary
    pub fn utf16_offset(&self, byte: usize) -> usize {
        self.boundaries.partition_point(|&b| b < byte)
    }

    pub fn byte_range(&self, begin: usize, end: usize) -> Option<Range<usize>> {
        if begin > end {
            return None;
        }
        Some(self.byte_offset(begin)?..self.byte_offset(end)?)
    }
}
