/// Size of a serialised fork index
pub const FORK_INDEX_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ForkIndexError {
    #[error("invalid fork index size, expected 32, got {0}")]
    InvalidSize(usize),
}

/// A 256 bit presence set over byte values.
///
/// Records which of a node's 256 possible fork slots are populated.
///  Byte `b` is bit `b % 8` of byte `b / 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForkIndex([u8; FORK_INDEX_SIZE]);

impl ForkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, byte: u8) {
        self.0[byte as usize / 8] |= 1 << (byte % 8);
    }

    pub fn contains(&self, byte: u8) -> bool {
        (self.0[byte as usize / 8] >> (byte % 8)) & 1 == 1
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Present byte values, in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|b| self.contains(*b))
    }

    pub fn to_bytes(&self) -> [u8; FORK_INDEX_SIZE] {
        self.0
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, ForkIndexError> {
        let bytes: [u8; FORK_INDEX_SIZE] = data
            .try_into()
            .map_err(|_| ForkIndexError::InvalidSize(data.len()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; FORK_INDEX_SIZE]> for ForkIndex {
    fn from(bytes: [u8; FORK_INDEX_SIZE]) -> Self {
        ForkIndex(bytes)
    }
}

impl FromIterator<u8> for ForkIndex {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut index = ForkIndex::new();
        for byte in iter {
            index.set(byte);
        }
        index
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_and_contains() {
        let mut index = ForkIndex::new();
        assert!(index.is_empty());

        index.set(0);
        index.set(b'/');
        index.set(255);

        assert!(index.contains(0));
        assert!(index.contains(47));
        assert!(index.contains(255));
        assert!(!index.contains(1));
        assert!(!index.is_empty());
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![0, 47, 255]);
    }

    #[test]
    fn test_bit_layout() {
        let index: ForkIndex = [b'p', 9].into_iter().collect();
        let bytes = index.to_bytes();
        // 'p' = 112 -> byte 14, bit 0
        assert_eq!(bytes[14], 0b0000_0001);
        // 9 -> byte 1, bit 1
        assert_eq!(bytes[1], 0b0000_0010);
        assert_eq!(bytes.iter().filter(|b| **b != 0).count(), 2);

        assert_eq!(ForkIndex::from_slice(&bytes).unwrap(), index);
        assert!(ForkIndex::from_slice(&bytes[..31]).is_err());
    }
}
