use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Length of a plain content address
pub const REFERENCE_SIZE: usize = 32;
/// Length of an encrypted content address (address + decryption key)
pub const ENCRYPTED_REFERENCE_SIZE: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("invalid reference length {0}, expected 32 or 64 bytes")]
    InvalidLength(usize),
    #[error("invalid reference hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// An opaque content address, exactly 32 or 64 bytes long.
///
/// References identify both payloads (a node's entry) and persisted
///  nodes (a node's content address). One manifest only ever uses one
///  reference length.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference(Vec<u8>);

impl Reference {
    /// Build a reference from raw bytes, checking its length
    pub fn from_slice(data: &[u8]) -> Result<Self, ReferenceError> {
        match data.len() {
            REFERENCE_SIZE | ENCRYPTED_REFERENCE_SIZE => Ok(Self(data.to_vec())),
            len => Err(ReferenceError::InvalidLength(len)),
        }
    }

    /// The all-zero reference of the given length
    pub fn zero(len: usize) -> Result<Self, ReferenceError> {
        Self::from_slice(&vec![0; len])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ReferenceError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        Self::from_slice(&bytes)
    }
}

impl Default for Reference {
    fn default() -> Self {
        Reference(vec![0; REFERENCE_SIZE])
    }
}

impl Deref for Reference {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Reference {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; REFERENCE_SIZE]> for Reference {
    fn from(bytes: [u8; REFERENCE_SIZE]) -> Self {
        Reference(bytes.to_vec())
    }
}

impl From<[u8; ENCRYPTED_REFERENCE_SIZE]> for Reference {
    fn from(bytes: [u8; ENCRYPTED_REFERENCE_SIZE]) -> Self {
        Reference(bytes.to_vec())
    }
}

impl TryFrom<&[u8]> for Reference {
    type Error = ReferenceError;
    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(data)
    }
}

impl TryFrom<Vec<u8>> for Reference {
    type Error = ReferenceError;
    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        match data.len() {
            REFERENCE_SIZE | ENCRYPTED_REFERENCE_SIZE => Ok(Self(data)),
            len => Err(ReferenceError::InvalidLength(len)),
        }
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.to_hex())
    }
}
