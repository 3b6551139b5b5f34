/// Flags making up a node's type byte.
///
/// The flags are not mutually exclusive; a node's type is the bitwise OR of
///  every flag that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// The node resolves to a content entry
    Value = 2,
    /// The node has at least one fork
    Edge = 4,
    /// The node's incoming prefix holds a `/` past its first byte
    WithPathSeparator = 8,
    /// The node carries metadata
    WithMetadata = 16,
    /// Every flag bit
    Mask = 255,
}

impl NodeType {
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Whether this flag is set in a raw type byte
    pub const fn is_set_in(self, node_type: u8) -> bool {
        node_type & self.bits() == self.bits()
    }

    /// `node_type` with this flag set
    pub const fn set_in(self, node_type: u8) -> u8 {
        node_type | self.bits()
    }

    /// `node_type` with this flag cleared
    pub const fn clear_in(self, node_type: u8) -> u8 {
        (NodeType::Mask.bits() ^ self.bits()) & node_type
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flags() {
        let t = NodeType::Value.set_in(NodeType::Edge.bits());
        assert_eq!(t, 6);
        assert!(NodeType::Value.is_set_in(t));
        assert!(NodeType::Edge.is_set_in(t));
        assert!(!NodeType::WithMetadata.is_set_in(t));

        let t = NodeType::Value.clear_in(t);
        assert_eq!(t, NodeType::Edge.bits());
        assert_eq!(NodeType::WithPathSeparator.clear_in(0), 0);
    }
}
