//! Silo binary layout and the minimal read-side companion `ensure` needs.
//!
//! This is deliberately not a query engine: there is no XPath, no live
//! accessor cursor. `Silo` validates the header, exposes the GUID, and (for
//! tests) offers a structural walk over the node table to check the
//! invariants the compiler promises.

use crate::error::SiloError;
use std::sync::Arc;
use uuid::Uuid;

pub const MAGIC: [u8; 4] = *b"XBS\0";
pub const VERSION: u32 = 1;

pub const HEADER_SIZE: u32 = 4 + 4 + 4 + 4 + 4 + 16; // magic,version,strtab,strtab_ntags,padding,guid
pub const NODE_RECORD_SIZE: u32 = 1 + 1 + 4 + 4 + 4 + 4; // flags,nr_attrs,element_name,next,parent,text
pub const ATTR_RECORD_SIZE: u32 = 4 + 4;

const FLAG_IS_NODE: u8 = 1 << 0;
const FLAG_HAS_TEXT: u8 = 1 << 1;

/// A compiled, immutable silo image.
///
/// Cloning is cheap: the backing bytes are reference-counted.
#[derive(Debug, Clone)]
pub struct Silo {
    bytes: Arc<[u8]>,
    strtab: u32,
    strtab_ntags: u32,
    guid: Uuid,
}

impl Silo {
    /// Parse and validate the header of a silo image.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, SiloError> {
        let bytes = bytes.into();
        if bytes.len() < HEADER_SIZE as usize {
            return Err(SiloError::BadMagic);
        }
        if bytes[0..4] != MAGIC {
            return Err(SiloError::BadMagic);
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(SiloError::BadVersion(version));
        }
        let strtab = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let strtab_ntags = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let guid_bytes: [u8; 16] = bytes[20..36].try_into().unwrap();
        let guid = Uuid::from_bytes(guid_bytes);
        Ok(Self {
            bytes,
            strtab,
            strtab_ntags,
            guid,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn strtab_offset(&self) -> u32 {
        self.strtab
    }

    pub fn strtab_ntags(&self) -> u32 {
        self.strtab_ntags
    }

    fn node_flags(&self, offset: u32) -> Option<u8> {
        self.bytes.get(offset as usize).copied()
    }

    /// True iff `offset` points at a live node record (not a sentinel).
    pub fn is_node_at(&self, offset: u32) -> bool {
        self.node_flags(offset)
            .is_some_and(|f| f & FLAG_IS_NODE != 0)
    }

    /// True iff `offset` (relative to the start of the string table, as
    /// stored in `element_name`/`text`/attr fields) lands exactly on the
    /// start of a NUL-terminated string.
    pub fn strtab_has_string_start(&self, offset: u32) -> bool {
        let idx = self.strtab as usize + offset as usize;
        if idx >= self.bytes.len() {
            return false;
        }
        if offset == 0 {
            return true;
        }
        // A string starts here iff the previous byte is a NUL terminator.
        self.bytes[idx - 1] == 0
    }

    /// Read a NUL-terminated string at the given strtab-relative offset.
    pub fn read_string(&self, offset: u32) -> Result<&str, SiloError> {
        let start = self.strtab as usize + offset as usize;
        let bytes = &self.bytes[start..];
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| SiloError::InvalidData("unterminated string".into()))?;
        std::str::from_utf8(&bytes[..end])
            .map_err(|e| SiloError::InvalidData(format!("non-utf8 string: {e}")))
    }

    /// Walk the node table pre-order, calling `visit(offset, flags, nr_attrs)`
    /// for every record (node or sentinel). Used by the verification test
    /// suite to check the Testable Properties; not part of the public query
    /// surface.
    pub fn walk_nodetab<F>(&self, mut visit: F) -> Result<(), SiloError>
    where
        F: FnMut(u32, NodeView) -> Result<(), SiloError>,
    {
        let mut off = HEADER_SIZE;
        while off < self.strtab {
            let flags = self.bytes[off as usize];
            let is_node = flags & FLAG_IS_NODE != 0;
            let has_text = flags & FLAG_HAS_TEXT != 0;
            let nr_attrs = self.bytes[off as usize + 1] as u32;
            let view = if is_node {
                let element_name = u32::from_le_bytes(
                    self.bytes[off as usize + 2..off as usize + 6]
                        .try_into()
                        .unwrap(),
                );
                let next = u32::from_le_bytes(
                    self.bytes[off as usize + 6..off as usize + 10]
                        .try_into()
                        .unwrap(),
                );
                let parent = u32::from_le_bytes(
                    self.bytes[off as usize + 10..off as usize + 14]
                        .try_into()
                        .unwrap(),
                );
                let text = if has_text {
                    Some(u32::from_le_bytes(
                        self.bytes[off as usize + 14..off as usize + 18]
                            .try_into()
                            .unwrap(),
                    ))
                } else {
                    None
                };
                NodeView::Node {
                    element_name,
                    next,
                    parent,
                    text,
                    nr_attrs,
                }
            } else {
                NodeView::Sentinel
            };
            visit(off, view)?;

            // A sentinel is a NodeRecord with every flag cleared, so it is
            // `has_text == false` too and loses the trailing text field just
            // like a textless node does.
            let mut advance = NODE_RECORD_SIZE;
            if !has_text {
                advance -= 4;
            }
            if is_node {
                advance += nr_attrs * ATTR_RECORD_SIZE;
            }
            off += advance;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NodeView {
    Sentinel,
    Node {
        element_name: u32,
        next: u32,
        parent: u32,
        text: Option<u32>,
        nr_attrs: u32,
    },
}
