//! In-memory compile-time tree node.
//!
//! [`BuilderNode`] owns its children outright (no parent back-pointer); the
//! node-table serializer derives parent/next relationships structurally
//! during its depth-first walk instead of following stored pointers.

/// Per-node compile flags.
///
/// `IGNORE_CDATA` removes the node (and everything beneath it) from the
/// output entirely. `LITERAL_TEXT` tells downstream consumers the node's
/// text has already been normalized and must not be re-whitespace-folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const NONE: NodeFlags = NodeFlags(0);
    pub const IGNORE_CDATA: NodeFlags = NodeFlags(1 << 0);
    pub const LITERAL_TEXT: NodeFlags = NodeFlags(1 << 1);

    pub fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: NodeFlags) {
        self.0 |= other.0;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::NONE
    }
}

impl std::ops::BitOr for NodeFlags {
    type Output = NodeFlags;
    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

/// Compile-scoped string-table slots, populated during Pass B and consumed
/// during Pass C/D. Meaningless outside one `compile()` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CompileSlots {
    pub element_idx: u32,
    pub text_idx: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AttrSlots {
    pub name_idx: u32,
    pub value_idx: u32,
}

/// One in-memory node of the forest being compiled.
#[derive(Debug, Clone)]
pub struct BuilderNode {
    pub(crate) element: String,
    pub(crate) text: Option<String>,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) flags: NodeFlags,
    pub(crate) children: Vec<BuilderNode>,

    pub(crate) slots: CompileSlots,
    pub(crate) attr_slots: Vec<AttrSlots>,
}

impl BuilderNode {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            text: None,
            attributes: Vec::new(),
            flags: NodeFlags::NONE,
            children: Vec::new(),
            slots: CompileSlots::default(),
            attr_slots: Vec::new(),
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn append_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
        self.attr_slots.push(AttrSlots::default());
    }

    pub fn children(&self) -> &[BuilderNode] {
        &self.children
    }

    pub fn append_child(&mut self, child: BuilderNode) -> &mut BuilderNode {
        self.children.push(child);
        self.children.last_mut().expect("just pushed")
    }

    pub fn has_flag(&self, flag: NodeFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn add_flag(&mut self, flag: NodeFlags) {
        self.flags.insert(flag);
    }

    /// Size in bytes this node occupies in the emitted node table: a
    /// `NodeRecord` (minus the trailing `text` field when absent) plus one
    /// `AttrRecord` per attribute.
    pub(crate) fn size_in_output(&self) -> u32 {
        let mut sz = crate::silo::NODE_RECORD_SIZE;
        if self.text.is_none() {
            sz -= 4;
        }
        sz + (self.attributes.len() as u32) * crate::silo::ATTR_RECORD_SIZE
    }
}
