//! Node-table serialization: the four passes that turn a [`BuilderNode`]
//! forest into the node-table bytes of a silo image.
//!
//! Pass A sizes the table so the caller can fix the string-table offset
//! before a single byte is written. Pass B interns strings level-order
//! (element names, then attribute names, then attribute values, then text)
//! so `strtab_ntags` can be captured right after the element-name pass.
//! Pass C walks the live forest pre-order, emitting sentinels to close
//! finished branches before every node and a full sentinel flush at the end.
//! Pass D patches each node's `next`/`parent` fields now that every live
//! node's offset is known.
//!
//! A node with `IGNORE_CDATA` set is dropped from every pass along with its
//! whole subtree.

use crate::node::{BuilderNode, NodeFlags};
use crate::silo::{ATTR_RECORD_SIZE, NODE_RECORD_SIZE};
use crate::strtab::StrTab;

const SENTINEL_SIZE: u32 = NODE_RECORD_SIZE - 4;

fn is_live(node: &BuilderNode) -> bool {
    !node.has_flag(NodeFlags::IGNORE_CDATA)
}

/// Pass A: total bytes this forest's live nodes and their sentinels will
/// occupy in the node table. A flush-to-zero sentinel policy closes exactly
/// one level per live node over a full traversal, so the sentinel count
/// always equals the live node count regardless of tree shape.
fn size_forest(nodes: &[BuilderNode]) -> u32 {
    let mut sz = 0;
    for n in nodes {
        if !is_live(n) {
            continue;
        }
        sz += n.size_in_output() + SENTINEL_SIZE;
        sz += size_forest(&n.children);
    }
    sz
}

pub fn pass_a_size(root: &BuilderNode) -> u32 {
    size_forest(&root.children)
}

/// Pass B: intern strings level-order. Returns `strtab_ntags`, the count of
/// distinct strings interned after the element-name sub-pass alone.
pub fn pass_b_intern(root: &mut BuilderNode, strtab: &mut StrTab) -> u32 {
    let depth_count = max_depth(&root.children);

    for depth in 0..depth_count {
        intern_element_names_at(&mut root.children, 0, depth, strtab);
    }
    let strtab_ntags = strtab.len() as u32;

    for depth in 0..depth_count {
        intern_attr_names_at(&mut root.children, 0, depth, strtab);
    }
    for depth in 0..depth_count {
        intern_attr_values_at(&mut root.children, 0, depth, strtab);
    }
    for depth in 0..depth_count {
        intern_text_at(&mut root.children, 0, depth, strtab);
    }

    strtab_ntags
}

fn max_depth(nodes: &[BuilderNode]) -> usize {
    let mut d = 0;
    for n in nodes {
        if !is_live(n) {
            continue;
        }
        d = d.max(1 + max_depth(&n.children));
    }
    d
}

fn intern_element_names_at(
    nodes: &mut [BuilderNode],
    cur_depth: usize,
    target: usize,
    strtab: &mut StrTab,
) {
    for n in nodes.iter_mut() {
        if !is_live(n) {
            continue;
        }
        if cur_depth == target {
            n.slots.element_idx = strtab.intern(&n.element.clone());
        } else {
            intern_element_names_at(&mut n.children, cur_depth + 1, target, strtab);
        }
    }
}

fn intern_attr_names_at(
    nodes: &mut [BuilderNode],
    cur_depth: usize,
    target: usize,
    strtab: &mut StrTab,
) {
    for n in nodes.iter_mut() {
        if !is_live(n) {
            continue;
        }
        if cur_depth == target {
            for i in 0..n.attributes.len() {
                let name = n.attributes[i].0.clone();
                n.attr_slots[i].name_idx = strtab.intern(&name);
            }
        } else {
            intern_attr_names_at(&mut n.children, cur_depth + 1, target, strtab);
        }
    }
}

fn intern_attr_values_at(
    nodes: &mut [BuilderNode],
    cur_depth: usize,
    target: usize,
    strtab: &mut StrTab,
) {
    for n in nodes.iter_mut() {
        if !is_live(n) {
            continue;
        }
        if cur_depth == target {
            for i in 0..n.attributes.len() {
                let value = n.attributes[i].1.clone();
                n.attr_slots[i].value_idx = strtab.intern(&value);
            }
        } else {
            intern_attr_values_at(&mut n.children, cur_depth + 1, target, strtab);
        }
    }
}

fn intern_text_at(nodes: &mut [BuilderNode], cur_depth: usize, target: usize, strtab: &mut StrTab) {
    for n in nodes.iter_mut() {
        if !is_live(n) {
            continue;
        }
        if cur_depth == target {
            if let Some(text) = n.text.clone() {
                n.slots.text_idx = strtab.intern(&text);
            }
        } else {
            intern_text_at(&mut n.children, cur_depth + 1, target, strtab);
        }
    }
}

fn write_sentinel(buf: &mut Vec<u8>) {
    buf.push(0); // flags: is_node=0, has_text=0
    buf.push(0); // nr_attrs
    buf.extend_from_slice(&0u32.to_le_bytes()); // element_name
    buf.extend_from_slice(&0u32.to_le_bytes()); // next
    buf.extend_from_slice(&0u32.to_le_bytes()); // parent
}

fn write_node_record(buf: &mut Vec<u8>, node: &BuilderNode) {
    let has_text = node.text().is_some();
    let flags: u8 = 0b01 | if has_text { 0b10 } else { 0 };
    buf.push(flags);
    buf.push(node.attributes().len() as u8);
    buf.extend_from_slice(&node.slots.element_idx.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // next, patched in pass D
    buf.extend_from_slice(&0u32.to_le_bytes()); // parent, patched in pass D
    if has_text {
        buf.extend_from_slice(&node.slots.text_idx.to_le_bytes());
    }
    for slot in &node.attr_slots {
        buf.extend_from_slice(&slot.name_idx.to_le_bytes());
        buf.extend_from_slice(&slot.value_idx.to_le_bytes());
    }
}

fn emit_subtree(node: &mut BuilderNode, depth: u32, header_size: u32, buf: &mut Vec<u8>, level: &mut u32) {
    if !is_live(node) {
        return;
    }
    while *level >= depth {
        write_sentinel(buf);
        *level -= 1;
    }
    node.slots.offset = header_size + buf.len() as u32;
    write_node_record(buf, node);
    *level = depth;
    for child in node.children.iter_mut() {
        emit_subtree(child, depth + 1, header_size, buf, level);
    }
}

/// Pass C: depth-first emit. `header_size` is added to every recorded
/// offset since the node table is appended directly after the header in
/// the final image.
pub fn pass_c_emit(root: &mut BuilderNode, header_size: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(pass_a_size(root) as usize);
    let mut level = 0u32;
    for child in root.children.iter_mut() {
        emit_subtree(child, 1, header_size, &mut buf, &mut level);
    }
    while level > 0 {
        write_sentinel(&mut buf);
        level -= 1;
    }
    buf
}

fn write_u32_at(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

fn fixup_children(children: &[BuilderNode], parent_offset: u32, header_size: u32, buf: &mut [u8]) {
    let mut prev_live_offset: Option<u32> = None;
    for child in children {
        if !is_live(child) {
            continue;
        }
        let off = child.slots.offset;
        write_u32_at(buf, (off - header_size) as usize + 10, parent_offset);
        if let Some(prev) = prev_live_offset {
            write_u32_at(buf, (prev - header_size) as usize + 6, off);
        }
        prev_live_offset = Some(off);
        fixup_children(&child.children, off, header_size, buf);
    }
}

/// Pass D: patch `next`/`parent` offsets now that every live node's own
/// offset is known. `parent_offset` is `0` for top-level elements (no
/// parent: the synthetic root is never itself emitted).
pub fn pass_d_fixup(root: &BuilderNode, header_size: u32, buf: &mut [u8]) {
    fixup_children(&root.children, 0, header_size, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BuilderNode;

    fn leaf(name: &str) -> BuilderNode {
        BuilderNode::new(name)
    }

    #[test]
    fn sentinel_count_matches_live_node_count() {
        let mut root = BuilderNode::new("root");
        let r = root.append_child(leaf("r"));
        r.append_child(leaf("x"));
        r.append_child(leaf("y"));

        let mut strtab = StrTab::new();
        pass_b_intern(&mut root, &mut strtab);
        let bytes = pass_c_emit(&mut root, 0);

        let mut sentinels = 0u32;
        let mut nodes = 0u32;
        let mut off = 0usize;
        while off < bytes.len() {
            let flags = bytes[off];
            let is_node = flags & 0b01 != 0;
            let has_text = flags & 0b10 != 0;
            let nr_attrs = bytes[off + 1] as u32;
            if is_node {
                nodes += 1;
            } else {
                sentinels += 1;
            }
            let mut adv = NODE_RECORD_SIZE;
            if !has_text {
                adv -= 4;
            }
            if is_node {
                adv += nr_attrs * ATTR_RECORD_SIZE;
            }
            off += adv as usize;
        }
        assert_eq!(nodes, 3);
        assert_eq!(sentinels, 3);
    }

    #[test]
    fn ignored_subtree_is_skipped_entirely() {
        let mut root = BuilderNode::new("root");
        let r = root.append_child(leaf("r"));
        let x = r.append_child(leaf("x"));
        x.add_flag(NodeFlags::IGNORE_CDATA);
        x.append_child(leaf("inner"));

        let mut strtab = StrTab::new();
        pass_b_intern(&mut root, &mut strtab);
        let bytes = pass_c_emit(&mut root, 0);
        let expected = size_forest(&root.children);
        assert_eq!(bytes.len() as u32, expected);
    }
}
