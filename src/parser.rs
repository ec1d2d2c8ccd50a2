//! Drives `quick_xml`'s streaming reader over an [`Import`]'s byte stream,
//! building a [`BuilderNode`] forest under a synthetic root.
//!
//! The underlying reader is sized to a 32 KiB buffer, and the cancel token
//! is polled once per XML event — the idiomatic Rust equivalent of the
//! original's "read a 32 KiB chunk, feed the tokenizer, poll cancel" loop,
//! since `quick_xml`'s reader already pulls from the `BufRead` in buffer-sized
//! increments.

use crate::builder::CompileFlags;
use crate::cancel::CancelToken;
use crate::error::SiloError;
use crate::import::Import;
use crate::node::{BuilderNode, NodeFlags};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufReader;

const CHUNK_SIZE: usize = 32 * 1024;

fn node_at_path_mut<'a>(root: &'a mut BuilderNode, path: &[usize]) -> &'a mut BuilderNode {
    let mut cur = root;
    for &idx in path {
        cur = &mut cur.children[idx];
    }
    cur
}

fn ascii_whitespace_only(s: &str) -> bool {
    s.bytes().all(|b| b == b' ' || b == b'\t' || b == b'\n' || b == b'\r')
}

/// Parse one import's XML into `root`, grafting the resulting top-level
/// element(s) as children of `root`. Fails with `InvalidData` unless the
/// stream closes back down to `root` (a single well-formed root element).
pub fn parse_into(
    import: &Import,
    root: &mut BuilderNode,
    flags: CompileFlags,
    locales: &[String],
    cancel: &CancelToken,
) -> Result<(), SiloError> {
    let reader_src = import.open()?;
    let buffered = BufReader::with_capacity(CHUNK_SIZE, reader_src);
    let mut reader = Reader::from_reader(buffered);
    reader.config_mut().trim_text(false);

    let info = import.info();
    let mut cursor: Vec<usize> = Vec::new();
    let mut buf = Vec::new();
    let children_before = root.children.len();

    loop {
        cancel.check()?;
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut node = BuilderNode::new(name);

                let parent_ignored = {
                    let parent = node_at_path_mut(root, &cursor);
                    parent.has_flag(NodeFlags::IGNORE_CDATA)
                };
                if parent_ignored {
                    node.add_flag(NodeFlags::IGNORE_CDATA);
                }

                let mut xml_lang: Option<String> = None;
                let mut attrs: Vec<(String, String)> = Vec::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(quick_xml::Error::from)?
                        .into_owned();
                    if key == "xml:lang" {
                        xml_lang = Some(value.clone());
                    }
                    attrs.push((key, value));
                }

                if !node.has_flag(NodeFlags::IGNORE_CDATA)
                    && flags.contains(CompileFlags::NATIVE_LANGS)
                {
                    if let Some(lang) = &xml_lang {
                        if !locales.iter().any(|l| l == lang) {
                            node.add_flag(NodeFlags::IGNORE_CDATA);
                        }
                    }
                }

                if !node.has_flag(NodeFlags::IGNORE_CDATA) {
                    for (k, v) in attrs {
                        node.append_attribute(k, v);
                    }
                }

                let parent = node_at_path_mut(root, &cursor);
                parent.children.push(node);
                cursor.push(parent.children.len() - 1);
            }
            Event::Empty(e) => {
                // Self-closing element: run the same start logic, then
                // immediately pop back up (no text, no children).
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut node = BuilderNode::new(name);

                let parent_ignored = {
                    let parent = node_at_path_mut(root, &cursor);
                    parent.has_flag(NodeFlags::IGNORE_CDATA)
                };
                if parent_ignored {
                    node.add_flag(NodeFlags::IGNORE_CDATA);
                }

                let mut xml_lang: Option<String> = None;
                let mut attrs: Vec<(String, String)> = Vec::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(quick_xml::Error::from)?
                        .into_owned();
                    if key == "xml:lang" {
                        xml_lang = Some(value.clone());
                    }
                    attrs.push((key, value));
                }
                if !node.has_flag(NodeFlags::IGNORE_CDATA)
                    && flags.contains(CompileFlags::NATIVE_LANGS)
                {
                    if let Some(lang) = &xml_lang {
                        if !locales.iter().any(|l| l == lang) {
                            node.add_flag(NodeFlags::IGNORE_CDATA);
                        }
                    }
                }
                if !node.has_flag(NodeFlags::IGNORE_CDATA) {
                    for (k, v) in attrs {
                        node.append_attribute(k, v);
                    }
                }

                let is_top_level = cursor.is_empty();
                let parent = node_at_path_mut(root, &cursor);
                parent.children.push(node);
                let idx = parent.children.len() - 1;

                if is_top_level {
                    if let Some(info_tree) = &info {
                        parent.children[idx].children.push(info_tree.clone());
                    }
                }
            }
            Event::End(_) => {
                if cursor.is_empty() {
                    return Err(SiloError::InvalidData("Mismatched XML".into()));
                }
                let is_top_level = cursor.len() == 1;
                if is_top_level {
                    if let Some(info_tree) = &info {
                        let node = node_at_path_mut(root, &cursor);
                        node.children.push(info_tree.clone());
                    }
                }
                cursor.pop();
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(quick_xml::Error::from)?
                    .into_owned();
                if text.is_empty() {
                    buf.clear();
                    continue;
                }
                let node = node_at_path_mut(root, &cursor);
                if node.has_flag(NodeFlags::IGNORE_CDATA) {
                    buf.clear();
                    continue;
                }
                if ascii_whitespace_only(&text) {
                    buf.clear();
                    continue;
                }
                if flags.contains(CompileFlags::LITERAL_TEXT) {
                    node.add_flag(NodeFlags::LITERAL_TEXT);
                }
                match &mut node.text {
                    Some(existing) => existing.push_str(&text),
                    None => node.text = Some(text),
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if !text.is_empty() {
                    let node = node_at_path_mut(root, &cursor);
                    if !node.has_flag(NodeFlags::IGNORE_CDATA) {
                        match &mut node.text {
                            Some(existing) => existing.push_str(&text),
                            None => node.text = Some(text),
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !cursor.is_empty() {
        return Err(SiloError::InvalidData("Mismatched XML".into()));
    }

    // Exactly one top-level element is expected per import. Mirrors the
    // reference implementation's "more opening than closing" root-mismatch
    // check, generalized to reject multiple root elements in one document.
    if root.children.len() != children_before + 1 {
        return Err(SiloError::InvalidData("Mismatched XML".into()));
    }

    Ok(())
}
