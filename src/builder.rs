//! The compile orchestrator: collects imports and synthetic nodes, drives
//! the parser and node-table passes, and computes the aggregate GUID.

use crate::cancel::CancelToken;
use crate::error::SiloError;
use crate::import::{self, Import};
use crate::locale::snapshot_preferred_locales;
use crate::node::BuilderNode;
use crate::nodetab;
use crate::silo::{Silo, HEADER_SIZE, MAGIC, VERSION};
use crate::strtab::StrTab;
use anyhow::Context;
use camino::Utf8Path;
use uuid::Uuid;

/// Compile-time behavior switches, set once per `compile`/`ensure` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileFlags(u32);

impl CompileFlags {
    pub const NONE: CompileFlags = CompileFlags(0);
    /// Mark parsed text as already-normalized; downstream consumers must
    /// not re-fold whitespace in it.
    pub const LITERAL_TEXT: CompileFlags = CompileFlags(1 << 0);
    /// Drop elements whose `xml:lang` does not match the host's preferred
    /// locales instead of keeping every translation.
    pub const NATIVE_LANGS: CompileFlags = CompileFlags(1 << 1);
    /// Skip imports that fail to parse instead of aborting the whole compile.
    pub const IGNORE_INVALID: CompileFlags = CompileFlags(1 << 2);

    pub fn contains(self, other: CompileFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CompileFlags {
    type Output = CompileFlags;
    fn bitor(self, rhs: CompileFlags) -> CompileFlags {
        CompileFlags(self.0 | rhs.0)
    }
}

/// Collects XML sources and synthetic nodes, and compiles them into a
/// [`Silo`]. Reusable across multiple `compile`/`ensure` calls; each call
/// re-runs the full pipeline over whatever has been imported so far.
#[derive(Default)]
pub struct Builder {
    imports: Vec<Import>,
    synthetic: Vec<BuilderNode>,
    guid_tokens: Vec<String>,
    current: Option<Silo>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import_xml(&mut self, xml: impl Into<String>) {
        let import = Import::from_xml(xml);
        self.append_guid(import.identity());
        self.imports.push(import);
    }

    pub fn import_file(
        &mut self,
        file: impl AsRef<Utf8Path>,
        info: Option<BuilderNode>,
    ) -> Result<(), SiloError> {
        let import = Import::from_file(file, info)?;
        self.append_guid(import.identity());
        self.imports.push(import);
        Ok(())
    }

    pub fn import_dir(
        &mut self,
        dir: impl AsRef<Utf8Path>,
        info: Option<BuilderNode>,
    ) -> Result<(), SiloError> {
        for path in import::scan_dir(dir)? {
            self.import_file(path, info.clone())?;
        }
        Ok(())
    }

    /// Append a synthetic node tree, grafted under the synthetic root
    /// during `compile`, after every Import's parsed content.
    pub fn import_node(&mut self, node: BuilderNode) {
        self.synthetic.push(node);
    }

    /// Append `token` to the GUID accumulator, joined with prior tokens by
    /// `&`. Called automatically by the `import_*` methods; exposed so
    /// callers can fold in extra cache-busting context (build flags, schema
    /// version, ...).
    pub fn append_guid(&mut self, token: impl Into<String>) {
        self.guid_tokens.push(token.into());
    }

    fn want_guid(&self) -> Uuid {
        let accumulator = self.guid_tokens.join("&");
        Uuid::new_v5(&Uuid::nil(), accumulator.as_bytes())
    }

    /// Run the full compile pipeline and rebind this builder's current silo
    /// to the result.
    pub fn compile(&mut self, flags: CompileFlags, cancel: &CancelToken) -> anyhow::Result<Silo> {
        let locales = snapshot_preferred_locales();
        let mut root = BuilderNode::new("");

        for import in &self.imports {
            cancel.check()?;
            match crate::parser::parse_into(import, &mut root, flags, &locales, cancel) {
                Ok(()) => {}
                Err(err) if flags.contains(CompileFlags::IGNORE_INVALID) => {
                    tracing::debug!(identity = import.identity(), error = %err, "skipping invalid import");
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("compiling import {}", import.identity()));
                }
            }
        }

        for node in self.synthetic.drain(..) {
            root.append_child(node);
        }

        let mut strtab = StrTab::new();
        let strtab_ntags = nodetab::pass_b_intern(&mut root, &mut strtab);
        let mut nodetab_bytes = nodetab::pass_c_emit(&mut root, HEADER_SIZE);
        nodetab::pass_d_fixup(&root, HEADER_SIZE, &mut nodetab_bytes);
        let strtab_bytes = strtab.into_bytes();

        let guid = self.want_guid();
        let strtab_offset = HEADER_SIZE + nodetab_bytes.len() as u32;

        let mut out = Vec::with_capacity(strtab_offset as usize + strtab_bytes.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&strtab_offset.to_le_bytes());
        out.extend_from_slice(&strtab_ntags.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.extend_from_slice(guid.as_bytes());
        debug_assert_eq!(out.len() as u32, HEADER_SIZE);
        out.extend_from_slice(&nodetab_bytes);
        out.extend_from_slice(&strtab_bytes);

        let silo = Silo::from_bytes(out)
            .expect("compiler produced a silo violating its own layout invariants");
        self.current = Some(silo.clone());
        Ok(silo)
    }

    /// Reuse `file` on disk when its embedded GUID matches what this
    /// builder would compile; otherwise recompile and persist the result.
    pub fn ensure(
        &mut self,
        file: impl AsRef<Utf8Path>,
        flags: CompileFlags,
        cancel: &CancelToken,
    ) -> anyhow::Result<Silo> {
        let file = file.as_ref();
        let want_guid = self.want_guid();

        let scratch = std::fs::read(file.as_std_path())
            .ok()
            .and_then(|bytes| match Silo::from_bytes(bytes) {
                Ok(silo) => Some(silo),
                Err(err) => {
                    tracing::debug!(path = %file, error = %err, "cached silo unreadable, recompiling");
                    None
                }
            });

        if let Some(scratch) = &scratch {
            if let Some(current) = &self.current {
                if scratch.guid() == current.guid() {
                    return Ok(current.clone());
                }
            }
            if scratch.guid() == want_guid {
                self.current = Some(scratch.clone());
                return Ok(scratch.clone());
            }
        }

        let silo = self.compile(flags, cancel)?;
        std::fs::write(file.as_std_path(), silo.as_bytes())
            .map_err(SiloError::Io)
            .with_context(|| format!("writing silo to {file}"))?;
        Ok(silo)
    }
}
