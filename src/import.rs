//! One XML input source plus optional provenance metadata.

use crate::error::SiloError;
use crate::node::BuilderNode;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use sha1::{Digest, Sha1};
use std::io::BufRead;

enum ImportKind {
    Inline(String),
    File(Utf8PathBuf),
}

/// A single XML source: a literal string or a file (transparently
/// gzip-decompressed when its name ends `.xml.gz`).
pub struct Import {
    kind: ImportKind,
    identity: String,
    info: Option<BuilderNode>,
}

impl Import {
    pub fn from_xml(xml: impl Into<String>) -> Self {
        let xml = xml.into();
        let mut hasher = Sha1::new();
        hasher.update(xml.as_bytes());
        let identity = format!("sha1:{:x}", hasher.finalize());
        Self {
            kind: ImportKind::Inline(xml),
            identity,
            info: None,
        }
    }

    pub fn from_file(
        path: impl AsRef<Utf8Path>,
        info: Option<BuilderNode>,
    ) -> Result<Self, SiloError> {
        let path = path.as_ref().to_path_buf();
        let meta = std::fs::metadata(path.as_std_path())
            .map_err(|_| SiloError::NotFound(path.clone()))?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let identity = format!("{path}@{mtime}");
        Ok(Self {
            kind: ImportKind::File(path),
            identity,
            info,
        })
    }

    /// A stable, content-derived token used to build the aggregate GUID.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The optional info tree grafted beneath each top-level element parsed
    /// from this import. Returns an owned clone since the Import remains
    /// reusable across compiles.
    pub fn info(&self) -> Option<BuilderNode> {
        self.info.clone()
    }

    /// Open a reader over this import's bytes, transparently decompressing
    /// `.xml.gz` files.
    pub fn open(&self) -> Result<Box<dyn BufRead>, SiloError> {
        match &self.kind {
            ImportKind::Inline(xml) => Ok(Box::new(std::io::Cursor::new(xml.clone().into_bytes()))),
            ImportKind::File(path) => {
                let file = std::fs::File::open(path.as_std_path())
                    .map_err(|_| SiloError::NotFound(path.clone()))?;
                if path.as_str().ends_with(".xml.gz") {
                    Ok(Box::new(std::io::BufReader::new(GzDecoder::new(file))))
                } else {
                    Ok(Box::new(std::io::BufReader::new(file)))
                }
            }
        }
    }
}

/// Scan a directory for `*.xml` and `*.xml.gz` files (non-recursive, matching
/// the original `xb_builder_import_dir`), in directory-listing order.
pub fn scan_dir(path: impl AsRef<Utf8Path>) -> Result<Vec<Utf8PathBuf>, SiloError> {
    let path = path.as_ref();
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(path.as_std_path()).map_err(|_| SiloError::NotFound(path.to_path_buf()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".xml") || name.ends_with(".xml.gz") {
            if let Ok(p) = Utf8PathBuf::from_path_buf(entry.path()) {
                out.push(p);
            }
        }
    }
    out.sort();
    Ok(out)
}
