//! Crate-wide error type.
//!
//! Call sites that only need to propagate and display use `anyhow::Result`;
//! call sites that need to pattern-match on the failure kind (the silo
//! verifier, `ensure`, the CLI) use [`SiloError`] directly.

use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SiloError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("bad magic bytes")]
    BadMagic,

    #[error("unsupported silo version: {0}")]
    BadVersion(u32),
}
