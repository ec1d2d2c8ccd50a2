//! Compiles XML documents into a single binary silo: a flat, offset-addressed
//! node table plus a deduplicated string table, intended to be read back
//! without a full XML reparse.
//!
//! The entry point is [`Builder`]: import XML from strings, files, or whole
//! directories, then call [`Builder::compile`] or [`Builder::ensure`] to
//! produce a [`Silo`].

pub mod builder;
pub mod cancel;
pub mod error;
pub mod import;
pub mod locale;
pub mod node;
mod nodetab;
pub mod parser;
pub mod silo;
mod strtab;

pub use builder::{Builder, CompileFlags};
pub use cancel::CancelToken;
pub use error::SiloError;
pub use import::Import;
pub use node::BuilderNode;
pub use silo::Silo;
