//! Model Module
//!
//! Typed document collections stored as opaque values in the engine.
//!
//! ## Key Layout
//! Every document of a collection lives under `"<collection>:<id>"`, so
//! several collections share one engine without clashing.
//!
//! ## Value Encoding
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ SchemaVersion(1) │   bincode(document)      │
//! └──────────────────┴──────────────────────────┘
//! ```
//! The version byte is checked on every decode, so a document type that
//! changes shape bumps `SCHEMA_VERSION` instead of silently misreading old
//! values.

mod collection;

pub use collection::{decode_document, encode_document, Collection, Document};
