//! Vocabulary bridge between a decoder and an n-gram language model.
//!
//! The decoder numbers words with its own symbol table; a loaded language
//! model numbers them differently. This crate provides:
//! - The symbol-table contract and an in-memory vocabulary (`vocab`)
//! - A growable, lock-free mapping from decoder ids to model ids (`bridge`)
//! - A scoring adapter translating ids before querying the model (`bridge`)
//! - Per-thread cached copies of that adapter (`bridge`, `lm::caching`)
//! - A backoff model loaded from ARPA text or binary images (`lm`)

/// Decoder-to-model id mapping and the scoring adapter.
pub mod bridge;

/// Error type shared by the crate.
pub mod error;

/// Language model side: scoring contract, backoff model, loading, caching.
pub mod lm;

/// Decoder-side symbol tables.
pub mod vocab;

/// Path helpers.
///
/// Not exposed
pub(crate) mod io;

pub use error::{BridgeError, BridgeResult};
