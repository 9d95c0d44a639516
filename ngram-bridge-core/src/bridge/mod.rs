//! The decoder-to-model bridge.
//!
//! This module exposes:
//! - `VocabMapping`: the growable decoder id -> model id table
//! - `NgramLanguageModel`: the decoder-facing scoring contract
//! - `BridgedNgramLm`: the adapter translating ids before scoring

/// Decoder-facing scoring adapter and its thread-local copies.
pub mod bridged_lm;

/// Lock-free growable id mapping.
pub mod vocab_mapping;

pub use bridged_lm::{BridgedNgramLm, NgramLanguageModel};
pub use vocab_mapping::{UNKNOWN_MODEL_ID, VocabMapping};
