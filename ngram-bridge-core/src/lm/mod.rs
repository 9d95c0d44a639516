//! Model-side components: the scoring contract the bridge forwards to, and
//! the backoff model, ARPA reader, binary images and cache implementing it.

use std::sync::Arc;

/// ARPA text reader.
pub mod arpa;

/// Backoff n-gram model over model-space ids.
pub mod backoff_model;

/// Non-thread-safe score cache.
pub mod caching;

/// Model loading from ARPA text or binary images.
pub mod loader;

/// The model's own word index.
pub mod word_indexer;

pub use backoff_model::BackoffModel;
pub use caching::CachingLm;
pub use loader::{load_model, load_or_build, write_binary_image};
pub use word_indexer::WordIndexer;

/// A language model scoring n-grams of model-space word ids.
///
/// The last id of the n-gram is the predicted word, the others its context.
/// Id `-1` stands for a word the model has never seen.
pub trait ArrayEncodedLm {
	/// Log10 probability of the n-gram's last word given the others.
	fn log_prob(&self, ngram: &[i32]) -> f32;

	/// Highest n-gram length the model distinguishes.
	fn order(&self) -> usize;

	/// The model's own vocabulary.
	fn word_indexer(&self) -> &WordIndexer;

	/// True if this model answers from a private cache.
	fn is_caching(&self) -> bool {
		false
	}
}

impl<L: ArrayEncodedLm + ?Sized> ArrayEncodedLm for Arc<L> {
	fn log_prob(&self, ngram: &[i32]) -> f32 {
		(**self).log_prob(ngram)
	}

	fn order(&self) -> usize {
		(**self).order()
	}

	fn word_indexer(&self) -> &WordIndexer {
		(**self).word_indexer()
	}

	fn is_caching(&self) -> bool {
		(**self).is_caching()
	}
}
