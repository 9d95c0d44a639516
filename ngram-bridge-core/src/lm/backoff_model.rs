use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ArrayEncodedLm;
use super::word_indexer::WordIndexer;

/// Log10 probability given to words the model cannot score at all.
pub const OOV_LOG_PROB: f32 = -100.0;

/// Probability and backoff weight of one n-gram, both in log10.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NgramEntry {
	pub log_prob: f32,
	pub backoff: f32,
}

/// Backoff n-gram language model over model-space word ids.
///
/// Scoring follows the usual ARPA recipe: a known n-gram returns its own
/// probability; otherwise the context's backoff weight is added to the score
/// of the n-gram shortened by its first word.
///
/// # Invariants
/// - every key has a length in `1..=order`
/// - every word id in a key is a valid index of `indexer`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BackoffModel {
	order: usize,
	indexer: WordIndexer,
	entries: HashMap<Vec<i32>, NgramEntry>,
}

impl BackoffModel {
	/// Creates an empty model of the given order over `indexer`.
	pub fn new(order: usize, indexer: WordIndexer) -> Self {
		Self { order, indexer, entries: HashMap::new() }
	}

	/// Adds or replaces the entry for `words`.
	///
	/// Returns `false` and ignores the entry if its length is not in `1..=order`.
	pub fn insert(&mut self, words: &[i32], log_prob: f32, backoff: f32) -> bool {
		if words.is_empty() || words.len() > self.order {
			return false;
		}
		self.entries.insert(words.to_vec(), NgramEntry { log_prob, backoff });
		true
	}

	/// Entry stored for exactly `words`.
	pub fn entry(&self, words: &[i32]) -> Option<&NgramEntry> {
		self.entries.get(words)
	}

	/// Iterates over every stored n-gram and its entry.
	pub fn entries(&self) -> impl Iterator<Item = (&[i32], &NgramEntry)> {
		self.entries.iter().map(|(words, entry)| (words.as_slice(), entry))
	}

	/// Number of stored n-grams, all orders together.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True if no n-gram is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn unigram_log_prob(&self, word: i32) -> f32 {
		self.entries
			.get([word].as_slice())
			.or_else(|| {
				let unk = self.indexer.unk_index()?;
				self.entries.get([unk].as_slice())
			})
			.map_or(OOV_LOG_PROB, |entry| entry.log_prob)
	}
}

impl ArrayEncodedLm for BackoffModel {
	fn log_prob(&self, ngram: &[i32]) -> f32 {
		let ngram = &ngram[ngram.len().saturating_sub(self.order)..];
		if ngram.is_empty() {
			return 0.0;
		}

		let mut backoff = 0.0;
		for start in 0..ngram.len() - 1 {
			let suffix = &ngram[start..];
			if let Some(entry) = self.entries.get(suffix) {
				return backoff + entry.log_prob;
			}
			if let Some(context) = self.entries.get(&suffix[..suffix.len() - 1]) {
				backoff += context.backoff;
			}
		}

		backoff + self.unigram_log_prob(ngram[ngram.len() - 1])
	}

	fn order(&self) -> usize {
		self.order
	}

	fn word_indexer(&self) -> &WordIndexer {
		&self.indexer
	}
}
