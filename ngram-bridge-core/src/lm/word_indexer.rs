use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Word used by model files for the unknown word.
pub const MODEL_UNKNOWN_WORD: &str = "<unk>";

/// A model's own vocabulary: dense model-space ids in order of first sight.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WordIndexer {
	words: Vec<String>,
	indices: HashMap<String, i32>,
	unk_index: Option<i32>,
}

impl WordIndexer {
	/// Creates an empty indexer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the index of `word`, adding it if needed.
	pub fn add_word(&mut self, word: &str) -> i32 {
		if let Some(&index) = self.indices.get(word) {
			return index;
		}
		let index = self.words.len() as i32;
		self.words.push(word.to_owned());
		self.indices.insert(word.to_owned(), index);
		if word == MODEL_UNKNOWN_WORD {
			self.unk_index = Some(index);
		}
		index
	}

	/// Exact lookup.
	pub fn index(&self, word: &str) -> Option<i32> {
		self.indices.get(word).copied()
	}

	/// Exact lookup, falling back to the unknown word when the model has one.
	pub fn index_possibly_unk(&self, word: &str) -> Option<i32> {
		self.index(word).or(self.unk_index)
	}

	/// Index of the unknown word, if the model defines it.
	pub fn unk_index(&self) -> Option<i32> {
		self.unk_index
	}

	/// Word stored at `index`.
	pub fn word(&self, index: i32) -> Option<&str> {
		usize::try_from(index)
			.ok()
			.and_then(|i| self.words.get(i))
			.map(String::as_str)
	}

	/// Number of words.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	/// True if the indexer holds no word.
	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn indices_are_dense_and_stable() {
		let mut indexer = WordIndexer::new();
		assert_eq!(indexer.add_word("a"), 0);
		assert_eq!(indexer.add_word("b"), 1);
		assert_eq!(indexer.add_word("a"), 0);
		assert_eq!(indexer.word(1), Some("b"));
		assert_eq!(indexer.word(-1), None);
		assert_eq!(indexer.len(), 2);
	}

	#[test]
	fn unknown_word_is_a_fallback_only_when_present() {
		let mut indexer = WordIndexer::new();
		indexer.add_word("a");
		assert_eq!(indexer.index_possibly_unk("zzz"), None);

		let unk = indexer.add_word(MODEL_UNKNOWN_WORD);
		assert_eq!(indexer.index_possibly_unk("zzz"), Some(unk));
		assert_eq!(indexer.index_possibly_unk("a"), Some(0));
		assert_eq!(indexer.index("zzz"), None);
	}
}
