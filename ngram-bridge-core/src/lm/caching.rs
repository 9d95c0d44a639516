use std::cell::{Cell, RefCell};

use super::ArrayEncodedLm;
use super::word_indexer::WordIndexer;

/// Number of slots in a default cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 16;

struct CacheSlot {
	ngram: Vec<i32>,
	log_prob: f32,
}

/// Direct-mapped score cache in front of a model.
///
/// Each n-gram hashes to exactly one slot; a collision evicts the previous
/// occupant. The cache lives in `RefCell`/`Cell`, so a `CachingLm` may move
/// to another thread but never be shared between threads.
pub struct CachingLm<L> {
	lm: L,
	mask: u64,
	slots: RefCell<Vec<Option<CacheSlot>>>,
	hits: Cell<u64>,
	misses: Cell<u64>,
}

impl<L> CachingLm<L> {
	/// Wraps `lm` with a cache of [`DEFAULT_CACHE_CAPACITY`] slots.
	pub fn new(lm: L) -> Self {
		Self::with_capacity(lm, DEFAULT_CACHE_CAPACITY)
	}

	/// Wraps `lm` with a cache of `capacity` slots, rounded up to a power of two.
	pub fn with_capacity(lm: L, capacity: usize) -> Self {
		let capacity = capacity.max(1).next_power_of_two();
		Self {
			lm,
			mask: capacity as u64 - 1,
			slots: RefCell::new((0..capacity).map(|_| None).collect()),
			hits: Cell::new(0),
			misses: Cell::new(0),
		}
	}

	/// The wrapped model.
	pub fn inner(&self) -> &L {
		&self.lm
	}

	/// Number of queries answered from the cache.
	pub fn hits(&self) -> u64 {
		self.hits.get()
	}

	/// Number of queries forwarded to the wrapped model.
	pub fn misses(&self) -> u64 {
		self.misses.get()
	}

	/// Number of occupied slots.
	pub fn len(&self) -> usize {
		self.slots.borrow().iter().filter(|slot| slot.is_some()).count()
	}

	/// True if no slot is occupied.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of slots.
	pub fn capacity(&self) -> usize {
		self.mask as usize + 1
	}

	fn slot_of(&self, ngram: &[i32]) -> usize {
		// FNV-1a over the word ids.
		let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
		for &word in ngram {
			hash ^= word as u32 as u64;
			hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
		}
		(hash & self.mask) as usize
	}
}

/// A copy starts with an empty cache of the same capacity.
impl<L: Clone> Clone for CachingLm<L> {
	fn clone(&self) -> Self {
		Self::with_capacity(self.lm.clone(), self.capacity())
	}
}

impl<L: ArrayEncodedLm> ArrayEncodedLm for CachingLm<L> {
	fn log_prob(&self, ngram: &[i32]) -> f32 {
		let index = self.slot_of(ngram);

		if let Some(slot) = &self.slots.borrow()[index] {
			if slot.ngram == ngram {
				self.hits.set(self.hits.get() + 1);
				return slot.log_prob;
			}
		}

		self.misses.set(self.misses.get() + 1);
		let log_prob = self.lm.log_prob(ngram);

		let mut slots = self.slots.borrow_mut();
		match &mut slots[index] {
			Some(slot) => {
				slot.ngram.clear();
				slot.ngram.extend_from_slice(ngram);
				slot.log_prob = log_prob;
			}
			empty => *empty = Some(CacheSlot { ngram: ngram.to_vec(), log_prob }),
		}
		log_prob
	}

	fn order(&self) -> usize {
		self.lm.order()
	}

	fn word_indexer(&self) -> &WordIndexer {
		self.lm.word_indexer()
	}

	fn is_caching(&self) -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::lm::backoff_model::BackoffModel;

	fn model() -> Arc<BackoffModel> {
		let mut indexer = WordIndexer::new();
		let a = indexer.add_word("a");
		let b = indexer.add_word("b");
		let mut model = BackoffModel::new(2, indexer);
		model.insert(&[a], -1.0, -0.5);
		model.insert(&[b], -2.0, 0.0);
		model.insert(&[a, b], -0.3, 0.0);
		Arc::new(model)
	}

	#[test]
	fn repeated_queries_hit() {
		let cached = CachingLm::new(model());
		assert_eq!(cached.log_prob(&[0, 1]), -0.3);
		assert_eq!(cached.log_prob(&[0, 1]), -0.3);
		assert_eq!(cached.log_prob(&[1]), -2.0);
		assert_eq!((cached.hits(), cached.misses()), (1, 2));
		assert_eq!(cached.len(), 2);
	}

	#[test]
	fn collisions_evict_and_stay_correct() {
		let cached = CachingLm::with_capacity(model(), 1);
		assert_eq!(cached.capacity(), 1);
		assert_eq!(cached.log_prob(&[0]), -1.0);
		assert_eq!(cached.log_prob(&[1]), -2.0);
		assert_eq!(cached.log_prob(&[0]), -1.0);
		assert_eq!((cached.hits(), cached.misses()), (0, 3));
		assert_eq!(cached.len(), 1);
	}

	#[test]
	fn capacity_rounds_to_a_power_of_two() {
		assert_eq!(CachingLm::with_capacity(model(), 1000).capacity(), 1024);
		assert_eq!(CachingLm::with_capacity(model(), 0).capacity(), 1);
	}

	#[test]
	fn clones_start_empty() {
		let cached = CachingLm::with_capacity(model(), 8);
		cached.log_prob(&[0, 1]);
		let copy = cached.clone();
		assert!(copy.is_empty());
		assert_eq!(copy.capacity(), 8);
		assert!(copy.is_caching());
		assert!(!cached.inner().is_caching());
	}
}
