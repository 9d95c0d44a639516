use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Model-space id returned for decoder ids that were never registered.
pub const UNKNOWN_MODEL_ID: i32 = -1;

/// Capacity of a freshly created mapping.
pub const INITIAL_CAPACITY: usize = 10;

/// One published generation of the mapping array.
///
/// Slots are atomics so registrations that fit in the current capacity can
/// write in place; growth publishes a new `Slots` instead.
struct Slots {
	model_ids: Box<[AtomicI32]>,
	/// Number of decoder ids observed so far. Always `<= model_ids.len()`.
	mapped_len: AtomicUsize,
}

impl Slots {
	fn with_capacity(capacity: usize) -> Self {
		Self {
			model_ids: (0..capacity).map(|_| AtomicI32::new(UNKNOWN_MODEL_ID)).collect(),
			mapped_len: AtomicUsize::new(0),
		}
	}

	/// Copies `self` into a larger array; new slots hold [`UNKNOWN_MODEL_ID`].
	fn grown(&self, capacity: usize) -> Self {
		let model_ids = (0..capacity)
			.map(|i| {
				let id = self
					.model_ids
					.get(i)
					.map_or(UNKNOWN_MODEL_ID, |slot| slot.load(Ordering::Acquire));
				AtomicI32::new(id)
			})
			.collect();
		Self {
			model_ids,
			mapped_len: AtomicUsize::new(self.mapped_len.load(Ordering::Acquire)),
		}
	}
}

/// Growable mapping from decoder-space word ids to model-space word ids.
///
/// A loaded model owns one mapping; every thread scoring against that model
/// shares it.
///
/// # Concurrency
/// - `register` serializes on a single writer lock.
/// - `translate` takes no lock: it loads the published array and reads it.
/// - Growth copies into a new array which is fully populated before it is
///   swapped in, so readers never observe a partially grown array.
///
/// # Invariants
/// - `mapped_len <= capacity`
/// - ids below `mapped_len` hold a registered (or gap-filling unknown) model id
/// - the array never shrinks
pub struct VocabMapping {
	slots: ArcSwap<Slots>,
	writer: Mutex<()>,
}

impl Default for VocabMapping {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for VocabMapping {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VocabMapping")
			.field("mapped_len", &self.mapped_len())
			.field("capacity", &self.capacity())
			.finish()
	}
}

impl VocabMapping {
	/// Creates an empty mapping with [`INITIAL_CAPACITY`] slots.
	pub fn new() -> Self {
		Self::with_capacity(INITIAL_CAPACITY)
	}

	/// Creates an empty mapping with `capacity` slots.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			slots: ArcSwap::from_pointee(Slots::with_capacity(capacity)),
			writer: Mutex::new(()),
		}
	}

	/// Records that `decoder_id` is the word `token`.
	///
	/// `lookup` resolves `token` in the model's own vocabulary. Returns
	/// `false` and leaves the mapping untouched if the model does not know the
	/// token, or if `decoder_id` is a nonterminal.
	///
	/// Registering the same decoder id again overwrites the previous entry.
	pub fn register<F>(&self, decoder_id: i32, token: &str, lookup: F) -> bool
	where
		F: FnOnce(&str) -> Option<i32>,
	{
		if decoder_id < 0 {
			log::trace!("not registering nonterminal {decoder_id} ({token})");
			return false;
		}
		let Some(model_id) = lookup(token) else {
			log::trace!("model has no entry for {token:?}; decoder id {decoder_id} left unmapped");
			return false;
		};

		let index = decoder_id as usize;
		let _guard = self.writer.lock();

		let mut current = self.slots.load_full();
		if index >= current.model_ids.len() {
			let capacity = (index + 1).max(current.model_ids.len() * 2);
			log::debug!(
				"growing vocabulary mapping from {} to {capacity} slots",
				current.model_ids.len()
			);
			let grown = Arc::new(current.grown(capacity));
			self.slots.store(Arc::clone(&grown));
			current = grown;
		}

		current.model_ids[index].store(model_id, Ordering::Release);
		current.mapped_len.fetch_max(index + 1, Ordering::Release);
		true
	}

	/// Returns the model id registered for `decoder_id`, or [`UNKNOWN_MODEL_ID`].
	#[inline]
	pub fn translate(&self, decoder_id: i32) -> i32 {
		if decoder_id < 0 {
			return UNKNOWN_MODEL_ID;
		}
		let slots = self.slots.load();
		let index = decoder_id as usize;
		if index < slots.mapped_len.load(Ordering::Acquire) {
			slots.model_ids[index].load(Ordering::Acquire)
		} else {
			UNKNOWN_MODEL_ID
		}
	}

	/// Translates `ngram` into `out`, replacing its content.
	///
	/// All ids are read against the same published array.
	pub fn translate_into(&self, ngram: &[i32], out: &mut Vec<i32>) {
		let slots = self.slots.load();
		let mapped_len = slots.mapped_len.load(Ordering::Acquire);

		out.clear();
		out.extend(ngram.iter().map(|&decoder_id| {
			if decoder_id >= 0 && (decoder_id as usize) < mapped_len {
				slots.model_ids[decoder_id as usize].load(Ordering::Acquire)
			} else {
				UNKNOWN_MODEL_ID
			}
		}));
	}

	/// Number of decoder ids observed so far.
	pub fn mapped_len(&self) -> usize {
		self.slots.load().mapped_len.load(Ordering::Acquire)
	}

	/// Number of slots currently allocated.
	pub fn capacity(&self) -> usize {
		self.slots.load().model_ids.len()
	}
}
