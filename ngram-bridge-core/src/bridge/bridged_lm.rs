use std::sync::Arc;

use super::vocab_mapping::VocabMapping;
use crate::error::{BridgeError, BridgeResult};
use crate::lm::{ArrayEncodedLm, CachingLm};

/// Decoder-facing n-gram language model.
///
/// N-grams are given in decoder-space ids; the last id is the predicted word.
pub trait NgramLanguageModel {
	/// Highest n-gram length accepted by [`NgramLanguageModel::ngram_log_probability`].
	fn order(&self) -> usize;

	/// Tells the model that decoder id `decoder_id` is the word `token`.
	///
	/// Returns `false` if the model does not know `token`.
	fn register_word(&self, token: &str, decoder_id: i32) -> bool;

	/// Log10 probability of the n-gram's last word given the others.
	///
	/// # Errors
	/// [`BridgeError::InvalidNgram`] if `ngram` is empty or longer than [`NgramLanguageModel::order`].
	fn ngram_log_probability(&self, ngram: &[i32]) -> BridgeResult<f32>;

	/// Log10 probability of a backoff state.
	///
	/// # Errors
	/// [`BridgeError::UnsupportedOperation`] unless the model exposes backoff states.
	fn log_probability_of_backoff_state(
		&self,
		_ngram: &[i32],
		_order: usize,
		_additional_backoff_weights: usize,
	) -> BridgeResult<f32> {
		Err(BridgeError::UnsupportedOperation(
			"backoff state scoring is not exposed by this model".to_owned(),
		))
	}

	/// A copy with its own private cache, for use by a single thread.
	///
	/// # Errors
	/// [`BridgeError::InvalidState`] if `self` is already cached.
	fn boxed_thread_local_copy(&self) -> BridgeResult<Box<dyn NgramLanguageModel + Send>>;

	/// Sums the log probabilities of a sentence.
	///
	/// The leading partial n-grams `sentence[..j]` for `j` in
	/// `start_index..order` are scored first (the empty one is skipped), then
	/// every full `order`-gram.
	///
	/// # Errors
	/// [`BridgeError::InvalidNgram`] if `order` is zero or above the model order.
	fn sentence_log_probability(&self, sentence: &[i32], order: usize, start_index: usize) -> BridgeResult<f64> {
		if order == 0 || order > self.order() {
			return Err(BridgeError::InvalidNgram { len: order, order: self.order() });
		}
		if sentence.is_empty() {
			return Ok(0.0);
		}

		let mut log_prob = 0.0;
		for j in start_index.max(1)..order.min(sentence.len() + 1) {
			log_prob += f64::from(self.ngram_log_probability(&sentence[..j])?);
		}
		for ngram in sentence.windows(order) {
			log_prob += f64::from(self.ngram_log_probability(ngram)?);
		}
		Ok(log_prob)
	}
}

/// Where a [`BridgedNgramLm`] sends its queries.
enum Backend<L> {
	Shared(L),
	Cached(CachingLm<L>),
}

impl<L: ArrayEncodedLm> Backend<L> {
	fn lm(&self) -> &dyn ArrayEncodedLm {
		match self {
			Backend::Shared(lm) => lm,
			Backend::Cached(cached) => cached,
		}
	}
}

/// Scores decoder-space n-grams against a model with its own word ids.
///
/// Each query is copied and translated through the shared [`VocabMapping`],
/// then forwarded whole to the model. Copies made by
/// [`BridgedNgramLm::thread_local_copy`] share the model and the mapping but
/// each carry a private cache; the cache makes them `!Sync`, so every thread
/// takes its own copy.
pub struct BridgedNgramLm<L> {
	backend: Backend<L>,
	mapping: Arc<VocabMapping>,
}

impl<L: ArrayEncodedLm> BridgedNgramLm<L> {
	/// Bridges `lm` through a new, empty mapping.
	pub fn new(lm: L) -> Self {
		Self::with_mapping(lm, Arc::new(VocabMapping::new()))
	}

	/// Bridges `lm` through an existing mapping.
	pub fn with_mapping(lm: L, mapping: Arc<VocabMapping>) -> Self {
		Self { backend: Backend::Shared(lm), mapping }
	}

	/// The decoder-to-model id mapping.
	pub fn mapping(&self) -> &Arc<VocabMapping> {
		&self.mapping
	}

	/// The private cache, on thread-local copies.
	pub fn cache(&self) -> Option<&CachingLm<L>> {
		match &self.backend {
			Backend::Shared(_) => None,
			Backend::Cached(cached) => Some(cached),
		}
	}

	/// Registers every `(decoder_id, word)` pair; returns how many the model knew.
	pub fn register_words<'a, I>(&self, words: I) -> usize
	where
		I: IntoIterator<Item = (i32, &'a str)>,
	{
		words
			.into_iter()
			.filter(|&(decoder_id, word)| self.register(word, decoder_id))
			.count()
	}

	fn register(&self, token: &str, decoder_id: i32) -> bool {
		let indexer = self.backend.lm().word_indexer();
		self.mapping
			.register(decoder_id, token, |token| indexer.index_possibly_unk(token))
	}

	fn score(&self, ngram: &[i32]) -> BridgeResult<f32> {
		let lm = self.backend.lm();
		if ngram.is_empty() || ngram.len() > lm.order() {
			return Err(BridgeError::InvalidNgram { len: ngram.len(), order: lm.order() });
		}

		// The caller may reuse its buffer; translate into our own.
		let mut translated = Vec::with_capacity(ngram.len());
		self.mapping.translate_into(ngram, &mut translated);
		Ok(lm.log_prob(&translated))
	}
}

impl<L: ArrayEncodedLm + Clone> BridgedNgramLm<L> {
	/// A copy sharing the model and mapping, with a fresh private cache.
	///
	/// # Errors
	/// [`BridgeError::InvalidState`] if `self` is itself a thread-local copy.
	pub fn thread_local_copy(&self) -> BridgeResult<Self> {
		self.thread_local_copy_with_capacity(crate::lm::caching::DEFAULT_CACHE_CAPACITY)
	}

	/// Same as [`BridgedNgramLm::thread_local_copy`] with a cache of `capacity` slots.
	pub fn thread_local_copy_with_capacity(&self, capacity: usize) -> BridgeResult<Self> {
		let lm = match &self.backend {
			Backend::Shared(lm) if !lm.is_caching() => lm,
			_ => {
				return Err(BridgeError::InvalidState(
					"cannot wrap an already cached model with another cache".to_owned(),
				));
			}
		};
		Ok(Self {
			backend: Backend::Cached(CachingLm::with_capacity(lm.clone(), capacity)),
			mapping: Arc::clone(&self.mapping),
		})
	}
}

/// Copies share the model and mapping; a cached copy starts with an empty cache.
impl<L: Clone> Clone for BridgedNgramLm<L> {
	fn clone(&self) -> Self {
		let backend = match &self.backend {
			Backend::Shared(lm) => Backend::Shared(lm.clone()),
			Backend::Cached(cached) => Backend::Cached(cached.clone()),
		};
		Self { backend, mapping: Arc::clone(&self.mapping) }
	}
}

impl<L> NgramLanguageModel for BridgedNgramLm<L>
where
	L: ArrayEncodedLm + Clone + Send + 'static,
{
	fn order(&self) -> usize {
		self.backend.lm().order()
	}

	fn register_word(&self, token: &str, decoder_id: i32) -> bool {
		self.register(token, decoder_id)
	}

	fn ngram_log_probability(&self, ngram: &[i32]) -> BridgeResult<f32> {
		self.score(ngram)
	}

	fn boxed_thread_local_copy(&self) -> BridgeResult<Box<dyn NgramLanguageModel + Send>> {
		Ok(Box::new(self.thread_local_copy()?))
	}
}
