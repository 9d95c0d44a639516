//! Error types shared by the vocabulary, the bridge and the model loader.

/// Errors raised by symbol-table lookups, scoring and model loading.
///
/// None of these are retried internally: lookups and scoring are pure
/// functions of the current state.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	/// A decoder id or a word was never allocated.
	#[error("lookup failed: {0}")]
	Lookup(String),

	/// The operation is intentionally not implemented by this backend.
	#[error("unsupported operation: {0}")]
	UnsupportedOperation(String),

	/// A precondition on the receiver does not hold.
	#[error("invalid state: {0}")]
	InvalidState(String),

	/// The n-gram is empty or longer than the model order.
	#[error("invalid n-gram of length {len} for a model of order {order}")]
	InvalidNgram {
		/// Length of the rejected n-gram.
		len: usize,
		/// Order of the model it was submitted to.
		order: usize,
	},

	/// A nonterminal string carries no index digit before its last character.
	#[error("malformed nonterminal `{0}`")]
	MalformedNonterminal(String),

	/// The model file is not valid ARPA text.
	#[error("line {line}: {message}")]
	ModelFormat {
		/// 1-based line number in the model file.
		line: usize,
		/// What was wrong with it.
		message: String,
	},

	/// Binary image encoding or decoding failed.
	#[error(transparent)]
	Serialization(#[from] postcard::Error),

	/// I/O error.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
