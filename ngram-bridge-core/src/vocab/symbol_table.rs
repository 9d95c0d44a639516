use std::io::{Read, Write};

use crate::error::{BridgeError, BridgeResult};

/// Decoder id of the unknown word. Every vocabulary allocates it first.
pub const UNKNOWN_WORD_ID: i32 = 0;

/// Surface form of the unknown word.
pub const UNKNOWN_WORD: &str = "<unk>";

/// Returned by [`SymbolTable::target_nonterminal_index`] for terminals.
pub const NOT_A_NONTERMINAL: i32 = -1;

/// Character encoding accepted by [`SymbolTable::export`].
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Label printed for nonterminals by [`SymbolTable::render`].
const NONTERMINAL_LABEL: &str = "X";

/// Bidirectional mapping between surface words and decoder-space ids.
///
/// Terminals get non-negative ids, nonterminals negative ones. The sign is
/// all the decoder needs on its hot path; the nonterminal's index is only
/// recovered from its string form when asked for.
///
/// Implementors provide the storage (`add_terminal`, `add_nonterminal`,
/// `word`, `id`, `len`); the encoding rules are provided here.
pub trait SymbolTable {
	/// Returns the id of `word`, allocating a new terminal id if needed.
	fn add_terminal(&mut self, word: &str) -> i32;

	/// Returns the id of `word`, allocating a new nonterminal id if needed.
	fn add_nonterminal(&mut self, word: &str) -> i32;

	/// Inverse lookup.
	///
	/// # Errors
	/// [`BridgeError::Lookup`] if `id` was never allocated.
	fn word(&self, id: i32) -> BridgeResult<&str>;

	/// Forward lookup, without allocating.
	fn id(&self, word: &str) -> Option<i32>;

	/// Number of allocated symbols, terminals and nonterminals together.
	fn len(&self) -> usize;

	/// True if nothing has been allocated.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Splits `sentence` on runs of whitespace and adds every token, in order.
	fn add_terminals(&mut self, sentence: &str) -> Vec<i32> {
		sentence
			.split_whitespace()
			.map(|word| self.add_terminal(word))
			.collect()
	}

	/// Adds every word of an already tokenized sentence, in order.
	fn add_terminal_words(&mut self, words: &[&str]) -> Vec<i32> {
		words.iter().map(|word| self.add_terminal(word)).collect()
	}

	/// True iff `id` denotes a nonterminal.
	fn is_nonterminal(&self, id: i32) -> bool {
		id < 0
	}

	/// Returns the index carried by a nonterminal's string form.
	///
	/// The index is the run of decimal digits ending right before the final
	/// character, so `[X,1]` yields `1` and `[X,12]` yields `12`.
	/// Terminals yield [`NOT_A_NONTERMINAL`].
	///
	/// # Errors
	/// - [`BridgeError::Lookup`] if the nonterminal id was never allocated.
	/// - [`BridgeError::MalformedNonterminal`] if no digit precedes the final character.
	fn target_nonterminal_index(&self, id: i32) -> BridgeResult<i32> {
		if !self.is_nonterminal(id) {
			return Ok(NOT_A_NONTERMINAL);
		}
		nonterminal_index_of(self.word(id)?)
	}

	/// Renders `ids` as a space-separated string.
	///
	/// Nonterminals print as `[X,n]`. With `renumber_nonterminals`, `n` counts
	/// up from 1 in order of appearance; otherwise `n` is the negated id.
	///
	/// # Errors
	/// [`BridgeError::Lookup`] if a terminal id was never allocated.
	fn render(&self, ids: &[i32], renumber_nonterminals: bool) -> BridgeResult<String> {
		let mut out = String::new();
		let mut next_index: i64 = 1;

		for (position, &id) in ids.iter().enumerate() {
			if position > 0 {
				out.push(' ');
			}

			if self.is_nonterminal(id) {
				let index = if renumber_nonterminals {
					let index = next_index;
					next_index += 1;
					index
				} else {
					-(id as i64)
				};
				out.push_str(&format!("[{NONTERMINAL_LABEL},{index}]"));
			} else {
				out.push_str(self.word(id)?);
			}
		}

		Ok(out)
	}

	/// Surface form of the unknown word.
	fn unknown_word(&self) -> &str {
		UNKNOWN_WORD
	}

	/// Decoder id of the unknown word.
	fn unknown_word_id(&self) -> i32 {
		UNKNOWN_WORD_ID
	}

	/// Writes the table to `writer` using the named character encoding.
	///
	/// Not every table can be persisted; the default declines.
	fn export(&self, _writer: &mut dyn Write, _encoding: &str) -> BridgeResult<()> {
		Err(BridgeError::UnsupportedOperation("symbol table export".to_owned()))
	}

	/// Replaces the table's content with what `reader` holds.
	///
	/// Not every table can be persisted; the default declines.
	fn import(&mut self, _reader: &mut dyn Read) -> BridgeResult<()> {
		Err(BridgeError::UnsupportedOperation("symbol table import".to_owned()))
	}
}

/// Extracts the index digits preceding the last character of a nonterminal.
pub fn nonterminal_index_of(symbol: &str) -> BridgeResult<i32> {
	let malformed = || BridgeError::MalformedNonterminal(symbol.to_owned());

	let mut chars = symbol.char_indices().rev();
	let (last, _) = chars.next().ok_or_else(malformed)?;

	let start = symbol[..last]
		.char_indices()
		.rev()
		.take_while(|(_, c)| c.is_ascii_digit())
		.last()
		.map(|(i, _)| i)
		.ok_or_else(malformed)?;

	symbol[start..last].parse::<i32>().map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn index_is_the_digit_before_the_closing_bracket() {
		assert_eq!(nonterminal_index_of("[X,1]").unwrap(), 1);
		assert_eq!(nonterminal_index_of("[X,2]").unwrap(), 2);
		assert_eq!(nonterminal_index_of("[NP,7]").unwrap(), 7);
	}

	#[test]
	fn multi_digit_indices_are_read_whole() {
		assert_eq!(nonterminal_index_of("[X,12]").unwrap(), 12);
		assert_eq!(nonterminal_index_of("[X,104]").unwrap(), 104);
	}

	#[test]
	fn missing_digit_is_malformed() {
		assert!(matches!(nonterminal_index_of("[X]"), Err(BridgeError::MalformedNonterminal(_))));
		assert!(matches!(nonterminal_index_of(""), Err(BridgeError::MalformedNonterminal(_))));
		assert!(matches!(nonterminal_index_of("]"), Err(BridgeError::MalformedNonterminal(_))));
	}

	/// Terminal-only table keeping every provided method.
	#[derive(Default)]
	struct WordList(Vec<String>);

	impl SymbolTable for WordList {
		fn add_terminal(&mut self, word: &str) -> i32 {
			match self.id(word) {
				Some(id) => id,
				None => {
					self.0.push(word.to_owned());
					self.0.len() as i32 - 1
				}
			}
		}

		fn add_nonterminal(&mut self, _word: &str) -> i32 {
			NOT_A_NONTERMINAL
		}

		fn word(&self, id: i32) -> BridgeResult<&str> {
			usize::try_from(id)
				.ok()
				.and_then(|i| self.0.get(i))
				.map(String::as_str)
				.ok_or_else(|| BridgeError::Lookup(format!("no word with id {id}")))
		}

		fn id(&self, word: &str) -> Option<i32> {
			self.0.iter().position(|w| w == word).map(|i| i as i32)
		}

		fn len(&self) -> usize {
			self.0.len()
		}
	}

	#[test]
	fn tables_without_persistence_decline_export_and_import() {
		let mut table = WordList::default();
		assert_eq!(table.add_terminals("the cat the"), vec![0, 1, 0]);

		let mut bytes = Vec::new();
		assert!(matches!(table.export(&mut bytes, DEFAULT_ENCODING), Err(BridgeError::UnsupportedOperation(_))));
		assert!(bytes.is_empty());
		assert!(matches!(table.import(&mut [0u8; 4].as_slice()), Err(BridgeError::UnsupportedOperation(_))));
		assert_eq!(table.len(), 2);
	}
}
