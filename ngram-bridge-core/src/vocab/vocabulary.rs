use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::symbol_table::{DEFAULT_ENCODING, SymbolTable, UNKNOWN_WORD, UNKNOWN_WORD_ID};
use crate::error::{BridgeError, BridgeResult};

/// In-memory symbol table.
///
/// Terminal ids are dense from `0` upward, `0` being the unknown word.
/// Nonterminal ids are dense from `-1` downward.
///
/// # Invariants
/// - `terminals[id]` is the word of terminal `id`
/// - `nonterminals[-id - 1]` is the word of nonterminal `id`
/// - `ids` holds exactly one entry per allocated word
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vocabulary {
	terminals: Vec<String>,
	nonterminals: Vec<String>,
	ids: HashMap<String, i32>,
}

impl Default for Vocabulary {
	fn default() -> Self {
		Self::new()
	}
}

impl Vocabulary {
	/// Creates a vocabulary holding only the unknown word.
	pub fn new() -> Self {
		let mut vocabulary = Self {
			terminals: Vec::new(),
			nonterminals: Vec::new(),
			ids: HashMap::new(),
		};
		let unk = vocabulary.add_terminal(UNKNOWN_WORD);
		debug_assert_eq!(unk, UNKNOWN_WORD_ID);
		vocabulary
	}

	/// Iterates over terminal `(id, word)` pairs in id order.
	pub fn terminals(&self) -> impl Iterator<Item = (i32, &str)> {
		self.terminals
			.iter()
			.enumerate()
			.map(|(id, word)| (id as i32, word.as_str()))
	}

	/// Number of terminals, the unknown word included.
	pub fn terminal_count(&self) -> usize {
		self.terminals.len()
	}

	/// Number of nonterminals.
	pub fn nonterminal_count(&self) -> usize {
		self.nonterminals.len()
	}
}

impl SymbolTable for Vocabulary {
	fn add_terminal(&mut self, word: &str) -> i32 {
		if let Some(&id) = self.ids.get(word) {
			return id;
		}
		let id = self.terminals.len() as i32;
		self.terminals.push(word.to_owned());
		self.ids.insert(word.to_owned(), id);
		id
	}

	fn add_nonterminal(&mut self, word: &str) -> i32 {
		if let Some(&id) = self.ids.get(word) {
			return id;
		}
		let id = -(self.nonterminals.len() as i32) - 1;
		self.nonterminals.push(word.to_owned());
		self.ids.insert(word.to_owned(), id);
		id
	}

	fn word(&self, id: i32) -> BridgeResult<&str> {
		let word = if id >= 0 {
			self.terminals.get(id as usize)
		} else {
			self.nonterminals.get((-(id as i64) - 1) as usize)
		};
		word.map(String::as_str)
			.ok_or_else(|| BridgeError::Lookup(format!("no word for id {id}")))
	}

	fn id(&self, word: &str) -> Option<i32> {
		self.ids.get(word).copied()
	}

	fn len(&self) -> usize {
		self.terminals.len() + self.nonterminals.len()
	}

	fn export(&self, writer: &mut dyn Write, encoding: &str) -> BridgeResult<()> {
		if !encoding.eq_ignore_ascii_case(DEFAULT_ENCODING) && !encoding.eq_ignore_ascii_case("UTF8") {
			return Err(BridgeError::UnsupportedOperation(format!("export with encoding {encoding}")));
		}
		let bytes = postcard::to_stdvec(self)?;
		writer.write_all(&bytes)?;
		Ok(())
	}

	fn import(&mut self, reader: &mut dyn Read) -> BridgeResult<()> {
		let mut bytes = Vec::new();
		reader.read_to_end(&mut bytes)?;
		let imported: Vocabulary = postcard::from_bytes(&bytes)?;

		if imported.terminals.first().map(String::as_str) != Some(UNKNOWN_WORD) {
			return Err(BridgeError::InvalidState("imported vocabulary lacks the unknown word".to_owned()));
		}
		*self = imported;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::vocab::symbol_table::NOT_A_NONTERMINAL;

	#[test]
	fn unknown_word_comes_first() {
		let vocabulary = Vocabulary::new();
		assert_eq!(vocabulary.id(UNKNOWN_WORD), Some(UNKNOWN_WORD_ID));
		assert_eq!(vocabulary.word(vocabulary.unknown_word_id()).unwrap(), vocabulary.unknown_word());
		assert_eq!(vocabulary.len(), 1);
	}

	#[test]
	fn sentences_split_on_whitespace_runs() {
		let mut vocabulary = Vocabulary::new();
		let ids = vocabulary.add_terminals("  the cat\t\tsat  on the\nmat ");
		assert_eq!(ids, vec![1, 2, 3, 4, 1, 5]);
		assert_eq!(vocabulary.render(&ids, false).unwrap(), "the cat sat on the mat");
		assert_eq!(vocabulary.add_terminal_words(&["mat", "the"]), vec![5, 1]);
	}

	#[test]
	fn nonterminals_are_negative() {
		let mut vocabulary = Vocabulary::new();
		let x1 = vocabulary.add_nonterminal("[X,1]");
		let x2 = vocabulary.add_nonterminal("[X,2]");
		let word = vocabulary.add_terminal("house");

		assert_eq!((x1, x2), (-1, -2));
		assert!(vocabulary.is_nonterminal(x1));
		assert!(vocabulary.is_nonterminal(x2));
		assert!(!vocabulary.is_nonterminal(word));
		assert_eq!(vocabulary.add_nonterminal("[X,1]"), x1);
		assert_eq!(vocabulary.word(x2).unwrap(), "[X,2]");
		assert_eq!(vocabulary.nonterminal_count(), 2);
	}

	#[test]
	fn nonterminal_index_comes_from_the_string() {
		let mut vocabulary = Vocabulary::new();
		let first = vocabulary.add_nonterminal("[X,2]");
		let second = vocabulary.add_nonterminal("[NP,1]");
		let word = vocabulary.add_terminal("house");

		assert_eq!(vocabulary.target_nonterminal_index(first).unwrap(), 2);
		assert_eq!(vocabulary.target_nonterminal_index(second).unwrap(), 1);
		assert_eq!(vocabulary.target_nonterminal_index(word).unwrap(), NOT_A_NONTERMINAL);
		assert!(matches!(vocabulary.target_nonterminal_index(-9), Err(BridgeError::Lookup(_))));
	}

	#[test]
	fn render_renumbers_nonterminals_on_request() {
		let vocabulary = Vocabulary::new();
		assert_eq!(vocabulary.render(&[-1, -1], true).unwrap(), "[X,1] [X,2]");
		assert_eq!(vocabulary.render(&[-1, -1], false).unwrap(), "[X,1] [X,1]");
	}

	#[test]
	fn render_mixes_terminals_and_nonterminals() {
		let mut vocabulary = Vocabulary::new();
		let ids = vocabulary.add_terminals("le chat");
		let sequence = [ids[0], -2, ids[1], -1];
		assert_eq!(vocabulary.render(&sequence, false).unwrap(), "le [X,2] chat [X,1]");
		assert_eq!(vocabulary.render(&sequence, true).unwrap(), "le [X,1] chat [X,2]");
		assert_eq!(vocabulary.render(&[], true).unwrap(), "");
	}

	#[test]
	fn unknown_ids_fail_lookup() {
		let vocabulary = Vocabulary::new();
		assert!(matches!(vocabulary.word(42), Err(BridgeError::Lookup(_))));
		assert!(matches!(vocabulary.word(-1), Err(BridgeError::Lookup(_))));
		assert!(matches!(vocabulary.render(&[0, 42], false), Err(BridgeError::Lookup(_))));
	}

	#[test]
	fn export_then_import_restores_ids() {
		let mut vocabulary = Vocabulary::new();
		vocabulary.add_terminals("a b c");
		vocabulary.add_nonterminal("[X,1]");

		let mut bytes = Vec::new();
		vocabulary.export(&mut bytes, "utf-8").unwrap();

		let mut restored = Vocabulary::new();
		restored.import(&mut bytes.as_slice()).unwrap();
		assert_eq!(restored.id("c"), Some(3));
		assert_eq!(restored.id("[X,1]"), Some(-1));
		assert_eq!(restored.len(), vocabulary.len());
	}

	#[test]
	fn export_rejects_other_encodings() {
		let vocabulary = Vocabulary::new();
		let mut bytes = Vec::new();
		assert!(matches!(
			vocabulary.export(&mut bytes, "ISO-8859-1"),
			Err(BridgeError::UnsupportedOperation(_))
		));
		assert!(bytes.is_empty());
	}

	proptest! {
		#[test]
		fn add_terminal_is_idempotent(word in "\\PC{1,12}") {
			let mut vocabulary = Vocabulary::new();
			let first = vocabulary.add_terminal(&word);
			let second = vocabulary.add_terminal(&word);
			prop_assert_eq!(first, second);
			prop_assert!(first >= 0);
			prop_assert!(!vocabulary.is_nonterminal(first));
			prop_assert_eq!(vocabulary.word(first).unwrap(), word.as_str());
		}

		#[test]
		fn every_negative_id_is_a_nonterminal(id in i32::MIN..0) {
			let vocabulary = Vocabulary::new();
			prop_assert!(vocabulary.is_nonterminal(id));
		}

		#[test]
		fn every_non_negative_id_is_a_terminal(id in 0..i32::MAX) {
			let vocabulary = Vocabulary::new();
			prop_assert!(!vocabulary.is_nonterminal(id));
		}
	}
}
