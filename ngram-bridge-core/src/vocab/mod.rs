//! Decoder-side vocabulary.
//!
//! - `SymbolTable`: the encoding contract (terminals >= 0, nonterminals < 0)
//! - `Vocabulary`: an in-memory table implementing it

/// Encoding rules shared by every symbol table.
pub mod symbol_table;

/// Concrete in-memory symbol table.
pub mod vocabulary;

pub use symbol_table::{NOT_A_NONTERMINAL, SymbolTable, UNKNOWN_WORD, UNKNOWN_WORD_ID};
pub use vocabulary::Vocabulary;
