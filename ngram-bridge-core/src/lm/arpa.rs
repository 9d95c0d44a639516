//! Reader for the ARPA n-gram text format.
//!
//! ```text
//! \data\
//! ngram 1=2
//! ngram 2=1
//!
//! \1-grams:
//! -1.0	the	-0.3
//! -1.2	cat
//!
//! \2-grams:
//! -0.4	the cat
//!
//! \end\
//! ```

use super::backoff_model::BackoffModel;
use super::word_indexer::WordIndexer;
use crate::error::{BridgeError, BridgeResult};

/// Highest n-gram order a header may declare.
pub const MAX_ARPA_ORDER: usize = 255;

enum Section {
	Preamble,
	Header,
	Ngrams(usize),
	End,
}

fn format_error(line: usize, message: impl Into<String>) -> BridgeError {
	BridgeError::ModelFormat { line, message: message.into() }
}

/// Parses ARPA `text` into a model of at most `order` (`0` keeps the file's order).
///
/// # Errors
/// [`BridgeError::ModelFormat`] with the offending 1-based line number if the
/// text is not well formed.
pub fn parse_arpa(text: &str, order: usize) -> BridgeResult<BackoffModel> {
	let mut section = Section::Preamble;
	let mut declared: Vec<(usize, usize)> = Vec::new();
	let mut indexer = WordIndexer::new();
	// (words, log_prob, backoff), buffered until the order is known.
	let mut entries: Vec<(Vec<i32>, f32, f32)> = Vec::new();
	let mut effective_order = order;
	let mut seen: Vec<usize> = Vec::new();

	for (number, raw) in text.lines().enumerate() {
		let number = number + 1;
		let line = raw.trim();
		if line.is_empty() {
			continue;
		}

		if line == "\\data\\" {
			section = Section::Header;
			continue;
		}
		if line == "\\end\\" {
			section = Section::End;
			continue;
		}
		if let Some(n) = section_order(line) {
			let Some(n) = n else {
				return Err(format_error(number, format!("bad section header `{line}`")));
			};
			if !declared.iter().any(|&(declared_n, _)| declared_n == n) {
				return Err(format_error(number, format!("{n}-grams were not declared")));
			}
			section = Section::Ngrams(n);
			continue;
		}

		match section {
			Section::Preamble => {}
			Section::Header => {
				let (n, count) = parse_count(line).ok_or_else(|| format_error(number, format!("bad count `{line}`")))?;
				if n > MAX_ARPA_ORDER {
					return Err(format_error(number, format!("order {n} is above {MAX_ARPA_ORDER}")));
				}
				declared.push((n, count));
				let max_n = declared.iter().map(|&(n, _)| n).max().unwrap_or(0);
				effective_order = if order == 0 { max_n } else { order.min(max_n) };
				seen = vec![0; max_n + 1];
			}
			Section::Ngrams(n) => {
				seen[n] += 1;
				if n > effective_order {
					continue;
				}
				let fields: Vec<&str> = line.split_whitespace().collect();
				if fields.len() != n + 1 && fields.len() != n + 2 {
					return Err(format_error(number, format!("expected {n} words, got `{line}`")));
				}

				let log_prob = parse_float(fields[0], number)?;
				let backoff = match fields.get(n + 1) {
					Some(field) => parse_float(field, number)?,
					None => 0.0,
				};

				let mut words = Vec::with_capacity(n);
				for word in &fields[1..=n] {
					let index = if n == 1 {
						indexer.add_word(word)
					} else {
						indexer
							.index(word)
							.ok_or_else(|| format_error(number, format!("`{word}` is not a unigram")))?
					};
					words.push(index);
				}
				entries.push((words, log_prob, backoff));
			}
			Section::End => {
				return Err(format_error(number, "content after \\end\\"));
			}
		}
	}

	if declared.is_empty() {
		return Err(format_error(0, "missing \\data\\ header"));
	}
	if !matches!(section, Section::End) {
		log::warn!("ARPA text has no \\end\\ marker");
	}
	for &(n, count) in &declared {
		if seen[n] != count {
			log::warn!("ARPA header declares {count} {n}-grams, found {}", seen[n]);
		}
	}

	let mut model = BackoffModel::new(effective_order, indexer);
	for (words, log_prob, backoff) in entries {
		model.insert(&words, log_prob, backoff);
	}
	Ok(model)
}

/// `Some(Some(n))` for `\n-grams:`, `Some(None)` for a malformed section header.
fn section_order(line: &str) -> Option<Option<usize>> {
	let inner = line.strip_prefix('\\')?.strip_suffix("-grams:")?;
	Some(inner.parse().ok().filter(|&n| n > 0))
}

/// Parses `ngram N=count`.
fn parse_count(line: &str) -> Option<(usize, usize)> {
	let (n, count) = line.strip_prefix("ngram")?.trim().split_once('=')?;
	let n = n.trim().parse().ok().filter(|&n: &usize| n > 0)?;
	Some((n, count.trim().parse().ok()?))
}

fn parse_float(field: &str, line: usize) -> BridgeResult<f32> {
	field
		.parse()
		.map_err(|_| format_error(line, format!("`{field}` is not a number")))
}
