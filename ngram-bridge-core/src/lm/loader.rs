use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ArrayEncodedLm;
use super::arpa::parse_arpa;
use super::backoff_model::BackoffModel;
use crate::error::{BridgeError, BridgeResult};
use crate::io::build_output_path;

/// First bytes of every binary model image.
pub const BINARY_MAGIC: &[u8; 8] = b"NGBRIDGE";

/// Extension of the binary image mirrored next to an ARPA file.
pub const BINARY_EXTENSION: &str = "bin";

/// Loads a model from `path`, which holds either a binary image or ARPA text.
///
/// The format is detected from the file's first bytes. `order` caps the
/// model order (`0` keeps the file's order).
///
/// # Errors
/// Any I/O, decoding or ARPA format error. A partially read model is never
/// returned.
pub fn load_model<P: AsRef<Path>>(path: P, order: usize) -> BridgeResult<Arc<BackoffModel>> {
	let path = path.as_ref();
	let bytes = std::fs::read(path)?;

	let model = if let Some(image) = bytes.strip_prefix(BINARY_MAGIC.as_slice()) {
		log::info!("Loading n-gram model from binary image {}", path.display());
		let model: BackoffModel = postcard::from_bytes(image)?;
		truncate_order(model, order)?
	} else {
		log::info!("Loading n-gram model from ARPA file {}", path.display());
		let text = String::from_utf8(bytes).map_err(|e| BridgeError::ModelFormat {
			line: 0,
			message: format!("not a binary image nor UTF-8 text: {e}"),
		})?;
		parse_arpa(&text, order)?
	};

	log::info!("Loaded {} n-grams of order {}", model.len(), model.order());
	Ok(Arc::new(model))
}

/// Loads an ARPA file through its binary mirror.
///
/// - `data/model.arpa` is mirrored as `data/model.bin`
/// - if the mirror exists it is loaded instead of the text
/// - otherwise the text is parsed and the mirror written for next time
pub fn load_or_build<P: AsRef<Path>>(arpa_path: P, order: usize) -> BridgeResult<Arc<BackoffModel>> {
	let binary_path = build_output_path(&arpa_path, BINARY_EXTENSION)?;
	if binary_path.exists() {
		return load_model(binary_path, order);
	}

	let model = load_model(&arpa_path, 0)?;
	write_binary_image(&model, &binary_path)?;
	if order == 0 || order >= model.order() {
		return Ok(model);
	}
	load_model(binary_path, order)
}

/// Writes `model` as a binary image to `path`.
pub fn write_binary_image<P: AsRef<Path>>(model: &BackoffModel, path: P) -> BridgeResult<PathBuf> {
	let path = path.as_ref();
	let mut bytes = BINARY_MAGIC.to_vec();
	bytes.extend(postcard::to_stdvec(model)?);
	std::fs::write(path, bytes)?;
	log::info!("Wrote binary image {}", path.display());
	Ok(path.to_path_buf())
}

fn truncate_order(model: BackoffModel, order: usize) -> BridgeResult<BackoffModel> {
	if order == 0 || order >= model.order() {
		return Ok(model);
	}
	// Rebuild keeping only the n-grams the requested order can reach.
	let mut truncated = BackoffModel::new(order, model.word_indexer().clone());
	for (words, entry) in model.entries() {
		if words.len() <= order {
			truncated.insert(words, entry.log_prob, entry.backoff);
		}
	}
	Ok(truncated)
}
