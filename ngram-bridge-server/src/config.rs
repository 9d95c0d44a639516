use std::path::PathBuf;

use clap::Parser;

/// Command line options of the scoring server.
#[derive(Parser, Debug)]
#[command(name = "ngram-bridge-server", about = "Serves n-gram scores over decoder vocabulary ids")]
pub struct ServerArgs {
	/// ARPA file or binary image to load.
	#[arg(long, default_value = "./data/sample.arpa")]
	pub model: PathBuf,

	/// Maximum n-gram order (0 keeps the model's order).
	#[arg(long, default_value_t = 0)]
	pub order: usize,

	/// Load ARPA files through a `.bin` mirror, writing it on first use.
	#[arg(long)]
	pub mirror: bool,

	/// Address to bind.
	#[arg(long, default_value = "127.0.0.1")]
	pub host: String,

	/// Port to bind.
	#[arg(long, default_value_t = 5000)]
	pub port: u16,

	/// Worker threads; each one owns a cached scoring view.
	#[arg(long, default_value_t = num_cpus::get())]
	pub workers: usize,

	/// Slots in each worker's score cache.
	#[arg(long, default_value_t = 1 << 16)]
	pub cache_capacity: usize,
}
