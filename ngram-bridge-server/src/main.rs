use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use clap::Parser;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use ngram_bridge_core::BridgeError;
use ngram_bridge_core::bridge::{BridgedNgramLm, NgramLanguageModel, UNKNOWN_MODEL_ID};
use ngram_bridge_core::lm::{BackoffModel, load_model, load_or_build};
use ngram_bridge_core::vocab::{SymbolTable, Vocabulary};

mod config;

use config::ServerArgs;

/// Scoring adapter owned by one worker thread.
type ScoringView = BridgedNgramLm<Arc<BackoffModel>>;

/// State shared by every worker.
struct SharedData {
	vocabulary: RwLock<Vocabulary>,
}

#[derive(Deserialize)]
struct ScoreParams {
	ngram: String,
}

#[derive(Deserialize)]
struct SentenceParams {
	text: String,
	start: Option<usize>,
}

#[derive(Deserialize)]
struct WordsQuery {
	tokens: Option<String>,
}

#[derive(Deserialize)]
struct RenderParams {
	ids: String,
	renumber: Option<bool>,
}

#[derive(Serialize)]
struct RegisteredWord {
	word: String,
	id: i32,
	registered: bool,
}

#[derive(Serialize)]
struct Stats {
	order: usize,
	vocabulary_size: usize,
	mapped_len: usize,
	mapping_capacity: usize,
	cache_hits: u64,
	cache_misses: u64,
}

/// Maps a bridge error to an HTTP response.
fn error_response(error: BridgeError) -> HttpResponse {
	match error {
		BridgeError::Lookup(_) => HttpResponse::NotFound().body(error.to_string()),
		BridgeError::InvalidNgram { .. } | BridgeError::MalformedNonterminal(_) => {
			HttpResponse::BadRequest().body(error.to_string())
		}
		_ => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

/// Resolves `text`'s words to vocabulary ids and makes sure the model knows them.
///
/// Known words only need the read lock; the write lock is taken when some
/// word is new. Ids already mapped are not registered again.
fn tokenize(shared: &SharedData, view: &ScoringView, text: &str) -> Vec<i32> {
	let words: Vec<&str> = text.split_whitespace().collect();
	let known: Vec<Option<i32>> = {
		let vocabulary = shared.vocabulary.read();
		words.iter().map(|word| vocabulary.id(word)).collect()
	};

	let ids: Vec<i32> = if known.iter().all(Option::is_some) {
		known.into_iter().flatten().collect()
	} else {
		let mut vocabulary = shared.vocabulary.write();
		words
			.iter()
			.zip(known)
			.map(|(word, id)| id.unwrap_or_else(|| vocabulary.add_terminal(word)))
			.collect()
	};

	for (&id, word) in ids.iter().zip(&words) {
		if view.mapping().translate(id) == UNKNOWN_MODEL_ID {
			view.register_word(word, id);
		}
	}
	ids
}

/// HTTP GET endpoint `/v1/score`
///
/// Scores one n-gram given as space-separated words.
#[get("/v1/score")]
async fn get_score(
	shared: web::Data<SharedData>,
	view: web::Data<ScoringView>,
	query: web::Query<ScoreParams>,
) -> impl Responder {
	let ids = tokenize(&shared, &view, &query.ngram);
	match view.ngram_log_probability(&ids) {
		Ok(log_prob) => HttpResponse::Ok().body(log_prob.to_string()),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/sentence`
///
/// Scores a whole sentence with the model order, skipping the first
/// `start - 1` partial n-grams (`start` defaults to 1).
#[get("/v1/sentence")]
async fn get_sentence(
	shared: web::Data<SharedData>,
	view: web::Data<ScoringView>,
	query: web::Query<SentenceParams>,
) -> impl Responder {
	let ids = tokenize(&shared, &view, &query.text);
	match view.sentence_log_probability(&ids, view.order(), query.start.unwrap_or(1)) {
		Ok(log_prob) => HttpResponse::Ok().body(log_prob.to_string()),
		Err(e) => error_response(e),
	}
}

#[put("/v1/words")]
async fn put_words(
	shared: web::Data<SharedData>,
	view: web::Data<ScoringView>,
	query: web::Query<WordsQuery>,
) -> impl Responder {
	let tokens = match &query.tokens {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty tokens"),
	};

	let mut vocabulary = shared.vocabulary.write();
	let words: Vec<RegisteredWord> = tokens
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(|word| {
			let id = vocabulary.add_terminal(word);
			let registered = view.register_word(word, id);
			RegisteredWord { word: word.to_owned(), id, registered }
		})
		.collect();

	HttpResponse::Ok().json(words)
}

#[get("/v1/words/{id}")]
async fn get_word(shared: web::Data<SharedData>, path: web::Path<i32>) -> impl Responder {
	let vocabulary = shared.vocabulary.read();
	match vocabulary.word(path.into_inner()) {
		Ok(word) => HttpResponse::Ok().body(word.to_owned()),
		Err(e) => error_response(e),
	}
}

#[get("/v1/render")]
async fn get_render(shared: web::Data<SharedData>, query: web::Query<RenderParams>) -> impl Responder {
	let ids: Result<Vec<i32>, _> = query
		.ids
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(str::parse::<i32>)
		.collect();
	let ids = match ids {
		Ok(ids) => ids,
		Err(_) => return HttpResponse::BadRequest().body("Ids must be comma-separated integers"),
	};

	let vocabulary = shared.vocabulary.read();
	match vocabulary.render(&ids, query.renumber.unwrap_or(false)) {
		Ok(rendered) => HttpResponse::Ok().body(rendered),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/stats`
///
/// Cache figures are those of the worker answering the request.
#[get("/v1/stats")]
async fn get_stats(shared: web::Data<SharedData>, view: web::Data<ScoringView>) -> impl Responder {
	let (cache_hits, cache_misses) = view
		.cache()
		.map_or((0, 0), |cache| (cache.hits(), cache.misses()));
	HttpResponse::Ok().json(Stats {
		order: view.order(),
		vocabulary_size: shared.vocabulary.read().len(),
		mapped_len: view.mapping().mapped_len(),
		mapping_capacity: view.mapping().capacity(),
		cache_hits,
		cache_misses,
	})
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_score)
		.service(get_sentence)
		.service(put_words)
		.service(get_word)
		.service(get_render)
		.service(get_stats);
}

/// Main entry point for the server.
///
/// Loads the model once, then gives every worker thread its own cached
/// scoring view over the shared model and id mapping. A model that fails to
/// load aborts startup.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = ServerArgs::parse();

	let loaded = if args.mirror {
		load_or_build(&args.model, args.order)
	} else {
		load_model(&args.model, args.order)
	};
	let model = match loaded {
		Ok(model) => model,
		Err(e) => {
			log::error!("Failed to load model {}: {e}", args.model.display());
			return Err(std::io::Error::other(e));
		}
	};

	let lm = BridgedNgramLm::new(model);
	let vocabulary = Vocabulary::new();
	lm.register_words(vocabulary.terminals());
	// Clones of a cached view share the model and mapping, each with an empty cache.
	let prototype = lm
		.thread_local_copy_with_capacity(args.cache_capacity)
		.map_err(std::io::Error::other)?;

	let shared = web::Data::new(SharedData { vocabulary: RwLock::new(vocabulary) });

	log::info!("Serving on {}:{} with {} workers", args.host, args.port, args.workers);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared.clone())
			.app_data(web::Data::new(prototype.clone()))
			.configure(configure)
	})
	.workers(args.workers)
	.bind((args.host.as_str(), args.port))?
	.run()
	.await
}
