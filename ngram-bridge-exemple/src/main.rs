use std::sync::Arc;
use std::thread;

use rand::seq::IndexedRandom;

use ngram_bridge_core::bridge::{BridgedNgramLm, NgramLanguageModel};
use ngram_bridge_core::lm::load_or_build;
use ngram_bridge_core::vocab::{SymbolTable, Vocabulary};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load the model from its ARPA text
    // A "data/sample.bin" image is written on first run and loaded afterwards
    let model = load_or_build("./data/sample.arpa", 3)?;

    // The bridge owns the decoder id -> model id mapping
    let lm = BridgedNgramLm::new(Arc::clone(&model));

    // The decoder numbers words in its own vocabulary, in its own order
    let mut vocabulary = Vocabulary::new();
    let sentence = vocabulary.add_terminals("<s> the cat sat on the mat </s>");
    vocabulary.add_terminals("a dog ran house castle");

    // Tell the model which decoder id is which word
    // Words the model does not know ('castle') fall back to its <unk>
    let registered = lm.register_words(vocabulary.terminals());
    println!("Registered {registered} of {} words", vocabulary.terminal_count());

    // Score a few n-grams
    for ngram in [&sentence[..3], &sentence[1..4], &sentence[5..8]] {
        println!(
            "log10 p({}) = {}",
            vocabulary.render(ngram, false)?,
            lm.ngram_log_probability(ngram)?
        );
    }

    // Score the whole sentence, ignoring the lone <s>
    println!(
        "log10 p(sentence) = {:.4}",
        lm.sentence_log_probability(&sentence, lm.order(), 2)?
    );

    // Nonterminals render with their index and are unknown to the model
    let x1 = vocabulary.add_nonterminal("[X,1]");
    let rule = [sentence[1], x1, sentence[3]];
    println!(
        "rule: {} (index of {} is {})",
        vocabulary.render(&rule, true)?,
        vocabulary.word(x1)?,
        vocabulary.target_nonterminal_index(x1)?
    );

    // Backoff states are not exposed by this model
    match lm.log_probability_of_backoff_state(&sentence[..2], 2, 1) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Backoff state: {e}"),
    }

    // One cached view per thread, all sharing the same model and mapping
    let words: Vec<i32> = vocabulary.terminals().map(|(id, _)| id).collect();
    let views = (0..4)
        .map(|_| lm.thread_local_copy())
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Scoring random trigrams on {} threads", views.len());

    thread::scope(|scope| {
        for (t, view) in views.into_iter().enumerate() {
            let words = &words;
            scope.spawn(move || {
                let mut rng = rand::rng();
                let mut total = 0.0;
                for _ in 0..10_000 {
                    let ngram: Vec<i32> = words.choose_multiple(&mut rng, 3).copied().collect();
                    total += view.ngram_log_probability(&ngram).unwrap_or(0.0) as f64;
                }
                if let Some(cache) = view.cache() {
                    println!(
                        "thread {t}: total {total:.2}, cache hits {} misses {}",
                        cache.hits(),
                        cache.misses()
                    );
                }
            });
        }
    });

    // A cached view cannot be cached again
    let view = lm.thread_local_copy()?;
    match view.thread_local_copy() {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Nested copy: {e}"),
    }

    Ok(())
}
