use ngram_bridge_core::BridgeError;
use ngram_bridge_core::bridge::{BridgedNgramLm, NgramLanguageModel};
use ngram_bridge_core::lm::load_model;
use ngram_bridge_core::vocab::{SymbolTable, Vocabulary};
use tempdir::TempDir;

const ARPA: &str = "\\data\\
ngram 1=5
ngram 2=3
ngram 3=1

\\1-grams:
-99.0\t<s>\t-0.6
-1.2\t</s>
-1.5\tthe\t-0.4
-2.0\thouse\t-0.3
-3.0\t<unk>

\\2-grams:
-0.3\t<s> the\t-0.2
-0.8\tthe house\t-0.1
-0.5\thouse </s>

\\3-grams:
-0.1\t<s> the house

\\end\\
";

fn load() -> (TempDir, BridgedNgramLm<std::sync::Arc<ngram_bridge_core::lm::BackoffModel>>) {
	let dir = TempDir::new("ngram-bridge-scoring").unwrap();
	let path = dir.path().join("small.arpa");
	std::fs::write(&path, ARPA).unwrap();
	let lm = BridgedNgramLm::new(load_model(&path, 3).unwrap());
	(dir, lm)
}

#[test]
fn decoder_sentences_score_through_the_bridge() {
	let (_dir, lm) = load();
	let mut vocabulary = Vocabulary::new();
	let ids = vocabulary.add_terminals("<s> the house </s>");
	lm.register_words(vocabulary.terminals());

	assert_eq!(lm.ngram_log_probability(&ids[..3]).unwrap(), -0.1);
	assert_eq!(lm.ngram_log_probability(&ids[1..]).unwrap(), -0.1 + -0.5);

	// p(the | <s>) + p(house | <s> the) + p(</s> | the house)
	let expected = f64::from(-0.3f32) + f64::from(-0.1f32) + f64::from(-0.1f32 + -0.5f32);
	assert_eq!(lm.sentence_log_probability(&ids, 3, 2).unwrap(), expected);
}

#[test]
fn words_outside_the_model_map_to_unk() {
	let (_dir, lm) = load();
	let mut vocabulary = Vocabulary::new();
	let ids = vocabulary.add_terminals("the castle");
	assert_eq!(lm.register_words(vocabulary.terminals()), 3);

	// "castle" was registered against the model's <unk>.
	assert_eq!(lm.ngram_log_probability(&ids[1..]).unwrap(), -3.0);
	assert_eq!(lm.ngram_log_probability(&ids).unwrap(), -0.4 + -3.0);
}

#[test]
fn words_added_after_loading_can_be_registered_later() {
	let (_dir, lm) = load();
	let mut vocabulary = Vocabulary::new();
	let view = lm.thread_local_copy().unwrap();

	// Unregistered ids reach the model as unknown words.
	let house = vocabulary.add_terminal("house");
	assert_eq!(view.ngram_log_probability(&[house]).unwrap(), -3.0);

	assert!(view.register_word("house", house));
	assert_eq!(view.ngram_log_probability(&[house]).unwrap(), -2.0);
	assert_eq!(lm.ngram_log_probability(&[house]).unwrap(), -2.0);
}

#[test]
fn rendering_and_scoring_share_ids() {
	let (_dir, lm) = load();
	let mut vocabulary = Vocabulary::new();
	let x = vocabulary.add_nonterminal("[X,1]");
	let ids = vocabulary.add_terminals("the house");
	lm.register_words(vocabulary.terminals());

	let rule = [ids[0], x, ids[1]];
	assert_eq!(vocabulary.render(&rule, true).unwrap(), "the [X,1] house");
	assert_eq!(vocabulary.target_nonterminal_index(x).unwrap(), 1);

	// Nonterminals are unknown to the model.
	assert_eq!(lm.ngram_log_probability(&[x]).unwrap(), -3.0);
	assert!(matches!(lm.ngram_log_probability(&rule[..0]), Err(BridgeError::InvalidNgram { .. })));
}
