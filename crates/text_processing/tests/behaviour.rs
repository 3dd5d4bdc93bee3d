//! End-to-end checks of the classifier and generator contracts

use chat_agent_text_processing::{
    IntentCorpus, IntentMatch, IntentOutcome, IntentParser, MarkovModel, MatchMethod,
    ParserConfig, StopwordCleaner, Successor, TrainingExample, MAX_TRAINING_TOKENS,
};

fn greeting_farewell_parser() -> IntentParser {
    let cleaner = StopwordCleaner::from_words(["de", "la", "el"]).unwrap();
    let corpus = IntentCorpus::build(
        vec![
            TrainingExample::new("hola buenas", "greeting"),
            TrainingExample::new("adios hasta luego", "farewell"),
        ],
        &cleaner,
    )
    .unwrap();
    IntentParser::new(corpus, ParserConfig::default())
}

#[test]
fn test_short_greeting_is_decided_by_regex() {
    let parser = greeting_farewell_parser();
    let outcome = parser.intent_parse("hola", &["greeting", "farewell"]).unwrap();
    assert_eq!(
        outcome,
        IntentOutcome::Matched(IntentMatch {
            label: "greeting".to_string(),
            confidence: 1.0,
            method: MatchMethod::Regex,
        })
    );
}

#[test]
fn test_long_query_is_decided_by_cosine() {
    let parser = greeting_farewell_parser();
    let outcome = parser
        .intent_parse("estoy muy contento de verte hoy", &["greeting", "farewell"])
        .unwrap();
    match outcome {
        IntentOutcome::Matched(m) => {
            assert_eq!(m.method, MatchMethod::Cosine);
            // "hoy" and "contento" overlap "hola" and "buenas" more than the farewell
            assert_eq!(m.label, "greeting");
            assert!(m.confidence > 0.5 && m.confidence <= 1.0);
        }
        IntentOutcome::NoMatch => panic!("expected a cosine match"),
    }
}

#[test]
fn test_fast_path_word_limit_is_configurable() {
    let cleaner = StopwordCleaner::empty();
    let corpus = IntentCorpus::build(
        vec![
            TrainingExample::new("hola", "greeting"),
            TrainingExample::new("adios", "farewell"),
        ],
        &cleaner,
    )
    .unwrap();
    let parser = IntentParser::new(
        corpus,
        ParserConfig {
            fast_path_max_words: 1,
            ..ParserConfig::default()
        },
    );

    let short = parser.intent_parse("hola", &["greeting", "farewell"]).unwrap();
    assert!(matches!(short, IntentOutcome::Matched(ref m) if m.method == MatchMethod::Regex));

    let longer = parser.intent_parse("hola hola", &["greeting", "farewell"]).unwrap();
    assert!(matches!(longer, IntentOutcome::Matched(ref m) if m.method == MatchMethod::Cosine));
}

#[test]
fn test_markov_weights_for_repeated_state() {
    let model = MarkovModel::train(["a", "b", "a", "c", "a"], MAX_TRAINING_TOKENS).unwrap();
    let successors = model.successors("a");

    let mut targets: Vec<Successor> = successors.iter().map(|e| e.to.clone()).collect();
    targets.sort();
    assert_eq!(
        targets,
        vec![
            Successor::Token("b".into()),
            Successor::Token("c".into()),
            Successor::EndOfSequence,
        ]
    );
    for entry in successors {
        assert_eq!(entry.count, 1);
        assert!((entry.weight - 0.0556).abs() < 1e-4);
    }
}
