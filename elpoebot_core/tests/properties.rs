// Property tests for the poem generator.
//
// Random corpora (Catalan-ish letters, punctuation, spaces, and deliberately
// short lines so empty and short rhyme keys show up) are fed through the
// public API. Each property is checked for every generated corpus and seed.

use std::collections::HashSet;
use std::thread;

use elpoebot_core::{
    GenerateError, GeneratorConfig, LineRange, Poem, PoemKind, PoemRng, build_free_poem,
    generate_poem, rhyme_key, try_build_abab,
};
use proptest::prelude::*;

const STRIPPED: [char; 10] = [';', ':', ',', '.', '¿', '?', '¡', '!', '(', ')'];

fn verse() -> impl Strategy<Value = String> {
    "[a-zàèéíòóúç ,.;:!?¿¡()]{0,16}"
}

fn corpus(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(verse(), min..max)
}

/// A corpus built from a handful of endings so rhymes are common.
fn rhyming_corpus() -> impl Strategy<Value = Vec<String>> {
    let endings = prop::sample::select(vec!["ella", "rena", "ança", "orta", "iu"]);
    prop::collection::vec(("[a-z ]{0,8}", endings), 4..24)
        .prop_map(|parts| parts.into_iter().map(|(head, end)| format!("{head}{end}")).collect())
}

fn assert_valid_poem(poem: &Poem, config: &GeneratorConfig, corpus: &[String]) {
    for line in poem.lines() {
        assert!(corpus.contains(line), "line {line:?} is not from the corpus");
    }
    match poem.kind() {
        PoemKind::Abab => {
            let lines = poem.lines();
            assert_eq!(lines.len(), 4);
            assert_eq!(rhyme_key(&lines[0]), rhyme_key(&lines[2]));
            assert_eq!(rhyme_key(&lines[1]), rhyme_key(&lines[3]));
            let (a, b) = poem.rhymes().unwrap();
            assert_eq!(rhyme_key(&lines[0]), a);
            assert_eq!(rhyme_key(&lines[1]), b);
            assert_ne!(lines[0], lines[1]);
        }
        PoemKind::Free => {
            assert!(config.free_lines.contains(poem.lines().len()));
        }
    }
}

proptest! {
    /// Rhyme keys are short, deterministic, and free of stripped characters.
    #[test]
    fn prop_rhyme_key_shape(line in "\\PC{0,40}") {
        let key = rhyme_key(&line);
        prop_assert!(key.chars().count() <= 4);
        prop_assert!(!key.chars().any(|c| c.is_whitespace() || STRIPPED.contains(&c)));
        prop_assert_eq!(key, rhyme_key(&line));
    }

    /// Case does not affect the key.
    #[test]
    fn prop_rhyme_key_ignores_ascii_case(line in "[a-zA-Z .,!?]{0,20}") {
        prop_assert_eq!(rhyme_key(&line), rhyme_key(&line.to_uppercase()));
    }

    /// Any corpus of four or more lines yields a valid poem.
    #[test]
    fn prop_generate_always_succeeds(lines in corpus(4, 30), seed in any::<u64>()) {
        let config = GeneratorConfig::default();
        let mut rng = PoemRng::new(seed);
        let poem = generate_poem(&lines, &config, &mut rng).unwrap();
        assert_valid_poem(&poem, &config, &lines);
    }

    /// Rhyme-rich corpora: every ABAB result honours its own scheme.
    #[test]
    fn prop_abab_is_consistent(lines in rhyming_corpus(), seed in any::<u64>()) {
        let config = GeneratorConfig::default();
        let mut rng = PoemRng::new(seed);
        if let Some(poem) = try_build_abab(&lines, &config, &mut rng) {
            assert_valid_poem(&poem, &config, &lines);
            prop_assert!(poem.check_scheme().is_ok());
        }
    }

    /// Below the minimum size, generation reports the shortfall.
    #[test]
    fn prop_small_corpus_is_insufficient(lines in corpus(0, 4), seed in any::<u64>()) {
        let mut rng = PoemRng::new(seed);
        let err = generate_poem(&lines, &GeneratorConfig::default(), &mut rng).unwrap_err();
        prop_assert_eq!(err, GenerateError::InsufficientCorpus { available: lines.len(), required: 4 });
    }

    /// Free poems never repeat a verse while unused ones remain.
    #[test]
    fn prop_free_poem_is_maximally_diverse(lines in corpus(1, 20), seed in any::<u64>(), min in 1usize..8, extra in 0usize..8) {
        let config = GeneratorConfig {
            free_lines: LineRange::new(min, min + extra),
            ..GeneratorConfig::default()
        };
        let mut rng = PoemRng::new(seed);
        let poem = build_free_poem(&lines, &config, &mut rng).unwrap();
        let len = poem.lines().len();
        prop_assert!((min..=min + extra).contains(&len));

        let distinct: HashSet<&String> = lines.iter().collect();
        let used: HashSet<&String> = poem.lines().iter().collect();
        prop_assert_eq!(used.len(), len.min(distinct.len()));
    }
}

#[test]
fn unique_suffixes_always_fall_back_to_free() {
    let lines: Vec<String> = [
        "la lluna plena",
        "un arbre sec",
        "camí de pols",
        "el riu baixa",
        "ocells del matí",
        "una porta oberta",
        "pedra i fang",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let keys: HashSet<String> = lines.iter().map(|l| rhyme_key(l)).collect();
    assert_eq!(keys.len(), lines.len(), "fixture must have unique keys");

    let config = GeneratorConfig::default();
    for seed in 0..50 {
        let mut rng = PoemRng::new(seed);
        assert!(try_build_abab(&lines, &config, &mut rng).is_none());
        let poem = generate_poem(&lines, &config, &mut PoemRng::new(seed)).unwrap();
        assert_eq!(poem.kind(), PoemKind::Free, "seed {seed}");
    }
}

#[test]
fn concurrent_generation_is_independent() {
    let lines: Vec<String> = [
        "casa vermella",
        "nit serena",
        "taula bella",
        "mar serena",
        "el vent del nord",
        "porta oberta",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let config = GeneratorConfig::default();

    let expected: Vec<Poem> = (0..8)
        .map(|seed| generate_poem(&lines, &config, &mut PoemRng::new(seed)).unwrap())
        .collect();

    let results: Vec<Poem> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|seed| {
                let lines = &lines;
                let config = &config;
                scope.spawn(move || generate_poem(lines, config, &mut PoemRng::new(seed)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, expected);
}
