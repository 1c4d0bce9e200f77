// Poem generation: bounded random search for an ABAB quatrain, with a
// free-form fallback.
//
// Algorithm for `generate_poem`:
// 1. Reject corpora smaller than `min_corpus_lines`.
// 2. `try_build_abab`: up to `abab_attempts` times, draw line 1 (key A) and a
//    textually different line 2 (key B), then search for an unused line 3
//    rhyming with A and an unused line 4 rhyming with B. Any miss restarts
//    the attempt from line 1.
// 3. If every attempt misses, `build_free_poem` draws 4–14 lines (configurable),
//    avoiding repeats while unused verses remain.
//
// The rhyme search (`find_rhyming_line`) is best-effort: when it can't find a
// rhyme it still returns *some* verse, and callers re-check the key before
// trusting it. Every loop here is bounded by a `GeneratorConfig` value; when a
// reject-and-redraw loop runs out, the result is a repeated verse rather than
// an error.
//
// The corpus is a borrowed `&[String]` snapshot and is never mutated.
// Returned `&str`s borrow from it.

use std::collections::HashSet;

use elpoebot_prng::PoemRng;
use tracing::debug;

use crate::config::{GeneratorConfig, MAX_FREE_LINES};
use crate::error::GenerateError;
use crate::poem::Poem;
use crate::rhyme::rhyme_key;

/// Draw one verse uniformly, with replacement.
pub fn sample_line<'a>(corpus: &'a [String], rng: &mut PoemRng) -> Result<&'a str, GenerateError> {
    rng.choose(corpus)
        .map(String::as_str)
        .ok_or(GenerateError::EmptyCorpus)
}

/// Search for a verse whose rhyme key is `target_key` and that is not in
/// `excluded`.
///
/// Spends `rhyme_search_draws` uniform draws on the search proper. On a miss,
/// falls back to any verse outside `excluded`, unless `excluded` already
/// covers every distinct verse, in which case the last draw is returned as a
/// repeat. The fallback loop is capped by `fallback_draw_limit` and also ends
/// in a repeat when the cap is hit.
///
/// Only fails on an empty corpus. The returned verse may not rhyme.
pub fn find_rhyming_line<'a>(
    corpus: &'a [String],
    target_key: &str,
    excluded: &[&str],
    config: &GeneratorConfig,
    rng: &mut PoemRng,
) -> Result<&'a str, GenerateError> {
    let mut last = None;
    for _ in 0..config.rhyme_search_draws {
        let line = sample_line(corpus, rng)?;
        if !excluded.contains(&line) && rhyme_key(line) == target_key {
            return Ok(line);
        }
        last = Some(line);
    }
    let mut last = match last {
        Some(line) => line,
        None => sample_line(corpus, rng)?,
    };

    let excluded_distinct: HashSet<&str> = excluded.iter().copied().collect();
    if excluded_distinct.len() >= distinct_count(corpus) {
        return Ok(last);
    }

    for _ in 0..config.fallback_draw_limit {
        if !excluded.contains(&last) {
            return Ok(last);
        }
        last = sample_line(corpus, rng)?;
    }
    Ok(last)
}

/// Try to assemble an ABAB quatrain.
///
/// Returns `None` when `abab_attempts` attempts all miss, or when the corpus
/// is empty or holds a single distinct verse (line 2 must differ from line 1).
/// `None` is the signal to fall back to a free poem, not an error.
pub fn try_build_abab(
    corpus: &[String],
    config: &GeneratorConfig,
    rng: &mut PoemRng,
) -> Option<Poem> {
    if distinct_count(corpus) < 2 {
        return None;
    }

    for attempt in 0..config.abab_attempts {
        let line1 = sample_line(corpus, rng).ok()?;
        let Some(line2) = draw_other_than(corpus, line1, config, rng) else {
            continue;
        };
        let key_a = rhyme_key(line1);
        let key_b = rhyme_key(line2);

        let line3 = find_rhyming_line(corpus, &key_a, &[line1, line2], config, rng).ok()?;
        if rhyme_key(line3) != key_a {
            continue;
        }

        let line4 = find_rhyming_line(corpus, &key_b, &[line1, line2, line3], config, rng).ok()?;
        if rhyme_key(line4) != key_b {
            continue;
        }

        debug!(attempt, %key_a, %key_b, "built ABAB quatrain");
        return Some(Poem::Abab {
            lines: [
                line1.to_string(),
                line2.to_string(),
                line3.to_string(),
                line4.to_string(),
            ],
            rhymes: (key_a, key_b),
        });
    }

    debug!(attempts = config.abab_attempts, "ABAB search exhausted");
    None
}

/// Build an unconstrained poem with a random line count in `free_lines`.
///
/// Verses already used in this poem are redrawn while unused distinct verses
/// remain; after that, repeats are allowed. A one-verse corpus produces N
/// copies of that verse.
pub fn build_free_poem(
    corpus: &[String],
    config: &GeneratorConfig,
    rng: &mut PoemRng,
) -> Result<Poem, GenerateError> {
    if corpus.is_empty() {
        return Err(GenerateError::EmptyCorpus);
    }

    let (min, max) = config.free_lines.bounds();
    let count = rng.range_usize_inclusive(min, max);
    let distinct = distinct_count(corpus);

    let mut used: HashSet<&str> = HashSet::with_capacity(distinct);
    let mut lines = Vec::with_capacity(count.min(MAX_FREE_LINES));
    for _ in 0..count {
        let mut line = sample_line(corpus, rng)?;
        if used.len() < distinct {
            for _ in 0..config.fallback_draw_limit {
                if !used.contains(line) {
                    break;
                }
                line = sample_line(corpus, rng)?;
            }
        }
        used.insert(line);
        lines.push(line.to_string());
    }

    Ok(Poem::Free { lines })
}

/// Generate one poem from a corpus snapshot.
///
/// Fails only when the corpus has fewer than `min_corpus_lines` verses (or is
/// empty). Otherwise always returns a poem: an ABAB quatrain when the search
/// succeeds, a free poem when it doesn't.
pub fn generate_poem(
    corpus: &[String],
    config: &GeneratorConfig,
    rng: &mut PoemRng,
) -> Result<Poem, GenerateError> {
    if corpus.len() < config.min_corpus_lines {
        return Err(GenerateError::InsufficientCorpus {
            available: corpus.len(),
            required: config.min_corpus_lines,
        });
    }
    if corpus.is_empty() {
        return Err(GenerateError::EmptyCorpus);
    }

    if let Some(poem) = try_build_abab(corpus, config, rng) {
        return Ok(poem);
    }

    debug!(corpus_len = corpus.len(), "falling back to a free poem");
    build_free_poem(corpus, config, rng)
}

/// Draw a verse textually different from `avoid`, or `None` if the draw
/// limit runs out first.
fn draw_other_than<'a>(
    corpus: &'a [String],
    avoid: &str,
    config: &GeneratorConfig,
    rng: &mut PoemRng,
) -> Option<&'a str> {
    for _ in 0..config.fallback_draw_limit {
        let line = sample_line(corpus, rng).ok()?;
        if line != avoid {
            return Some(line);
        }
    }
    None
}

fn distinct_count(corpus: &[String]) -> usize {
    corpus.iter().map(String::as_str).collect::<HashSet<_>>().len()
}
