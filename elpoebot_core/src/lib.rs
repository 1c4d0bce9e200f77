// ELPOEBOT poem generator.
//
// Builds short poems out of a shared pool of user-submitted verses (the
// corpus). The generator first tries to assemble an ABAB quatrain whose lines
// 1&3 and 2&4 share a rhyme key; when a bounded random search can't satisfy
// the scheme it falls back to an unconstrained free-form poem. No I/O, no
// shared state: every entry point takes a borrowed corpus snapshot and a
// `&mut PoemRng`.
//
// Architecture:
// - `rhyme.rs`: `rhyme_key()`, the orthographic suffix heuristic
// - `combinations.rs`: `combine()`, fixed word/character rewrites of a
//   single verse (inversion, alternate words, vowels only, ...)
// - `generator.rs`: sampling, rhyme search, ABAB construction, free-form
//   fallback, and the top-level `generate_poem()`
// - `poem.rs`: `Poem` (ABAB or FREE) and `PoemKind`
// - `config.rs`: `GeneratorConfig`, the search bounds and free-poem length
//   range, loaded from JSON like the rest of the workspace's configs
// - `error.rs`: `GenerateError` and `ConfigError`
//
// Determinism constraint: identical corpus, config, and seed must produce the
// identical poem. All randomness goes through `elpoebot_prng::PoemRng`.

pub mod combinations;
pub mod config;
pub mod error;
pub mod generator;
pub mod poem;
pub mod rhyme;

pub use combinations::{Combination, CombinationKind, combine};
pub use config::{GeneratorConfig, LineRange, MAX_FREE_LINES};
pub use error::{ConfigError, GenerateError};
pub use generator::{
    build_free_poem, find_rhyming_line, generate_poem, sample_line, try_build_abab,
};
pub use poem::{Poem, PoemKind};
pub use rhyme::{RHYME_KEY_LEN, rhyme_key};

pub use elpoebot_prng::PoemRng;
