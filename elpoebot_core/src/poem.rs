// Poem data types.
//
// A `Poem` is either an ABAB quatrain (with the two rhyme keys that bind it)
// or a free-form poem of any length. Serialized with an internal `kind` tag so
// the persisted form keeps line order, the ABAB/FREE distinction, and the
// rhyme keys:
//
//   {"kind":"ABAB","lines":["…","…","…","…"],"rhymes":["ella","rena"]}
//   {"kind":"FREE","lines":["…", …]}
//
// Poems are immutable once generated. Timestamps belong to the book entry
// wrapping a poem (see `elpoebot_store`), not to the poem itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rhyme::rhyme_key;

/// Which scheme a poem follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoemKind {
    #[serde(rename = "ABAB")]
    Abab,
    #[serde(rename = "FREE")]
    Free,
}

impl fmt::Display for PoemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoemKind::Abab => f.write_str("ABAB"),
            PoemKind::Free => f.write_str("FREE"),
        }
    }
}

/// A generated (or submitted) poem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Poem {
    /// Lines 1&3 share `rhymes.0`, lines 2&4 share `rhymes.1`.
    #[serde(rename = "ABAB")]
    Abab {
        lines: [String; 4],
        rhymes: (String, String),
    },
    #[serde(rename = "FREE")]
    Free { lines: Vec<String> },
}

impl Poem {
    pub fn kind(&self) -> PoemKind {
        match self {
            Poem::Abab { .. } => PoemKind::Abab,
            Poem::Free { .. } => PoemKind::Free,
        }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            Poem::Abab { lines, .. } => lines.as_slice(),
            Poem::Free { lines } => lines.as_slice(),
        }
    }

    /// The (A, B) rhyme keys of a quatrain; `None` for free poems.
    pub fn rhymes(&self) -> Option<(&str, &str)> {
        match self {
            Poem::Abab { rhymes, .. } => Some((&rhymes.0, &rhymes.1)),
            Poem::Free { .. } => None,
        }
    }

    /// Check that the poem satisfies its own scheme.
    ///
    /// A quatrain must carry rhyme keys matching its lines (1&3 on A, 2&4 on
    /// B). Any poem must have at least one line. Used to vet poems submitted
    /// from outside the generator before they reach the book.
    pub fn check_scheme(&self) -> Result<(), String> {
        match self {
            Poem::Abab { lines, rhymes } => {
                for (idx, expected) in [(0, &rhymes.0), (1, &rhymes.1), (2, &rhymes.0), (3, &rhymes.1)] {
                    let actual = rhyme_key(&lines[idx]);
                    if &actual != expected {
                        return Err(format!(
                            "line {} has rhyme key {actual:?}, expected {expected:?}",
                            idx + 1
                        ));
                    }
                }
                Ok(())
            }
            Poem::Free { lines } if lines.is_empty() => Err("poem has no lines".into()),
            Poem::Free { .. } => Ok(()),
        }
    }
}

impl fmt::Display for Poem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}
