// Verse combinations: deterministic rewrites of a single verse.
//
// `combine` splits a verse on whitespace and returns every transform that
// applies to it, in a fixed order:
//
//   Inversion       words in reverse order
//   EvenWords       words at positions 0, 2, 4, ...   (needs 2+ words)
//   OddWords        words at positions 1, 3, 5, ...   (needs 2+ words)
//   Extremes        first and last word               (needs 2+ words)
//   Uppercase       the whole verse upper-cased
//   ReversedChars   the verse's characters back to front
//   Vertical        one word per line
//   VowelsOnly      the verse's vowels, space-separated (if it has any)
//   ConsonantsOnly  its consonants, space-separated (if it has any)
//
// Vowels are `a e i o u` plus the Catalan accented `à è é í ò ó ú`, in either
// case. Consonants are the 21 plain Latin consonant letters, in either case;
// `ç`, `ñ`, and the `l·l` middle dot count as neither. Matched characters keep
// their original case.
//
// No randomness and no corpus: the same verse always gives the same list.

use std::fmt;

use serde::{Deserialize, Serialize};

const VOWELS: &str = "aeiouàèéíòóú";
const CONSONANTS: &str = "bcdfghjklmnpqrstvwxyz";

/// Which rewrite produced a `Combination`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombinationKind {
    Inversion,
    EvenWords,
    OddWords,
    Extremes,
    Uppercase,
    ReversedChars,
    Vertical,
    VowelsOnly,
    ConsonantsOnly,
}

impl CombinationKind {
    /// Short upper-case label, as shown to readers.
    pub fn label(self) -> &'static str {
        match self {
            CombinationKind::Inversion => "INVERSIÓ",
            CombinationKind::EvenWords => "PARAULES PARELLES",
            CombinationKind::OddWords => "PARAULES IMPARELLES",
            CombinationKind::Extremes => "EXTREMS",
            CombinationKind::Uppercase => "MAJÚSCULES",
            CombinationKind::ReversedChars => "CARÀCTERS INVERTITS",
            CombinationKind::Vertical => "VERTICALITZACIÓ",
            CombinationKind::VowelsOnly => "NOMÉS VOCALS",
            CombinationKind::ConsonantsOnly => "NOMÉS CONSONANTS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CombinationKind::Inversion => "Ordre invers de les paraules",
            CombinationKind::EvenWords => "Només paraules en posicions parelles",
            CombinationKind::OddWords => "Només paraules en posicions imparelles",
            CombinationKind::Extremes => "Primera i última paraula",
            CombinationKind::Uppercase => "Tot en majúscules",
            CombinationKind::ReversedChars => "Caràcters en ordre invers",
            CombinationKind::Vertical => "Cada paraula en una línia",
            CombinationKind::VowelsOnly => "Només les vocals del vers",
            CombinationKind::ConsonantsOnly => "Només les consonants del vers",
        }
    }
}

impl fmt::Display for CombinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One rewritten form of a verse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub kind: CombinationKind,
    pub result: String,
}

impl Combination {
    fn new(kind: CombinationKind, result: impl Into<String>) -> Self {
        Self {
            kind,
            result: result.into(),
        }
    }
}

fn is_vowel(c: char) -> bool {
    c.to_lowercase().all(|l| VOWELS.contains(l))
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && CONSONANTS.contains(c.to_ascii_lowercase())
}

/// Space-separated characters of `verse` that satisfy `keep`, or `None` if
/// there are none.
fn spelled(verse: &str, keep: fn(char) -> bool) -> Option<String> {
    let picked: Vec<String> = verse.chars().filter(|&c| keep(c)).map(String::from).collect();
    (!picked.is_empty()).then(|| picked.join(" "))
}

/// Every combination that applies to `verse`, in the order listed above.
pub fn combine(verse: &str) -> Vec<Combination> {
    use CombinationKind::*;

    let words: Vec<&str> = verse.split_whitespace().collect();
    let mut out = Vec::with_capacity(9);

    let inverted: Vec<&str> = words.iter().rev().copied().collect();
    out.push(Combination::new(Inversion, inverted.join(" ")));

    if let [first, .., last] = words.as_slice() {
        let even: Vec<&str> = words.iter().step_by(2).copied().collect();
        let odd: Vec<&str> = words.iter().skip(1).step_by(2).copied().collect();
        out.push(Combination::new(EvenWords, even.join(" ")));
        out.push(Combination::new(OddWords, odd.join(" ")));
        out.push(Combination::new(Extremes, format!("{first} {last}")));
    }

    out.push(Combination::new(Uppercase, verse.to_uppercase()));
    out.push(Combination::new(ReversedChars, verse.chars().rev().collect::<String>()));
    out.push(Combination::new(Vertical, words.join("\n")));

    if let Some(vowels) = spelled(verse, is_vowel) {
        out.push(Combination::new(VowelsOnly, vowels));
    }
    if let Some(consonants) = spelled(verse, is_consonant) {
        out.push(Combination::new(ConsonantsOnly, consonants));
    }
    out
}
