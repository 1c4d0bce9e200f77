// Rhyme key extraction.
//
// Two verses "rhyme" when their rhyme keys are equal: the last four
// characters left after dropping punctuation and whitespace, lower-cased.
// This is a spelling heuristic, not phonetics; "bella" and "vermella" rhyme,
// "serena" and "plena" do not ("rena" vs "lena").
//
// Lower-casing uses Unicode case mapping over the whole cleaned verse, which
// keeps diacritics intact ("BELLÀ" -> "ellà") and applies context-dependent
// rules such as word-final sigma. Case mapping runs before the suffix is cut,
// so a character whose lower-case form expands never pushes the key past
// `RHYME_KEY_LEN` characters.
//
// Lines with fewer than four surviving characters yield a shorter key, and an
// empty or all-punctuation line yields the empty key. Empty keys match each
// other; the generator does not special-case this.

/// Number of trailing characters that make up a rhyme key.
pub const RHYME_KEY_LEN: usize = 4;

/// Punctuation removed before the suffix is taken. Whitespace is removed too.
const STRIPPED: [char; 10] = [';', ':', ',', '.', '¿', '?', '¡', '!', '(', ')'];

/// Compute the rhyme key of a verse.
pub fn rhyme_key(line: &str) -> String {
    let cleaned: String = line
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED.contains(c))
        .collect();
    let folded = cleaned.to_lowercase();
    let skip = folded.chars().count().saturating_sub(RHYME_KEY_LEN);
    folded.chars().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_four_characters() {
        assert_eq!(rhyme_key("casa vermella"), "ella");
        assert_eq!(rhyme_key("taula bella"), "ella");
        assert_eq!(rhyme_key("nit serena"), "rena");
    }

    #[test]
    fn strips_punctuation_and_whitespace() {
        assert_eq!(rhyme_key("¿Qui és la bella?"), "ella");
        assert_eq!(rhyme_key("(la mar serena!)  "), "rena");
        assert_eq!(rhyme_key("a b; c: d, e."), "bcde");
        assert_eq!(rhyme_key("lla\tna\n"), "lana");
    }

    #[test]
    fn joins_across_word_boundaries() {
        // Whitespace is removed before the suffix is cut.
        assert_eq!(rhyme_key("el sol s'amaga a la mar"), "amar");
        assert_eq!(rhyme_key("fa un a"), "auna");
    }

    #[test]
    fn lowercases_without_dropping_accents() {
        assert_eq!(rhyme_key("L'AMOR QUE S'ACABÀ"), "cabà");
        assert_eq!(rhyme_key("CANÇÓ"), "ançó");
        assert_ne!(rhyme_key("camí"), rhyme_key("cami"));
    }

    #[test]
    fn short_lines_yield_short_keys() {
        assert_eq!(rhyme_key("sol"), "sol");
        assert_eq!(rhyme_key("A!"), "a");
    }

    #[test]
    fn empty_and_punctuation_only_lines_yield_empty_key() {
        assert_eq!(rhyme_key(""), "");
        assert_eq!(rhyme_key("   "), "");
        assert_eq!(rhyme_key("¿¡...!?"), "");
        // Degenerate match: two empty keys compare equal.
        assert_eq!(rhyme_key("..."), rhyme_key("!!"));
    }

    #[test]
    fn characters_are_counted_not_bytes() {
        // Four accented characters are more than four bytes.
        assert_eq!(rhyme_key("xàèìò"), "àèìò");
    }

    #[test]
    fn keys_compare_across_case_and_punctuation() {
        assert_eq!(rhyme_key("casa vermella"), rhyme_key("Taula bella."));
        assert_ne!(rhyme_key("nit serena"), rhyme_key("flor plena"));
    }

    #[test]
    fn final_sigma_follows_word_context() {
        assert_eq!(rhyme_key("ΟΔΟΣ"), "οδος");
        assert!(rhyme_key("ΟΔΟΣ").ends_with('ς'));
        // Whitespace is gone before folding, so a mid-verse sigma stays medial.
        assert_eq!(rhyme_key("ΟΣ Α"), "οσα");
    }
}
