//! Splits a free-text artist field into main and featured artist names.
//!
//! `"PJ Harvey & Thom Yorke feat. Someone"` becomes main
//! `["PJ Harvey", "Thom Yorke"]` and featured `["Someone"]`.

use std::sync::LazyLock;

use regex::Regex;

/// Stands in for an escaped ampersand while the field is split.
const LITERAL_AMPERSAND: char = '\u{E000}';

/// Escape sequences that mean "an ampersand that is part of a name".
const AMPERSAND_ESCAPES: [&str; 2] = ["\\&", "&amp;"];

static FEATURING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:featuring|feat\.?|ft\.|בהשתתפות)(?:\s|$)")
        .expect("featuring marker pattern is valid")
});

static CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:&|,|\band\b)\s*").expect("conjunction pattern is valid")
});

/// Artist names parsed out of one artist field, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArtists {
    pub main: Vec<String>,
    pub featured: Vec<String>,
}

impl ParsedArtists {
    /// Builds a credit from an explicit list of names (all main artists).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut main = Vec::new();
        for name in names {
            push_unique(&mut main, name.as_ref().trim());
        }
        Self {
            main,
            featured: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.featured.is_empty()
    }

    /// All names, main first, then featured.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.main
            .iter()
            .chain(self.featured.iter())
            .map(String::as_str)
    }
}

/// Parse a free-text artist field.
///
/// The first featuring marker (`feat`, `feat.`, `featuring`, `ft.`, or the
/// Hebrew `בהשתתפות`, any case) splits the field into a main and a
/// featured segment. Each segment is split on `&`, `,` and the word `and`.
/// Tokens are trimmed, escaped ampersands (`\&`, `&amp;`) are restored, and
/// empty or repeated names are dropped.
pub fn parse_artist_field(field: &str) -> ParsedArtists {
    let mut protected = field.to_string();
    for escape in AMPERSAND_ESCAPES {
        protected = protected.replace(escape, &LITERAL_AMPERSAND.to_string());
    }

    let (main_segment, featured_segment) = match FEATURING_MARKER.find(&protected) {
        Some(marker) => (
            &protected[..marker.start()],
            &protected[marker.end()..],
        ),
        None => (protected.as_str(), ""),
    };

    let mut parsed = ParsedArtists::default();
    for token in CONJUNCTION.split(main_segment) {
        push_unique(&mut parsed.main, &restore(token));
    }
    // A second marker inside the featured segment acts as a plain separator
    for part in FEATURING_MARKER.split(featured_segment) {
        for token in CONJUNCTION.split(part) {
            push_unique(&mut parsed.featured, &restore(token));
        }
    }
    parsed
}

fn restore(token: &str) -> String {
    token.trim().replace(LITERAL_AMPERSAND, "&")
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if !name.is_empty() && !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_main_and_featured() {
        let parsed = parse_artist_field("A & B feat C");
        assert_eq!(parsed.main, names(&["A", "B"]));
        assert_eq!(parsed.featured, names(&["C"]));
    }

    #[test]
    fn test_comma_separated() {
        let parsed = parse_artist_field("A, B");
        assert_eq!(parsed.main, names(&["A", "B"]));
        assert!(parsed.featured.is_empty());
    }

    #[test]
    fn test_featured_list() {
        let parsed = parse_artist_field("A feat. B & C");
        assert_eq!(parsed.main, names(&["A"]));
        assert_eq!(parsed.featured, names(&["B", "C"]));
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let parsed = parse_artist_field("PJ Harvey AND Thom Yorke FEATURING Someone");
        assert_eq!(parsed.main, names(&["PJ Harvey", "Thom Yorke"]));
        assert_eq!(parsed.featured, names(&["Someone"]));

        let parsed = parse_artist_field("Arik Einstein בהשתתפות Shalom Hanoch");
        assert_eq!(parsed.main, names(&["Arik Einstein"]));
        assert_eq!(parsed.featured, names(&["Shalom Hanoch"]));
    }

    #[test]
    fn test_marker_must_be_a_whole_word() {
        let parsed = parse_artist_field("Feather & Anderson");
        assert_eq!(parsed.main, names(&["Feather", "Anderson"]));
        assert!(parsed.featured.is_empty());
    }

    #[test]
    fn test_escaped_ampersand_is_part_of_the_name() {
        let parsed = parse_artist_field(r"Simon \& Garfunkel, Sting");
        assert_eq!(parsed.main, names(&["Simon & Garfunkel", "Sting"]));

        let parsed = parse_artist_field("Earth, Wind &amp; Fire");
        assert_eq!(parsed.main, names(&["Earth", "Wind & Fire"]));
    }

    #[test]
    fn test_dangling_separators_yield_no_empty_names() {
        let parsed = parse_artist_field(" & A &");
        assert_eq!(parsed.main, names(&["A"]));

        let parsed = parse_artist_field("A feat.");
        assert_eq!(parsed.main, names(&["A"]));
        assert!(parsed.featured.is_empty());

        let parsed = parse_artist_field("feat. B");
        assert!(parsed.main.is_empty());
        assert_eq!(parsed.featured, names(&["B"]));

        assert!(parse_artist_field("  ,  & ").is_empty());
    }

    #[test]
    fn test_repeated_names_kept_once() {
        let parsed = parse_artist_field("A & A feat. B, B");
        assert_eq!(parsed.main, names(&["A"]));
        assert_eq!(parsed.featured, names(&["B"]));
    }

    #[test]
    fn test_from_names() {
        let parsed = ParsedArtists::from_names([" A ", "", "B", "A"]);
        assert_eq!(parsed.main, names(&["A", "B"]));
        assert!(parsed.featured.is_empty());
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Single-word artist names that cannot be mistaken for separators or markers
    fn artist_name() -> impl Strategy<Value = String> {
        prop::string::string_regex("[A-Z][a-z]{2,8}")
            .unwrap()
            .prop_filter("not a keyword", |s| {
                !matches!(s.to_lowercase().as_str(), "and" | "feat" | "featuring")
            })
    }

    proptest! {
        /// Joining names with any separator parses back to the same names, in order
        #[test]
        fn parse_preserves_order(
            main in prop::collection::vec(artist_name(), 1..5),
            featured in prop::collection::vec(artist_name(), 0..4),
            sep in prop::sample::select(vec![" & ", ", ", " and ", " AND "]),
        ) {
            let mut field = main.join(sep);
            if !featured.is_empty() {
                field.push_str(" feat. ");
                field.push_str(&featured.join(sep));
            }
            let parsed = parse_artist_field(&field);

            let mut expected_main = Vec::new();
            for n in &main {
                if !expected_main.contains(n) { expected_main.push(n.clone()); }
            }
            let mut expected_feat = Vec::new();
            for n in &featured {
                if !expected_feat.contains(n) { expected_feat.push(n.clone()); }
            }
            prop_assert_eq!(parsed.main, expected_main);
            prop_assert_eq!(parsed.featured, expected_feat);
        }

        /// Parsing never produces an empty or untrimmed name
        #[test]
        fn parse_never_yields_blank_names(field in "[A-Za-z &,.]{0,40}") {
            let parsed = parse_artist_field(&field);
            for name in parsed.all() {
                prop_assert!(!name.is_empty());
                prop_assert_eq!(name, name.trim());
            }
        }
    }
}
