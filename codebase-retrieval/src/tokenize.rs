//! Term extraction shared by the lexical and relational indexes.

/// Lowercase, replace every non-word character with a separator, split on
/// whitespace and drop tokens of one character or less.
///
/// Word characters are alphanumerics and `_`, so identifiers such as
/// `parse_config` survive as a single token while `self.config` splits in two.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_word_char(c) { c } else { ' ' })
        .collect();

    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lowercases_and_splits() {
        assert_eq!(tokenize("The Cat SAT"), vec!["the", "cat", "sat"]);
    }

    #[test]
    fn test_drops_single_characters() {
        assert_eq!(tokenize("a b cd e"), vec!["cd"]);
    }

    #[test]
    fn test_punctuation_separates_tokens() {
        assert_eq!(
            tokenize("fn parse_config(self.path) -> Result<()>"),
            vec!["fn", "parse_config", "self", "path", "result"]
        );
    }

    #[test]
    fn test_blank_input() {
        assert!(tokenize("   \n\t").is_empty());
        assert!(tokenize("!!! ??").is_empty());
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(tokenize("größe über"), vec!["größe", "über"]);
    }
}
