//! Input tokenizer (C9): splits a validation string on commas and ASCII
//! whitespace, producing no empty tokens for consecutive separators.

/// Split `input` into symbol tokens on `,`, `' '`, `\t`, `\n`, `\r`.
pub fn tokenize(input: &str) -> Vec<&str> {
    input
        .split(|c: char| c == ',' || c == ' ' || c == '\t' || c == '\n' || c == '\r')
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn splits_on_commas_and_whitespace() {
        assert_eq!(tokenize("a, b,  c\td\n"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn collapses_consecutive_separators() {
        assert_eq!(tokenize(",,a,,,b,,"), vec!["a", "b"]);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokenize("   \t\n").is_empty());
    }
}
