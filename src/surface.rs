//! Textual surface parser (SPEC_FULL.md §3, spec §6's grammar contract):
//! scans the restricted regex-like syntax and drives a `DirectDriver`,
//! which is "the reference for operator semantics" per the same section.
//!
//! Grounded on `creative-forest-lang-pt/src/production/terminals/regex_field.rs`'s
//! regex-driven token recognition, reusing the teacher's `regex`
//! dependency for its native purpose.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::builder::{DirectDriver, ExpressionBuilder};
use crate::error::BadLimits;

/// Matches, in priority order: whitespace runs, a `[...]` quantifier, a
/// single special character, or a run of non-special characters (a
/// symbol).
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+|\[[^\]]*\]|[()^*+?,|&]|[^\s()\^*+?,|&\[\]]+").expect("static regex is valid")
});

fn parse_quantifier(token: &str) -> Result<(i64, i64), BadLimits> {
    let inner = &token[1..token.len() - 1];
    let mut parts = inner.splitn(2, ',');
    let min_str = parts.next().unwrap_or("").trim();
    let max_str = parts.next().unwrap_or("").trim();

    let min: i64 = min_str.parse().map_err(|_| BadLimits::new(-1, -1))?;
    let max: i64 = if max_str == "*" {
        -1
    } else {
        max_str.parse().map_err(|_| BadLimits::new(min, -1))?
    };
    Ok((min, max))
}

/// Scan `text` and drive `builder`. Per spec §6: `(` → `push`; `)`/`^` →
/// `pop`; `*`/`+`/`?` → the same-named unary op; `,`/`|`/`&` → the
/// same-named n-ary op; `[m,n]` → `range(m, n)` (`n = -1` for `*`); any
/// other run of characters → `symbol`.
pub fn parse_into(builder: &mut DirectDriver, text: &str) -> Result<(), BadLimits> {
    for token in TOKEN.find_iter(text) {
        let t = token.as_str();
        match t {
            _ if t.chars().all(char::is_whitespace) => {}
            "(" => builder.push(),
            ")" | "^" => builder.pop(),
            "*" => builder.star(),
            "+" => builder.plus(),
            "?" => builder.opt(),
            "," => builder.and(),
            "|" => builder.or(),
            "&" => builder.all(),
            _ if t.starts_with('[') => {
                let (min, max) = parse_quantifier(t)?;
                builder.range(min, max)?;
            }
            symbol => builder.symbol(symbol),
        }
    }
    Ok(())
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::tree::{NaryKind, Node, UnaryKind};

    #[test]
    fn parses_grouped_alternation_and_quantifier() {
        let mut b = DirectDriver::new();
        parse_into(&mut b, "(a|b)[2,3]").unwrap();
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        let Node::Range { limits, child, .. } = tree.node(root) else {
            panic!("expected a range node at the root");
        };
        assert_eq!((limits.min, limits.max), (2, 3));
        match tree.node(*child) {
            Node::Nary { kind: NaryKind::Alternation, children } => assert_eq!(children.len(), 2),
            other => panic!("expected alternation, got {:?}", other),
        }
    }

    #[test]
    fn infinite_quantifier_reduces_to_star() {
        let mut b = DirectDriver::new();
        parse_into(&mut b, "a[0,*]").unwrap();
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        assert!(matches!(tree.node(root), Node::Unary { kind: UnaryKind::Star, .. }));
    }

    #[test]
    fn caret_is_a_synonym_for_close_paren() {
        let mut b = DirectDriver::new();
        parse_into(&mut b, "(a,b^,c").unwrap();
        let tree = b.into_tree();
        let root = tree.root().unwrap();
        match tree.node(root) {
            Node::Nary { kind: NaryKind::Concat, children } => assert_eq!(children.len(), 3),
            other => panic!("expected ternary concat, got {:?}", other),
        }
    }

    #[test]
    fn whitespace_is_ignored_between_tokens() {
        let mut b1 = DirectDriver::new();
        parse_into(&mut b1, "a , b").unwrap();
        let mut b2 = DirectDriver::new();
        parse_into(&mut b2, "a,b").unwrap();
        assert_eq!(format!("{:?}", b1.into_tree()), format!("{:?}", b2.into_tree()));
    }
}
