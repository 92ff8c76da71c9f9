use crate::registry::GrammarRegistry;
use codesift_language::Language;
use std::time::Duration;
use tree_sitter::{Node, Parser};

/// Outcome of a single tree-sitter parse
///
/// `TimedOut` and `Unavailable` are kept distinct from `ErrorNodes`: a parse
/// that ran out of time says nothing about the fragment, while a parse that
/// produced error nodes is real evidence of malformed syntax.
pub(crate) enum ParseAttempt {
    Clean { node_count: usize },
    ErrorNodes { count: usize },
    TimedOut,
    Unavailable,
}

/// Parse a fragment with the registered grammar for `language`
pub(crate) fn parse_fragment(language: Language, text: &str, timeout: Duration) -> ParseAttempt {
    let Some(grammar) = GrammarRegistry::global().grammar(language) else {
        return ParseAttempt::Unavailable;
    };

    let mut parser = Parser::new();
    if let Err(err) = parser.set_language(grammar) {
        log::error!("failed to load {language} grammar: {err}");
        return ParseAttempt::Unavailable;
    }
    parser.set_timeout_micros(timeout.as_micros() as u64);

    let Some(tree) = parser.parse(text, None) else {
        // tree-sitter returns None when the timeout fires mid-parse
        return ParseAttempt::TimedOut;
    };

    let root = tree.root_node();
    if root.has_error() {
        ParseAttempt::ErrorNodes {
            count: count_error_nodes(root),
        }
    } else {
        ParseAttempt::Clean {
            node_count: count_nodes(root),
        }
    }
}

fn count_nodes(node: Node) -> usize {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    1 + children.into_iter().map(count_nodes).sum::<usize>()
}

fn count_error_nodes(node: Node) -> usize {
    let mut count = usize::from(node.is_error() || node.is_missing());
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        count += count_error_nodes(child);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[test]
    fn test_clean_python_parse() {
        let attempt = parse_fragment(Language::Python, "def f():\n    return 1\n", TIMEOUT);
        match attempt {
            ParseAttempt::Clean { node_count } => assert!(node_count > 5),
            _ => panic!("expected a clean parse"),
        }
    }

    #[test]
    fn test_clean_rust_parse() {
        let src = "fn add(a: u32, b: u32) -> u32 {\n    a + b\n}\n";
        assert!(matches!(
            parse_fragment(Language::Rust, src, TIMEOUT),
            ParseAttempt::Clean { .. }
        ));
    }

    #[test]
    fn test_broken_python_reports_error_nodes() {
        let attempt = parse_fragment(Language::Python, "def f(:\n    return 1\n", TIMEOUT);
        match attempt {
            ParseAttempt::ErrorNodes { count } => assert!(count >= 1),
            _ => panic!("expected error nodes"),
        }
    }

    #[test]
    fn test_unsupported_language_is_unavailable() {
        assert!(matches!(
            parse_fragment(Language::Go, "func main() {}\n", TIMEOUT),
            ParseAttempt::Unavailable
        ));
    }
}
