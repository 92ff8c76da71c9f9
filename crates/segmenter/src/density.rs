//! Technical-density scoring shared by the segmentation passes and the
//! pattern validation tier.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Characters that signal code or configuration rather than prose
const TECHNICAL_CHARS: &str = "{}[]()<>;:=+-*/%&|!~^#@$";

/// Keywords counted toward density regardless of language
const KEYWORDS: &[&str] = &[
    "def", "class", "function", "var", "let", "const", "import", "export",
    "if", "else", "for", "while", "return", "void", "int", "string",
    "public", "private", "static", "async", "await", "try", "catch",
];

static STRUCTURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(def|class|if|for|while|return)\b").expect("structure regex is valid")
});

/// Ratio of technical characters and keywords in a piece of text
///
/// Weighted blend: character-level signal dominates (0.7), keyword hits
/// contribute the rest (0.3). Empty or whitespace-only text scores 0.
pub fn technical_density(text: &str) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }

    let char_total = text.chars().count().max(1);
    let tech_count = text.chars().filter(|c| TECHNICAL_CHARS.contains(*c)).count();

    let words: Vec<&str> = text.unicode_words().collect();
    let word_total = words.len().max(1);
    let keyword_count = words
        .iter()
        .filter(|word| {
            let lower = word.to_lowercase();
            KEYWORDS.contains(&lower.as_str())
        })
        .count();

    (tech_count as f32 / char_total as f32) * 0.7
        + (keyword_count as f32 / word_total as f32) * 0.3
}

/// Structural complexity: control-flow/declaration keyword hits, plus one
/// for a brace pair
pub fn block_complexity(text: &str) -> usize {
    let mut score = STRUCTURE_RE.find_iter(text).count();
    if text.contains('{') && text.contains('}') {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(technical_density(""), 0.0);
        assert_eq!(technical_density("   \n  "), 0.0);
    }

    #[test]
    fn test_code_denser_than_prose() {
        let code = "fn main() { let x = vec![1, 2, 3]; }";
        let prose = "The quick brown fox jumps over the lazy dog today";
        assert!(technical_density(code) > technical_density(prose));
        assert!(technical_density(prose) < 0.05);
    }

    #[test]
    fn test_keywords_contribute() {
        let with = "return if else while";
        let without = "apple banana cherry mango";
        assert!(technical_density(with) > technical_density(without));
    }

    #[test]
    fn test_block_complexity() {
        let block = "def f():\n    if x:\n        return 1\n";
        assert_eq!(block_complexity(block), 3);

        let braced = "while (true) { return; }";
        // while + return + brace pair
        assert_eq!(block_complexity(braced), 3);

        assert_eq!(block_complexity("plain words only"), 0);
    }
}
