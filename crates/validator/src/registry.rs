use codesift_language::Language;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static REGISTRY: Lazy<GrammarRegistry> = Lazy::new(GrammarRegistry::build);

/// Languages expected to carry a compiled grammar
const AST_LANGUAGES: &[Language] = &[
    Language::Rust,
    Language::Python,
    Language::JavaScript,
    Language::TypeScript,
];

/// Static grammar table, assembled once at startup
///
/// Parsers themselves are created per validation call (they are cheap and
/// not `Sync`); the registry holds the immutable grammar handles. A language
/// that claims AST support but has no grammar here is a configuration
/// problem: it is logged at build time and validation quietly downgrades to
/// pattern checks.
pub struct GrammarRegistry {
    grammars: HashMap<Language, tree_sitter::Language>,
}

impl GrammarRegistry {
    fn build() -> Self {
        let mut grammars = HashMap::new();
        for &lang in AST_LANGUAGES {
            match lang.grammar() {
                Some(grammar) => {
                    grammars.insert(lang, grammar);
                }
                None => {
                    log::warn!(
                        "language {lang} claims AST support but no grammar is compiled in"
                    );
                }
            }
        }
        log::debug!("grammar registry holds {} languages", grammars.len());
        Self { grammars }
    }

    /// The process-wide registry
    pub fn global() -> &'static GrammarRegistry {
        &REGISTRY
    }

    pub fn grammar(&self, language: Language) -> Option<&tree_sitter::Language> {
        self.grammars.get(&language)
    }

    pub fn is_registered(&self, language: Language) -> bool {
        self.grammars.contains_key(&language)
    }

    /// Registered languages, in stable order
    pub fn registered(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.grammars.keys().copied().collect();
        langs.sort();
        langs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_ast_languages() {
        let registry = GrammarRegistry::global();
        for &lang in AST_LANGUAGES {
            assert!(registry.is_registered(lang), "{lang} missing from registry");
        }
        assert_eq!(registry.registered().len(), AST_LANGUAGES.len());
    }

    #[test]
    fn test_unregistered_languages_have_no_grammar() {
        let registry = GrammarRegistry::global();
        assert!(!registry.is_registered(Language::Go));
        assert!(!registry.is_registered(Language::Yaml));
        assert!(registry.grammar(Language::Unknown).is_none());
    }
}
