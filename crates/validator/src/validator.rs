use crate::ast::{parse_fragment, ParseAttempt};
use crate::pattern;
use crate::verdict::{PatternSignal, RejectReason, Verdict};
use codesift_language::Language;
use codesift_segmenter::density::technical_density;
use codesift_segmenter::{BlockType, CandidateFragment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the two validation tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Per-fragment grammar parse budget in milliseconds
    pub parse_timeout_ms: u64,
    /// Technical density required to pass on density alone
    pub pattern_density_floor: f32,
    /// Density-only acceptance requires at least this many lines
    pub min_density_lines: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            parse_timeout_ms: 500,
            pattern_density_floor: 0.25,
            min_density_lines: 2,
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.parse_timeout_ms == 0 {
            return Err("parse_timeout_ms must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.pattern_density_floor) {
            return Err(format!(
                "pattern_density_floor must be within 0..=1, got {}",
                self.pattern_density_floor
            ));
        }
        if self.min_density_lines == 0 {
            return Err("min_density_lines must be positive".to_string());
        }
        Ok(())
    }
}

/// Two-tier fragment validator
///
/// Tier one is a real grammar parse; tier two is pattern evidence. The
/// decision flow never throws away a fragment just because a parse could
/// not run: only affirmative evidence of breakage (error nodes that the
/// pattern tier cannot redeem, a blown parse budget, or no code signal at
/// all) produces a rejection.
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ValidatorConfig::default())
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Classify one fragment under its detected language
    pub fn validate(&self, fragment: &CandidateFragment, language: Language) -> Verdict {
        if language.supports_ast() {
            let timeout = Duration::from_millis(self.config.parse_timeout_ms);
            match parse_fragment(language, &fragment.text, timeout) {
                ParseAttempt::Clean { node_count } => {
                    return Verdict::AstValid { node_count };
                }
                ParseAttempt::ErrorNodes { count } => {
                    log::debug!(
                        "{language} parse hit {count} error nodes, lines {}-{}; trying pattern tier",
                        fragment.start_line,
                        fragment.end_line
                    );
                    return self.pattern_tier(fragment, count);
                }
                ParseAttempt::TimedOut => {
                    log::warn!(
                        "{language} parse exceeded {}ms, lines {}-{}",
                        self.config.parse_timeout_ms,
                        fragment.start_line,
                        fragment.end_line
                    );
                    return Verdict::Rejected {
                        reason: RejectReason::ParseTimeout,
                    };
                }
                ParseAttempt::Unavailable => {
                    log::warn!("no usable grammar for {language}; using pattern tier");
                }
            }
        }
        self.pattern_tier(fragment, 0)
    }

    fn pattern_tier(&self, fragment: &CandidateFragment, parse_errors: usize) -> Verdict {
        let text = &fragment.text;
        match fragment.hint {
            BlockType::StructuredData => {
                if pattern::json_well_formed(text) || pattern::mapping_shape(text) {
                    return Verdict::PatternValid {
                        signal: PatternSignal::StructuredWellFormed,
                        parse_errors,
                    };
                }
                match self.generic_signal(fragment) {
                    Ok(signal) => Verdict::PatternValid {
                        signal,
                        parse_errors,
                    },
                    Err(reason) => {
                        // A structured hint that fails every check is a
                        // malformed document, not merely signal-free
                        let reason = if reason == RejectReason::NoCodeSignal {
                            RejectReason::MalformedStructure
                        } else {
                            reason
                        };
                        Verdict::Rejected { reason }
                    }
                }
            }
            BlockType::Config => {
                if pattern::config_shape(text) {
                    return Verdict::PatternValid {
                        signal: PatternSignal::ConfigShape,
                        parse_errors,
                    };
                }
                match self.generic_signal(fragment) {
                    Ok(signal) => Verdict::PatternValid {
                        signal,
                        parse_errors,
                    },
                    Err(reason) => Verdict::Rejected { reason },
                }
            }
            BlockType::Code | BlockType::Prose => match self.generic_signal(fragment) {
                Ok(signal) => Verdict::PatternValid {
                    signal,
                    parse_errors,
                },
                Err(reason) => Verdict::Rejected { reason },
            },
        }
    }

    /// Declaration evidence first, density floor second; delimiter balance
    /// is a prerequisite for either
    fn generic_signal(&self, fragment: &CandidateFragment) -> Result<PatternSignal, RejectReason> {
        let text = &fragment.text;
        let balanced = pattern::check_balanced(text);

        if pattern::declaration_hits(text) >= 1 {
            return if balanced {
                Ok(PatternSignal::Declaration)
            } else {
                Err(RejectReason::UnbalancedDelimiters)
            };
        }

        let dense = technical_density(text) >= self.config.pattern_density_floor
            && fragment.line_count() >= self.config.min_density_lines;
        if dense {
            return if balanced {
                Ok(PatternSignal::DensityFloor)
            } else {
                Err(RejectReason::UnbalancedDelimiters)
            };
        }

        Err(RejectReason::NoCodeSignal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesift_segmenter::SegmentPass;

    fn fragment(text: &str, hint: BlockType) -> CandidateFragment {
        CandidateFragment {
            start_line: 1,
            end_line: text.lines().count().max(1),
            text: text.to_string(),
            hint,
            pass: SegmentPass::Fence,
            fence_tag: None,
        }
    }

    #[test]
    fn test_clean_python_is_ast_valid() {
        let validator = Validator::with_defaults();
        let frag = fragment("def f():\n    return 1\n", BlockType::Code);
        match validator.validate(&frag, Language::Python) {
            Verdict::AstValid { node_count } => assert!(node_count > 0),
            other => panic!("expected AstValid, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_failure_falls_back_to_pattern() {
        // JavaScript source under a Python detection: the grammar parse
        // fails, but the declaration shape still carries it
        let validator = Validator::with_defaults();
        let frag = fragment("function greet(name) {\n  return name;\n}\n", BlockType::Code);
        match validator.validate(&frag, Language::Python) {
            Verdict::PatternValid {
                signal,
                parse_errors,
            } => {
                assert_eq!(signal, PatternSignal::Declaration);
                assert!(parse_errors >= 1);
            }
            other => panic!("expected PatternValid, got {other:?}"),
        }
    }

    #[test]
    fn test_language_without_grammar_uses_pattern_tier() {
        let validator = Validator::with_defaults();
        let frag = fragment("func main() {\n\tfmt.Println(1)\n}\n", BlockType::Code);
        match validator.validate(&frag, Language::Go) {
            Verdict::PatternValid {
                signal,
                parse_errors,
            } => {
                assert_eq!(signal, PatternSignal::Declaration);
                assert_eq!(parse_errors, 0);
            }
            other => panic!("expected PatternValid, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_hint_accepts_json() {
        let validator = Validator::with_defaults();
        let frag = fragment(r#"{"retries": 3, "hosts": ["a", "b"]}"#, BlockType::StructuredData);
        assert!(matches!(
            validator.validate(&frag, Language::Json),
            Verdict::PatternValid {
                signal: PatternSignal::StructuredWellFormed,
                ..
            }
        ));
    }

    #[test]
    fn test_structured_hint_accepts_yaml_mapping() {
        let validator = Validator::with_defaults();
        let frag = fragment("host: localhost\nport: 8080\n", BlockType::StructuredData);
        assert!(matches!(
            validator.validate(&frag, Language::Yaml),
            Verdict::PatternValid {
                signal: PatternSignal::StructuredWellFormed,
                ..
            }
        ));
    }

    #[test]
    fn test_config_hint_accepts_ini() {
        let validator = Validator::with_defaults();
        let frag = fragment("[database]\nhost = db.internal\nport = 5432\n", BlockType::Config);
        assert!(matches!(
            validator.validate(&frag, Language::Ini),
            Verdict::PatternValid {
                signal: PatternSignal::ConfigShape,
                ..
            }
        ));
    }

    #[test]
    fn test_prose_is_rejected_for_lack_of_signal() {
        let validator = Validator::with_defaults();
        let frag = fragment(
            "Just some sentences here.\nNothing resembling code.\n",
            BlockType::Prose,
        );
        assert_eq!(
            validator.validate(&frag, Language::Unknown),
            Verdict::Rejected {
                reason: RejectReason::NoCodeSignal
            }
        );
    }

    #[test]
    fn test_unbalanced_declaration_is_rejected() {
        let validator = Validator::with_defaults();
        let frag = fragment("def broken(:\n    return compute(x)\n", BlockType::Code);
        assert_eq!(
            validator.validate(&frag, Language::Unknown),
            Verdict::Rejected {
                reason: RejectReason::UnbalancedDelimiters
            }
        );
    }

    #[test]
    fn test_density_floor_requires_two_lines() {
        let validator = Validator::with_defaults();
        // Dense but a single line: an inline span, not a block of code
        let one_line = fragment("[x](#y)", BlockType::Code);
        assert_eq!(
            validator.validate(&one_line, Language::Unknown),
            Verdict::Rejected {
                reason: RejectReason::NoCodeSignal
            }
        );

        let two_lines = fragment("q0={a:1,b:[2,3]};\nq1={c:4,d:[5,6]};\n", BlockType::Code);
        assert!(matches!(
            validator.validate(&two_lines, Language::Unknown),
            Verdict::PatternValid {
                signal: PatternSignal::DensityFloor,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_structured_hint() {
        let validator = Validator::with_defaults();
        let frag = fragment(r#"{"trailing": }"#, BlockType::StructuredData);
        assert_eq!(
            validator.validate(&frag, Language::Json),
            Verdict::Rejected {
                reason: RejectReason::MalformedStructure
            }
        );
    }

    #[test]
    fn test_config_validate_rejects_bad_values() {
        let mut config = ValidatorConfig::default();
        assert!(config.validate().is_ok());

        config.parse_timeout_ms = 0;
        assert!(config.validate().is_err());

        config = ValidatorConfig::default();
        config.pattern_density_floor = 1.5;
        assert!(config.validate().is_err());
    }
}
