use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signal a vote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteSource {
    Extension,
    Fence,
    Shebang,
    Heuristic,
}

impl VoteSource {
    /// Base weight of this signal; extension outranks everything
    pub fn weight(self) -> u32 {
        match self {
            VoteSource::Extension => 5,
            VoteSource::Fence => 4,
            VoteSource::Shebang => 3,
            // heuristic weight scales with marker hits, capped in tally()
            VoteSource::Heuristic => 1,
        }
    }
}

/// One weighted vote for a language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageVote {
    pub source: VoteSource,
    pub language: Language,
    pub weight: u32,
}

/// How certain the detector is about its answer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetectionConfidence {
    Unknown,
    Low,
    Medium,
    High,
}

impl DetectionConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionConfidence::High => "high",
            DetectionConfidence::Medium => "medium",
            DetectionConfidence::Low => "low",
            DetectionConfidence::Unknown => "unknown",
        }
    }
}

/// Detector output: winning language, certainty, and the evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub language: Language,
    pub confidence: DetectionConfidence,
    pub votes: Vec<LanguageVote>,
}

impl Detection {
    fn unknown() -> Self {
        Self {
            language: Language::Unknown,
            confidence: DetectionConfidence::Unknown,
            votes: Vec::new(),
        }
    }
}

/// Languages probed by the content-marker heuristic
const HEURISTIC_CANDIDATES: &[Language] = &[
    Language::Rust,
    Language::Python,
    Language::JavaScript,
    Language::TypeScript,
    Language::Go,
    Language::Java,
    Language::C,
    Language::Cpp,
    Language::CSharp,
    Language::Ruby,
    Language::Swift,
    Language::Kotlin,
    Language::Php,
    Language::Bash,
    Language::Sql,
    Language::Html,
    Language::Css,
];

// Content markers never outvote a shebang line on their own.
const HEURISTIC_WEIGHT_CAP: u32 = 2;

/// Weighted-vote language detector
///
/// Collects votes from the file extension, an optional fence tag, a shebang
/// line, and content markers, then tallies them. Equal totals resolve toward
/// the extension vote, then the fence vote; with no signal at all the answer
/// is [`Language::Unknown`], never an error.
#[derive(Debug, Default, Clone)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the language of a fragment or document
    ///
    /// `path` is the originating file name (extension vote), `fence_tag` the
    /// declared tag when the fragment came out of a fenced block.
    pub fn detect(
        &self,
        path: Option<&str>,
        content: &str,
        fence_tag: Option<&str>,
    ) -> Detection {
        let mut votes = Vec::new();

        if let Some(path) = path {
            let lang = Language::from_path(path);
            if lang != Language::Unknown {
                votes.push(LanguageVote {
                    source: VoteSource::Extension,
                    language: lang,
                    weight: VoteSource::Extension.weight(),
                });
            }
        }

        if let Some(tag) = fence_tag {
            let lang = Language::from_label(tag);
            if lang != Language::Unknown {
                votes.push(LanguageVote {
                    source: VoteSource::Fence,
                    language: lang,
                    weight: VoteSource::Fence.weight(),
                });
            }
        }

        if let Some(lang) = shebang_language(content) {
            votes.push(LanguageVote {
                source: VoteSource::Shebang,
                language: lang,
                weight: VoteSource::Shebang.weight(),
            });
        }

        for &lang in HEURISTIC_CANDIDATES {
            let hits = marker_hits(content, lang);
            if hits > 0 {
                votes.push(LanguageVote {
                    source: VoteSource::Heuristic,
                    language: lang,
                    weight: (hits as u32).min(HEURISTIC_WEIGHT_CAP),
                });
            }
        }

        self.tally(votes)
    }

    fn tally(&self, votes: Vec<LanguageVote>) -> Detection {
        if votes.is_empty() {
            return Detection::unknown();
        }

        let mut totals: BTreeMap<Language, u32> = BTreeMap::new();
        for vote in &votes {
            *totals.entry(vote.language).or_insert(0) += vote.weight;
        }

        let best_total = totals.values().copied().max().unwrap_or(0);
        let tied: Vec<Language> = totals
            .iter()
            .filter(|(_, total)| **total == best_total)
            .map(|(lang, _)| *lang)
            .collect();

        let winner = if tied.len() == 1 {
            tied[0]
        } else {
            // tie-break: extension vote wins, then fence, then enum order
            Self::tie_break(&tied, &votes)
        };

        let confidence = Self::confidence_for(winner, &votes);
        Detection {
            language: winner,
            confidence,
            votes,
        }
    }

    fn tie_break(tied: &[Language], votes: &[LanguageVote]) -> Language {
        for source in [VoteSource::Extension, VoteSource::Fence, VoteSource::Shebang] {
            if let Some(vote) = votes
                .iter()
                .find(|v| v.source == source && tied.contains(&v.language))
            {
                return vote.language;
            }
        }
        tied[0]
    }

    fn confidence_for(winner: Language, votes: &[LanguageVote]) -> DetectionConfidence {
        let from = |source: VoteSource| {
            votes
                .iter()
                .find(|v| v.source == source && v.language == winner)
        };
        if from(VoteSource::Extension).is_some() || from(VoteSource::Fence).is_some() {
            DetectionConfidence::High
        } else if from(VoteSource::Shebang).is_some() {
            DetectionConfidence::Medium
        } else if let Some(vote) = from(VoteSource::Heuristic) {
            if vote.weight >= 2 {
                DetectionConfidence::Medium
            } else {
                DetectionConfidence::Low
            }
        } else {
            DetectionConfidence::Unknown
        }
    }
}

/// Number of distinct content markers present for a language
fn marker_hits(content: &str, language: Language) -> usize {
    language
        .content_markers()
        .iter()
        .filter(|marker| content.contains(**marker))
        .count()
}

/// Interpreter named on a `#!` first line, if any
fn shebang_language(content: &str) -> Option<Language> {
    let first = content.lines().next()?;
    let rest = first.strip_prefix("#!")?;
    let mut parts = rest.trim().split_whitespace();
    let mut interpreter = parts.next()?.rsplit('/').next()?;
    if interpreter == "env" {
        interpreter = parts.next()?;
    }
    // "python3.11" and friends reduce to the bare interpreter name
    let interpreter =
        interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    match interpreter {
        "python" => Some(Language::Python),
        "node" | "nodejs" => Some(Language::JavaScript),
        "bash" | "sh" | "zsh" | "dash" | "ksh" => Some(Language::Bash),
        "ruby" => Some(Language::Ruby),
        "php" => Some(Language::Php),
        _ => None,
    }
}
