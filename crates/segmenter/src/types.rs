use serde::{Deserialize, Serialize};

/// What kind of content a fragment appears to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Code,
    Config,
    StructuredData,
    Prose,
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Code => "code",
            BlockType::Config => "config",
            BlockType::StructuredData => "structured-data",
            BlockType::Prose => "prose",
        }
    }
}

/// Which pass produced a candidate
///
/// Priority resolves overlaps: an explicit section marker beats a fence,
/// a fence beats an indentation run, and so on down to prose coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentPass {
    Section,
    Fence,
    Indentation,
    Keyword,
    Density,
    WholeFile,
    Prose,
}

impl SegmentPass {
    pub fn priority(self) -> u8 {
        match self {
            SegmentPass::Section => 6,
            SegmentPass::Fence => 5,
            SegmentPass::Indentation => 4,
            SegmentPass::Keyword => 3,
            SegmentPass::Density => 2,
            SegmentPass::WholeFile => 1,
            SegmentPass::Prose => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SegmentPass::Section => "section",
            SegmentPass::Fence => "fence",
            SegmentPass::Indentation => "indentation",
            SegmentPass::Keyword => "keyword",
            SegmentPass::Density => "density",
            SegmentPass::WholeFile => "whole-file",
            SegmentPass::Prose => "prose",
        }
    }
}

/// A candidate fragment cut out of a document
///
/// Line numbers are 1-based and inclusive; `text` is the exact byte slice of
/// those lines joined with `\n`, so a fragment can always be located back in
/// its document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFragment {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub hint: BlockType,
    pub pass: SegmentPass,
    pub fence_tag: Option<String>,
}

impl CandidateFragment {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    pub fn is_prose(&self) -> bool {
        self.hint == BlockType::Prose
    }
}
