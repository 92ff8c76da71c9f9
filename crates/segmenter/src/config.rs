use serde::{Deserialize, Serialize};

/// Configuration for segmentation behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Minimum line count for fence, indentation, and density candidates.
    /// Section and keyword candidates are valid from one line up.
    pub min_block_lines: usize,

    /// Technical density a window must reach to open a density candidate
    pub density_threshold: f32,

    /// Per-line density needed to keep extending a density candidate
    pub extend_threshold: f32,

    /// Window density above which a candidate is promoted outright,
    /// without needing the complexity gate
    pub promote_threshold: f32,

    /// Structural complexity (keyword/brace hits) that promotes a
    /// density candidate below the promote threshold
    pub min_complexity: usize,

    /// Sliding window size for density scoring, in lines
    pub density_window: usize,

    /// Overall density floor for the whole-file fallback
    pub whole_file_floor: f32,

    /// Blank lines tolerated inside a keyword block
    pub max_keyword_gap: usize,

    /// Leading spaces that count as an indented line
    pub indent_width: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_block_lines: 3,
            density_threshold: 0.15,
            extend_threshold: 0.12,
            promote_threshold: 0.30,
            min_complexity: 3,
            density_window: 5,
            whole_file_floor: 0.05,
            max_keyword_gap: 2,
            indent_width: 4,
        }
    }
}

impl SegmenterConfig {
    /// Preset that favors recall: smaller minimums, lower density gates.
    /// Useful for chat transcripts where fragments are short and messy.
    pub fn aggressive() -> Self {
        Self {
            min_block_lines: 2,
            density_threshold: 0.10,
            extend_threshold: 0.08,
            promote_threshold: 0.20,
            whole_file_floor: 0.03,
            ..Default::default()
        }
    }

    /// Preset that favors precision: larger minimums, higher density gates.
    /// Useful for prose-heavy documents where false positives are costly.
    pub fn conservative() -> Self {
        Self {
            min_block_lines: 4,
            density_threshold: 0.20,
            extend_threshold: 0.16,
            promote_threshold: 0.35,
            min_complexity: 4,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_block_lines == 0 {
            return Err("min_block_lines must be > 0".to_string());
        }

        if self.density_window < 2 {
            return Err("density_window must be >= 2".to_string());
        }

        for (name, value) in [
            ("density_threshold", self.density_threshold),
            ("extend_threshold", self.extend_threshold),
            ("promote_threshold", self.promote_threshold),
            ("whole_file_floor", self.whole_file_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} ({value}) must be within 0.0..=1.0"));
            }
        }

        if self.extend_threshold > self.density_threshold {
            return Err(format!(
                "extend_threshold ({}) cannot exceed density_threshold ({})",
                self.extend_threshold, self.density_threshold
            ));
        }

        if self.density_threshold > self.promote_threshold {
            return Err(format!(
                "density_threshold ({}) cannot exceed promote_threshold ({})",
                self.density_threshold, self.promote_threshold
            ));
        }

        Ok(())
    }
}
