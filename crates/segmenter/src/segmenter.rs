use crate::config::SegmenterConfig;
use crate::density::{block_complexity, technical_density};
use crate::error::{Result, SegmenterError};
use crate::types::{BlockType, CandidateFragment, SegmentPass};
use codesift_language::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[#/\*]+\s*-+\s*SECTION:\s*([A-Z_]+)\s*-+")
        .expect("section regex is valid")
});

static FENCE_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(\w+)?").expect("fence regex is valid"));

static KV_EQUALS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*[A-Za-z0-9_.\-]+\s*=\s*\S"#).expect("kv regex is valid")
});

static KV_COLON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*["']?[A-Za-z0-9_.\-]+["']?\s*:(\s|$)"#).expect("kv regex is valid")
});

static INI_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]+\]\s*$").expect("ini regex is valid"));

/// Words that open a top-level declaration block
const START_KEYWORDS: &[&str] = &[
    "import", "from", "package", "namespace",
    "def", "class", "func", "function",
    "pub", "fn", "struct", "enum", "impl",
    "interface", "type", "const", "var", "let",
    "public", "private", "protected", "void",
    "#include", "#define", "using", "typedef",
    "if", "else", "try", "catch", "finally",
    "require", "include", "trait", "abstract", "final",
    "module", "require_relative", "alias",
    "fun", "val", "data", "object",
    "export", "echo", "source",
    "@media", "@import",
    "SELECT", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER",
];

/// Multi-pass document segmenter
///
/// Each pass claims the lines it consumes; later passes skip claimed lines,
/// and unclaimed non-blank runs become prose coverage at the end. The output
/// is ordered by start line and never overlaps.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a normalized document into candidate fragments
    pub fn segment(&self, text: &str) -> Result<Vec<CandidateFragment>> {
        if text.trim().is_empty() {
            return Err(SegmenterError::EmptyDocument);
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let mut claimed = vec![false; lines.len()];
        let mut candidates: Vec<CandidateFragment> = Vec::new();

        self.section_pass(&lines, &mut claimed, &mut candidates);
        self.fence_pass(&lines, &mut claimed, &mut candidates);
        self.indentation_pass(&lines, &mut claimed, &mut candidates);
        self.keyword_pass(&lines, &mut claimed, &mut candidates);
        self.density_pass(&lines, &mut claimed, &mut candidates);

        if candidates.is_empty() {
            self.whole_file_fallback(text, &lines, &mut claimed, &mut candidates);
        }

        self.prose_fill(&lines, &claimed, &mut candidates);

        let mut fragments = resolve_overlaps(candidates);
        fragments.sort_by_key(|f| f.start_line);
        log::debug!(
            "segmented {} lines into {} fragments",
            lines.len(),
            fragments.len()
        );
        Ok(fragments)
    }

    /// Pass 1: explicit section markers
    ///
    /// A marker line opens a section that runs until the next marker or end
    /// of document. The marker's name is kept as the fragment tag.
    fn section_pass(
        &self,
        lines: &[&str],
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        let mut open: Option<(usize, Option<String>)> = None;

        for i in 0..lines.len() {
            if let Some(caps) = SECTION_RE.captures(lines[i].trim()) {
                if let Some((marker, tag)) = open.take() {
                    self.close_section(lines, marker, i - 1, tag, claimed, out);
                }
                claimed[i] = true;
                open = Some((i, caps.get(1).map(|m| m.as_str().to_lowercase())));
            }
        }

        if let Some((marker, tag)) = open {
            self.close_section(lines, marker, lines.len() - 1, tag, claimed, out);
        }
    }

    fn close_section(
        &self,
        lines: &[&str],
        marker: usize,
        end: usize,
        tag: Option<String>,
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        if end <= marker {
            return;
        }
        let start = marker + 1;
        if let Some(frag) = self.emit(lines, start, end, SegmentPass::Section, tag) {
            claim(claimed, start, end);
            out.push(frag);
        }
    }

    /// Pass 2: fenced blocks
    fn fence_pass(
        &self,
        lines: &[&str],
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        let mut open: Option<(usize, Option<String>)> = None;

        for i in 0..lines.len() {
            let trimmed = lines[i].trim();
            match open.take() {
                None => {
                    if let Some(caps) = FENCE_OPEN_RE.captures(trimmed) {
                        open = Some((i, caps.get(1).map(|m| m.as_str().to_string())));
                    }
                }
                Some((opener, tag)) => {
                    if trimmed.starts_with("```") {
                        let content_lines = i.saturating_sub(opener + 1);
                        let untouched = !(opener..=i).any(|k| claimed[k]);
                        if untouched && content_lines >= self.config.min_block_lines {
                            if let Some(frag) = self.emit(
                                lines,
                                opener + 1,
                                i - 1,
                                SegmentPass::Fence,
                                tag,
                            ) {
                                // markers are consumed too, so they never
                                // surface as prose
                                claim(claimed, opener, i);
                                out.push(frag);
                            }
                        }
                    } else {
                        open = Some((opener, tag));
                    }
                }
            }
        }
    }

    /// Pass 3: contiguous indented runs, density-gated
    fn indentation_pass(
        &self,
        lines: &[&str],
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        let mut run_start: Option<usize> = None;

        for i in 0..=lines.len() {
            let boundary =
                i == lines.len() || claimed[i] || !self.is_indented_content(lines[i]);
            if !boundary {
                run_start.get_or_insert(i);
                continue;
            }
            if let Some(start) = run_start.take() {
                let end = i - 1;
                if end - start + 1 >= self.config.min_block_lines {
                    let body = lines[start..=end].join("\n");
                    if technical_density(&body) > self.config.density_threshold {
                        if let Some(frag) =
                            self.emit(lines, start, end, SegmentPass::Indentation, None)
                        {
                            claim(claimed, start, end);
                            out.push(frag);
                        }
                    }
                }
            }
        }
    }

    fn is_indented_content(&self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        let spaces = line.chars().take_while(|c| *c == ' ').count();
        spaces >= self.config.indent_width || line.starts_with('\t')
    }

    /// Pass 4: top-level declaration-keyword blocks
    ///
    /// A keyword line opens a block that extends through indented
    /// continuation lines. Blank gaps are tolerated up to the configured
    /// limit, but a gap followed by a non-indented line ends the block, as
    /// does a line opening a new top-level declaration.
    fn keyword_pass(
        &self,
        lines: &[&str],
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        let mut i = 0;
        while i < lines.len() {
            if claimed[i] || !is_block_start(lines[i]) {
                i += 1;
                continue;
            }

            let start = i;
            let mut end = i;
            let mut gap = 0usize;
            let mut j = i + 1;
            while j < lines.len() {
                if claimed[j] {
                    break;
                }
                let next = lines[j];
                if next.trim().is_empty() {
                    gap += 1;
                    if gap > self.config.max_keyword_gap {
                        break;
                    }
                    j += 1;
                    continue;
                }
                let indented = next.starts_with(' ') || next.starts_with('\t');
                if !indented {
                    if gap > 0 {
                        break;
                    }
                    if is_block_start_keyword(next) {
                        break;
                    }
                }
                gap = 0;
                end = j;
                j += 1;
            }

            if let Some(frag) = self.emit(lines, start, end, SegmentPass::Keyword, None)
            {
                claim(claimed, start, end);
                out.push(frag);
            }
            i = j.max(i + 1);
        }
    }

    /// Pass 5: sliding-window technical density
    fn density_pass(
        &self,
        lines: &[&str],
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        let window = self.config.density_window;
        let mut i = 0;
        while i + window <= lines.len() {
            // A window never reaches into lines another pass already owns
            if (i..i + window).any(|k| claimed[k]) {
                i += 1;
                continue;
            }
            let window_text = lines[i..i + window].join("\n");
            let density = technical_density(&window_text);
            if density <= self.config.density_threshold {
                i += 1;
                continue;
            }

            let start = i;
            let mut end = i + window;
            while end < lines.len()
                && !claimed[end]
                && technical_density(lines[end]) > self.config.extend_threshold
            {
                end += 1;
            }

            if end - start >= self.config.min_block_lines {
                let body = lines[start..end].join("\n");
                if density > self.config.promote_threshold
                    || block_complexity(&body) >= self.config.min_complexity
                {
                    if let Some(frag) =
                        self.emit(lines, start, end - 1, SegmentPass::Density, None)
                    {
                        claim(claimed, start, end - 1);
                        out.push(frag);
                    }
                }
            }
            i = end;
        }
    }

    /// Pass 6: whole-file fallback when nothing else fired
    fn whole_file_fallback(
        &self,
        text: &str,
        lines: &[&str],
        claimed: &mut [bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        if lines.len() < self.config.min_block_lines {
            return;
        }
        if technical_density(text) <= self.config.whole_file_floor {
            return;
        }
        if let Some(frag) =
            self.emit(lines, 0, lines.len() - 1, SegmentPass::WholeFile, None)
        {
            claim(claimed, 0, lines.len() - 1);
            out.push(frag);
        }
    }

    /// Cover every unclaimed non-blank run as prose
    fn prose_fill(
        &self,
        lines: &[&str],
        claimed: &[bool],
        out: &mut Vec<CandidateFragment>,
    ) {
        let mut i = 0;
        while i < lines.len() {
            if claimed[i] || lines[i].trim().is_empty() {
                i += 1;
                continue;
            }
            let start = i;
            let mut end = i;
            while i < lines.len() && !claimed[i] {
                if !lines[i].trim().is_empty() {
                    end = i;
                }
                i += 1;
            }
            if let Some(frag) = self.emit(lines, start, end, SegmentPass::Prose, None) {
                out.push(frag);
            }
        }
    }

    /// Build a fragment over a 0-based inclusive line range
    ///
    /// The range is shrunk to its non-blank boundaries so fragment text is
    /// always an exact slice of the document with no blank padding. Returns
    /// `None` when the range holds nothing but whitespace.
    fn emit(
        &self,
        lines: &[&str],
        start: usize,
        end: usize,
        pass: SegmentPass,
        tag: Option<String>,
    ) -> Option<CandidateFragment> {
        let start = (start..=end).find(|&i| !lines[i].trim().is_empty())?;
        let end = (start..=end).rev().find(|&i| !lines[i].trim().is_empty())?;
        let text = lines[start..=end].join("\n");

        let hint = if pass == SegmentPass::Prose {
            BlockType::Prose
        } else {
            derive_hint(&text, tag.as_deref())
        };

        Some(CandidateFragment {
            start_line: start + 1,
            end_line: end + 1,
            text,
            hint,
            pass,
            fence_tag: tag,
        })
    }
}

fn claim(claimed: &mut [bool], start: usize, end: usize) {
    for slot in &mut claimed[start..=end] {
        *slot = true;
    }
}

fn first_word(line: &str) -> &str {
    line.trim().split_whitespace().next().unwrap_or("")
}

fn is_block_start_keyword(line: &str) -> bool {
    START_KEYWORDS.contains(&first_word(line))
}

fn is_block_start(line: &str) -> bool {
    let first = first_word(line);
    if first.is_empty() {
        return false;
    }
    START_KEYWORDS.contains(&first)
        || first.starts_with("#!")
        || first.starts_with("<?")
        || first.starts_with('{')
        || first.starts_with('[')
        || first.starts_with('<')
        || (first.ends_with(':') && first.len() > 2)
}

/// Classify a candidate's content shape
fn derive_hint(text: &str, tag: Option<&str>) -> BlockType {
    if let Some(tag) = tag {
        let lang = Language::from_label(tag);
        if lang.is_data_format() {
            return BlockType::StructuredData;
        }
        if lang.is_config_format() {
            return BlockType::Config;
        }
        if lang == Language::Markdown {
            return BlockType::Prose;
        }
        if lang != Language::Unknown {
            return BlockType::Code;
        }
        if matches!(tag.to_lowercase().as_str(), "text" | "plain" | "txt" | "output") {
            return BlockType::Prose;
        }
    }
    shape_hint(text)
}

fn shape_hint(text: &str) -> BlockType {
    let trimmed = text.trim();
    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        return BlockType::StructuredData;
    }

    let non_blank: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if non_blank.is_empty() {
        return BlockType::Code;
    }
    let total = non_blank.len() as f32;
    let eq_hits = non_blank.iter().filter(|l| KV_EQUALS_RE.is_match(l)).count() as f32;
    let colon_hits =
        non_blank.iter().filter(|l| KV_COLON_RE.is_match(l)).count() as f32;
    let sections = non_blank.iter().filter(|l| INI_SECTION_RE.is_match(l)).count();

    if sections > 0 && (eq_hits + sections as f32) / total >= 0.5 {
        return BlockType::Config;
    }
    if eq_hits / total > 0.6 {
        return BlockType::Config;
    }
    if colon_hits / total > 0.6 {
        return BlockType::StructuredData;
    }
    BlockType::Code
}

/// Final guard against overlapping candidates: higher-priority passes win,
/// longer fragments break ties
fn resolve_overlaps(candidates: Vec<CandidateFragment>) -> Vec<CandidateFragment> {
    let mut ordered = candidates;
    ordered.sort_by(|a, b| {
        b.pass
            .priority()
            .cmp(&a.pass.priority())
            .then(b.line_count().cmp(&a.line_count()))
            .then(a.start_line.cmp(&b.start_line))
    });

    let mut used: HashSet<usize> = HashSet::new();
    let mut kept = Vec::with_capacity(ordered.len());
    for frag in ordered {
        if (frag.start_line..=frag.end_line).any(|l| used.contains(&l)) {
            continue;
        }
        used.extend(frag.start_line..=frag.end_line);
        kept.push(frag);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segment(text: &str) -> Vec<CandidateFragment> {
        Segmenter::default().segment(text).expect("segmentation succeeds")
    }

    fn code_fragments(text: &str) -> Vec<CandidateFragment> {
        segment(text).into_iter().filter(|f| !f.is_prose()).collect()
    }

    #[test]
    fn test_empty_document_is_an_error() {
        let segmenter = Segmenter::default();
        assert!(matches!(
            segmenter.segment(""),
            Err(SegmenterError::EmptyDocument)
        ));
        assert!(matches!(
            segmenter.segment("  \n\t\n"),
            Err(SegmenterError::EmptyDocument)
        ));
    }

    #[test]
    fn test_fenced_block_with_tag() {
        let doc = "Some intro.\n\n```python\nimport os\n\nprint(os.name)\n```\n\nOutro.\n";
        let frags = code_fragments(doc);
        assert_eq!(frags.len(), 1);
        let frag = &frags[0];
        assert_eq!(frag.pass, SegmentPass::Fence);
        assert_eq!(frag.fence_tag.as_deref(), Some("python"));
        assert_eq!((frag.start_line, frag.end_line), (4, 6));
        assert_eq!(frag.text, "import os\n\nprint(os.name)");
    }

    #[test]
    fn test_short_fence_demotes_to_prose() {
        // two content lines, below the default minimum of three
        let doc = "Intro prose sentence.\n```\nhi there\nbye now\n```\nMore prose.\n";
        let frags = segment(doc);
        assert!(frags.iter().all(|f| f.pass != SegmentPass::Fence));
    }

    #[test]
    fn test_giant_fence_yields_exactly_one_candidate() {
        let mut doc = String::from("```rust\n");
        for i in 0..40 {
            doc.push_str(&format!("let x{i} = {i};\n"));
        }
        doc.push_str("```\n");
        let frags = segment(&doc);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].pass, SegmentPass::Fence);
        assert_eq!(frags[0].line_count(), 40);
    }

    #[test]
    fn test_section_markers() {
        let doc = "# ---- SECTION: CONFIG ----\nhost = \"db.local\"\nport = 5432\n\
                   # ---- SECTION: NOTES ----\nRemember to rotate the key.\n";
        let frags = segment(doc);
        let sections: Vec<_> =
            frags.iter().filter(|f| f.pass == SegmentPass::Section).collect();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].fence_tag.as_deref(), Some("config"));
        assert_eq!(sections[0].hint, BlockType::Config);
        assert_eq!(sections[0].text, "host = \"db.local\"\nport = 5432");
    }

    #[test]
    fn test_declaration_block_ends_at_blank_gap_before_prose() {
        let doc = "def f():\n    return 1\n\nThis is prose.\n";
        let frags = segment(doc);
        let code: Vec<_> = frags.iter().filter(|f| !f.is_prose()).collect();
        assert_eq!(code.len(), 1);
        assert_eq!((code[0].start_line, code[0].end_line), (1, 2));
        assert_eq!(code[0].text, "def f():\n    return 1");

        let prose: Vec<_> = frags.iter().filter(|f| f.is_prose()).collect();
        assert_eq!(prose.len(), 1);
        assert_eq!(prose[0].text, "This is prose.");
    }

    #[test]
    fn test_adjacent_declarations_split_into_blocks() {
        let doc = "def first():\n    return 1\ndef second():\n    return 2\n";
        let frags = code_fragments(doc);
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].text, "def first():\n    return 1");
        assert_eq!(frags[1].text, "def second():\n    return 2");
    }

    #[test]
    fn test_keyword_block_tolerates_internal_gaps() {
        let doc = "impl Widget {\n    fn a(&self) {}\n\n    fn b(&self) {}\n}\n";
        let frags = code_fragments(doc);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].line_count(), 5);
    }

    #[test]
    fn test_single_line_import_is_a_valid_block() {
        let doc = "import os\n\nJust prose follows here.\nNothing else.\n";
        let frags = code_fragments(doc);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "import os");
        assert_eq!(frags[0].pass, SegmentPass::Keyword);
    }

    #[test]
    fn test_indented_run_extraction() {
        let doc = "Shell transcript below.\n\
                   \n\
                   \tfor (i = 0; i < n; i++) {\n\
                   \t\ttotal += data[i];\n\
                   \t}\n\
                   \n\
                   Back to prose.\n";
        let frags = segment(doc);
        let indented: Vec<_> = frags
            .iter()
            .filter(|f| f.pass == SegmentPass::Indentation)
            .collect();
        assert_eq!(indented.len(), 1);
        assert_eq!((indented[0].start_line, indented[0].end_line), (3, 5));
    }

    #[test]
    fn test_whole_file_fallback_for_plain_source() {
        // no fences, no keywords from the start set, no 4-space indent
        let doc = "x = compute(1)\ny = compute(2)\nemit(x + y)\n";
        let frags = segment(doc);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].pass, SegmentPass::WholeFile);
        assert_eq!((frags[0].start_line, frags[0].end_line), (1, 3));
    }

    #[test]
    fn test_pure_prose_yields_only_prose_coverage() {
        let doc = "This paragraph explains the approach.\n\n\
                   It continues with more detail about the plan,\n\
                   and closes politely.\n";
        let frags = segment(doc);
        assert!(!frags.is_empty());
        assert!(frags.iter().all(|f| f.is_prose()));
    }

    #[test]
    fn test_inline_span_stays_inside_prose() {
        let doc = "To start, run `let x = 1` in the console.\n\n\
                   Then read the manual carefully.\n";
        let frags = segment(doc);
        assert!(frags.iter().all(|f| f.is_prose()));
    }

    #[test]
    fn test_coverage_and_ordering_invariants() {
        let doc = "Intro.\n\n```js\nconst a = 1;\nconst b = 2;\nconst c = 3;\n```\n\n\
                   def g():\n    return 2\n\nClosing remark.\n";
        let frags = segment(doc);

        // ordered, non-overlapping
        for pair in frags.windows(2) {
            assert!(pair[0].end_line < pair[1].start_line);
        }

        // every non-blank line is covered by some fragment
        for (idx, line) in doc.split('\n').enumerate() {
            if line.trim().is_empty() || line.trim().starts_with("```") {
                continue;
            }
            let line_no = idx + 1;
            assert!(
                frags
                    .iter()
                    .any(|f| f.start_line <= line_no && line_no <= f.end_line),
                "line {line_no} uncovered: {line:?}"
            );
        }
    }

    #[test]
    fn test_structured_data_hint_from_shape() {
        let doc = "{\n  \"name\": \"app\",\n  \"port\": 8080\n}\n";
        let frags = code_fragments(doc);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].hint, BlockType::StructuredData);
    }

    #[test]
    fn test_config_hint_from_shape() {
        let text = "[server]\nhost = localhost\nport = 9000\n";
        assert_eq!(shape_hint(text), BlockType::Config);
        assert_eq!(shape_hint("A plain sentence.\nAnother one.\n"), BlockType::Code);
    }

    #[test]
    fn test_fence_tag_drives_hint() {
        assert_eq!(derive_hint("a: 1\nb: 2", Some("yaml")), BlockType::StructuredData);
        assert_eq!(derive_hint("k = v", Some("ini")), BlockType::Config);
        assert_eq!(derive_hint("fn main() {}", Some("rust")), BlockType::Code);
        assert_eq!(derive_hint("anything", Some("text")), BlockType::Prose);
    }

    #[test]
    fn test_dense_lines_before_a_fence_stay_covered() {
        let doc = "a=[1];b=[2];c=[3];\nd=[4];e=[5];f=[6];\n\
                   ```python\nimport os\nimport sys\nimport re\n```\n";
        let frags = segment(doc);

        assert!(frags.iter().any(|f| f.pass == SegmentPass::Fence));
        // the two leading lines still belong to some fragment
        for line_no in [1, 2] {
            assert!(
                frags
                    .iter()
                    .any(|f| f.start_line <= line_no && line_no <= f.end_line),
                "line {line_no} uncovered"
            );
        }
        for pair in frags.windows(2) {
            assert!(pair[0].end_line < pair[1].start_line);
        }
    }

    #[test]
    fn test_density_pass_promotes_dense_runs() {
        // minified-ish assignments: no fences, no start keywords, no indent
        let doc = "q0={a:1,b:[2,3],c:{d:4}};\n\
                   q1={a:1,b:[2,3],c:{d:4}};\n\
                   q2={a:1,b:[2,3],c:{d:4}};\n\
                   q3={a:1,b:[2,3],c:{d:4}};\n\
                   q4={a:1,b:[2,3],c:{d:4}};\n";
        let frags = segment(doc);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].pass, SegmentPass::Density);
        assert_eq!((frags[0].start_line, frags[0].end_line), (1, 5));
    }
}
