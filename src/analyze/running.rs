//! Running header, footer and page-number detection.
//!
//! Works on the finished block sequence. For each placement (the first or
//! last text line of a page) the detector looks for a confirmed page-number
//! sequence and for text that repeats on consecutive or alternating pages.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

use super::numerals::{decode_roman, is_increasing};
use crate::model::ContentBlock;

/// Which line of a page is examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// First text line (headers)
    First,
    /// Last text line (footers)
    Last,
}

/// Repetition pattern found for a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPattern {
    /// No running element
    #[default]
    Absent,
    /// Repeats on every page
    Consecutive,
    /// Repeats on every other page
    Alternating,
}

/// Detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOptions {
    /// Average similarity (0-100) a placement must exceed to have a pattern
    pub present_threshold: f64,
    /// Per-line similarity (0-100) at or above which a line is suppressed
    pub match_threshold: u8,
}

impl DetectorOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pattern threshold.
    pub fn with_present_threshold(mut self, threshold: f64) -> Self {
        self.present_threshold = threshold;
        self
    }

    /// Set the per-line threshold.
    pub fn with_match_threshold(mut self, threshold: u8) -> Self {
        self.match_threshold = threshold.min(100);
        self
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            present_threshold: 50.0,
            match_threshold: 80,
        }
    }
}

/// Numeral recognized in a candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Numeral {
    /// Arabic digits
    Arabic(u64),
    /// Roman numeral
    Roman(u32),
}

/// What the detector knows about one page's line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLine {
    /// Line text
    pub text: String,
    /// Decoded numeral, if the line is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeral: Option<Numeral>,
    /// Best similarity to the line one page away
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_consecutive: Option<u8>,
    /// Best similarity to the line two pages away
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_alternating: Option<u8>,
}

/// Findings for one placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementFindings {
    /// Candidate line per page
    pub lines: BTreeMap<u32, CandidateLine>,
    /// Arabic page numbers form a strictly increasing sequence
    pub arabic_confirmed: bool,
    /// Roman page numbers form a strictly increasing sequence
    pub roman_confirmed: bool,
    /// Repetition pattern
    pub pattern: RepeatPattern,
    /// Average similarity of consecutive pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_consecutive: Option<f64>,
    /// Average similarity of alternating pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_alternating: Option<f64>,
}

impl PlacementFindings {
    /// Check whether anything running was found.
    pub fn has_running_elements(&self) -> bool {
        self.arabic_confirmed || self.roman_confirmed || self.pattern != RepeatPattern::Absent
    }

    fn is_suppressed(&self, page_no: u32, match_threshold: u8) -> bool {
        let Some(line) = self.lines.get(&page_no) else {
            return false;
        };
        match line.numeral {
            Some(Numeral::Arabic(_)) if self.arabic_confirmed => return true,
            Some(Numeral::Roman(_)) if self.roman_confirmed => return true,
            _ => {}
        }
        let ratio = match self.pattern {
            RepeatPattern::Absent => None,
            RepeatPattern::Consecutive => line.ratio_consecutive,
            RepeatPattern::Alternating => line.ratio_alternating,
        };
        ratio.is_some_and(|r| r >= match_threshold)
    }
}

/// Result of running the detector over a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningElements {
    /// First-line findings
    pub first: PlacementFindings,
    /// Last-line findings
    pub last: PlacementFindings,
    /// Per-line threshold used by [`RunningElements::is_suppressed`]
    pub match_threshold: u8,
}

impl RunningElements {
    /// Findings for a placement.
    pub fn findings(&self, placement: Placement) -> &PlacementFindings {
        match placement {
            Placement::First => &self.first,
            Placement::Last => &self.last,
        }
    }

    /// Whether the line at `placement` on `page_no` is a running element.
    pub fn is_suppressed(&self, page_no: u32, placement: Placement) -> bool {
        self.findings(placement)
            .is_suppressed(page_no, self.match_threshold)
    }

    /// Whether a text block should be hidden.
    pub fn is_block_suppressed(&self, block: &ContentBlock) -> bool {
        match block {
            ContentBlock::Text(text) => {
                (text.is_first_on_page && self.is_suppressed(text.page_no, Placement::First))
                    || (text.is_last_on_page && self.is_suppressed(text.page_no, Placement::Last))
            }
            _ => false,
        }
    }

    /// Set the suppression flag on matching text blocks. Returns how many
    /// blocks were flagged.
    pub fn annotate(&self, blocks: &mut [ContentBlock]) -> usize {
        let mut count = 0;
        for block in blocks.iter_mut() {
            if self.is_block_suppressed(block) {
                if let ContentBlock::Text(text) = block {
                    text.suppressed = true;
                    count += 1;
                }
            }
        }
        count
    }
}

/// Repeated-element detector.
pub struct RunningElementDetector {
    options: DetectorOptions,
    arabic: Regex,
    roman: Regex,
}

impl RunningElementDetector {
    /// Create a detector.
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            options,
            arabic: Regex::new(r"^[0-9]+$").unwrap(),
            roman: Regex::new(r"(?i)^[xicmlvd]+$").unwrap(),
        }
    }

    /// The detector options.
    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Analyze both placements.
    pub fn detect(&self, blocks: &[ContentBlock]) -> RunningElements {
        RunningElements {
            first: self.detect_placement(blocks, Placement::First),
            last: self.detect_placement(blocks, Placement::Last),
            match_threshold: self.options.match_threshold,
        }
    }

    /// Analyze one placement.
    pub fn detect_placement(&self, blocks: &[ContentBlock], placement: Placement) -> PlacementFindings {
        let mut findings = PlacementFindings::default();
        let mut arabic = Vec::new();
        let mut roman = Vec::new();

        for text in blocks.iter().filter_map(ContentBlock::as_text) {
            let designated = match placement {
                Placement::First => text.is_first_on_page,
                Placement::Last => text.is_last_on_page,
            };
            if !designated {
                continue;
            }

            let numeral = self.classify(&text.text);
            match numeral {
                Some(Numeral::Arabic(n)) => arabic.push(n),
                Some(Numeral::Roman(n)) => roman.push(n),
                None => {}
            }
            findings.lines.insert(
                text.page_no,
                CandidateLine {
                    text: text.text.clone(),
                    numeral,
                    ratio_consecutive: None,
                    ratio_alternating: None,
                },
            );
        }

        // Non-monotonic candidates are false positives and not examined further.
        findings.arabic_confirmed = !arabic.is_empty() && is_increasing(&arabic);
        findings.roman_confirmed = !roman.is_empty() && is_increasing(&roman);
        if findings.arabic_confirmed {
            log::debug!("{:?}: page numbers found: {:?}", placement, arabic);
        }
        if findings.roman_confirmed {
            log::debug!("{:?}: Roman page numbers found: {:?}", placement, roman);
        }

        if findings.lines.len() < 3 {
            return findings;
        }

        findings.average_consecutive = score_pairs(&mut findings.lines, 1);
        findings.average_alternating = score_pairs(&mut findings.lines, 2);
        log::debug!(
            "{:?}: consecutive avg {:?}, alternating avg {:?}",
            placement,
            findings.average_consecutive,
            findings.average_alternating
        );

        let threshold = self.options.present_threshold;
        findings.pattern = if findings.average_consecutive.is_some_and(|avg| avg > threshold) {
            RepeatPattern::Consecutive
        } else if findings.average_alternating.is_some_and(|avg| avg > threshold) {
            RepeatPattern::Alternating
        } else {
            RepeatPattern::Absent
        };
        if findings.pattern != RepeatPattern::Absent {
            log::debug!("{:?} repeated, {:?}", placement, findings.pattern);
        }

        findings
    }

    fn classify(&self, line: &str) -> Option<Numeral> {
        let line = line.trim();
        if self.roman.is_match(line) {
            match decode_roman(line) {
                Some(n) => Some(Numeral::Roman(n)),
                None => {
                    log::debug!("{:?} is not a Roman numeral", line);
                    None
                }
            }
        } else if self.arabic.is_match(line) {
            line.parse().ok().map(Numeral::Arabic)
        } else {
            None
        }
    }
}

impl Default for RunningElementDetector {
    fn default() -> Self {
        Self::new(DetectorOptions::default())
    }
}

/// Similarity of two lines on a 0-100 scale.
///
/// The scale is normalized Levenshtein distance, not an indel ratio: a line
/// that is a prefix of the other scores lower here ("Chapter" against
/// "Chapter One" is 64 rather than 78). Thresholds tuned on a ratio scale
/// need re-tuning before use as `match_threshold`.
pub fn similarity(a: &str, b: &str) -> u8 {
    (normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Score every pair of pages `distance` apart. Each page keeps its best
/// ratio; returns the average over all pairs, or `None` without pairs.
fn score_pairs(lines: &mut BTreeMap<u32, CandidateLine>, distance: u32) -> Option<f64> {
    let pairs: Vec<(u32, u32, u8)> = lines
        .iter()
        .filter_map(|(&page, line)| {
            let other = lines.get(&(page + distance))?;
            Some((page, page + distance, similarity(&line.text, &other.text)))
        })
        .collect();
    if pairs.is_empty() {
        return None;
    }

    let mut total = 0u64;
    for &(a, b, ratio) in &pairs {
        total += u64::from(ratio);
        for page in [a, b] {
            if let Some(line) = lines.get_mut(&page) {
                let slot = if distance == 1 {
                    &mut line.ratio_consecutive
                } else {
                    &mut line.ratio_alternating
                };
                *slot = Some(slot.map_or(ratio, |r| r.max(ratio)));
            }
        }
    }
    Some(total as f64 / pairs.len() as f64)
}
