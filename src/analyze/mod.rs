//! Post-pass analysis over the flat block sequence.

mod numerals;
mod running;

pub use numerals::{decode_roman, is_increasing};
pub use running::{
    similarity, CandidateLine, DetectorOptions, Numeral, PlacementFindings, Placement,
    RepeatPattern, RunningElementDetector, RunningElements,
};
