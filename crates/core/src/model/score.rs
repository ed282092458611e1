use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::model::section::SectionKind;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("band score {0} is outside 5.0..=9.0 or not a half step")]
    OutOfRange(f64),
}

//
// ─── BAND SCORE ────────────────────────────────────────────────────────────────
//

/// A placeholder band in `{5.0, 5.5, ..., 9.0}`, stored as half points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BandScore(u8);

impl BandScore {
    pub const MIN: BandScore = BandScore(10);
    pub const MAX: BandScore = BandScore(18);

    /// Build from a float that is already a half step inside the range.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` for anything else.
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 {
            return Err(ScoreError::OutOfRange(value));
        }
        if !(f64::from(Self::MIN.0)..=f64::from(Self::MAX.0)).contains(&doubled) {
            return Err(ScoreError::OutOfRange(value));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let half_points = doubled as u8;
        Ok(Self(half_points))
    }

    /// Map a unit sample `r` in `[0, 1)` onto the band scale as
    /// `round((5 + r * 4) * 2) / 2`. Inputs outside the unit range are clamped.
    #[must_use]
    pub fn from_unit(r: f64) -> Self {
        let r = if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 };
        let doubled = ((5.0 + r * 4.0) * 2.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let half_points = doubled as u8;
        Self(half_points.clamp(Self::MIN.0, Self::MAX.0))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl fmt::Display for BandScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

//
// ─── SECTION SCORES ────────────────────────────────────────────────────────────
//

/// Scores recorded so far in a session, at most one per section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionScores {
    scores: BTreeMap<SectionKind, BandScore>,
}

impl SectionScores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `score` unless the section already has one.
    ///
    /// Returns the score that is in effect after the call.
    pub fn record(&mut self, section: SectionKind, score: BandScore) -> BandScore {
        *self.scores.entry(section).or_insert(score)
    }

    #[must_use]
    pub fn get(&self, section: SectionKind) -> Option<BandScore> {
        self.scores.get(&section).copied()
    }

    #[must_use]
    pub fn is_recorded(&self, section: SectionKind) -> bool {
        self.scores.contains_key(&section)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }

    /// Flatten into the four-key shape handed to hosts; missing sections are `0.0`.
    #[must_use]
    pub fn completed(&self) -> CompletedScores {
        let value = |kind| self.get(kind).map_or(0.0, BandScore::value);
        CompletedScores {
            listening: value(SectionKind::Listening),
            reading: value(SectionKind::Reading),
            writing: value(SectionKind::Writing),
            speaking: value(SectionKind::Speaking),
        }
    }
}

/// Final scores with every section present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletedScores {
    pub listening: f64,
    pub reading: f64,
    pub writing: f64,
    pub speaking: f64,
}

impl CompletedScores {
    #[must_use]
    pub fn get(&self, section: SectionKind) -> f64 {
        match section {
            SectionKind::Listening => self.listening,
            SectionKind::Reading => self.reading,
            SectionKind::Writing => self.writing,
            SectionKind::Speaking => self.speaking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_samples_map_to_half_steps() {
        assert_eq!(BandScore::from_unit(0.0).value(), 5.0);
        assert_eq!(BandScore::from_unit(0.999_999).value(), 9.0);
        assert_eq!(BandScore::from_unit(0.5).value(), 7.0);
        assert_eq!(BandScore::from_unit(0.06).value(), 5.0);
        assert_eq!(BandScore::from_unit(0.07).value(), 5.5);
    }

    #[test]
    fn every_unit_sample_lands_in_range() {
        for i in 0..=1000 {
            let score = BandScore::from_unit(f64::from(i) / 1000.0).value();
            assert!((5.0..=9.0).contains(&score));
            assert_eq!((score * 2.0).fract(), 0.0);
        }
    }

    #[test]
    fn new_rejects_off_scale_values() {
        assert!(BandScore::new(6.5).is_ok());
        assert!(BandScore::new(6.3).is_err());
        assert!(BandScore::new(4.5).is_err());
        assert!(BandScore::new(9.5).is_err());
        assert!(BandScore::new(f64::NAN).is_err());
    }

    #[test]
    fn record_keeps_first_value() {
        let mut scores = SectionScores::new();
        let first = BandScore::new(6.0).unwrap();
        let second = BandScore::new(8.5).unwrap();
        assert_eq!(scores.record(SectionKind::Reading, first), first);
        assert_eq!(scores.record(SectionKind::Reading, second), first);
        assert_eq!(scores.get(SectionKind::Reading), Some(first));
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn completed_fills_missing_with_zero() {
        let mut scores = SectionScores::new();
        scores.record(SectionKind::Writing, BandScore::new(7.5).unwrap());
        let done = scores.completed();
        assert_eq!(done.writing, 7.5);
        assert_eq!(done.listening, 0.0);
        assert_eq!(done.reading, 0.0);
        assert_eq!(done.speaking, 0.0);
        assert_eq!(done.get(SectionKind::Writing), 7.5);
    }
}
