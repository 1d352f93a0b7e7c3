//! Soil condition scoring.
//!
//! Maps four raw readings to per-factor scores on a 0-100 scale, averages them
//! and buckets the average into a [`SoilCondition`]:
//!
//! | Factor | Reference maximum |
//! |--------|-------------------|
//! | moisture | 60 |
//! | nitrogen | 60 |
//! | phosphorus | 50 |
//! | potassium | 50 |
//!
//! Readings are not validated. Negative values produce negative scores; a
//! score that is not finite or does not fit in an `i64` is an error.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reading that maps to a moisture score of 100.
pub const MOISTURE_REFERENCE: f64 = 60.0;
/// Reading that maps to a nitrogen score of 100.
pub const NITROGEN_REFERENCE: f64 = 60.0;
/// Reading that maps to a phosphorus score of 100.
pub const PHOSPHORUS_REFERENCE: f64 = 50.0;
/// Reading that maps to a potassium score of 100.
pub const POTASSIUM_REFERENCE: f64 = 50.0;

/// Upper bound of every factor score.
pub const MAX_FACTOR_SCORE: f64 = 100.0;

/// Result type for soil scoring.
pub type SoilResult<T> = Result<T, SoilError>;

/// Errors raised while scoring a reading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SoilError {
    #[error("{factor} score is not a finite number")]
    NonFiniteScore { factor: &'static str },

    #[error("{factor} score is out of range")]
    ScoreOutOfRange { factor: &'static str },
}

/// Four soil readings on a caller-defined scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SoilReading {
    pub moisture: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl SoilReading {
    pub fn new(moisture: f64, nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            moisture,
            nitrogen,
            phosphorus,
            potassium,
        }
    }
}

/// Soil condition bucket derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SoilCondition {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl SoilCondition {
    /// Bucket an overall score. Thresholds are checked top-down, first match wins.
    pub fn from_overall_score(overall_score: i64) -> Self {
        if overall_score >= 80 {
            SoilCondition::Excellent
        } else if overall_score >= 60 {
            SoilCondition::Good
        } else if overall_score >= 40 {
            SoilCondition::Moderate
        } else {
            SoilCondition::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilCondition::Excellent => "Excellent",
            SoilCondition::Good => "Good",
            SoilCondition::Moderate => "Moderate",
            SoilCondition::Poor => "Poor",
        }
    }
}

impl fmt::Display for SoilCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-factor scores, each truncated to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SoilScoreDetails {
    pub moisture_score: i64,
    pub nitrogen_score: i64,
    pub phosphorus_score: i64,
    pub potassium_score: i64,
}

/// Scored soil reading as returned by `/predict_soil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SoilScoreResult {
    pub soil_condition: SoilCondition,
    pub overall_score: i64,
    pub details: SoilScoreDetails,
}

/// Score a soil reading.
///
/// The overall score averages the unrounded factor scores before truncating,
/// so it can differ from the average of the values reported in `details`.
pub fn score(reading: &SoilReading) -> SoilResult<SoilScoreResult> {
    let moisture = factor_score("moisture", reading.moisture, MOISTURE_REFERENCE)?;
    let nitrogen = factor_score("nitrogen", reading.nitrogen, NITROGEN_REFERENCE)?;
    let phosphorus = factor_score("phosphorus", reading.phosphorus, PHOSPHORUS_REFERENCE)?;
    let potassium = factor_score("potassium", reading.potassium, POTASSIUM_REFERENCE)?;

    let details = SoilScoreDetails {
        moisture_score: truncate("moisture", moisture)?,
        nitrogen_score: truncate("nitrogen", nitrogen)?,
        phosphorus_score: truncate("phosphorus", phosphorus)?,
        potassium_score: truncate("potassium", potassium)?,
    };
    let overall_score = truncate(
        "overall",
        (moisture + nitrogen + phosphorus + potassium) / 4.0,
    )?;

    Ok(SoilScoreResult {
        soil_condition: SoilCondition::from_overall_score(overall_score),
        overall_score,
        details,
    })
}

/// Truncate toward zero, rejecting values an `i64` cannot hold.
fn truncate(factor: &'static str, score: f64) -> SoilResult<i64> {
    let truncated = score.trunc();
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(SoilError::ScoreOutOfRange { factor });
    }
    Ok(truncated as i64)
}

/// Scale a reading against its reference maximum and cap it at 100.
///
/// NaN is kept (not capped) so it can be rejected instead of silently
/// becoming 100.
fn factor_score(factor: &'static str, reading: f64, reference: f64) -> SoilResult<f64> {
    let scaled = reading * 100.0 / reference;
    let capped = if scaled > MAX_FACTOR_SCORE {
        MAX_FACTOR_SCORE
    } else {
        scaled
    };

    if !capped.is_finite() {
        return Err(SoilError::NonFiniteScore { factor });
    }

    Ok(capped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(m: f64, n: f64, p: f64, k: f64) -> SoilScoreResult {
        score(&SoilReading::new(m, n, p, k)).unwrap()
    }

    #[test]
    fn test_reference_maxima_score_excellent() {
        let result = score_of(60.0, 60.0, 50.0, 50.0);
        assert_eq!(result.overall_score, 100);
        assert_eq!(result.soil_condition, SoilCondition::Excellent);
        assert_eq!(result.details.moisture_score, 100);
        assert_eq!(result.details.potassium_score, 100);
    }

    #[test]
    fn test_all_zero_scores_poor() {
        let result = score_of(0.0, 0.0, 0.0, 0.0);
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.soil_condition, SoilCondition::Poor);
    }

    #[test]
    fn test_half_reference_fixture() {
        let result = score_of(30.0, 30.0, 25.0, 25.0);
        assert_eq!(
            result,
            SoilScoreResult {
                soil_condition: SoilCondition::Moderate,
                overall_score: 50,
                details: SoilScoreDetails {
                    moisture_score: 50,
                    nitrogen_score: 50,
                    phosphorus_score: 50,
                    potassium_score: 50,
                },
            }
        );
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(SoilCondition::from_overall_score(100), SoilCondition::Excellent);
        assert_eq!(SoilCondition::from_overall_score(80), SoilCondition::Excellent);
        assert_eq!(SoilCondition::from_overall_score(79), SoilCondition::Good);
        assert_eq!(SoilCondition::from_overall_score(60), SoilCondition::Good);
        assert_eq!(SoilCondition::from_overall_score(59), SoilCondition::Moderate);
        assert_eq!(SoilCondition::from_overall_score(40), SoilCondition::Moderate);
        assert_eq!(SoilCondition::from_overall_score(39), SoilCondition::Poor);
        assert_eq!(SoilCondition::from_overall_score(-5), SoilCondition::Poor);
    }

    #[test]
    fn test_boundaries_through_readings() {
        // 48/60 -> 80 on every factor
        let result = score_of(48.0, 48.0, 40.0, 40.0);
        assert_eq!(result.overall_score, 80);
        assert_eq!(result.soil_condition, SoilCondition::Excellent);

        // 24/60 -> 40 on every factor
        let result = score_of(24.0, 24.0, 20.0, 20.0);
        assert_eq!(result.overall_score, 40);
        assert_eq!(result.soil_condition, SoilCondition::Moderate);
    }

    #[test]
    fn test_factor_scores_capped() {
        let result = score_of(1000.0, 0.0, 0.0, 0.0);
        assert_eq!(result.details.moisture_score, 100);
        assert_eq!(result.overall_score, 25);

        let result = score_of(f64::INFINITY, 60.0, 50.0, 50.0);
        assert_eq!(result.details.moisture_score, 100);
        assert_eq!(result.overall_score, 100);
    }

    #[test]
    fn test_overall_uses_unrounded_factors() {
        // moisture 59 -> 98.33, nitrogen 59 -> 98.33, others 100
        // average 99.16 -> 99 even though details truncate to 98
        let result = score_of(59.0, 59.0, 50.0, 50.0);
        assert_eq!(result.details.moisture_score, 98);
        assert_eq!(result.overall_score, 99);
    }

    #[test]
    fn test_truncation_not_rounding() {
        // 1/60*100 = 1.67 per factor for moisture and nitrogen
        let result = score_of(1.0, 1.0, 0.0, 0.0);
        assert_eq!(result.details.moisture_score, 1);
        assert_eq!(result.overall_score, 0);
    }

    #[test]
    fn test_negative_readings_propagate() {
        let result = score_of(-30.0, 0.0, 0.0, 0.0);
        assert_eq!(result.details.moisture_score, -50);
        assert_eq!(result.overall_score, -12);
        assert_eq!(result.soil_condition, SoilCondition::Poor);
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = score(&SoilReading::new(f64::NAN, 1.0, 1.0, 1.0)).unwrap_err();
        assert_eq!(err, SoilError::NonFiniteScore { factor: "moisture" });

        let err = score(&SoilReading::new(1.0, 1.0, 1.0, f64::NEG_INFINITY)).unwrap_err();
        assert_eq!(err, SoilError::NonFiniteScore { factor: "potassium" });
        assert_eq!(err.to_string(), "potassium score is not a finite number");
    }

    #[test]
    fn test_huge_negative_reading_rejected() {
        let err = score(&SoilReading::new(-1e19, 0.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, SoilError::ScoreOutOfRange { factor: "moisture" });
        assert_eq!(err.to_string(), "moisture score is out of range");

        let err = score(&SoilReading::new(0.0, 0.0, 0.0, -1e300)).unwrap_err();
        assert_eq!(err, SoilError::ScoreOutOfRange { factor: "potassium" });
    }

    #[test]
    fn test_large_negative_reading_within_range() {
        // -3e18 * 100 / 50 = -6e18, still representable
        let result = score_of(0.0, 0.0, -3e18, 0.0);
        assert_eq!(result.details.phosphorus_score, -6_000_000_000_000_000_000);
        assert_eq!(result.overall_score, -1_500_000_000_000_000_000);
        assert_eq!(result.soil_condition, SoilCondition::Poor);
    }

    #[test]
    fn test_truncate_bounds() {
        assert_eq!(truncate("overall", -2.9), Ok(-2));
        assert_eq!(truncate("overall", i64::MIN as f64), Ok(i64::MIN));
        assert_eq!(
            truncate("overall", 2f64.powi(63)),
            Err(SoilError::ScoreOutOfRange { factor: "overall" })
        );
    }

    #[test]
    fn test_monotonic_in_each_factor() {
        let steps: Vec<f64> = (0..=80).map(|i| i as f64).collect();
        for factor in 0..4 {
            let mut previous = i64::MIN;
            for &value in &steps {
                let mut readings = [20.0, 20.0, 20.0, 20.0];
                readings[factor] = value;
                let result = score_of(readings[0], readings[1], readings[2], readings[3]);
                assert!(
                    result.overall_score >= previous,
                    "factor {} decreased at {}",
                    factor,
                    value
                );
                previous = result.overall_score;
            }
        }
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(score_of(30.0, 30.0, 25.0, 25.0)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "soil_condition": "Moderate",
                "overall_score": 50,
                "details": {
                    "moisture_score": 50,
                    "nitrogen_score": 50,
                    "phosphorus_score": 50,
                    "potassium_score": 50
                }
            })
        );
    }
}
