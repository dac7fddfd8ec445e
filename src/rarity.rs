//! Uniqueness factors, the rarity score and its tier.
//!
//! The score is the equal-weighted mean of four factors. Tier thresholds
//! are inclusive on the lower bound and are part of the public contract:
//! downstream consumers route artworks on them.

use crate::analysis::PatternMetadata;
use crate::params::GenerationParameters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight of each factor in the rarity mean.
pub const FACTOR_WEIGHT: f64 = 0.25;

/// Scores strictly above this are "unique"; the rest are editions.
pub const UNIQUE_THRESHOLD: f64 = 0.8;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum RarityTier {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl RarityTier {
    pub const ALL: [RarityTier; 4] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::Legendary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RarityTier::Common => "common",
            RarityTier::Uncommon => "uncommon",
            RarityTier::Rare => "rare",
            RarityTier::Legendary => "legendary",
        }
    }

    /// Lowest score that earns this tier.
    pub fn floor(self) -> f64 {
        match self {
            RarityTier::Common => 0.0,
            RarityTier::Uncommon => 0.3,
            RarityTier::Rare => 0.6,
            RarityTier::Legendary => 0.8,
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rarity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RarityScore(f64);

impl RarityScore {
    /// Clamps into `[0, 1]`; NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn tier(self) -> RarityTier {
        match self.0 {
            s if s < 0.3 => RarityTier::Common,
            s if s < 0.6 => RarityTier::Uncommon,
            s if s < 0.8 => RarityTier::Rare,
            _ => RarityTier::Legendary,
        }
    }

    pub fn is_unique(self) -> bool {
        self.0 > UNIQUE_THRESHOLD
    }
}

impl fmt::Display for RarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UniquenessFactors {
    pub color_uniqueness: f64,
    pub composition_uniqueness: f64,
    pub pattern_uniqueness: f64,
    pub emotional_uniqueness: f64,
}

impl UniquenessFactors {
    pub fn score(&self) -> RarityScore {
        RarityScore::new(
            FACTOR_WEIGHT
                * (self.color_uniqueness
                    + self.composition_uniqueness
                    + self.pattern_uniqueness
                    + self.emotional_uniqueness),
        )
    }
}

/// Population variance; 0 for an empty set.
pub fn variance(values: impl IntoIterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RarityScorer;

impl RarityScorer {
    pub fn factors(
        &self,
        pattern: &PatternMetadata,
        params: &GenerationParameters,
    ) -> UniquenessFactors {
        let balance = pattern.composition_balance.overall;
        let density = params.technical_density;

        UniquenessFactors {
            color_uniqueness: unit(pattern.distinct_colors as f64 / 10.0),
            composition_uniqueness: unit(
                ((balance - 0.5).abs() * 2.0 + (density - 0.3).abs() * 1.5) / 2.0,
            ),
            pattern_uniqueness: unit(
                ((pattern.pattern_complexity / 2.0).min(1.0)
                    + (pattern.organic_ratio - 0.5).abs() * 2.0)
                    / 2.0,
            ),
            emotional_uniqueness: unit(
                variance(params.emotional_mix.values().copied()) * 2.0,
            ),
        }
    }

    pub fn score(
        &self,
        pattern: &PatternMetadata,
        params: &GenerationParameters,
    ) -> (UniquenessFactors, RarityScore) {
        let factors = self.factors(pattern, params);
        let score = factors.score();
        tracing::debug!(%score, tier = %score.tier(), "rarity scored");
        (factors, score)
    }
}
