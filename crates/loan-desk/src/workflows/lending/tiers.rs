use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::guard::ValidationError;

pub const MIN_CREDIT_SCORE: i64 = 300;
pub const MAX_CREDIT_SCORE: i64 = 900;

/// Risk band derived from a credit score. The bands partition 300..=900.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditTier {
    Low,
    Moderate,
    High,
}

impl CreditTier {
    pub const ALL: [CreditTier; 3] = [CreditTier::Low, CreditTier::Moderate, CreditTier::High];

    pub fn resolve(score: i64) -> Result<Self, ValidationError> {
        match score {
            300..=649 => Ok(CreditTier::Low),
            650..=749 => Ok(CreditTier::Moderate),
            750..=900 => Ok(CreditTier::High),
            _ => Err(ValidationError::CreditScoreOutOfRange { received: score }),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CreditTier::Low => "low",
            CreditTier::Moderate => "moderate",
            CreditTier::High => "high",
        }
    }

    pub const fn score_range(self) -> RangeInclusive<u16> {
        match self {
            CreditTier::Low => 300..=649,
            CreditTier::Moderate => 650..=749,
            CreditTier::High => 750..=900,
        }
    }

    /// Minimum annual rate, as a decimal, the lender accepts for this band.
    pub const fn benchmark_rate(self) -> f64 {
        match self {
            CreditTier::Low => 0.06,
            CreditTier::Moderate => 0.13,
            CreditTier::High => 0.20,
        }
    }

    pub fn benchmark_rate_percent(self) -> f64 {
        self.benchmark_rate() * 100.0
    }

    pub const fn benchmark_rate_label(self) -> &'static str {
        match self {
            CreditTier::Low => "6%",
            CreditTier::Moderate => "13%",
            CreditTier::High => "20%",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            CreditTier::Low => "Low credit category - Higher risk profile",
            CreditTier::Moderate => "Moderate credit category - Medium risk profile",
            CreditTier::High => "High credit category - Lower risk profile",
        }
    }

    pub fn profile(self) -> TierProfile {
        let range = self.score_range();
        TierProfile {
            category: self,
            range: format!("{}-{}", range.start(), range.end()),
            benchmark_rate: self.benchmark_rate(),
            benchmark_rate_label: self.benchmark_rate_label(),
            description: self.description(),
        }
    }
}

/// Serializable tier record for documentation and responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProfile {
    pub category: CreditTier,
    pub range: String,
    pub benchmark_rate: f64,
    pub benchmark_rate_label: &'static str,
    pub description: &'static str,
}
