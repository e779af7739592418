//! Risk banding derived from the dropout-class probability.

use serde::{Deserialize, Serialize};

/// Discrete risk band for counselor triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// `p <= 0.20`.
    Low,
    /// `0.20 < p <= 0.40`.
    Moderate,
    /// `0.40 < p <= 0.70`.
    High,
    /// `p > 0.70`.
    Critical,
}

impl RiskLevel {
    /// Band name as shown to counselors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a dropout probability in `[0, 1]` to a percentage and a band.
///
/// Pure and total: no model access, no state. The percentage is rounded to
/// two decimals; band boundaries are exclusive on the upper side, so exactly
/// 0.70 is High, 0.40 is Moderate and 0.20 is Low.
pub fn score(dropout_probability: f64) -> (f64, RiskLevel) {
    let percent = (dropout_probability * 100.0 * 100.0).round() / 100.0;
    let level = if dropout_probability > 0.70 {
        RiskLevel::Critical
    } else if dropout_probability > 0.40 {
        RiskLevel::High
    } else if dropout_probability > 0.20 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };
    (percent, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenarios() {
        assert_eq!(score(0.75), (75.0, RiskLevel::Critical));
        assert_eq!(score(0.50).1, RiskLevel::High);
        assert_eq!(score(0.30).1, RiskLevel::Moderate);
        assert_eq!(score(0.10).1, RiskLevel::Low);
    }

    #[test]
    fn band_boundaries_fall_downward() {
        assert_eq!(score(0.70).1, RiskLevel::High);
        assert_eq!(score(0.40).1, RiskLevel::Moderate);
        assert_eq!(score(0.20).1, RiskLevel::Low);
        assert_eq!(score(0.0).1, RiskLevel::Low);
        assert_eq!(score(1.0).1, RiskLevel::Critical);
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(score(0.12345).0, 12.35);
        assert_eq!(score(0.123449).0, 12.34);
        assert_eq!(score(1.0).0, 100.0);
    }
}
