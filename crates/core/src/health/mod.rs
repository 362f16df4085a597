//! Rolling success-rate statistics and health classification.

mod evaluator;

pub use evaluator::{HealthEvaluator, HealthReport, MonitorSummary};

use serde::{Deserialize, Serialize};

/// Rates at or above this are healthy.
pub const HEALTHY_THRESHOLD: f64 = 80.0;
/// Rates at or above this (and below healthy) are degraded.
pub const DEGRADED_THRESHOLD: f64 = 50.0;
/// Default trailing window.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Percentage of successes, 0 when there is nothing to measure.
///
/// Multiplies before dividing so exact boundaries such as 12/15 land on 80.0.
pub fn success_rate(successful: f64, failed: f64) -> f64 {
    let total = successful + failed;
    if total <= 0.0 {
        return 0.0;
    }
    successful * 100.0 / total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthClass {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthClass {
    /// Lower bounds are inclusive: exactly 80 is healthy, exactly 50 degraded.
    pub fn classify(rate: f64) -> Self {
        if rate >= HEALTHY_THRESHOLD {
            HealthClass::Healthy
        } else if rate >= DEGRADED_THRESHOLD {
            HealthClass::Degraded
        } else {
            HealthClass::Unhealthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthClass::Healthy => "healthy",
            HealthClass::Degraded => "degraded",
            HealthClass::Unhealthy => "unhealthy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(HealthClass::classify(80.0), HealthClass::Healthy);
        assert_eq!(HealthClass::classify(79.999), HealthClass::Degraded);
        assert_eq!(HealthClass::classify(50.0), HealthClass::Degraded);
        assert_eq!(HealthClass::classify(49.999), HealthClass::Unhealthy);
        assert_eq!(HealthClass::classify(100.0), HealthClass::Healthy);
        assert_eq!(HealthClass::classify(0.0), HealthClass::Unhealthy);
    }

    #[test]
    fn test_success_rate_exact_boundaries() {
        assert_eq!(success_rate(12.0, 3.0), 80.0);
        assert_eq!(success_rate(5.0, 5.0), 50.0);
        assert_eq!(HealthClass::classify(success_rate(12.0, 3.0)), HealthClass::Healthy);
    }

    #[test]
    fn test_success_rate_reference_values() {
        assert_eq!(success_rate(15.0, 0.0), 100.0);
        let rate = success_rate(7.0, 8.0);
        assert!((rate - 46.666).abs() < 0.01);
        assert_eq!(HealthClass::classify(rate), HealthClass::Unhealthy);
    }

    #[test]
    fn test_success_rate_empty_is_zero() {
        assert_eq!(success_rate(0.0, 0.0), 0.0);
        assert_eq!(HealthClass::classify(success_rate(0.0, 0.0)), HealthClass::Unhealthy);
    }
}
