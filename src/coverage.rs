//! Coverage-driven eligibility rules for each reporting level.
//!
//! Two ratios decide how fine a region can be reported at: the fraction of
//! source records that carried a usable location (`geocoded_ratio`) and the
//! fraction of the reporting window matched to weather signal
//! (`weather_coverage`). A missing ratio never blocks a level.

use serde::{Deserialize, Serialize};

use crate::models::FallbackReason;

/// Coverage ratios supplied once per resolver (tenant / reporting window).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    #[serde(default)]
    pub geocoded_ratio: Option<f64>,
    #[serde(default)]
    pub weather_coverage: Option<f64>,
}

impl CoverageMetrics {
    /// Non-finite ratios (NaN, infinities) are treated as missing.
    pub fn new(geocoded_ratio: Option<f64>, weather_coverage: Option<f64>) -> Self {
        Self {
            geocoded_ratio: geocoded_ratio.filter(|r| r.is_finite()),
            weather_coverage: weather_coverage.filter(|r| r.is_finite()),
        }
    }

    /// Both ratios, or `None` when either is missing
    fn both(&self) -> Option<(f64, f64)> {
        Some((self.geocoded_ratio?, self.weather_coverage?))
    }
}

/// Minimum ratios per level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageThresholds {
    pub media_market_geocoded: f64,
    pub media_market_weather: f64,
    pub state_geocoded: f64,
    pub state_weather: f64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            media_market_geocoded: 0.55,
            media_market_weather: 0.85,
            state_geocoded: 0.25,
            state_weather: 0.70,
        }
    }
}

/// Pure eligibility check; holds nothing but thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoverageGate {
    thresholds: CoverageThresholds,
}

impl CoverageGate {
    pub fn new(thresholds: CoverageThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &CoverageThresholds {
        &self.thresholds
    }

    /// Media market level: geocoding is checked before weather coverage.
    pub fn evaluate_media_market(&self, metrics: &CoverageMetrics) -> Result<(), FallbackReason> {
        let Some((geocoded, weather)) = metrics.both() else {
            return Ok(());
        };

        if geocoded < self.thresholds.media_market_geocoded {
            return Err(FallbackReason::MediaMarketGeocodedRatioBelowThreshold);
        }
        if weather < self.thresholds.media_market_weather {
            return Err(FallbackReason::MediaMarketWeatherCoverageBelowThreshold);
        }
        Ok(())
    }

    /// State level.
    ///
    /// A location that already failed the media market geocoding bar but
    /// clears the state weather bar is not held to the state geocoding bar.
    /// Weak weather coverage at this level is reported through
    /// [`CoverageGate::state_advisory`] only and never blocks.
    pub fn evaluate_state(
        &self,
        metrics: &CoverageMetrics,
        media_market_reason: Option<FallbackReason>,
    ) -> Result<(), FallbackReason> {
        let Some((geocoded, weather)) = metrics.both() else {
            return Ok(());
        };

        let override_allowed = media_market_reason
            == Some(FallbackReason::MediaMarketGeocodedRatioBelowThreshold)
            && weather >= self.thresholds.state_weather;

        if geocoded < self.thresholds.state_geocoded && !override_allowed {
            return Err(FallbackReason::StateGeocodedRatioBelowThreshold);
        }
        Ok(())
    }

    /// Non-blocking state level note for diagnostics.
    pub fn state_advisory(&self, metrics: &CoverageMetrics) -> Option<FallbackReason> {
        let (_, weather) = metrics.both()?;
        (weather < self.thresholds.state_weather)
            .then_some(FallbackReason::StateWeatherCoverageBelowThreshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(geocoded: f64, weather: f64) -> CoverageMetrics {
        CoverageMetrics::new(Some(geocoded), Some(weather))
    }

    #[test]
    fn test_missing_ratios_never_block() {
        let gate = CoverageGate::default();
        for m in [
            CoverageMetrics::default(),
            CoverageMetrics::new(Some(0.0), None),
            CoverageMetrics::new(None, Some(0.0)),
        ] {
            assert_eq!(gate.evaluate_media_market(&m), Ok(()));
            assert_eq!(
                gate.evaluate_state(&m, Some(FallbackReason::MediaMarketGeocodedRatioBelowThreshold)),
                Ok(())
            );
            assert_eq!(gate.state_advisory(&m), None);
        }
    }

    #[test]
    fn test_non_finite_ratios_are_missing() {
        let m = CoverageMetrics::new(Some(f64::NAN), Some(f64::NEG_INFINITY));
        assert_eq!(m, CoverageMetrics::default());
        assert_eq!(
            CoverageMetrics::new(Some(0.4), Some(f64::NAN)),
            CoverageMetrics::new(Some(0.4), None)
        );
    }

    #[test]
    fn test_media_market_thresholds() {
        let gate = CoverageGate::default();
        assert_eq!(gate.evaluate_media_market(&metrics(0.6, 0.9)), Ok(()));
        assert_eq!(gate.evaluate_media_market(&metrics(0.55, 0.85)), Ok(()));
        assert_eq!(
            gate.evaluate_media_market(&metrics(0.54, 0.9)),
            Err(FallbackReason::MediaMarketGeocodedRatioBelowThreshold)
        );
        assert_eq!(
            gate.evaluate_media_market(&metrics(0.6, 0.7)),
            Err(FallbackReason::MediaMarketWeatherCoverageBelowThreshold)
        );
    }

    #[test]
    fn test_media_market_geocoding_checked_first() {
        let gate = CoverageGate::default();
        assert_eq!(
            gate.evaluate_media_market(&metrics(0.1, 0.1)),
            Err(FallbackReason::MediaMarketGeocodedRatioBelowThreshold)
        );
    }

    #[test]
    fn test_state_geocoded_bar() {
        let gate = CoverageGate::default();
        assert_eq!(gate.evaluate_state(&metrics(0.3, 0.9), None), Ok(()));
        assert_eq!(
            gate.evaluate_state(&metrics(0.2, 0.9), None),
            Err(FallbackReason::StateGeocodedRatioBelowThreshold)
        );
    }

    #[test]
    fn test_state_override_after_media_market_geocoding_failure() {
        let gate = CoverageGate::default();
        let reason = Some(FallbackReason::MediaMarketGeocodedRatioBelowThreshold);

        assert_eq!(gate.evaluate_state(&metrics(0.2, 0.9), reason), Ok(()));
        assert_eq!(gate.evaluate_state(&metrics(0.2, 0.70), reason), Ok(()));
        // Weather below the state bar disables the override
        assert_eq!(
            gate.evaluate_state(&metrics(0.2, 0.69), reason),
            Err(FallbackReason::StateGeocodedRatioBelowThreshold)
        );
    }

    #[test]
    fn test_override_requires_geocoding_reason() {
        let gate = CoverageGate::default();
        assert_eq!(
            gate.evaluate_state(
                &metrics(0.2, 0.9),
                Some(FallbackReason::MediaMarketWeatherCoverageBelowThreshold)
            ),
            Err(FallbackReason::StateGeocodedRatioBelowThreshold)
        );
    }

    #[test]
    fn test_state_weather_is_advisory_only() {
        let gate = CoverageGate::default();
        let m = metrics(0.6, 0.5);
        assert_eq!(gate.evaluate_state(&m, None), Ok(()));
        assert_eq!(
            gate.state_advisory(&m),
            Some(FallbackReason::StateWeatherCoverageBelowThreshold)
        );
        assert_eq!(gate.state_advisory(&metrics(0.6, 0.7)), None);
    }

    #[test]
    fn test_custom_thresholds() {
        let gate = CoverageGate::new(CoverageThresholds {
            media_market_geocoded: 0.9,
            ..CoverageThresholds::default()
        });
        assert_eq!(gate.thresholds().media_market_geocoded, 0.9);
        assert_eq!(gate.thresholds().state_geocoded, 0.25);
        assert_eq!(
            gate.evaluate_media_market(&metrics(0.6, 0.9)),
            Err(FallbackReason::MediaMarketGeocodedRatioBelowThreshold)
        );
    }
}
