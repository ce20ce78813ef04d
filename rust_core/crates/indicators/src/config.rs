//! Analysis configuration.

use crate::error::IndicatorError;
use crate::traits::{IndicatorKind, IndicatorSpec};
use serde::Serialize;
use sextant_types::Timeframe;
use std::collections::HashSet;

/// Indicators a strategy runs and the candle size that drives them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    /// Candle size of the feed
    pub timeframe: Timeframe,
    /// Indicator instances, in evaluation order
    pub indicators: Vec<IndicatorSpec>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct AnalysisConfigRaw {
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub indicators: Vec<IndicatorSpec>,
}

impl From<AnalysisConfigRaw> for AnalysisConfig {
    fn from(raw: AnalysisConfigRaw) -> Self {
        let candle_size_min = raw.timeframe.to_minutes();
        let indicators = raw
            .indicators
            .into_iter()
            .map(|mut spec| {
                if spec.kind == IndicatorKind::OrderbookHeatmap {
                    if spec.params.is_null() {
                        spec.params = serde_json::Value::Object(serde_json::Map::new());
                    }
                    if let Some(params) = spec.params.as_object_mut() {
                        params
                            .entry("candle_size_min")
                            .or_insert_with(|| candle_size_min.into());
                    }
                }
                spec
            })
            .collect();

        Self {
            timeframe: raw.timeframe,
            indicators,
        }
    }
}

impl<'de> serde::Deserialize<'de> for AnalysisConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = AnalysisConfigRaw::deserialize(deserializer)?;
        Ok(raw.into())
    }
}

impl AnalysisConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// Returns [`IndicatorError::Serialization`] for malformed JSON or unknown
    /// kinds, and [`IndicatorError::InvalidParams`] for duplicate names.
    pub fn from_json(json: &str) -> Result<Self, IndicatorError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty or duplicate indicator names.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] on violation.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let mut seen = HashSet::new();
        for spec in &self.indicators {
            if spec.name.trim().is_empty() {
                return Err(IndicatorError::invalid_params(format!(
                    "{} indicator without a name",
                    spec.kind
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(IndicatorError::invalid_params(format!(
                    "duplicate indicator name: {}",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config.timeframe, Timeframe::H1);
        assert!(config.indicators.is_empty());
    }

    #[test]
    fn test_heatmap_candle_size_from_timeframe() {
        let config = AnalysisConfig::from_json(
            r#"{
                "timeframe": "M15",
                "indicators": [
                    { "name": "depth", "kind": "orderbook_heatmap" },
                    { "name": "depth_h4", "kind": "ORDERBOOK_HEATMAP", "params": { "candle_size_min": 240 } },
                    { "name": "rsi", "kind": "rsi", "params": { "interval": 7 } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.indicators[0].params["candle_size_min"], 15);
        assert_eq!(config.indicators[1].params["candle_size_min"], 240);
        assert!(config.indicators[2].params.get("candle_size_min").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = AnalysisConfig::from_json(
            r#"{ "indicators": [
                { "name": "a", "kind": "sma" },
                { "name": "a", "kind": "ema" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParams(ref msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = AnalysisConfig::from_json(
            r#"{ "indicators": [ { "name": "p", "kind": "pivot_points" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IndicatorError::Serialization(_)));
        assert!(err.to_string().contains("pivot_points"));
    }
}
