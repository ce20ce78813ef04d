//! Indicator registry for config-driven indicator creation.

use crate::error::IndicatorError;
use crate::heatmap::{HeatmapParams, OrderbookHeatmap};
use crate::impl_::{
    PeriodParams, atr::Atr, bollinger::BollingerBands, bollinger::BollingerParams, macd::Macd,
    macd::MacdParams, moving_average::MovingAverage, parse_params, rsi::Rsi,
};
use crate::ta::{NativeTaLibrary, TaLibrary};
use crate::traits::{Indicator, IndicatorKind, IndicatorSpec};
use crate::volume_profile::{VolumeProfile, VolumeProfileParams};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory function type for creating indicators from parameters.
pub type IndicatorFactory = Box<
    dyn Fn(&str, &serde_json::Value, &Arc<dyn TaLibrary>) -> Result<Box<dyn Indicator>, IndicatorError>
        + Send
        + Sync,
>;

/// Registry mapping indicator kinds to factories.
///
/// Every factory receives the instance name, the raw JSON parameters and the
/// numeric library shared by all thin indicators.
pub struct IndicatorRegistry {
    factories: HashMap<IndicatorKind, IndicatorFactory>,
    library: Arc<dyn TaLibrary>,
}

impl IndicatorRegistry {
    /// Creates an empty registry over `library`.
    #[must_use]
    pub fn new(library: Arc<dyn TaLibrary>) -> Self {
        Self {
            factories: HashMap::new(),
            library,
        }
    }

    /// Registers or replaces the factory of a kind.
    pub fn register<F>(&mut self, kind: IndicatorKind, factory: F)
    where
        F: Fn(&str, &serde_json::Value, &Arc<dyn TaLibrary>) -> Result<Box<dyn Indicator>, IndicatorError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Creates an indicator from a specification.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::UnknownIndicator`] if the kind has no factory
    /// and [`IndicatorError::InvalidParams`] when parameters do not match.
    pub fn create(&self, spec: &IndicatorSpec) -> Result<Box<dyn Indicator>, IndicatorError> {
        let factory = self
            .factories
            .get(&spec.kind)
            .ok_or_else(|| IndicatorError::UnknownIndicator(spec.kind.to_string()))?;
        factory(&spec.name, &spec.params, &self.library)
    }

    /// Checks if a kind is registered.
    #[must_use]
    pub fn contains(&self, kind: IndicatorKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Returns the registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<IndicatorKind> {
        let mut kinds: Vec<IndicatorKind> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Numeric library handed to factories.
    #[must_use]
    pub fn library(&self) -> &Arc<dyn TaLibrary> {
        &self.library
    }

    /// Creates a registry over `library` with every built-in kind registered.
    #[must_use]
    pub fn with_library(library: Arc<dyn TaLibrary>) -> Self {
        let mut registry = Self::new(library);

        // Moving averages
        for kind in [IndicatorKind::Sma, IndicatorKind::Ema] {
            registry.register(kind, move |name, params, library| {
                let params: PeriodParams = parse_params(params)?;
                Ok(Box::new(MovingAverage::new(name, kind, params, Arc::clone(library))?))
            });
        }

        registry.register(IndicatorKind::Rsi, |name, params, library| {
            let params: PeriodParams = parse_params(params)?;
            Ok(Box::new(Rsi::new(name, params, Arc::clone(library))?))
        });

        registry.register(IndicatorKind::Macd, |name, params, library| {
            let params: MacdParams = parse_params(params)?;
            Ok(Box::new(Macd::new(name, params, Arc::clone(library))?))
        });

        registry.register(IndicatorKind::Atr, |name, params, library| {
            let params: PeriodParams = parse_params(params)?;
            Ok(Box::new(Atr::new(name, params, Arc::clone(library))?))
        });

        registry.register(IndicatorKind::Bollinger, |name, params, library| {
            let params: BollingerParams = parse_params(params)?;
            Ok(Box::new(BollingerBands::new(name, params, Arc::clone(library))?))
        });

        registry.register(IndicatorKind::VolumeProfile, |name, params, _| {
            let params: VolumeProfileParams = parse_params(params)?;
            Ok(Box::new(VolumeProfile::new(name, params)?))
        });

        registry.register(IndicatorKind::OrderbookHeatmap, |name, params, _| {
            let params: HeatmapParams = parse_params(params)?;
            Ok(Box::new(OrderbookHeatmap::new(name, params)?))
        });

        registry
    }

    /// Creates a registry over [`NativeTaLibrary`] with every built-in kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_library(Arc::new(NativeTaLibrary::new()))
    }
}

impl Default for IndicatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_with_defaults() {
        let registry = IndicatorRegistry::with_defaults();
        for kind in IndicatorKind::ALL {
            assert!(registry.contains(kind), "{kind} missing");
        }
        assert_eq!(registry.kinds(), IndicatorKind::ALL.to_vec());
    }

    #[test]
    fn test_registry_create_each_kind() {
        let registry = IndicatorRegistry::with_defaults();
        for kind in IndicatorKind::ALL {
            let spec = IndicatorSpec::new(format!("my_{kind}"), kind, serde_json::Value::Null);
            let indicator = registry.create(&spec).unwrap();
            assert_eq!(indicator.kind(), kind);
            assert_eq!(indicator.name(), format!("my_{kind}"));
            assert!(!indicator.is_ready());
        }
    }

    #[test]
    fn test_registry_create_volume_profile_typed() {
        let registry = IndicatorRegistry::with_defaults();
        let spec = IndicatorSpec::new(
            "vp",
            IndicatorKind::VolumeProfile,
            json!({ "interval": 4, "volume_rows": 2 }),
        );

        let indicator = registry.create(&spec).unwrap();
        let vp = indicator.as_any().downcast_ref::<VolumeProfile>().unwrap();
        assert_eq!(vp.params().interval, 4);
        assert_eq!(vp.params().volume_rows, 2);
    }

    #[test]
    fn test_registry_unknown_kind() {
        let registry = IndicatorRegistry::new(Arc::new(NativeTaLibrary::new()));
        let spec = IndicatorSpec::new("sma", IndicatorKind::Sma, json!({}));

        match registry.create(&spec) {
            Err(IndicatorError::UnknownIndicator(name)) => assert_eq!(name, "SMA"),
            Err(other) => panic!("Expected UnknownIndicator error, got {other}"),
            Ok(_) => panic!("Expected UnknownIndicator error"),
        }
    }

    #[test]
    fn test_registry_invalid_params() {
        let registry = IndicatorRegistry::with_defaults();

        let spec = IndicatorSpec::new("rsi", IndicatorKind::Rsi, json!({ "interval": 0 }));
        assert!(matches!(
            registry.create(&spec),
            Err(IndicatorError::InvalidParams(_))
        ));

        let spec = IndicatorSpec::new("vp", IndicatorKind::VolumeProfile, json!({ "volume_rows": "x" }));
        assert!(matches!(
            registry.create(&spec),
            Err(IndicatorError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_registry_custom_factory() {
        let mut registry = IndicatorRegistry::with_defaults();

        // SMA with the period doubled
        registry.register(IndicatorKind::Sma, |name, params, library| {
            let params: PeriodParams = parse_params(params)?;
            Ok(Box::new(MovingAverage::new(
                name,
                IndicatorKind::Sma,
                PeriodParams::new(params.interval * 2),
                Arc::clone(library),
            )?))
        });

        let spec = IndicatorSpec::new("sma", IndicatorKind::Sma, json!({ "interval": 5 }));
        assert!(registry.create(&spec).is_ok());
    }
}
