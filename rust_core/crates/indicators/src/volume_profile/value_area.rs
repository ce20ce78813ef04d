//! Value area expansion around the point of control.

use crate::volume_profile::bar::VolumeProfileBar;
use serde::{Deserialize, Serialize};

/// Bars compared per side on each expansion step.
const STEP: usize = 2;

/// Summary of one volume profile computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    /// Id of the highest-volume bar
    pub point_of_control_id: usize,
    /// Highest close in the window
    pub profile_high: f64,
    /// Lowest close in the window
    pub profile_low: f64,
    /// Volume inside the value area
    pub value_area_volume: f64,
    /// Included bars in inclusion order, point of control first
    pub value_area: Vec<VolumeProfileBar>,
    /// Upper edge of the highest included bar
    pub value_area_high: f64,
    /// Lower edge of the lowest included bar
    pub value_area_low: f64,
    /// Sum of all bar volumes
    pub total_volume: f64,
    /// `total_volume * value_area_percent / 100`
    pub target_volume: f64,
}

impl ValueArea {
    /// Expands the value area outward from the point of control.
    ///
    /// `bars_by_price` must be ascending and `ranked` the same bars sorted by
    /// descending volume. Each step compares the next two higher-priced bars
    /// with the next two lower-priced ones and includes the heavier side;
    /// ties go to the higher-priced side and an exhausted side counts as 0.
    /// Stops once the target volume is reached or every bar is included.
    ///
    /// Returns `None` for an empty profile.
    #[must_use]
    pub fn compute(
        bars_by_price: &[VolumeProfileBar],
        ranked: &[VolumeProfileBar],
        value_area_percent: f64,
        profile_low: f64,
        profile_high: f64,
    ) -> Option<Self> {
        let poc = ranked.first()?;
        let poc_idx = bars_by_price.iter().position(|bar| bar.id == poc.id)?;

        let total_volume: f64 = bars_by_price.iter().map(|bar| bar.volume).sum();
        let target_volume = total_volume * value_area_percent / 100.0;

        let mut area = Self {
            point_of_control_id: poc.id,
            profile_high,
            profile_low,
            value_area_volume: poc.volume,
            value_area: vec![*poc],
            value_area_high: poc.price_zone_high,
            value_area_low: poc.price_zone_low,
            total_volume,
            target_volume,
        };

        // next unincluded index above, and one past the next unincluded index below
        let mut above = poc_idx + 1;
        let mut below = poc_idx;

        let len = bars_by_price.len();
        while area.value_area_volume < target_volume {
            let upper = &bars_by_price[above..(above + STEP).min(len)];
            let lower_start = below.saturating_sub(STEP);
            let lower = &bars_by_price[lower_start..below];

            if upper.is_empty() && lower.is_empty() {
                break;
            }

            let upper_volume: f64 = upper.iter().map(|bar| bar.volume).sum();
            let lower_volume: f64 = lower.iter().map(|bar| bar.volume).sum();

            if !upper.is_empty() && (lower.is_empty() || upper_volume >= lower_volume) {
                for bar in upper {
                    area.include(bar);
                }
                above += upper.len();
            } else {
                for bar in lower.iter().rev() {
                    area.include(bar);
                }
                below = lower_start;
            }
        }

        Some(area)
    }

    fn include(&mut self, bar: &VolumeProfileBar) {
        self.value_area_volume += bar.volume;
        self.value_area_high = self.value_area_high.max(bar.price_zone_high);
        self.value_area_low = self.value_area_low.min(bar.price_zone_low);
        self.value_area.push(*bar);
    }

    /// Returns true when `price` lies within `[value_area_low, value_area_high)`.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.value_area_low && price < self.value_area_high
    }
}
