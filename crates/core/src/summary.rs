//! Aggregate statistics from `GET /api/dashboard_data`.

use serde::{Deserialize, Serialize};

use crate::event::share_percent;
use crate::wire::ProductCount;

/// Per-day series. The three vectors are index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyData {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub nestle_values: Vec<u64>,
    #[serde(default)]
    pub competitor_values: Vec<u64>,
}

impl DailyData {
    /// Add counts to `day`, appending a zeroed bucket when the day is new.
    pub fn add_to_day(&mut self, day: &str, nestle: u64, competitor: u64) {
        let index = match self.dates.iter().position(|d| d == day) {
            Some(index) => index,
            None => {
                self.dates.push(day.to_string());
                self.dates.len() - 1
            }
        };
        // Series shorter than `dates` are padded so the index is valid.
        if self.nestle_values.len() <= index {
            self.nestle_values.resize(index + 1, 0);
        }
        if self.competitor_values.len() <= index {
            self.competitor_values.resize(index + 1, 0);
        }
        self.nestle_values[index] += nestle;
        self.competitor_values[index] += competitor;
    }

    /// Nestlé plus competitor count for every date.
    pub fn totals(&self) -> Vec<u64> {
        (0..self.dates.len())
            .map(|i| {
                self.nestle_values.get(i).copied().unwrap_or(0)
                    + self.competitor_values.get(i).copied().unwrap_or(0)
            })
            .collect()
    }

    /// `first - last` label for the covered dates.
    pub fn date_range(&self) -> Option<String> {
        match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => Some(format!("{first} - {last}")),
            _ => None,
        }
    }

    /// Nestlé and competitor share of all counted products, rounded.
    pub fn market_share_percent(&self) -> (u8, u8) {
        let nestle: u64 = self.nestle_values.iter().sum();
        let competitor: u64 = self.competitor_values.iter().sum();
        let total = nestle + competitor;
        (share_percent(nestle, total), share_percent(competitor, total))
    }
}

/// One statistics card entry (max / avg / min).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatPoint {
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandStats {
    #[serde(default)]
    pub max: StatPoint,
    #[serde(default)]
    pub avg: StatPoint,
    #[serde(default)]
    pub min: StatPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketShare {
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub daily_data: Option<DailyData>,
    #[serde(default)]
    pub nestle: Option<BrandStats>,
    #[serde(default)]
    pub competitor: Option<BrandStats>,
    #[serde(default)]
    pub top_products: Vec<ProductCount>,
    #[serde(default)]
    pub market_share: Option<MarketShare>,
}

impl DashboardSummary {
    /// Add an event's counts to the day's bucket, creating the daily
    /// series if the summary has none yet.
    pub fn add_to_day(&mut self, day: &str, nestle: u64, competitor: u64) {
        self.daily_data
            .get_or_insert_with(DailyData::default)
            .add_to_day(day, nestle, competitor);
    }

    /// Highest count among the top products, used to scale bar heights.
    pub fn top_product_max(&self) -> u64 {
        self.top_products.iter().map(|p| p.count).max().unwrap_or(0)
    }
}
