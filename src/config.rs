//! Configuration surface consumed from the presentation layer.
//!
//! A [`DetectionConfig`] fully determines one detection run: which measure
//! to derive, which dimension to split on, the resampling frequency and the
//! detection strategy. Configurations are plain values; deriving a working
//! view twice from the same (dataset, configuration) pair yields the same
//! result.

use crate::error::{AnomalyError, Result};
use chrono::{Datelike, NaiveDate};

/// Synthetic category label used when the dimension is [`Dimension::All`].
pub const ALL_CATEGORY: &str = "ALL";

/// The dimension to split the dataset on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    /// Collapse every dimension; the dataset becomes one synthetic series.
    All,
    /// Split on a named categorical column.
    Column(String),
}

impl Dimension {
    /// Create a column dimension from a name.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Check whether this is the `ALL` sentinel.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The column name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Column(name) => Some(name),
        }
    }
}

/// Target resampling frequency for the working view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    /// No resampling beyond the daily granularity of the input.
    Daily,
    /// Weekly buckets, weeks starting on Monday.
    #[default]
    Weekly,
    /// Calendar-month buckets.
    Monthly,
}

impl Frequency {
    /// Map a daily timestamp to the start of its period.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => {
                let back = date.weekday().num_days_from_monday() as i64;
                date - chrono::Duration::days(back)
            }
            Self::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

/// Detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// STL decomposition with normal confidence bounds on the residuals.
    #[default]
    Stl,
    /// ARIMA forecast with prediction-interval checks on a held-out tail.
    Arima,
}

/// Rule for deriving the measure column from aggregated components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureRule {
    /// The summed component itself (e.g. quote volume).
    Sum { component: String },
    /// Ratio of two summed components (e.g. conversion rate).
    Ratio {
        numerator: String,
        denominator: String,
    },
    /// Proportion-type measure: one per collapsed unit, the share of the
    /// whole is computed downstream. The column is a constant 1.
    Proportion { component: String },
}

/// A named derived metric computed from raw aggregated components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    name: String,
    rule: MeasureRule,
}

impl Measure {
    /// A ratio measure dividing two summed components.
    pub fn ratio(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rule: MeasureRule::Ratio {
                numerator: numerator.into(),
                denominator: denominator.into(),
            },
        }
    }

    /// A volume measure carrying a summed component through.
    pub fn sum(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: MeasureRule::Sum {
                component: component.into(),
            },
        }
    }

    /// A proportion measure (constant 1 per collapsed unit).
    pub fn proportion(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: MeasureRule::Proportion {
                component: component.into(),
            },
        }
    }

    /// `conversion_rate = sales_count / quote_count`.
    pub fn conversion_rate() -> Self {
        Self::ratio("conversion_rate", "sales_count", "quote_count")
    }

    /// Total quote count per period.
    pub fn quote_volume() -> Self {
        Self::sum("quote_volume", "quote_count")
    }

    /// Total sales count per period.
    pub fn sales_volume() -> Self {
        Self::sum("sales_volume", "sales_count")
    }

    /// Share of quotes per category (constant-1 column).
    pub fn quote_proportion() -> Self {
        Self::proportion("quote_proportion", "quote_count")
    }

    /// Share of sales per category (constant-1 column).
    pub fn sales_proportion() -> Self {
        Self::proportion("sales_proportion", "sales_count")
    }

    /// The measure column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The derivation rule.
    pub fn rule(&self) -> &MeasureRule {
        &self.rule
    }
}

/// Optional secondary filter applied before collapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Dimension column to filter on.
    pub dimension: String,
    /// Category substrings to retain.
    pub categories: Vec<String>,
}

/// Knobs for the ARIMA strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOptions {
    /// Length of the held-out test segment (forecast horizon).
    pub steps: usize,
    /// Maximum differencing order considered.
    pub max_diff: usize,
}

impl Default for ArimaOptions {
    fn default() -> Self {
        Self {
            steps: 4,
            max_diff: 3,
        }
    }
}

/// Full configuration for one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Measure to derive and analyze.
    pub measure: Measure,
    /// Dimension to split on, or `ALL`.
    pub dimension: Dimension,
    /// Resampling frequency of the working view.
    pub frequency: Frequency,
    /// Categories with fewer rows than this are excluded from detection.
    pub min_category_rows: usize,
    /// Optional secondary category filter applied before collapsing.
    pub filter: Option<CategoryFilter>,
    /// Optional calendar-year filter; `None` keeps all years.
    pub year: Option<i32>,
    /// Two-sided significance level in (0, 1).
    pub sig_level: f64,
    /// Detection strategy.
    pub method: Method,
    /// Seasonal period used by the STL strategy.
    pub seasonal_period: usize,
    /// ARIMA strategy options.
    pub arima: ArimaOptions,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            measure: Measure::conversion_rate(),
            dimension: Dimension::All,
            frequency: Frequency::Weekly,
            min_category_rows: 100,
            filter: None,
            year: None,
            sig_level: 0.05,
            method: Method::Stl,
            seasonal_period: 12,
            arima: ArimaOptions::default(),
        }
    }
}

impl DetectionConfig {
    /// Create a configuration with defaults for the given measure and dimension.
    pub fn new(measure: Measure, dimension: Dimension) -> Self {
        Self {
            measure,
            dimension,
            ..Self::default()
        }
    }

    /// Set the detection strategy.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the significance level.
    pub fn with_sig_level(mut self, sig_level: f64) -> Self {
        self.sig_level = sig_level;
        self
    }

    /// Set the resampling frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the bad-category row threshold.
    pub fn with_min_category_rows(mut self, rows: usize) -> Self {
        self.min_category_rows = rows;
        self
    }

    /// Set the secondary category filter.
    pub fn with_filter(mut self, dimension: impl Into<String>, categories: Vec<String>) -> Self {
        self.filter = Some(CategoryFilter {
            dimension: dimension.into(),
            categories,
        });
        self
    }

    /// Restrict the run to one calendar year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the STL seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.sig_level > 0.0 && self.sig_level < 1.0) {
            return Err(AnomalyError::InvalidParameter(format!(
                "significance level must be in (0, 1), got {}",
                self.sig_level
            )));
        }
        if self.seasonal_period < 2 {
            return Err(AnomalyError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        if self.arima.steps == 0 {
            return Err(AnomalyError::InvalidParameter(
                "ARIMA test segment length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
