//! Model/session manager: owns the immutable source dataset and
//! orchestrates per-category pipeline and detection runs.
//!
//! The manager holds two tables. The main dataset is loaded once and never
//! altered by a run; the working view is a disposable copy derived from the
//! main dataset and the active configuration, and is rebuilt from scratch
//! for every run. The aggregated anomaly table is replaced wholesale each
//! time detection runs.

use crate::config::{DetectionConfig, Dimension, ALL_CATEGORY};
use crate::core::{Dataset, MetricSeries};
use crate::detect::{detect_series, AnomalyRecord, AnomalyTable};
use crate::error::Result;
use crate::pipeline::{category_pipeline, dimension_pipeline, FilterCategory, FilterYear, Transform};
use std::io::Write;
use std::time::{Duration, Instant};

/// Summary of one detection run.
#[derive(Debug, Clone)]
pub struct DetectionRun {
    /// Categories that were analyzed.
    pub analyzed: Vec<String>,
    /// Categories skipped because their series could not be analyzed.
    pub skipped: Vec<String>,
    /// Number of flagged records in the resulting table.
    pub flagged: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Anomaly-detection session over one source dataset.
#[derive(Debug, Clone)]
pub struct AnomalyModel {
    main: Dataset,
    working: Dataset,
    anomalies: AnomalyTable,
}

impl AnomalyModel {
    /// Create a session owning the given dataset. Missing numeric entries
    /// are zero-filled once on load.
    pub fn new(dataset: Dataset) -> Self {
        let mut main = dataset;
        main.fill_missing(0.0);
        let working = main.clone();
        Self {
            main,
            working,
            anomalies: AnomalyTable::new(),
        }
    }

    /// Replace the source dataset wholesale. The stored copy is defensive:
    /// later caller mutation cannot affect session state.
    pub fn load(&mut self, dataset: &Dataset) {
        let mut main = dataset.clone();
        main.fill_missing(0.0);
        self.main = main;
        self.reset_working();
    }

    /// Union new rows into the source dataset if their schema matches
    /// exactly. On mismatch nothing changes and `false` is returned; the
    /// source dataset and any derived working view are untouched.
    pub fn append(&mut self, rows: &Dataset, sort_after: bool) -> bool {
        match self.main.append(rows) {
            Ok(()) => {
                if sort_after {
                    self.main.sort_rows();
                }
                true
            }
            Err(error) => {
                tracing::warn!(%error, "append ignored");
                false
            }
        }
    }

    /// Reset the working view to a copy of the source dataset.
    pub fn reset_working(&mut self) {
        self.working = self.main.clone();
    }

    /// The immutable source dataset.
    pub fn main(&self) -> &Dataset {
        &self.main
    }

    /// The current working view.
    pub fn working(&self) -> &Dataset {
        &self.working
    }

    /// Dimension column names of the source dataset.
    pub fn dimensions(&self) -> &[String] {
        self.main.schema().dimensions()
    }

    /// Categories of the selected dimension in the source dataset. The
    /// `ALL` dimension has a single synthetic category.
    pub fn categories(&self, dimension: &Dimension) -> Result<Vec<String>> {
        match dimension {
            Dimension::All => Ok(vec![ALL_CATEGORY.to_string()]),
            Dimension::Column(name) => self.main.categories(name),
        }
    }

    /// The anomaly table produced by the last detection run (empty before
    /// the first run).
    pub fn anomalies(&self) -> &AnomalyTable {
        &self.anomalies
    }

    /// Categories in the current working view with fewer rows than the
    /// configured threshold. Empty for the `ALL` dimension.
    pub fn bad_categories(&self, config: &DetectionConfig) -> Vec<String> {
        let Some(name) = config.dimension.name() else {
            return vec![];
        };
        match self.working.category_counts(name) {
            Ok(counts) => counts
                .into_iter()
                .filter(|(_, count)| *count < config.min_category_rows)
                .map(|(category, _)| category)
                .collect(),
            Err(_) => vec![],
        }
    }

    /// Derive a fresh working view from the source dataset and the given
    /// configuration, replacing any previous working view.
    pub fn derive_working_view(&mut self, config: &DetectionConfig) -> Result<()> {
        config.validate()?;
        self.reset_working();

        // The secondary filter is advisory: an unknown filter dimension is
        // a logged no-op, not a failed run.
        if let Some(filter) = &config.filter {
            let stage = FilterCategory::retain(&filter.dimension, filter.categories.clone());
            match stage.apply(self.working.clone()) {
                Ok(filtered) => self.working = filtered,
                Err(error) => tracing::warn!(%error, "category filter ignored"),
            }
        }

        self.working = FilterYear::new(config.year).apply(self.working.clone())?;

        // Bad categories are counted on the filtered daily rows, before
        // collapsing.
        let bad = self.bad_categories(config);
        let pipeline =
            dimension_pipeline(&config.measure, &config.dimension, config.frequency, &bad);
        self.working = pipeline.apply(self.working.clone())?;
        Ok(())
    }

    /// Run the configured detection strategy over every non-bad category of
    /// the working view, replacing the stored anomaly table. Categories
    /// whose series cannot be analyzed are skipped and recorded; a single
    /// bad category never aborts the run.
    pub fn detect_anomalies(&mut self, config: &DetectionConfig) -> Result<DetectionRun> {
        let start = Instant::now();
        self.derive_working_view(config)?;

        let categories: Vec<String> = match &config.dimension {
            Dimension::All => vec![ALL_CATEGORY.to_string()],
            Dimension::Column(name) => self.working.categories(name)?,
        };

        let mut records: Vec<AnomalyRecord> = Vec::new();
        let mut analyzed = Vec::new();
        let mut skipped = Vec::new();

        for category in &categories {
            match self.detect_category(config, category) {
                Ok(category_records) => {
                    analyzed.push(category.clone());
                    records.extend(category_records);
                }
                Err(error) => {
                    tracing::warn!(category = %category, %error, "category skipped");
                    skipped.push(category.clone());
                }
            }
        }

        let table = AnomalyTable::from_records(records);
        let flagged = table.flagged().count();
        self.anomalies = table;
        self.reset_working();

        let elapsed = start.elapsed();
        tracing::info!(
            analyzed = analyzed.len(),
            skipped = skipped.len(),
            flagged,
            ?elapsed,
            "detection run complete"
        );

        Ok(DetectionRun {
            analyzed,
            skipped,
            flagged,
            elapsed,
        })
    }

    /// Serialize the flagged rows of the current anomaly table as CSV. If
    /// no detection has run, the output is a valid header-only table.
    pub fn export_anomalies<W: Write>(&self, writer: W) -> Result<()> {
        self.anomalies.write_csv(writer)
    }

    fn detect_category(
        &self,
        config: &DetectionConfig,
        category: &str,
    ) -> Result<Vec<AnomalyRecord>> {
        let slice = match &config.dimension {
            Dimension::All => self.working.clone(),
            Dimension::Column(name) => {
                category_pipeline(name, vec![category.to_string()]).apply(self.working.clone())?
            }
        };

        let series = MetricSeries::from_dataset(&slice, config.measure.name(), category)?;
        detect_series(&series, config)
    }
}
