//! End-to-end detection scenarios over the full session manager.

use chrono::NaiveDate;
use metric_anomaly::config::{DetectionConfig, Dimension, Frequency, Measure, Method};
use metric_anomaly::core::{Dataset, Schema};
use metric_anomaly::model::AnomalyModel;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

fn monday(week: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Duration::weeks(week)
}

fn schema() -> Schema {
    Schema::new(
        vec!["cat".to_string()],
        vec!["quote_count".to_string(), "sales_count".to_string()],
    )
}

/// Weekly rows (dated on Mondays) for the given categories with a seasonal
/// conversion rate around 20% plus seeded Gaussian noise of scale `sigma`.
fn weekly_dataset(categories: &[&str], weeks: usize, sigma: f64, seed: u64) -> Dataset {
    use rand::distributions::Distribution;

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();

    let mut data = Dataset::new(schema());
    for category in categories {
        for w in 0..weeks {
            let quotes = 1000.0;
            let rate = 0.2
                + 0.03 * (2.0 * std::f64::consts::PI * w as f64 / 12.0).sin()
                + 0.0002 * w as f64
                + noise.sample(&mut rng);
            data.push_row(
                monday(w as i64),
                vec![category.to_string()],
                vec![quotes, quotes * rate],
            )
            .unwrap();
        }
    }
    data
}

fn stl_config() -> DetectionConfig {
    DetectionConfig::new(Measure::conversion_rate(), Dimension::column("cat"))
        .with_frequency(Frequency::Weekly)
        .with_method(Method::Stl)
        .with_sig_level(0.05)
        .with_min_category_rows(50)
}

#[test]
fn two_category_stl_run_flags_each_category_independently() {
    let data = weekly_dataset(&["A", "B"], 104, 0.01, 7);
    let mut model = AnomalyModel::new(data);

    let run = model.detect_anomalies(&stl_config()).unwrap();

    assert_eq!(run.analyzed, vec!["A", "B"]);
    assert!(run.skipped.is_empty());

    let table = model.anomalies();
    assert_eq!(table.len(), 208); // 104 weekly records per category

    // Flagged rows are the score exceedances of the two-sided normal
    // bounds (z = 1.96 at 0.05), per category.
    for record in table.records() {
        if record.flagged {
            assert!(record.score.abs() > 1.9, "{record:?}");
        } else {
            assert!(record.score.abs() < 2.0, "{record:?}");
        }
    }
}

#[test]
fn clean_noise_flags_roughly_five_percent() {
    let data = weekly_dataset(&["A", "B"], 104, 0.01, 21);
    let mut model = AnomalyModel::new(data);

    let run = model.detect_anomalies(&stl_config()).unwrap();

    // At sig level 0.05 the expected flagged fraction is about 5%.
    let fraction = run.flagged as f64 / model.anomalies().len() as f64;
    assert!(
        (0.0..0.15).contains(&fraction),
        "flagged fraction {fraction} out of tolerance"
    );
}

#[test]
fn ten_sigma_spike_is_always_flagged() {
    for seed in [1, 2, 3] {
        let sigma = 0.01;
        let mut data = weekly_dataset(&["A"], 104, sigma, seed);

        // Replace week 60 with a +10 sigma jump in the rate.
        let spike_week = monday(60);
        let mut spiked = Dataset::new(schema());
        for record in data.records() {
            let mut components = record.components.clone();
            if record.date == spike_week {
                components[1] += components[0] * 10.0 * sigma;
            }
            spiked
                .push_row(record.date, record.dimensions.clone(), components)
                .unwrap();
        }
        data = spiked;

        let mut model = AnomalyModel::new(data);
        model.detect_anomalies(&stl_config()).unwrap();

        let spike_record = model
            .anomalies()
            .records()
            .iter()
            .find(|r| r.timestamp == spike_week)
            .expect("spike week present");
        assert!(spike_record.flagged, "seed {seed}: spike must be flagged");
    }
}

#[test]
fn spike_in_one_category_does_not_flag_the_other() {
    // A carries noise and a spike; B is perfectly flat, so it can never be
    // flagged regardless of A.
    let mut data = weekly_dataset(&["A"], 104, 0.01, 11);
    let spike_week = monday(50);
    let mut spiked = Dataset::new(schema());
    for record in data.records() {
        let mut components = record.components.clone();
        if record.date == spike_week {
            components[1] += components[0] * 0.15;
        }
        spiked
            .push_row(record.date, record.dimensions.clone(), components)
            .unwrap();
    }
    data = spiked;
    for w in 0..104 {
        data.push_row(monday(w), vec!["B".to_string()], vec![1000.0, 200.0])
            .unwrap();
    }

    let mut model = AnomalyModel::new(data);
    model.detect_anomalies(&stl_config()).unwrap();

    let at_spike: Vec<_> = model
        .anomalies()
        .records()
        .iter()
        .filter(|r| r.timestamp == spike_week)
        .collect();
    assert_eq!(at_spike.len(), 2);

    let a = at_spike.iter().find(|r| r.category == "A").unwrap();
    let b = at_spike.iter().find(|r| r.category == "B").unwrap();
    assert!(a.flagged);
    assert!(!b.flagged);
}

#[test]
fn bad_category_is_excluded_from_detection_output() {
    let mut data = weekly_dataset(&["A", "B"], 104, 0.01, 13);
    // 50 weekly rows for C, below the default threshold of 100.
    data.append(&weekly_dataset(&["C"], 50, 0.01, 14)).unwrap();

    let mut model = AnomalyModel::new(data);
    let config = stl_config().with_min_category_rows(100);
    let run = model.detect_anomalies(&config).unwrap();

    assert_eq!(run.analyzed, vec!["A", "B"]);
    assert!(model
        .anomalies()
        .records()
        .iter()
        .all(|r| r.category != "C"));
}

#[test]
fn append_with_mismatched_schema_leaves_source_unchanged() {
    let data = weekly_dataset(&["A"], 10, 0.01, 5);
    let mut model = AnomalyModel::new(data);
    let before_len = model.main().len();

    let mut rows = Dataset::new(Schema::new(
        vec!["cat".to_string(), "extra".to_string()],
        vec!["quote_count".to_string(), "sales_count".to_string()],
    ));
    rows.push_row(
        monday(0),
        vec!["A".to_string(), "x".to_string()],
        vec![1.0, 1.0],
    )
    .unwrap();

    assert!(!model.append(&rows, false));
    assert_eq!(model.main().len(), before_len);
    assert_eq!(model.main().schema(), &schema());
}

#[test]
fn arima_on_constant_series_flags_nothing() {
    // Constant conversion rate: the grid search must settle on a degenerate
    // model without dividing by zero and flag nothing.
    let mut data = Dataset::new(schema());
    for w in 0..60 {
        data.push_row(monday(w), vec!["A".to_string()], vec![1000.0, 200.0])
            .unwrap();
    }

    let mut model = AnomalyModel::new(data);
    let config = stl_config().with_method(Method::Arima);
    let run = model.detect_anomalies(&config).unwrap();

    assert_eq!(run.analyzed, vec!["A"]);
    assert_eq!(run.flagged, 0);
}

#[test]
fn arima_flags_level_break_in_test_segment() {
    let mut data = Dataset::new(schema());
    for w in 0..80 {
        // Drifting rate with a mild wobble, then a collapse in the final
        // held-out weeks.
        let rate = if w >= 77 {
            0.02
        } else {
            0.2 + 0.001 * w as f64 + 0.003 * (w as f64 * 0.7).sin()
        };
        data.push_row(
            monday(w),
            vec!["A".to_string()],
            vec![1000.0, 1000.0 * rate],
        )
        .unwrap();
    }

    let mut model = AnomalyModel::new(data);
    let config = stl_config().with_method(Method::Arima);
    let run = model.detect_anomalies(&config).unwrap();

    assert!(run.flagged >= 1);
    // ARIMA reports only the held-out tail.
    assert_eq!(model.anomalies().len(), 4);
}

#[test]
fn export_with_zero_flagged_rows_has_headers_only() {
    // A constant-1 proportion measure has no residual variance anywhere, so
    // nothing can be flagged.
    let data = weekly_dataset(&["A", "B"], 104, 0.01, 17);
    let mut model = AnomalyModel::new(data);

    let config = DetectionConfig::new(Measure::quote_proportion(), Dimension::column("cat"))
        .with_min_category_rows(50);
    let run = model.detect_anomalies(&config).unwrap();
    assert_eq!(run.flagged, 0);
    assert!(!model.anomalies().is_empty());

    let mut buffer = Vec::new();
    model.export_anomalies(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec!["timestamp,category,value,score,flagged"]
    );
}

#[test]
fn export_contains_flagged_rows_after_spiked_run() {
    let sigma = 0.01;
    let base = weekly_dataset(&["A"], 104, sigma, 3);
    let spike_week = monday(30);
    let mut data = Dataset::new(schema());
    for record in base.records() {
        let mut components = record.components.clone();
        if record.date == spike_week {
            components[1] += components[0] * 10.0 * sigma;
        }
        data.push_row(record.date, record.dimensions.clone(), components)
            .unwrap();
    }

    let mut model = AnomalyModel::new(data);
    model.detect_anomalies(&stl_config()).unwrap();

    let mut buffer = Vec::new();
    model.export_anomalies(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.len() >= 2);
    assert!(text.contains(&spike_week.to_string()));
}

#[test]
fn all_dimension_produces_single_synthetic_series() {
    let data = weekly_dataset(&["A", "B"], 104, 0.01, 9);
    let mut model = AnomalyModel::new(data);

    let config = DetectionConfig::new(Measure::conversion_rate(), Dimension::All)
        .with_method(Method::Stl);
    let run = model.detect_anomalies(&config).unwrap();

    assert_eq!(run.analyzed, vec!["ALL"]);
    assert_eq!(model.anomalies().len(), 104);
    assert!(model.bad_categories(&config).is_empty());
}
