//! The four-stage cleaning and analytics pipeline.
//!
//! Stages run strictly in order over a store the caller owns:
//! validation, pruning, flattening, aggregation.

use crate::analysis::{
    average_by, average_score_by_country, best_department, expected_row_count, flatten,
};
use crate::cleaning::{prune, Validator};
use crate::config::Config;
use crate::error::PipelineResult;
use crate::models::{AnalyticsReport, GroupKey, PipelineOutcome};
use crate::store::HierarchyStore;
use tracing::info;

/// Settings for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub validator: Validator,
    /// Extra levels to compute grouped averages for.
    pub extra_groupings: Vec<GroupKey>,
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            validator: Validator::from(&config.validation),
            extra_groupings: config.report.group_by.clone(),
        }
    }
}

/// Run every stage over `store`, mutating it in place.
///
/// # Errors
/// * `PipelineError::EmptyInput` - no student survived cleaning
pub fn run(
    store: &mut HierarchyStore,
    options: &PipelineOptions,
) -> PipelineResult<PipelineOutcome> {
    let validation = options.validator.clean(store);
    let pruning = prune(store);

    let rows = flatten(store)?;
    debug_assert_eq!(rows.len(), expected_row_count(store));
    info!("Flattened {} student row(s)", rows.len());

    let average_score_by_country = average_score_by_country(&rows);
    let best_department = best_department(&rows)?;
    let extra_groupings = options
        .extra_groupings
        .iter()
        .map(|&key| average_by(&rows, key))
        .collect();

    info!(
        "Best department: {} ({:.2})",
        best_department.name, best_department.average
    );

    Ok(PipelineOutcome {
        validation,
        pruning,
        analytics: AnalyticsReport {
            average_score_by_country,
            best_department,
            total_rows: rows.len(),
            extra_groupings,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::flattener;
    use crate::error::PipelineError;
    use crate::models::{Level, Student};
    use crate::store::loader::sample;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sample_end_to_end() {
        let mut store = sample();
        let outcome = run(&mut store, &PipelineOptions::default()).unwrap();

        assert_eq!(outcome.validation.examined, 6);
        assert_eq!(outcome.validation.rejected.len(), 3);
        assert_eq!(outcome.pruning.removed.len(), 1);
        assert_eq!(outcome.pruning.count_at(Level::Department), 1);

        let analytics = &outcome.analytics;
        assert_eq!(analytics.total_rows, 3);
        assert!(approx_eq(
            analytics.average_score_by_country.get("Germany").unwrap(),
            91.5
        ));
        assert!(approx_eq(
            analytics.average_score_by_country.get("Nigeria").unwrap(),
            81.5
        ));
        assert_eq!(analytics.best_department.name, "CS");
        assert!(approx_eq(analytics.best_department.average, 91.5));
        assert!(analytics.extra_groupings.is_empty());

        // Math keeps only Ada; Physics is gone.
        assert_eq!(
            store
                .children_at(
                    Level::Department,
                    &["Africa", "Nigeria", "UniLagos", "Science", "Math"]
                )
                .unwrap(),
            vec!["1"]
        );
        assert_eq!(
            store
                .children_at(Level::Faculty, &["Africa", "Nigeria", "UniLagos", "Science"])
                .unwrap(),
            vec!["Math"]
        );
    }

    #[test]
    fn test_validation_monotonicity() {
        let mut store = sample();
        run(&mut store, &PipelineOptions::default()).unwrap();
        let rows = flattener::flatten(&store).unwrap();

        let mut present: Vec<(&str, i64)> = rows
            .iter()
            .map(|r| (r.department.as_str(), r.student_id))
            .collect();
        present.sort();
        assert_eq!(present, vec![("CS", 1), ("CS", 5), ("Math", 1)]);
        assert!(rows
            .iter()
            .all(|r| (0..=100).contains(&r.calc) && (0..=100).contains(&r.algebra)));
    }

    #[test]
    fn test_extra_groupings() {
        let mut store = sample();
        let options = PipelineOptions {
            extra_groupings: vec![GroupKey::Continent, GroupKey::Faculty],
            ..Default::default()
        };

        let outcome = run(&mut store, &options).unwrap();
        let groupings = &outcome.analytics.extra_groupings;
        assert_eq!(groupings.len(), 2);
        assert_eq!(groupings[0].group_by, GroupKey::Continent);
        assert!(approx_eq(groupings[0].get("Europe").unwrap(), 91.5));
        assert!(approx_eq(groupings[1].get("Science").unwrap(), 81.5));
    }

    #[test]
    fn test_no_surviving_students_is_empty_input() {
        let mut store = HierarchyStore::default();
        store.insert_student(["A", "B", "C", "D", "E"], 1, Student::new(None, Some(1), Some(1)));

        let err = run(&mut store, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_best_department_tie_goes_to_first_listed() {
        let doc = serde_json::json!({
            "continents": { "Europe": { "countries": { "France": { "universities": {
                "Sorbonne": { "faculties": { "Arts": { "departments": {
                    "Zoology": { "students": {
                        "1": { "name": "Zoe", "scores": { "calc": 80, "algebra": 80 } }
                    }},
                    "Art": { "students": {
                        "2": { "name": "Abe", "scores": { "calc": 70, "algebra": 90 } }
                    }}
                }}}}
            }}}}}
        });
        let mut store = crate::store::loader::from_value(&doc).unwrap();

        let outcome = run(&mut store, &PipelineOptions::default()).unwrap();
        assert_eq!(outcome.analytics.best_department.name, "Zoology");
        assert!(approx_eq(outcome.analytics.best_department.average, 80.0));

        let rows = flattener::flatten(&store).unwrap();
        let departments: Vec<&str> = rows.iter().map(|r| r.department.as_str()).collect();
        assert_eq!(departments, vec!["Zoology", "Art"]);
    }

    #[test]
    fn test_stricter_range_from_config() {
        let mut config = Config::default();
        config.validation.min_score = 80;

        let mut store = sample();
        let outcome = run(&mut store, &PipelineOptions::from(&config)).unwrap();

        // Ada's algebra (78) now fails, which empties Math and then the whole
        // African branch.
        assert_eq!(outcome.analytics.total_rows, 2);
        assert_eq!(outcome.pruning.count_at(Level::Continent), 1);
        assert_eq!(store.children_at(Level::Root, &[]).unwrap(), vec!["Europe"]);
    }
}
