//! Row aggregation and statistics.
//!
//! This module groups flat rows by any ancestry level and computes the
//! mean `avg_score` per group, plus arg-max selection over those means.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{BestGroup, FlatRow, GroupAverage, GroupKey, GroupedAverages};
use std::collections::HashMap;

/// Mean `avg_score` per value of `key`.
///
/// Groups come out in the order their key is first seen in `rows`. Only
/// keys with at least one row get a group, so no mean divides by zero.
pub fn average_by(rows: &[FlatRow], key: GroupKey) -> GroupedAverages {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sums: Vec<(&str, f64, usize)> = Vec::new();

    for row in rows {
        let value = row.group_value(key);
        let slot = *index.entry(value).or_insert_with(|| {
            sums.push((value, 0.0, 0));
            sums.len() - 1
        });
        sums[slot].1 += row.avg_score;
        sums[slot].2 += 1;
    }

    GroupedAverages {
        group_by: key,
        groups: sums
            .into_iter()
            .map(|(value, total, count)| GroupAverage {
                key: value.to_string(),
                mean: total / count as f64,
                count,
            })
            .collect(),
    }
}

pub fn average_score_by_country(rows: &[FlatRow]) -> GroupedAverages {
    average_by(rows, GroupKey::Country)
}

/// The group with the highest mean.
///
/// Ties go to the group seen first. Fails with `EmptyInput` when there are
/// no groups.
pub fn arg_max(grouped: &GroupedAverages) -> PipelineResult<BestGroup> {
    let mut best: Option<&GroupAverage> = None;

    for group in &grouped.groups {
        if best.map_or(true, |b| group.mean > b.mean) {
            best = Some(group);
        }
    }

    best.map(|g| BestGroup {
        name: g.key.clone(),
        average: g.mean,
    })
    .ok_or_else(|| {
        PipelineError::EmptyInput(format!(
            "no rows to select a best {} from",
            grouped.group_by.to_string().to_lowercase()
        ))
    })
}

pub fn best_by(rows: &[FlatRow], key: GroupKey) -> PipelineResult<BestGroup> {
    arg_max(&average_by(rows, key))
}

pub fn best_department(rows: &[FlatRow]) -> PipelineResult<BestGroup> {
    best_by(rows, GroupKey::Department)
}

/// Groups ordered by mean, highest first. Equal means keep first-seen order.
pub fn ranked(grouped: &GroupedAverages) -> Vec<&GroupAverage> {
    let mut ranked: Vec<&GroupAverage> = grouped.groups.iter().collect();
    ranked.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(country: &str, department: &str, calc: i64, algebra: i64) -> FlatRow {
        FlatRow {
            continent: "C".to_string(),
            country: country.to_string(),
            university: "U".to_string(),
            faculty: "F".to_string(),
            department: department.to_string(),
            student_id: 1,
            name: "S".to_string(),
            calc,
            algebra,
            avg_score: (calc + algebra) as f64 / 2.0,
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_average_by_country() {
        let rows = vec![
            row("Nigeria", "Math", 85, 78),
            row("Germany", "CS", 88, 90),
            row("Germany", "CS", 95, 93),
        ];

        let grouped = average_score_by_country(&rows);
        assert_eq!(grouped.len(), 2);
        assert!(approx_eq(grouped.get("Nigeria").unwrap(), 81.5));
        assert!(approx_eq(grouped.get("Germany").unwrap(), 91.5));
        assert_eq!(grouped.groups[0].key, "Nigeria");
        assert_eq!(grouped.groups[1].count, 2);
    }

    #[test]
    fn test_mean_matches_rows_of_that_group_only() {
        let rows = vec![
            row("A", "D1", 10, 20),
            row("B", "D2", 90, 90),
            row("A", "D3", 30, 40),
            row("A", "D1", 50, 60),
        ];

        let grouped = average_by(&rows, GroupKey::Country);
        for group in &grouped.groups {
            let matching: Vec<f64> = rows
                .iter()
                .filter(|r| r.country == group.key)
                .map(|r| r.avg_score)
                .collect();
            let expected = matching.iter().sum::<f64>() / matching.len() as f64;
            assert!(approx_eq(group.mean, expected));
            assert_eq!(group.count, matching.len());
        }
    }

    #[test]
    fn test_empty_rows() {
        let grouped = average_score_by_country(&[]);
        assert!(grouped.is_empty());

        let err = best_department(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput(_)));
    }

    #[test]
    fn test_best_department() {
        let rows = vec![
            row("Nigeria", "Math", 85, 78),
            row("Germany", "CS", 88, 90),
            row("Germany", "CS", 95, 93),
        ];

        let best = best_department(&rows).unwrap();
        assert_eq!(best.name, "CS");
        assert!(approx_eq(best.average, 91.5));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let rows = vec![
            row("X", "Zoology", 80, 80),
            row("X", "Art", 70, 90),
            row("X", "Biology", 50, 50),
        ];

        for _ in 0..3 {
            assert_eq!(best_department(&rows).unwrap().name, "Zoology");
        }

        let reversed: Vec<FlatRow> = rows.iter().rev().cloned().collect();
        assert_eq!(best_department(&reversed).unwrap().name, "Art");
    }

    #[test]
    fn test_best_by_other_level() {
        let rows = vec![row("Nigeria", "Math", 85, 78), row("Germany", "CS", 88, 90)];
        assert_eq!(best_by(&rows, GroupKey::Country).unwrap().name, "Germany");
    }

    #[test]
    fn test_ranked_orders_by_mean() {
        let rows = vec![
            row("A", "Low", 10, 10),
            row("A", "High", 90, 90),
            row("A", "Mid", 50, 50),
        ];

        let grouped = average_by(&rows, GroupKey::Department);
        let order: Vec<&str> = ranked(&grouped).iter().map(|g| g.key.as_str()).collect();
        assert_eq!(order, vec!["High", "Mid", "Low"]);
    }
}
