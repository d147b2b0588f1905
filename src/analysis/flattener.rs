//! Flattening of the cleaned tree into independent rows.

use crate::config::{ALGEBRA, CALC};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{FlatRow, Student};
use crate::store::HierarchyStore;
use tracing::debug;

/// Emits one row per student, in traversal order.
///
/// Must run after validation: a student without a name or either checked
/// score yields `PipelineError::Unvalidated`.
pub fn flatten(store: &HierarchyStore) -> PipelineResult<Vec<FlatRow>> {
    let mut rows = Vec::new();

    for (path, department) in store.departments() {
        let [continent, country, university, faculty, dept] = path.segments() else {
            return Err(PipelineError::structure(
                path.to_string(),
                "department path must have five segments",
            ));
        };

        for (&student_id, student) in &department.students {
            let (name, calc, algebra) = required_fields(student).ok_or_else(|| {
                PipelineError::Unvalidated {
                    path: path.child(student_id).to_string(),
                }
            })?;

            rows.push(FlatRow {
                continent: continent.clone(),
                country: country.clone(),
                university: university.clone(),
                faculty: faculty.clone(),
                department: dept.clone(),
                student_id,
                name: name.to_string(),
                calc,
                algebra,
                avg_score: average(calc, algebra),
            });
        }
    }

    debug!("Flattened {} row(s)", rows.len());
    Ok(rows)
}

fn required_fields(student: &Student) -> Option<(&str, i64, i64)> {
    Some((
        student.name.as_deref()?,
        student.score(CALC)?,
        student.score(ALGEBRA)?,
    ))
}

fn average(calc: i64, algebra: i64) -> f64 {
    (calc as f64 + algebra as f64) / 2.0
}

/// Row count a flatten of `store` would produce.
pub fn expected_row_count(store: &HierarchyStore) -> usize {
    store.departments().map(|(_, d)| d.students.len()).sum()
}
