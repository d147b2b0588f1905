//! Leaf-level student validation.

use crate::config::{ValidationConfig, CHECKED_SUBJECTS};
use crate::models::{RejectedStudent, Rejection, Student, StudentId, ValidationReport};
use crate::store::{remove_keys, HierarchyStore};
use indexmap::IndexMap;
use std::ops::RangeInclusive;
use tracing::{debug, info};

/// Decides which students are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    range: RangeInclusive<i64>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(0, 100)
    }
}

impl From<&ValidationConfig> for Validator {
    fn from(config: &ValidationConfig) -> Self {
        Self::new(config.min_score, config.max_score)
    }
}

impl Validator {
    /// Valid scores lie in `min..=max`.
    pub fn new(min: i64, max: i64) -> Self {
        Self { range: min..=max }
    }

    pub fn min_score(&self) -> i64 {
        *self.range.start()
    }

    pub fn max_score(&self) -> i64 {
        *self.range.end()
    }

    /// Returns the first failing check, or `None` if the student is valid.
    ///
    /// Checks run in order: name, then each checked subject.
    pub fn check(&self, student: &Student) -> Option<Rejection> {
        if student.name.is_none() {
            return Some(Rejection::MissingName);
        }

        CHECKED_SUBJECTS
            .iter()
            .find_map(|&subject| match student.score(subject) {
                None => Some(Rejection::MissingScore {
                    subject: subject.to_string(),
                }),
                Some(score) if !self.range.contains(&score) => Some(Rejection::ScoreOutOfRange {
                    subject: subject.to_string(),
                    score,
                }),
                Some(_) => None,
            })
    }

    /// IDs of the invalid students in one department, with the reason.
    ///
    /// Read-only; the caller deletes afterwards.
    pub fn invalid_students(
        &self,
        students: &IndexMap<StudentId, Student>,
    ) -> IndexMap<StudentId, Rejection> {
        students
            .iter()
            .filter_map(|(&id, student)| self.check(student).map(|reason| (id, reason)))
            .collect()
    }

    /// Removes every invalid student from the store.
    ///
    /// Each department is fully scanned before any of its students is deleted.
    pub fn clean(&self, store: &mut HierarchyStore) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (path, department) in store.departments_mut() {
            report.examined += department.students.len();

            let invalid = self.invalid_students(&department.students);
            for (id, reason) in &invalid {
                let student_path = path.child(id);
                debug!("Rejecting student {}: {}", student_path, reason);
                report.rejected.push(RejectedStudent {
                    name: department.students.get(id).and_then(|s| s.name.clone()),
                    path: student_path,
                    reason: reason.clone(),
                });
            }

            remove_keys(&mut department.students, invalid.keys());
        }

        report.retained = report.examined - report.rejected.len();
        info!(
            "Validation: {} examined, {} retained, {} removed",
            report.examined,
            report.retained,
            report.rejected.len()
        );

        report
    }
}
