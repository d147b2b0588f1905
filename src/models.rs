//! Data models for the cleaning pipeline.
//!
//! This module contains the node types for every level of the hierarchy,
//! the flat row emitted by the flattener, and the reports each stage
//! produces.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Student identifier, unique only within its department.
pub type StudentId = i64;

/// Nesting level of a node, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Root,
    Continent,
    Country,
    University,
    Faculty,
    Department,
    Student,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Root => write!(f, "Root"),
            Level::Continent => write!(f, "Continent"),
            Level::Country => write!(f, "Country"),
            Level::University => write!(f, "University"),
            Level::Faculty => write!(f, "Faculty"),
            Level::Department => write!(f, "Department"),
            Level::Student => write!(f, "Student"),
        }
    }
}

impl Level {
    /// Number of path segments needed to name a node at this level.
    pub fn depth(&self) -> usize {
        match self {
            Level::Root => 0,
            Level::Continent => 1,
            Level::Country => 2,
            Level::University => 3,
            Level::Faculty => 4,
            Level::Department => 5,
            Level::Student => 6,
        }
    }

    /// The level directly below this one.
    pub fn child(&self) -> Option<Level> {
        match self {
            Level::Root => Some(Level::Continent),
            Level::Continent => Some(Level::Country),
            Level::Country => Some(Level::University),
            Level::University => Some(Level::Faculty),
            Level::Faculty => Some(Level::Department),
            Level::Department => Some(Level::Student),
            Level::Student => None,
        }
    }

    /// Key under which a node of this level stores its children.
    pub fn child_key(&self) -> Option<&'static str> {
        match self {
            Level::Root => Some("continents"),
            Level::Continent => Some("countries"),
            Level::Country => Some("universities"),
            Level::University => Some("faculties"),
            Level::Faculty => Some("departments"),
            Level::Department => Some("students"),
            Level::Student => None,
        }
    }
}

/// Ancestry level a flat row can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Continent,
    Country,
    University,
    Faculty,
    Department,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Level::from(*self))
    }
}

impl From<GroupKey> for Level {
    fn from(key: GroupKey) -> Self {
        match key {
            GroupKey::Continent => Level::Continent,
            GroupKey::Country => Level::Country,
            GroupKey::University => Level::University,
            GroupKey::Faculty => Level::Faculty,
            GroupKey::Department => Level::Department,
        }
    }
}

/// Path from the root to a node, one segment per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path one level deeper.
    pub fn child(&self, key: impl fmt::Display) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Level of the node this path names, `None` if deeper than a student.
    pub fn level(&self) -> Option<Level> {
        let mut level = Level::Root;
        for _ in &self.segments {
            level = level.child()?;
        }
        Some(level)
    }
}

impl<S: Into<String>> FromIterator<S> for NodePath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.segments.join(" > "))
        }
    }
}

/// A student record, the leaf of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub name: Option<String>,
    /// Score per subject; `None` marks a recorded but missing score.
    pub scores: BTreeMap<String, Option<i64>>,
}

impl Student {
    pub fn new(name: Option<&str>, calc: Option<i64>, algebra: Option<i64>) -> Self {
        let scores = BTreeMap::from([
            (crate::config::CALC.to_string(), calc),
            (crate::config::ALGEBRA.to_string(), algebra),
        ]);
        Self {
            name: name.map(String::from),
            scores,
        }
    }

    /// Score for `subject`, flattening "absent" and "null" into `None`.
    pub fn score(&self, subject: &str) -> Option<i64> {
        self.scores.get(subject).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub students: IndexMap<StudentId, Student>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    pub departments: IndexMap<String, Department>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct University {
    pub faculties: IndexMap<String, Faculty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub universities: IndexMap<String, University>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Continent {
    pub countries: IndexMap<String, Country>,
}

/// The root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub continents: IndexMap<String, Continent>,
}

/// One denormalized row per retained student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub continent: String,
    pub country: String,
    pub university: String,
    pub faculty: String,
    pub department: String,
    pub student_id: StudentId,
    pub name: String,
    pub calc: i64,
    pub algebra: i64,
    pub avg_score: f64,
}

impl FlatRow {
    /// The ancestry value for `key`.
    pub fn group_value(&self, key: GroupKey) -> &str {
        match key {
            GroupKey::Continent => &self.continent,
            GroupKey::Country => &self.country,
            GroupKey::University => &self.university,
            GroupKey::Faculty => &self.faculty,
            GroupKey::Department => &self.department,
        }
    }
}

/// Why a student was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    MissingName,
    MissingScore { subject: String },
    ScoreOutOfRange { subject: String, score: i64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingName => write!(f, "name is missing"),
            Rejection::MissingScore { subject } => write!(f, "{} score is missing", subject),
            Rejection::ScoreOutOfRange { subject, score } => {
                write!(f, "{} score {} is out of range", subject, score)
            }
        }
    }
}

/// A student removed by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedStudent {
    /// Path to the student, the last segment being its ID.
    pub path: NodePath,
    pub name: Option<String>,
    pub reason: Rejection,
}

/// Outcome of the leaf validation stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Students inspected.
    pub examined: usize,
    /// Students kept.
    pub retained: usize,
    /// Students removed, in traversal order.
    pub rejected: Vec<RejectedStudent>,
}

/// A container removed by the pruner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrunedContainer {
    pub level: Level,
    pub path: NodePath,
}

/// Outcome of the structural pruning stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneReport {
    /// Removed containers, innermost level first.
    pub removed: Vec<PrunedContainer>,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Number of containers removed at `level`.
    pub fn count_at(&self, level: Level) -> usize {
        self.removed.iter().filter(|c| c.level == level).count()
    }
}

/// Mean of `avg_score` over one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAverage {
    pub key: String,
    pub mean: f64,
    pub count: usize,
}

/// Grouped means, in first-seen order of the group keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedAverages {
    pub group_by: GroupKey,
    pub groups: Vec<GroupAverage>,
}

impl GroupedAverages {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.groups.iter().find(|g| g.key == key).map(|g| g.mean)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The group with the highest mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestGroup {
    pub name: String,
    pub average: f64,
}

/// Aggregation results handed to the reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub average_score_by_country: GroupedAverages,
    pub best_department: BestGroup,
    pub total_rows: usize,
    /// Additional groupings requested by configuration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_groupings: Vec<GroupedAverages>,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub validation: ValidationReport,
    pub pruning: PruneReport,
    pub analytics: AnalyticsReport,
}

/// Metadata about a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the dataset came from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub min_score: i64,
    pub max_score: i64,
    pub duration_seconds: f64,
}

/// The complete analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub outcome: PipelineOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_depth_matches_child_chain() {
        let mut level = Level::Root;
        let mut depth = 0;
        while let Some(next) = level.child() {
            depth += 1;
            assert_eq!(next.depth(), depth);
            level = next;
        }
        assert_eq!(level, Level::Student);
        assert!(Level::Student.child_key().is_none());
    }

    #[test]
    fn test_node_path_display_and_level() {
        let path = NodePath::root().child("Africa").child("Nigeria");
        assert_eq!(path.to_string(), "Africa > Nigeria");
        assert_eq!(path.level(), Some(Level::Country));
        assert_eq!(NodePath::root().to_string(), "<root>");

        let too_deep: NodePath = ["a", "b", "c", "d", "e", "1", "x"].into_iter().collect();
        assert_eq!(too_deep.level(), None);
    }

    #[test]
    fn test_student_score_flattens_missing() {
        let student = Student::new(Some("Bola"), Some(92), None);
        assert_eq!(student.score("calc"), Some(92));
        assert_eq!(student.score("algebra"), None);
        assert_eq!(student.score("physics"), None);
    }

    #[test]
    fn test_rejection_display() {
        let reason = Rejection::ScoreOutOfRange {
            subject: "calc".to_string(),
            score: -10,
        };
        assert_eq!(reason.to_string(), "calc score -10 is out of range");
        assert_eq!(Rejection::MissingName.to_string(), "name is missing");
    }

    #[test]
    fn test_prune_report_count_at() {
        let report = PruneReport {
            removed: vec![
                PrunedContainer {
                    level: Level::Department,
                    path: NodePath::root().child("a"),
                },
                PrunedContainer {
                    level: Level::Faculty,
                    path: NodePath::root().child("b"),
                },
            ],
        };
        assert_eq!(report.count_at(Level::Department), 1);
        assert_eq!(report.count_at(Level::Country), 0);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_grouped_averages_get() {
        let grouped = GroupedAverages {
            group_by: GroupKey::Country,
            groups: vec![GroupAverage {
                key: "Germany".to_string(),
                mean: 91.5,
                count: 2,
            }],
        };
        assert_eq!(grouped.get("Germany"), Some(91.5));
        assert_eq!(grouped.get("Nigeria"), None);
        assert_eq!(grouped.len(), 1);
    }
}
