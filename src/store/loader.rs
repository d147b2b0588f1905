//! Dataset loading.
//!
//! Turns a JSON document shaped like
//! `{"continents": {NAME: {"countries": {NAME: {"universities": ...}}}}}`
//! into a [`HierarchyStore`], keeping the document's key order. Missing
//! container keys are structure errors; missing or null leaf fields are kept
//! as `None` and left to the validator.

use super::HierarchyStore;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    Continent, Country, Department, Faculty, Hierarchy, Level, NodePath, Student, StudentId,
    University,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Load a dataset from a JSON file.
pub fn load_file(path: &Path) -> Result<HierarchyStore> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let store = from_json_str(&content)
        .with_context(|| format!("Failed to load dataset: {}", path.display()))?;

    debug!("Loaded dataset from {}", path.display());
    Ok(store)
}

/// Parse a dataset from JSON text.
pub fn from_json_str(content: &str) -> PipelineResult<HierarchyStore> {
    let value: Value = serde_json::from_str(content)?;
    from_value(&value)
}

/// Build a store from an already parsed JSON value.
pub fn from_value(value: &Value) -> PipelineResult<HierarchyStore> {
    let root = NodePath::root();
    let continents = parse_children(value, Level::Root, &root, |node, path| {
        Ok(Continent {
            countries: parse_children(node, Level::Continent, path, parse_country)?,
        })
    })?;

    Ok(HierarchyStore::new(Hierarchy { continents }))
}

fn parse_country(node: &Value, path: &NodePath) -> PipelineResult<Country> {
    let universities = parse_children(node, Level::Country, path, |node, path| {
        Ok(University {
            faculties: parse_children(node, Level::University, path, parse_faculty)?,
        })
    })?;
    Ok(Country { universities })
}

fn parse_faculty(node: &Value, path: &NodePath) -> PipelineResult<Faculty> {
    let departments = parse_children(node, Level::Faculty, path, |node, path| {
        Ok(Department {
            students: parse_students(node, path)?,
        })
    })?;
    Ok(Faculty { departments })
}

/// Parses the child mapping of a container at `level`.
fn parse_children<T>(
    node: &Value,
    level: Level,
    path: &NodePath,
    parse_child: impl Fn(&Value, &NodePath) -> PipelineResult<T>,
) -> PipelineResult<IndexMap<String, T>> {
    nested_object(node, level, path)?
        .iter()
        .map(|(name, child)| {
            let child_path = path.child(name);
            parse_child(child, &child_path).map(|parsed| (name.clone(), parsed))
        })
        .collect()
}

fn parse_students(
    node: &Value,
    path: &NodePath,
) -> PipelineResult<IndexMap<StudentId, Student>> {
    let mut students = IndexMap::new();

    for (key, record) in nested_object(node, Level::Department, path)? {
        let student_path = path.child(key);
        let id: StudentId = key.trim().parse().map_err(|_| {
            PipelineError::structure(
                student_path.to_string(),
                format!("student ID '{}' is not an integer", key),
            )
        })?;

        if students.insert(id, parse_student(record, &student_path)?).is_some() {
            return Err(PipelineError::structure(
                student_path.to_string(),
                format!("duplicate student ID {}", id),
            ));
        }
    }

    Ok(students)
}

fn parse_student(record: &Value, path: &NodePath) -> PipelineResult<Student> {
    let fields = record
        .as_object()
        .ok_or_else(|| PipelineError::structure(path.to_string(), "student must be an object"))?;

    let name = match fields.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            return Err(PipelineError::structure(
                path.to_string(),
                "'name' must be a string or null",
            ))
        }
    };

    let mut scores = BTreeMap::new();
    match fields.get("scores") {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (subject, score) in map {
                scores.insert(subject.clone(), parse_score(score, subject, path)?);
            }
        }
        Some(_) => {
            return Err(PipelineError::structure(
                path.to_string(),
                "'scores' must be an object",
            ))
        }
    }

    Ok(Student { name, scores })
}

fn parse_score(score: &Value, subject: &str, path: &NodePath) -> PipelineResult<Option<i64>> {
    match score {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| {
            PipelineError::structure(
                path.to_string(),
                format!("score '{}' must be an integer, got {}", subject, n),
            )
        }),
        other => Err(PipelineError::structure(
            path.to_string(),
            format!("score '{}' must be an integer or null, got {}", subject, other),
        )),
    }
}

/// The child mapping stored under `level`'s child key.
fn nested_object<'v>(
    node: &'v Value,
    level: Level,
    path: &NodePath,
) -> PipelineResult<&'v Map<String, Value>> {
    let key = level.child_key().ok_or_else(|| {
        PipelineError::structure(path.to_string(), format!("{} has no children", level))
    })?;

    let fields = node.as_object().ok_or_else(|| {
        PipelineError::structure(path.to_string(), format!("{} must be an object", level))
    })?;

    match fields.get(key) {
        Some(Value::Object(children)) => Ok(children),
        Some(_) => Err(PipelineError::structure(
            path.to_string(),
            format!("'{}' must be an object", key),
        )),
        None => Err(PipelineError::structure(
            path.to_string(),
            format!("missing key '{}'", key),
        )),
    }
}

/// The six-student sample dataset.
pub fn sample() -> HierarchyStore {
    const LAGOS_MATH: [&str; 5] = ["Africa", "Nigeria", "UniLagos", "Science", "Math"];
    const LAGOS_PHYSICS: [&str; 5] = ["Africa", "Nigeria", "UniLagos", "Science", "Physics"];
    const BERLIN_CS: [&str; 5] = ["Europe", "Germany", "UniBerlin", "Engineering", "CS"];

    let mut store = HierarchyStore::default();
    store.insert_student(LAGOS_MATH, 1, Student::new(Some("Ada"), Some(85), Some(78)));
    store.insert_student(LAGOS_MATH, 2, Student::new(None, Some(90), Some(88)));
    store.insert_student(LAGOS_MATH, 3, Student::new(Some("Tunde"), Some(-10), Some(65)));
    store.insert_student(LAGOS_PHYSICS, 4, Student::new(Some("Bola"), Some(92), None));
    store.insert_student(BERLIN_CS, 1, Student::new(Some("Hans"), Some(88), Some(90)));
    store.insert_student(BERLIN_CS, 5, Student::new(Some("Lena"), Some(95), Some(93)));
    store
}
