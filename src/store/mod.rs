//! In-memory hierarchy store and its navigation primitives.
//!
//! Every container level implements [`Container`], which lets one pair of
//! generic walkers (`descend` / `descend_mut`) produce the nodes of any level
//! together with their path from the root.
//!
//! Children keep the order they were inserted in, so every walk visits
//! nodes in the order the dataset lists them.

pub mod loader;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    Continent, Country, Department, Faculty, Hierarchy, Level, NodePath, Student, StudentId,
    University,
};
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

/// A non-leaf node holding a keyed mapping of children.
pub trait Container {
    type Key: Hash + Eq + Clone + fmt::Display;
    type Child;

    /// Level of the node implementing this trait.
    const LEVEL: Level;

    fn children(&self) -> &IndexMap<Self::Key, Self::Child>;
    fn children_mut(&mut self) -> &mut IndexMap<Self::Key, Self::Child>;

    fn is_empty(&self) -> bool {
        self.children().is_empty()
    }
}

macro_rules! impl_container {
    ($node:ty, $field:ident, $key:ty, $child:ty, $level:expr) => {
        impl Container for $node {
            type Key = $key;
            type Child = $child;
            const LEVEL: Level = $level;

            fn children(&self) -> &IndexMap<$key, $child> {
                &self.$field
            }

            fn children_mut(&mut self) -> &mut IndexMap<$key, $child> {
                &mut self.$field
            }
        }
    };
}

impl_container!(Hierarchy, continents, String, Continent, Level::Root);
impl_container!(Continent, countries, String, Country, Level::Continent);
impl_container!(Country, universities, String, University, Level::Country);
impl_container!(University, faculties, String, Faculty, Level::University);
impl_container!(Faculty, departments, String, Department, Level::Faculty);
impl_container!(Department, students, StudentId, Student, Level::Department);

/// Walks one level down from every parent, keeping track of paths.
pub fn descend<'a, C, I>(parents: I) -> impl Iterator<Item = (NodePath, &'a C::Child)> + 'a
where
    C: Container + 'a,
    C::Key: 'a,
    C::Child: 'a,
    I: Iterator<Item = (NodePath, &'a C)> + 'a,
{
    parents.flat_map(|(path, parent)| {
        parent
            .children()
            .iter()
            .map(move |(key, child)| (path.child(key), child))
    })
}

/// Mutable counterpart of [`descend`].
pub fn descend_mut<'a, C, I>(parents: I) -> impl Iterator<Item = (NodePath, &'a mut C::Child)> + 'a
where
    C: Container + 'a,
    C::Key: 'a,
    C::Child: 'a,
    I: Iterator<Item = (NodePath, &'a mut C)> + 'a,
{
    parents.flat_map(|(path, parent)| {
        parent
            .children_mut()
            .iter_mut()
            .map(move |(key, child)| (path.child(key), child))
    })
}

/// Deletes every key in `keys` from `map`. Missing keys are ignored.
///
/// The remaining entries keep their relative order. Returns how many entries
/// were actually removed.
pub fn remove_keys<'k, K, V, Q>(
    map: &mut IndexMap<K, V>,
    keys: impl IntoIterator<Item = &'k Q>,
) -> usize
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized + 'k,
{
    keys.into_iter()
        .filter(|key| map.shift_remove(*key).is_some())
        .count()
}

fn child_keys<C: Container>(container: &C) -> Vec<String> {
    container.children().keys().map(ToString::to_string).collect()
}

fn lookup<'a, C>(parent: &'a C, key: &str, path: &[&str]) -> PipelineResult<&'a C::Child>
where
    C: Container<Key = String>,
{
    parent.children().get(key).ok_or_else(|| {
        let level = C::LEVEL.child().unwrap_or(Level::Student);
        PipelineError::structure(path.join(" > "), format!("no {} named '{}'", level, key))
    })
}

/// Number of nodes per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub continents: usize,
    pub countries: usize,
    pub universities: usize,
    pub faculties: usize,
    pub departments: usize,
    pub students: usize,
}

/// Owns the full hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyStore {
    root: Hierarchy,
}

impl HierarchyStore {
    pub fn new(root: Hierarchy) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Hierarchy {
        &self.root
    }

    pub fn into_root(self) -> Hierarchy {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.continents.is_empty()
    }

    /// Inserts a student, creating any missing ancestors.
    ///
    /// Returns the student previously stored under the same ID, if any.
    pub fn insert_student(
        &mut self,
        ancestry: [&str; 5],
        id: StudentId,
        student: Student,
    ) -> Option<Student> {
        let [continent, country, university, faculty, department] = ancestry;
        self.root
            .continents
            .entry(continent.to_string())
            .or_default()
            .countries
            .entry(country.to_string())
            .or_default()
            .universities
            .entry(university.to_string())
            .or_default()
            .faculties
            .entry(faculty.to_string())
            .or_default()
            .departments
            .entry(department.to_string())
            .or_default()
            .students
            .insert(id, student)
    }

    /// Keys of the children of the node at `path`, which must name a node at
    /// `level`.
    pub fn children_at(&self, level: Level, path: &[&str]) -> PipelineResult<Vec<String>> {
        if path.len() != level.depth() {
            return Err(PipelineError::structure(
                path.join(" > "),
                format!(
                    "a {} path needs {} segment(s), got {}",
                    level,
                    level.depth(),
                    path.len()
                ),
            ));
        }

        let root = &self.root;
        match path {
            [] => Ok(child_keys(root)),
            [a] => Ok(child_keys(lookup(root, a, path)?)),
            [a, b] => Ok(child_keys(lookup(lookup(root, a, path)?, b, path)?)),
            [a, b, c] => {
                let country = lookup(lookup(root, a, path)?, b, path)?;
                Ok(child_keys(lookup(country, c, path)?))
            }
            [a, b, c, d] => {
                let country = lookup(lookup(root, a, path)?, b, path)?;
                let university = lookup(country, c, path)?;
                Ok(child_keys(lookup(university, d, path)?))
            }
            [a, b, c, d, e] => {
                let country = lookup(lookup(root, a, path)?, b, path)?;
                let faculty = lookup(lookup(country, c, path)?, d, path)?;
                Ok(child_keys(lookup(faculty, e, path)?))
            }
            _ => Err(PipelineError::structure(
                path.join(" > "),
                "students have no children",
            )),
        }
    }

    fn root_entry(&self) -> impl Iterator<Item = (NodePath, &Hierarchy)> {
        std::iter::once((NodePath::root(), &self.root))
    }

    pub fn continents(&self) -> impl Iterator<Item = (NodePath, &Continent)> + '_ {
        descend(self.root_entry())
    }

    pub fn countries(&self) -> impl Iterator<Item = (NodePath, &Country)> + '_ {
        descend(self.continents())
    }

    pub fn universities(&self) -> impl Iterator<Item = (NodePath, &University)> + '_ {
        descend(self.countries())
    }

    pub fn faculties(&self) -> impl Iterator<Item = (NodePath, &Faculty)> + '_ {
        descend(self.universities())
    }

    pub fn departments(&self) -> impl Iterator<Item = (NodePath, &Department)> + '_ {
        descend(self.faculties())
    }

    pub fn students(&self) -> impl Iterator<Item = (NodePath, &Student)> + '_ {
        descend(self.departments())
    }

    /// The root paired with its (empty) path, for walkers starting at the top.
    pub fn root_entry_mut(&mut self) -> impl Iterator<Item = (NodePath, &mut Hierarchy)> {
        std::iter::once((NodePath::root(), &mut self.root))
    }

    pub fn continents_mut(&mut self) -> impl Iterator<Item = (NodePath, &mut Continent)> + '_ {
        descend_mut(self.root_entry_mut())
    }

    pub fn countries_mut(&mut self) -> impl Iterator<Item = (NodePath, &mut Country)> + '_ {
        descend_mut(self.continents_mut())
    }

    pub fn universities_mut(&mut self) -> impl Iterator<Item = (NodePath, &mut University)> + '_ {
        descend_mut(self.countries_mut())
    }

    pub fn faculties_mut(&mut self) -> impl Iterator<Item = (NodePath, &mut Faculty)> + '_ {
        descend_mut(self.universities_mut())
    }

    pub fn departments_mut(&mut self) -> impl Iterator<Item = (NodePath, &mut Department)> + '_ {
        descend_mut(self.faculties_mut())
    }

    pub fn counts(&self) -> LevelCounts {
        LevelCounts {
            continents: self.continents().count(),
            countries: self.countries().count(),
            universities: self.universities().count(),
            faculties: self.faculties().count(),
            departments: self.departments().count(),
            students: self.students().count(),
        }
    }
}

impl From<Hierarchy> for HierarchyStore {
    fn from(root: Hierarchy) -> Self {
        Self::new(root)
    }
}
