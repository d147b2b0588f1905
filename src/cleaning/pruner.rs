//! Bottom-up removal of empty containers.
//!
//! Five passes run in a fixed order: departments, faculties, universities,
//! countries, continents. Each pass finishes before the next begins, so an
//! emptiness created by one pass is seen by the pass above it.

use crate::models::{Level, NodePath, PruneReport, PrunedContainer};
use crate::store::{remove_keys, Container, HierarchyStore};
use tracing::{debug, info};

/// Removes every empty container from the store.
pub fn prune(store: &mut HierarchyStore) -> PruneReport {
    let mut report = PruneReport::default();

    prune_pass(store.faculties_mut(), &mut report);
    prune_pass(store.universities_mut(), &mut report);
    prune_pass(store.countries_mut(), &mut report);
    prune_pass(store.continents_mut(), &mut report);
    prune_pass(store.root_entry_mut(), &mut report);

    info!(
        "Pruning: removed {} container(s) ({} departments, {} faculties, {} universities, {} countries, {} continents)",
        report.removed.len(),
        report.count_at(Level::Department),
        report.count_at(Level::Faculty),
        report.count_at(Level::University),
        report.count_at(Level::Country),
        report.count_at(Level::Continent),
    );

    report
}

/// Removes the empty children of every parent yielded by `parents`.
fn prune_pass<'a, C, I>(parents: I, report: &mut PruneReport)
where
    C: Container + 'a,
    C::Child: Container,
    I: Iterator<Item = (NodePath, &'a mut C)>,
{
    let removed: usize = parents
        .map(|(path, parent)| prune_children(&path, parent, report))
        .sum();
    debug!(
        "{} pass removed {} container(s)",
        <C::Child as Container>::LEVEL,
        removed
    );
}

/// Collect-then-delete over one parent's children.
fn prune_children<C>(path: &NodePath, parent: &mut C, report: &mut PruneReport) -> usize
where
    C: Container,
    C::Child: Container,
{
    let empty: Vec<C::Key> = parent
        .children()
        .iter()
        .filter(|(_, child)| child.is_empty())
        .map(|(key, _)| key.clone())
        .collect();

    for key in &empty {
        let child_path = path.child(key);
        debug!("Pruning empty {} {}", <C::Child as Container>::LEVEL, child_path);
        report.removed.push(PrunedContainer {
            level: <C::Child as Container>::LEVEL,
            path: child_path,
        });
    }

    remove_keys(parent.children_mut(), &empty)
}
