use std::collections::BTreeSet;

use crate::graph::{FamilyGraph, PersonId};

/// How far the focus-relative subgraph widens beyond the direct line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum KinDepth {
    /// Ancestors and descendants of the focus only.
    #[default]
    DirectLine,
    /// Plus siblings of every visible person.
    Siblings,
    /// Plus cousins.
    Cousins,
    /// Plus second cousins (parents' cousins and children of cousins).
    SecondCousins,
}

impl KinDepth {
    /// Clamp a numeric filter level (0..=3) to a depth.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::DirectLine,
            1 => Self::Siblings,
            2 => Self::Cousins,
            _ => Self::SecondCousins,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    pub kin_depth: KinDepth,
    /// Add (but never traverse through) the spouses of visible people.
    pub include_spouses: bool,
}

fn ancestors_and_descendants(graph: &FamilyGraph, focus: PersonId, visible: &mut BTreeSet<PersonId>) {
    let mut stack = vec![focus];
    let mut seen = BTreeSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        visible.insert(id);
        stack.extend(graph.person(id).parents.iter().copied());
    }
    let mut stack = vec![focus];
    let mut seen = BTreeSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        visible.insert(id);
        stack.extend(graph.person(id).children.iter().copied());
    }
}

fn siblings(graph: &FamilyGraph, id: PersonId) -> BTreeSet<PersonId> {
    let mut out = BTreeSet::new();
    for &p in &graph.person(id).parents {
        for &c in &graph.person(p).children {
            if c != id {
                out.insert(c);
            }
        }
    }
    out
}

fn cousins(graph: &FamilyGraph, id: PersonId) -> BTreeSet<PersonId> {
    let mut out = BTreeSet::new();
    for &p in &graph.person(id).parents {
        for uncle_or_aunt in siblings(graph, p) {
            out.extend(graph.person(uncle_or_aunt).children.iter().copied());
        }
    }
    out
}

fn second_cousins(graph: &FamilyGraph, id: PersonId) -> BTreeSet<PersonId> {
    let mut out = BTreeSet::new();
    for &p in &graph.person(id).parents {
        out.extend(cousins(graph, p));
    }
    for c in cousins(graph, id) {
        out.extend(graph.person(c).children.iter().copied());
    }
    out
}

/// Select the visible subset for a focus person. Direct line first, then
/// each kin level widens the set based on everyone already visible, and
/// spouses come last so they never pull in further relatives.
pub(crate) fn filter_bloodline(
    graph: &FamilyGraph,
    focus: PersonId,
    opts: &FilterOptions,
) -> BTreeSet<PersonId> {
    let mut visible: BTreeSet<PersonId> = BTreeSet::new();
    ancestors_and_descendants(graph, focus, &mut visible);

    let stages: [(KinDepth, fn(&FamilyGraph, PersonId) -> BTreeSet<PersonId>); 3] = [
        (KinDepth::Siblings, siblings),
        (KinDepth::Cousins, cousins),
        (KinDepth::SecondCousins, second_cousins),
    ];
    for (depth, widen) in stages {
        if opts.kin_depth < depth {
            break;
        }
        let snapshot: Vec<PersonId> = visible.iter().copied().collect();
        for id in snapshot {
            visible.extend(widen(graph, id));
        }
    }

    if opts.include_spouses {
        let snapshot: Vec<PersonId> = visible.iter().copied().collect();
        for id in snapshot {
            if let Some(s) = graph.person(id).spouse {
                visible.insert(s);
            }
        }
    }
    visible
}
