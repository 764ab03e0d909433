use std::collections::{HashSet, VecDeque};

use crate::graph::{FamilyGraph, PersonId, Sex};

/// Depth-stamped breadth-first descent from `root`: children one level
/// deeper, a spouse at the same level as their partner. This is the walk
/// the relationship math depends on; parents are never followed upward.
pub fn descend(graph: &FamilyGraph, root: PersonId, mut visit: impl FnMut(PersonId, i32)) {
    let mut queue: VecDeque<(PersonId, i32)> = VecDeque::new();
    let mut seen: HashSet<PersonId> = HashSet::new();
    queue.push_back((root, 0));
    while let Some((id, depth)) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        visit(id, depth);
        let person = graph.person(id);
        for &child in &person.children {
            queue.push_back((child, depth + 1));
        }
        if let Some(spouse) = person.spouse {
            queue.push_back((spouse, depth));
        }
    }
}

/// Walk the whole connected component of `start` through spouse, child and
/// parent edges. Used for whole-tree statistics, where depth is
/// meaningless and spouse-side ancestors must not be skipped.
pub fn walk_connected(graph: &FamilyGraph, start: PersonId, mut visit: impl FnMut(PersonId)) {
    let mut stack = vec![start];
    let mut seen: HashSet<PersonId> = HashSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        visit(id);
        let person = graph.person(id);
        if let Some(spouse) = person.spouse {
            stack.push(spouse);
        }
        for &child in &person.children {
            stack.push(child);
        }
        for &parent in &person.parents {
            stack.push(parent);
        }
    }
}

/// Locate a person in the descent from the graph root, returning its depth.
/// `None` means the person is not reachable from the root.
pub fn locate(graph: &FamilyGraph, target: PersonId) -> Option<(PersonId, i32)> {
    let mut found = None;
    descend(graph, graph.root(), |id, depth| {
        if found.is_none() && id == target {
            found = Some((id, depth));
        }
    });
    found
}

/// First person in descent order whose display name matches.
pub fn find_by_name(graph: &FamilyGraph, name: &str) -> Option<PersonId> {
    let mut found = None;
    descend(graph, graph.root(), |id, _| {
        if found.is_none() && graph.person(id).name == name {
            found = Some(id);
        }
    });
    found
}

/// All members of the root's connected component, no duplicates.
pub fn collect_connected(graph: &FamilyGraph) -> Vec<PersonId> {
    let mut out = Vec::new();
    walk_connected(graph, graph.root(), |id| out.push(id));
    out
}

/// First parent of `child` in descent order. With two parents this returns
/// whichever the breadth-first walk reaches first, which is stable for a
/// given graph.
pub fn parent_of(graph: &FamilyGraph, child: PersonId) -> Option<PersonId> {
    let mut found = None;
    descend(graph, graph.root(), |id, _| {
        if found.is_none() && graph.person(id).children.contains(&child) {
            found = Some(id);
        }
    });
    found
}

pub fn father_of(graph: &FamilyGraph, child: PersonId) -> Option<PersonId> {
    let p = parent_of(graph, child)?;
    if graph.person(p).sex == Sex::Male {
        Some(p)
    } else {
        graph.person(p).spouse
    }
}

pub fn mother_of(graph: &FamilyGraph, child: PersonId) -> Option<PersonId> {
    let p = parent_of(graph, child)?;
    if graph.person(p).sex == Sex::Female {
        Some(p)
    } else {
        graph.person(p).spouse
    }
}

pub fn children_of(graph: &FamilyGraph, id: PersonId) -> Vec<PersonId> {
    graph.person(id).children.clone()
}

/// Children of the first found parent, minus the person themselves.
pub fn siblings_of(graph: &FamilyGraph, id: PersonId) -> Vec<PersonId> {
    match parent_of(graph, id) {
        Some(parent) => graph
            .person(parent)
            .children
            .iter()
            .copied()
            .filter(|&c| c != id)
            .collect(),
        None => Vec::new(),
    }
}

pub fn spouse_of(graph: &FamilyGraph, id: PersonId) -> Option<PersonId> {
    graph.person(id).spouse
}
