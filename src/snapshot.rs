use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{FamilyGraph, PersonId, Sex};

pub const SNAPSHOT_VERSION: u32 = 1;

/// One person record as persisted by the storage collaborator. All
/// references are stable string ids; edge lists may be one-sided in old
/// data and are symmetrized on rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMember {
    pub id: String,
    pub name: String,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    /// Subset of `children` adopted by this parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adopted: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTree {
    pub version: u32,
    pub root: String,
    pub members: BTreeMap<String, StoredMember>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("root id not present in snapshot: {id}")]
    UnknownRoot { id: String },
    #[error("duplicate member id: {id}")]
    DuplicateId { id: String },
    #[error("snapshot has no members")]
    Empty,
}

/// Rebuild the live graph from a snapshot. Ids are authoritative; dangling
/// references are dropped, one-sided parent/child edges are symmetrized,
/// and a person keeps at most two parents (first two in record order).
pub fn rebuild(stored: &StoredTree) -> Result<FamilyGraph, SnapshotError> {
    if stored.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: stored.version,
        });
    }
    if stored.members.is_empty() {
        return Err(SnapshotError::Empty);
    }
    if !stored.members.contains_key(&stored.root) {
        return Err(SnapshotError::UnknownRoot {
            id: stored.root.clone(),
        });
    }

    let mut graph = FamilyGraph::empty();
    let mut ids: BTreeMap<&str, PersonId> = BTreeMap::new();
    for (key, rec) in &stored.members {
        let id = graph
            .insert_with_key(key, &rec.name, rec.sex)
            .map_err(|_| SnapshotError::DuplicateId { id: key.clone() })?;
        ids.insert(key.as_str(), id);
    }

    for (key, rec) in &stored.members {
        let me = ids[key.as_str()];
        if let Some(spouse_key) = rec.spouse.as_deref() {
            if let Some(&sp) = ids.get(spouse_key) {
                // Symmetric by construction; conflicting claims lose to the
                // first marriage encountered.
                let _ = graph.add_spouse(me, sp);
            }
        }
        for child_key in &rec.children {
            if let Some(&child) = ids.get(child_key.as_str()) {
                graph.link_lenient(me, child);
            }
        }
        for parent_key in &rec.parents {
            if let Some(&parent) = ids.get(parent_key.as_str()) {
                graph.link_lenient(parent, me);
            }
        }
    }

    for (key, rec) in &stored.members {
        let me = ids[key.as_str()];
        for adopted_key in &rec.adopted {
            if let Some(&child) = ids.get(adopted_key.as_str()) {
                graph.mark_adopted(me, child);
            }
        }
    }

    graph.set_root(ids[stored.root.as_str()]);
    Ok(graph)
}

/// Project the live graph back into the snapshot shape. Deterministic:
/// members are keyed by their stable ids in a sorted map.
pub fn serialize(graph: &FamilyGraph) -> StoredTree {
    let mut members = BTreeMap::new();
    for person in graph.persons() {
        members.insert(
            person.key.clone(),
            StoredMember {
                id: person.key.clone(),
                name: person.name.clone(),
                sex: person.sex,
                spouse: person.spouse.map(|s| graph.person(s).key.clone()),
                parents: person
                    .parents
                    .iter()
                    .map(|&p| graph.person(p).key.clone())
                    .collect(),
                children: person
                    .children
                    .iter()
                    .map(|&c| graph.person(c).key.clone())
                    .collect(),
                adopted: person
                    .adopted_children
                    .iter()
                    .map(|&c| graph.person(c).key.clone())
                    .collect(),
            },
        );
    }
    StoredTree {
        version: SNAPSHOT_VERSION,
        root: graph.person(graph.root()).key.clone(),
        members,
    }
}
