use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::{FamilyGraph, Person, PersonId, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Person,
    Union,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
}

/// A placed node: either a person card or a synthesized union marker.
/// `members` names the source person, or the spouses a union stands for.
#[derive(Debug, Clone, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub kind: NodeKind,
    pub generation: i32,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub members: Vec<String>,
}

/// A routed connection, parent to union or union to child.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub from_side: Side,
    pub to_side: Side,
    pub adopted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
    pub width: f32,
    pub height: f32,
    pub min_gen: i32,
    pub max_gen: i32,
}

impl LayoutResult {
    /// The displayable empty diagram, used for empty or fully filtered
    /// graphs instead of an error.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            width: 800.0,
            height: 600.0,
            min_gen: 0,
            max_gen: 0,
        }
    }
}

/// Working geometry for one node while the pipeline is still moving things.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeBox {
    pub generation: i32,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NodeBox {
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }
}

/// A read view of the graph restricted to the visible subset. Relations
/// leading outside the subset are hidden, which is what lets the same
/// pipeline lay out both the full tree and a bloodline filter of it.
#[derive(Clone, Copy)]
pub(crate) struct View<'a> {
    pub graph: &'a FamilyGraph,
    pub visible: &'a BTreeSet<PersonId>,
}

impl<'a> View<'a> {
    pub fn contains(&self, id: PersonId) -> bool {
        self.visible.contains(&id)
    }

    pub fn person(&self, id: PersonId) -> &'a Person {
        self.graph.person(id)
    }

    pub fn key(&self, id: PersonId) -> &'a str {
        &self.graph.person(id).key
    }

    pub fn sex(&self, id: PersonId) -> Sex {
        self.graph.person(id).sex
    }

    pub fn spouse(&self, id: PersonId) -> Option<PersonId> {
        self.graph.person(id).spouse.filter(|&s| self.contains(s))
    }

    pub fn parents(&self, id: PersonId) -> Vec<PersonId> {
        self.graph
            .person(id)
            .parents
            .iter()
            .copied()
            .filter(|&p| self.contains(p))
            .collect()
    }

    pub fn children(&self, id: PersonId) -> Vec<PersonId> {
        self.graph
            .person(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.contains(c))
            .collect()
    }

    /// Visible ids in stable (arena) order.
    pub fn iter(&self) -> impl Iterator<Item = PersonId> + 'a {
        self.visible.iter().copied()
    }
}
