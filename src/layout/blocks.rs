use std::collections::{BTreeMap, HashSet};

use crate::graph::PersonId;

use super::types::{NodeBox, View};

/// A horizontal span of nodes moved as one rigid piece.
#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub members: Vec<PersonId>,
    pub left: f32,
    pub right: f32,
}

impl Span {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub(crate) fn from_members(
        members: Vec<PersonId>,
        nodes: &BTreeMap<PersonId, NodeBox>,
    ) -> Option<Self> {
        let mut left = f32::MAX;
        let mut right = f32::MIN;
        for id in &members {
            let n = nodes.get(id)?;
            left = left.min(n.x);
            right = right.max(n.right());
        }
        if members.is_empty() {
            return None;
        }
        Some(Self {
            members,
            left,
            right,
        })
    }

    pub(crate) fn shift(&mut self, dx: f32, nodes: &mut BTreeMap<PersonId, NodeBox>) {
        if dx == 0.0 {
            return;
        }
        for id in &self.members {
            if let Some(n) = nodes.get_mut(id) {
                n.x += dx;
            }
        }
        self.left += dx;
        self.right += dx;
    }
}

/// Group a parent row into spans, one per couple or lone person, ordered
/// left to right.
pub(crate) fn build_parent_row_blocks(
    view: View<'_>,
    nodes: &BTreeMap<PersonId, NodeBox>,
    row: &[PersonId],
) -> Vec<Span> {
    let in_row: HashSet<PersonId> = row.iter().copied().collect();
    let mut sorted: Vec<PersonId> = row.to_vec();
    sorted.sort_by(|a, b| {
        let ax = nodes.get(a).map(|n| n.x).unwrap_or(0.0);
        let bx = nodes.get(b).map(|n| n.x).unwrap_or(0.0);
        ax.total_cmp(&bx).then(a.cmp(b))
    });

    let mut seen: HashSet<PersonId> = HashSet::new();
    let mut blocks: Vec<Span> = Vec::new();
    for &id in &sorted {
        if seen.contains(&id) {
            continue;
        }
        let members = match view.spouse(id).filter(|s| in_row.contains(s) && !seen.contains(s)) {
            Some(s) => {
                seen.insert(id);
                seen.insert(s);
                vec![id, s]
            }
            None => {
                seen.insert(id);
                vec![id]
            }
        };
        if let Some(span) = Span::from_members(members, nodes) {
            blocks.push(span);
        }
    }
    blocks.sort_by(|a, b| a.left.total_cmp(&b.left));
    blocks
}

/// Pack spans compactly left to right at the given gap. The caller's
/// ordering is preserved; only x positions move.
pub(crate) fn pack_blocks_left_to_right(
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    blocks: &mut [Span],
    gap: f32,
) {
    if blocks.len() <= 1 {
        return;
    }
    let mut prev_right = blocks[0].left;
    for (i, block) in blocks.iter_mut().enumerate() {
        let desired_left = if i == 0 { prev_right } else { prev_right + gap };
        block.shift(desired_left - block.left, nodes);
        prev_right = block.right;
    }
}
