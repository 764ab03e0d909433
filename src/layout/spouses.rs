use std::collections::{BTreeMap, HashSet};

use crate::config::LayoutConfig;
use crate::graph::{PersonId, Sex};

use super::types::{NodeBox, View};

/// Left/right orientation for a couple: male left when both sexes are
/// present, otherwise keep the existing x order.
pub(crate) fn spouse_left_right(
    view: View<'_>,
    nodes: &BTreeMap<PersonId, NodeBox>,
    a: PersonId,
    b: PersonId,
) -> (PersonId, PersonId) {
    match (view.sex(a), view.sex(b)) {
        (Sex::Male, Sex::Female) => (a, b),
        (Sex::Female, Sex::Male) => (b, a),
        _ => {
            let ax = nodes.get(&a).map(|n| n.x).unwrap_or(0.0);
            let bx = nodes.get(&b).map(|n| n.x).unwrap_or(0.0);
            if ax <= bx { (a, b) } else { (b, a) }
        }
    }
}

/// Repack a row compactly from its left edge: couples strictly adjacent
/// with the intra-couple gap, everything else separated by the row gap.
/// Order of the groups follows the incoming row order.
pub(crate) fn enforce_spouse_adjacency_in_row(
    view: View<'_>,
    cfg: &LayoutConfig,
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    row: &[PersonId],
) {
    if row.is_empty() {
        return;
    }
    let in_row: HashSet<PersonId> = row.iter().copied().collect();
    let mut visited: HashSet<PersonId> = HashSet::new();
    let mut groups: Vec<Vec<PersonId>> = Vec::new();
    for &id in row {
        if visited.contains(&id) {
            continue;
        }
        match view.spouse(id).filter(|s| in_row.contains(s) && !visited.contains(s)) {
            Some(s) => {
                let (left, right) = spouse_left_right(view, nodes, id, s);
                visited.insert(left);
                visited.insert(right);
                groups.push(vec![left, right]);
            }
            None => {
                visited.insert(id);
                groups.push(vec![id]);
            }
        }
    }

    let mut cursor = row
        .iter()
        .filter_map(|id| nodes.get(id).map(|n| n.x))
        .fold(f32::MAX, f32::min);
    if cursor == f32::MAX {
        cursor = 0.0;
    }
    for group in groups {
        match group.as_slice() {
            [left, right] => {
                if let Some(n) = nodes.get_mut(left) {
                    n.x = cursor;
                }
                let right_x = cursor + cfg.card_w + cfg.min_couple_gap;
                if let Some(n) = nodes.get_mut(right) {
                    n.x = right_x;
                }
                cursor = right_x + cfg.card_w + cfg.min_h_gap;
            }
            [single] => {
                if let Some(n) = nodes.get_mut(single) {
                    n.x = cursor;
                }
                cursor += cfg.card_w + cfg.min_h_gap;
            }
            _ => {}
        }
    }
}

/// Pull any couple split apart by earlier passes back together without
/// repacking the whole row: the pair is re-anchored at its leftmost
/// member, sex-aware. Residual collisions are left to the de-overlap
/// sweep that follows.
pub(crate) fn regroup_couples_in_row(
    view: View<'_>,
    cfg: &LayoutConfig,
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    row: &[PersonId],
) {
    let in_row: HashSet<PersonId> = row.iter().copied().collect();
    let mut done: HashSet<PersonId> = HashSet::new();
    for &id in row {
        if done.contains(&id) {
            continue;
        }
        let Some(s) = view.spouse(id).filter(|s| in_row.contains(s)) else {
            continue;
        };
        done.insert(id);
        done.insert(s);
        let (left, right) = spouse_left_right(view, nodes, id, s);
        let (Some(ln), Some(rn)) = (nodes.get(&left).copied(), nodes.get(&right).copied()) else {
            continue;
        };
        let anchor = ln.x.min(rn.x);
        if let Some(n) = nodes.get_mut(&left) {
            n.x = anchor;
        }
        if let Some(n) = nodes.get_mut(&right) {
            n.x = anchor + cfg.card_w + cfg.min_couple_gap;
        }
    }
}

/// Bounded left-to-right sweep pushing later nodes right until every
/// neighbor pair in the row satisfies its minimum gap (the couple gap for
/// spouses, the child gap otherwise).
pub(crate) fn de_overlap_row(
    view: View<'_>,
    cfg: &LayoutConfig,
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    row: &[PersonId],
) {
    if row.len() < 2 {
        return;
    }
    for _ in 0..cfg.overlap_passes {
        let mut order: Vec<PersonId> = row.to_vec();
        order.sort_by(|a, b| {
            let ax = nodes.get(a).map(|n| n.x).unwrap_or(0.0);
            let bx = nodes.get(b).map(|n| n.x).unwrap_or(0.0);
            ax.total_cmp(&bx).then(a.cmp(b))
        });
        let mut moved = false;
        for pair in order.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let gap = if view.spouse(prev) == Some(cur) {
                cfg.min_couple_gap
            } else {
                cfg.min_child_gap
            };
            let prev_right = match nodes.get(&prev) {
                Some(n) => n.right(),
                None => continue,
            };
            if let Some(n) = nodes.get_mut(&cur) {
                let min_x = prev_right + gap;
                if n.x < min_x {
                    n.x = min_x;
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
}
