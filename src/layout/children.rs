use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::graph::PersonId;

use super::types::{NodeBox, View};
use super::blocks::Span;

/// Children placed under the same parent block, keyed by that block's
/// order within the generation. The order is what keeps sibling runs from
/// interleaving when rows are repacked.
#[derive(Debug, Clone)]
pub(crate) struct ChildGroup {
    pub order: usize,
    pub ids: Vec<PersonId>,
}

pub(crate) fn register_child_group(
    groups_by_gen: &mut BTreeMap<i32, Vec<ChildGroup>>,
    generation: i32,
    order: usize,
    ids: Vec<PersonId>,
) {
    groups_by_gen
        .entry(generation)
        .or_default()
        .push(ChildGroup { order, ids });
}

/// People in the row that no block claimed (spouses who married into the
/// generation, mostly) are folded into the group of their recorded parent
/// block, or into a trailing group of their own.
pub(crate) fn augment_groups_with_singletons(
    generation: i32,
    groups_by_gen: &mut BTreeMap<i32, Vec<ChildGroup>>,
    row: &[PersonId],
    parent_order: &HashMap<PersonId, usize>,
    nodes: &BTreeMap<PersonId, NodeBox>,
) {
    let grouped: HashSet<PersonId> = groups_by_gen
        .get(&generation)
        .map(|groups| groups.iter().flat_map(|g| g.ids.iter().copied()).collect())
        .unwrap_or_default();
    let singles: Vec<PersonId> = row
        .iter()
        .copied()
        .filter(|id| !grouped.contains(id))
        .collect();
    if singles.is_empty() {
        return;
    }

    let mut by_order: BTreeMap<usize, Vec<PersonId>> = BTreeMap::new();
    for id in singles {
        let order = parent_order.get(&id).copied().unwrap_or(usize::MAX);
        by_order.entry(order).or_default().push(id);
    }

    for (order, mut ids) in by_order {
        ids.sort_by(|a, b| {
            let ax = nodes.get(a).map(|n| n.x).unwrap_or(0.0);
            let bx = nodes.get(b).map(|n| n.x).unwrap_or(0.0);
            ax.total_cmp(&bx).then(a.cmp(b))
        });
        let groups = groups_by_gen.entry(generation).or_default();
        match groups.iter_mut().find(|g| g.order == order) {
            Some(group) => group.ids.extend(ids),
            None => groups.push(ChildGroup { order, ids }),
        }
    }
}

/// Merge groups connected by a marriage inside the row, so a couple never
/// straddles two sibling groups. Union-find over group indices; the merged
/// group keeps the smaller order.
pub(crate) fn merge_child_groups_by_spouses(
    view: View<'_>,
    generation: i32,
    groups_by_gen: &mut BTreeMap<i32, Vec<ChildGroup>>,
    row: &[PersonId],
) {
    let Some(groups) = groups_by_gen.get(&generation) else {
        return;
    };
    if groups.len() <= 1 || row.is_empty() {
        return;
    }
    let in_row: HashSet<PersonId> = row.iter().copied().collect();
    let mut group_of: HashMap<PersonId, usize> = HashMap::new();
    for (gi, group) in groups.iter().enumerate() {
        for &id in &group.ids {
            group_of.insert(id, gi);
        }
    }

    let mut parent: Vec<usize> = (0..groups.len()).collect();
    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        if parent[x] != x {
            let root = find(parent, parent[x]);
            parent[x] = root;
        }
        parent[x]
    }

    for &id in row {
        let Some(s) = view.spouse(id).filter(|s| in_row.contains(s)) else {
            continue;
        };
        if let (Some(&ga), Some(&gb)) = (group_of.get(&id), group_of.get(&s)) {
            let (ra, rb) = (find(&mut parent, ga), find(&mut parent, gb));
            if ra != rb {
                parent[rb] = ra;
            }
        }
    }

    let groups = groups_by_gen.get_mut(&generation).unwrap_or_else(|| unreachable!());
    let mut buckets: BTreeMap<usize, ChildGroup> = BTreeMap::new();
    for gi in 0..groups.len() {
        let root = find(&mut parent, gi);
        let entry = buckets.entry(root).or_insert_with(|| ChildGroup {
            order: groups[gi].order,
            ids: Vec::new(),
        });
        entry.order = entry.order.min(groups[gi].order);
        entry.ids.extend(groups[gi].ids.iter().copied());
    }
    let mut merged: Vec<ChildGroup> = buckets.into_values().collect();
    merged.sort_by_key(|g| g.order);
    *groups = merged;
}

/// Center the row's sibling blocks under their parents' union centers, in
/// group order, resolving overlap with a forward push and a backward pull.
/// Within each block, children are reordered by the fine ancestor index so
/// cousin clusters line up with their own branch.
#[allow(clippy::too_many_arguments)]
pub(crate) fn enforce_child_group_order(
    view: View<'_>,
    cfg: &LayoutConfig,
    generation: i32,
    groups_by_gen: &BTreeMap<i32, Vec<ChildGroup>>,
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    row: &[PersonId],
    parent_order: &HashMap<PersonId, usize>,
    desired_center_by_order: &BTreeMap<usize, f32>,
    fine_index: &HashMap<PersonId, f64>,
) {
    if row.is_empty() {
        return;
    }
    let mut membership: HashMap<PersonId, usize> = HashMap::new();
    if let Some(groups) = groups_by_gen.get(&generation) {
        for group in groups {
            for &id in &group.ids {
                membership.insert(id, group.order);
            }
        }
    }
    for &id in row {
        if !membership.contains_key(&id) {
            if let Some(&order) = parent_order.get(&id) {
                membership.insert(id, order);
            }
        }
    }

    // Bucket the row; unclaimed nodes ride along as solo trailing blocks.
    let mut by_order: BTreeMap<usize, Vec<PersonId>> = BTreeMap::new();
    let mut solos: Vec<PersonId> = Vec::new();
    for &id in row {
        match membership.get(&id) {
            Some(&order) => by_order.entry(order).or_default().push(id),
            None => solos.push(id),
        }
    }
    if by_order.len() + solos.len() <= 1 {
        return;
    }

    let mut blocks: Vec<(usize, Span)> = Vec::new();
    for (order, mut ids) in by_order {
        ids.sort_by(|a, b| {
            let fa = fine_index.get(a);
            let fb = fine_index.get(b);
            match (fa, fb) {
                (Some(fa), Some(fb)) if fa != fb => fa.total_cmp(fb),
                _ => {
                    let ax = nodes.get(a).map(|n| n.x).unwrap_or(0.0);
                    let bx = nodes.get(b).map(|n| n.x).unwrap_or(0.0);
                    ax.total_cmp(&bx).then(a.cmp(b))
                }
            }
        });
        repack_block(view, cfg, nodes, &ids);
        if let Some(span) = Span::from_members(ids, nodes) {
            blocks.push((order, span));
        }
    }
    for id in solos {
        if let Some(span) = Span::from_members(vec![id], nodes) {
            blocks.push((usize::MAX, span));
        }
    }
    blocks.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.left.total_cmp(&b.1.left)));

    let desired: Vec<f32> = blocks
        .iter()
        .map(|(order, span)| {
            desired_center_by_order
                .get(order)
                .copied()
                .unwrap_or_else(|| {
                    let centers: Vec<f32> = span
                        .members
                        .iter()
                        .filter_map(|id| nodes.get(id).map(|n| n.center_x()))
                        .collect();
                    if centers.is_empty() {
                        0.0
                    } else {
                        centers.iter().sum::<f32>() / centers.len() as f32
                    }
                })
        })
        .collect();

    let mut spans: Vec<Span> = blocks.into_iter().map(|(_, s)| s).collect();
    align_child_blocks_to_parents(nodes, &mut spans, &desired, cfg.min_block_gap);
}

/// Lay the sorted ids of one block edge to edge from the block's current
/// left, couples at the couple gap, everyone else at the child gap.
fn repack_block(
    view: View<'_>,
    cfg: &LayoutConfig,
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    ids: &[PersonId],
) {
    let Some(left) = ids
        .iter()
        .filter_map(|id| nodes.get(id).map(|n| n.x))
        .reduce(f32::min)
    else {
        return;
    };
    let mut cursor = left;
    for (i, id) in ids.iter().enumerate() {
        if let Some(n) = nodes.get_mut(id) {
            n.x = cursor;
        }
        let gap = match ids.get(i + 1) {
            Some(&next) if view.spouse(*id) == Some(next) => cfg.min_couple_gap,
            Some(_) => cfg.min_child_gap,
            None => 0.0,
        };
        cursor += cfg.card_w + gap;
    }
}

/// Two sweeps: left to right placing each block at its desired center but
/// never before the previous block plus the gap, then right to left
/// pulling blocks back toward their centers where room remains.
pub(crate) fn align_child_blocks_to_parents(
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    blocks: &mut [Span],
    desired_centers: &[f32],
    gap: f32,
) {
    if blocks.is_empty() {
        return;
    }
    let mut targets: Vec<(f32, f32)> = Vec::with_capacity(blocks.len());
    let first_left = desired_centers[0] - blocks[0].width() / 2.0;
    targets.push((first_left, first_left + blocks[0].width()));
    for i in 1..blocks.len() {
        let want_left = desired_centers[i] - blocks[i].width() / 2.0;
        let min_left = targets[i - 1].1 + gap;
        let left = want_left.max(min_left);
        targets.push((left, left + blocks[i].width()));
    }
    for i in (0..blocks.len().saturating_sub(1)).rev() {
        let want_left = desired_centers[i] - blocks[i].width() / 2.0;
        let max_right = targets[i + 1].0 - gap;
        let new_right = targets[i].1.min(max_right);
        let new_left = want_left.max(targets[i].0).min(new_right - blocks[i].width());
        targets[i] = (new_left, new_left + blocks[i].width());
    }
    for (block, &(left, _)) in blocks.iter_mut().zip(targets.iter()) {
        block.shift(left - block.left, nodes);
    }
}
