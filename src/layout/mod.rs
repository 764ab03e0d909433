//! Layout pipeline: generation assignment, supernode ordering, then
//! geometric placement of person cards, union markers and edges. The
//! whole pass is a pure function of the graph and the config; rerunning
//! it on an unchanged graph yields identical output.

mod blocks;
mod children;
mod filter;
pub(crate) mod generations;
pub(crate) mod ordering;
mod spouses;
pub(crate) mod types;

pub use filter::{FilterOptions, KinDepth};
pub use types::{LayoutEdge, LayoutResult, NodeKind, PositionedNode, Side};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::LayoutConfig;
use crate::graph::{FamilyGraph, PersonId};

use blocks::{build_parent_row_blocks, pack_blocks_left_to_right};
use children::{
    augment_groups_with_singletons, enforce_child_group_order, merge_child_groups_by_spouses,
    register_child_group, ChildGroup,
};
use filter::filter_bloodline;
use generations::assign_generations;
use ordering::{
    build_supernode_layers, couple_unit_id, minimize_crossings, upstream_index_multi,
    SupernodeBuild,
};
use spouses::{de_overlap_row, enforce_spouse_adjacency_in_row, regroup_couples_in_row};
use types::{NodeBox, View};

/// A synthesized union marker: the anchor point child edges hang from.
#[derive(Debug, Clone, Copy)]
struct UnionBox {
    generation: i32,
    x: f32,
    y: f32,
    a: PersonId,
    b: Option<PersonId>,
}

/// A parent block: one couple (shared children) or one single parent
/// (own or exclusive children). `sort_x` orders blocks within the
/// generation; exclusive-child blocks get nudged just outside the couple.
#[derive(Debug, Clone)]
struct ParentBlock {
    generation: i32,
    parents: Vec<PersonId>,
    children: Vec<PersonId>,
    sort_x: f32,
}

pub(crate) fn visible_all(graph: &FamilyGraph) -> BTreeSet<PersonId> {
    graph.ids().collect()
}

/// Lay out the whole graph from its root.
pub fn compute_layout(graph: &FamilyGraph, config: &LayoutConfig) -> LayoutResult {
    let visible = visible_all(graph);
    if visible.is_empty() {
        return LayoutResult::empty();
    }
    let view = View {
        graph,
        visible: &visible,
    };
    layout_view(view, graph.root(), config)
}

/// Lay out the subgraph around a focus person. A missing or unknown focus
/// falls back to the unfiltered layout.
pub fn compute_layout_filtered(
    graph: &FamilyGraph,
    focus: Option<&str>,
    opts: &FilterOptions,
    config: &LayoutConfig,
) -> LayoutResult {
    if graph.is_empty() {
        return LayoutResult::empty();
    }
    match focus.and_then(|key| graph.lookup(key)) {
        Some(focus_id) => {
            let visible = filter_bloodline(graph, focus_id, opts);
            let view = View {
                graph,
                visible: &visible,
            };
            layout_view(view, focus_id, config)
        }
        None => compute_layout(graph, config),
    }
}

fn row_ids(nodes: &BTreeMap<PersonId, NodeBox>, generation: i32) -> Vec<PersonId> {
    let mut row: Vec<PersonId> = nodes
        .iter()
        .filter(|(_, n)| n.generation == generation)
        .map(|(&id, _)| id)
        .collect();
    row.sort_by(|a, b| {
        nodes[a]
            .x
            .total_cmp(&nodes[b].x)
            .then(a.cmp(b))
    });
    row
}

fn unit_index(build: &SupernodeBuild, member: PersonId) -> Option<usize> {
    build
        .unit_of
        .get(&member)
        .and_then(|u| build.graph.index_of.get(u.as_str()))
        .copied()
}

/// Ancestor unit index with a small outward nudge; index zero stays put so
/// the leftmost branch is not pushed off its column.
fn nudged(idx: usize, eps: f64) -> f64 {
    if idx == 0 { 0.0 } else { idx as f64 + eps }
}

fn layout_view(view: View<'_>, root: PersonId, cfg: &LayoutConfig) -> LayoutResult {
    let gens = assign_generations(view, root, cfg.level_passes);
    if gens.is_empty() {
        return LayoutResult::empty();
    }
    let mut build = build_supernode_layers(view, &gens);
    minimize_crossings(&mut build.graph, cfg.order_sweeps);
    let upstream = upstream_index_multi(view, &gens, &build, 3);

    let mut nodes: BTreeMap<PersonId, NodeBox> = BTreeMap::new();
    let mut unions: BTreeMap<String, UnionBox> = BTreeMap::new();
    let mut edges: Vec<LayoutEdge> = Vec::new();

    let row_pitch = cfg.card_h + cfg.min_v_gap;
    let mut gen_y: BTreeMap<i32, f32> = BTreeMap::new();
    for g in build.min_gen..=build.max_gen {
        gen_y.insert(g, (g - build.min_gen) as f32 * row_pitch);
    }

    // 1) Parents in global sweep order; couples oriented toward their own
    // ancestry via the upstream index.
    for (li, layer) in build.graph.layers.iter().enumerate() {
        let g = build.min_gen + li as i32;
        let y = gen_y[&g];
        let mut cursor = 0.0f32;
        for unit in layer {
            match *unit.members.as_slice() {
                [a, b] => {
                    let (mut left, mut right) = (a, b);
                    if let (Some(ua), Some(ub)) = (upstream.get(&a), upstream.get(&b)) {
                        if ua > ub {
                            (left, right) = (b, a);
                        }
                    }
                    nodes.insert(
                        left,
                        NodeBox {
                            generation: g,
                            x: cursor,
                            y,
                            w: cfg.card_w,
                            h: cfg.card_h,
                        },
                    );
                    let right_x = cursor + cfg.card_w + cfg.min_couple_gap;
                    nodes.insert(
                        right,
                        NodeBox {
                            generation: g,
                            x: right_x,
                            y,
                            w: cfg.card_w,
                            h: cfg.card_h,
                        },
                    );
                    cursor = right_x + cfg.card_w + cfg.min_h_gap;
                }
                [single] => {
                    nodes.insert(
                        single,
                        NodeBox {
                            generation: g,
                            x: cursor,
                            y,
                            w: cfg.card_w,
                            h: cfg.card_h,
                        },
                    );
                    cursor += cfg.card_w + cfg.min_h_gap;
                }
                _ => {}
            }
        }
    }

    // Light compression per parent row; the order is already settled.
    for g in build.min_gen..=build.max_gen {
        let row = row_ids(&nodes, g);
        enforce_spouse_adjacency_in_row(view, cfg, &mut nodes, &row);
        let mut row_blocks = build_parent_row_blocks(view, &nodes, &row);
        pack_blocks_left_to_right(&mut nodes, &mut row_blocks, cfg.min_block_gap);
    }

    // 2) Parent blocks, splitting a couple's shared children from each
    // member's exclusive ones (remarriage support).
    let mut blocks_by_gen: BTreeMap<i32, Vec<ParentBlock>> = BTreeMap::new();
    for g in build.min_gen..=build.max_gen {
        let row = row_ids(&nodes, g);
        let in_row: BTreeSet<PersonId> = row.iter().copied().collect();
        let mut seen: BTreeSet<PersonId> = BTreeSet::new();
        let mut per_gen: Vec<ParentBlock> = Vec::new();

        for &id in &row {
            if seen.contains(&id) {
                continue;
            }
            let spouse = view
                .spouse(id)
                .filter(|s| in_row.contains(s) && !seen.contains(s));
            if let Some(s) = spouse {
                let (l, r) = if nodes[&id].x <= nodes[&s].x {
                    (id, s)
                } else {
                    (s, id)
                };
                seen.insert(l);
                seen.insert(r);
                let l_kids = view.children(l);
                let r_kids: BTreeSet<PersonId> = view.children(r).into_iter().collect();
                let shared: Vec<PersonId> = l_kids
                    .iter()
                    .copied()
                    .filter(|k| r_kids.contains(k))
                    .collect();
                let excl_l: Vec<PersonId> = l_kids
                    .iter()
                    .copied()
                    .filter(|k| !r_kids.contains(k))
                    .collect();
                let l_set: BTreeSet<PersonId> = l_kids.iter().copied().collect();
                let excl_r: Vec<PersonId> = view
                    .children(r)
                    .into_iter()
                    .filter(|k| !l_set.contains(k))
                    .collect();

                let left = nodes[&l].x;
                let right = nodes[&r].right();
                per_gen.push(ParentBlock {
                    generation: g,
                    parents: vec![l, r],
                    children: shared,
                    sort_x: (left + right) / 2.0,
                });
                if !excl_l.is_empty() {
                    per_gen.push(ParentBlock {
                        generation: g,
                        parents: vec![l],
                        children: excl_l,
                        sort_x: nodes[&l].x - 0.001,
                    });
                }
                if !excl_r.is_empty() {
                    per_gen.push(ParentBlock {
                        generation: g,
                        parents: vec![r],
                        children: excl_r,
                        sort_x: nodes[&r].right() + 0.001,
                    });
                }
            } else {
                seen.insert(id);
                per_gen.push(ParentBlock {
                    generation: g,
                    parents: vec![id],
                    children: view.children(id),
                    sort_x: nodes[&id].center_x(),
                });
            }
        }
        per_gen.sort_by(|a, b| a.sort_x.total_cmp(&b.sort_x));
        blocks_by_gen.insert(g, per_gen);
    }

    // 3) Union markers and child runs, block by block.
    let mut groups_by_gen: BTreeMap<i32, Vec<ChildGroup>> = BTreeMap::new();
    let mut parent_order_by_gen: BTreeMap<i32, HashMap<PersonId, usize>> = BTreeMap::new();
    let mut fine_by_gen: BTreeMap<i32, HashMap<PersonId, f64>> = BTreeMap::new();
    let mut parent_centers: BTreeMap<(i32, usize), Vec<f32>> = BTreeMap::new();

    for g in build.min_gen..=build.max_gen {
        let gen_blocks = blocks_by_gen.remove(&g).unwrap_or_default();
        for (order, block) in gen_blocks.iter().enumerate() {
            place_children_under_block(
                view,
                cfg,
                &build,
                block,
                order,
                &mut nodes,
                &mut unions,
                &mut edges,
                &mut gen_y,
                &mut groups_by_gen,
                &mut parent_order_by_gen,
                &mut fine_by_gen,
                &mut parent_centers,
                build.min_gen,
            );
        }
    }

    // 4) Pack child groups and align them under their parents' centers.
    let gens_present: BTreeSet<i32> = nodes.values().map(|n| n.generation).collect();
    let empty_order: HashMap<PersonId, usize> = HashMap::new();
    let empty_fine: HashMap<PersonId, f64> = HashMap::new();
    for &g in &gens_present {
        if g <= build.min_gen {
            continue;
        }
        let row = row_ids(&nodes, g);
        if row.is_empty() {
            continue;
        }
        let parent_order = parent_order_by_gen.get(&g).unwrap_or(&empty_order);
        augment_groups_with_singletons(g, &mut groups_by_gen, &row, parent_order, &nodes);
        merge_child_groups_by_spouses(view, g, &mut groups_by_gen, &row);

        let mut desired: BTreeMap<usize, f32> = BTreeMap::new();
        for (&(child_gen, order), centers) in &parent_centers {
            if child_gen == g && !centers.is_empty() {
                desired.insert(order, centers.iter().sum::<f32>() / centers.len() as f32);
            }
        }
        let fine = fine_by_gen.get(&g).unwrap_or(&empty_fine);
        enforce_child_group_order(
            view,
            cfg,
            g,
            &groups_by_gen,
            &mut nodes,
            &row,
            parent_order,
            &desired,
            fine,
        );
        let row = row_ids(&nodes, g);
        regroup_couples_in_row(view, cfg, &mut nodes, &row);
        de_overlap_row(view, cfg, &mut nodes, &row);
    }

    // 5) Vertical spacing: every row at least one card plus the gap below
    // the previous one; lower rows and their unions shift together.
    let gens_sorted: Vec<i32> = gens_present.iter().copied().collect();
    let mut row_y: BTreeMap<i32, f32> = BTreeMap::new();
    for &g in &gens_sorted {
        let y = nodes
            .values()
            .find(|n| n.generation == g)
            .map(|n| n.y)
            .unwrap_or((g - build.min_gen) as f32 * row_pitch);
        row_y.insert(g, y);
    }
    for w in gens_sorted.windows(2) {
        let (g, ng) = (w[0], w[1]);
        let needed = row_y[&g] + cfg.card_h + cfg.min_v_gap;
        if row_y[&ng] < needed {
            let dy = needed - row_y[&ng];
            for n in nodes.values_mut() {
                if n.generation >= ng {
                    n.y += dy;
                }
            }
            for u in unions.values_mut() {
                if u.generation >= ng {
                    u.y += dy;
                }
            }
            for (&gg, y) in row_y.iter_mut() {
                if gg >= ng {
                    *y += dy;
                }
            }
        }
    }

    // 6) Recenter each row against the widest row, then snap union
    // markers back to the midpoint of their (possibly moved) parents.
    let mut max_row_width = 0.0f32;
    for &g in &gens_sorted {
        let row = row_ids(&nodes, g);
        if let Some((l, r)) = row_bounds(&nodes, &row) {
            max_row_width = max_row_width.max(r - l);
        }
    }
    for &g in &gens_sorted {
        let row = row_ids(&nodes, g);
        let Some((l, r)) = row_bounds(&nodes, &row) else {
            continue;
        };
        let offset = (max_row_width - (r - l)) / 2.0 - l;
        if offset.abs() >= 0.5 {
            for id in &row {
                if let Some(n) = nodes.get_mut(id) {
                    n.x += offset;
                }
            }
        }
    }
    for u in unions.values_mut() {
        let center = match u.b {
            Some(b) => {
                let ax = nodes[&u.a].center_x();
                let bx = nodes[&b].center_x();
                ax.min(bx) + (ax - bx).abs() / 2.0
            }
            None => nodes[&u.a].center_x(),
        };
        u.x = center - cfg.union_w / 2.0;
    }

    // 7) Translate so the minimum coordinate sits at the margin.
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    for n in nodes.values() {
        min_x = min_x.min(n.x);
        min_y = min_y.min(n.y);
    }
    for u in unions.values() {
        min_x = min_x.min(u.x);
        min_y = min_y.min(u.y);
    }
    if min_x == f32::MAX {
        return LayoutResult::empty();
    }
    let dx = cfg.margin - min_x;
    let dy = cfg.margin - min_y;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for n in nodes.values_mut() {
        n.x += dx;
        n.y += dy;
        max_x = max_x.max(n.right());
        max_y = max_y.max(n.y + n.h);
    }
    for u in unions.values_mut() {
        u.x += dx;
        u.y += dy;
        max_x = max_x.max(u.x + cfg.union_w);
        max_y = max_y.max(u.y + cfg.union_h);
    }

    // 8) Project into the output shape.
    let mut out_nodes: Vec<PositionedNode> = Vec::with_capacity(nodes.len() + unions.len());
    for (&id, n) in &nodes {
        let key = view.key(id).to_string();
        out_nodes.push(PositionedNode {
            id: key.clone(),
            kind: NodeKind::Person,
            generation: n.generation,
            x: n.x,
            y: n.y,
            w: n.w,
            h: n.h,
            members: vec![key],
        });
    }
    for (uid, u) in &unions {
        let mut members = vec![view.key(u.a).to_string()];
        if let Some(b) = u.b {
            members.push(view.key(b).to_string());
        }
        out_nodes.push(PositionedNode {
            id: uid.clone(),
            kind: NodeKind::Union,
            generation: u.generation,
            x: u.x,
            y: u.y,
            w: cfg.union_w,
            h: cfg.union_h,
            members,
        });
    }

    LayoutResult {
        nodes: out_nodes,
        edges,
        width: max_x + cfg.margin,
        height: max_y + cfg.margin,
        min_gen: build.min_gen,
        max_gen: build.max_gen,
    }
}

fn row_bounds(nodes: &BTreeMap<PersonId, NodeBox>, row: &[PersonId]) -> Option<(f32, f32)> {
    let mut left = f32::MAX;
    let mut right = f32::MIN;
    for id in row {
        let n = nodes.get(id)?;
        left = left.min(n.x);
        right = right.max(n.right());
    }
    if row.is_empty() { None } else { Some((left, right)) }
}

#[allow(clippy::too_many_arguments)]
fn place_children_under_block(
    view: View<'_>,
    cfg: &LayoutConfig,
    build: &SupernodeBuild,
    block: &ParentBlock,
    order: usize,
    nodes: &mut BTreeMap<PersonId, NodeBox>,
    unions: &mut BTreeMap<String, UnionBox>,
    edges: &mut Vec<LayoutEdge>,
    gen_y: &mut BTreeMap<i32, f32>,
    groups_by_gen: &mut BTreeMap<i32, Vec<ChildGroup>>,
    parent_order_by_gen: &mut BTreeMap<i32, HashMap<PersonId, usize>>,
    fine_by_gen: &mut BTreeMap<i32, HashMap<PersonId, f64>>,
    parent_centers: &mut BTreeMap<(i32, usize), Vec<f32>>,
    min_gen: i32,
) {
    if block.children.is_empty() {
        return;
    }

    let union_y = gen_y[&block.generation] + cfg.card_h + cfg.union_dy;
    let (union_center, a, b) = match *block.parents.as_slice() {
        [l, r] => {
            let lx = nodes[&l].center_x();
            let rx = nodes[&r].center_x();
            (lx.min(rx) + (lx - rx).abs() / 2.0, l, Some(r))
        }
        [p] => (nodes[&p].center_x(), p, None),
        _ => return,
    };
    let uid = match b {
        Some(b) => couple_unit_id(view.key(a), view.key(b)).replacen("C:", "U:", 1),
        None => format!("U:{}:_", view.key(a)),
    };
    unions.insert(
        uid.clone(),
        UnionBox {
            generation: block.generation,
            x: union_center - cfg.union_w / 2.0,
            y: union_y,
            a,
            b,
        },
    );

    let child_gen = block.generation + 1;
    let row_pitch = cfg.card_h + cfg.min_v_gap;
    let child_y = *gen_y
        .entry(child_gen)
        .or_insert((child_gen - min_gen) as f32 * row_pitch);

    let fine = fine_by_gen.entry(child_gen).or_default();
    let count = block.children.len() as f32;
    let total_width = count * cfg.card_w + (count - 1.0) * cfg.min_child_gap;
    let mut cursor = union_center - total_width / 2.0;
    let mut placed: Vec<PersonId> = Vec::new();

    for &child in &block.children {
        // Fine order key: weighted ancestor unit indices up to
        // great-grandparents, median/average blend, block order epsilon.
        let mut unit_positions: Vec<f64> = Vec::new();
        for p in view.parents(child) {
            if let Some(idx) = unit_index(build, p) {
                unit_positions.push(idx as f64);
            }
            for gp in view.parents(p) {
                if let Some(idx) = unit_index(build, gp) {
                    unit_positions.push(nudged(idx, 0.25));
                }
                for ggp in view.parents(gp) {
                    if let Some(idx) = unit_index(build, ggp) {
                        unit_positions.push(nudged(idx, 0.1));
                    }
                }
            }
        }
        if !unit_positions.is_empty() {
            unit_positions.sort_by(f64::total_cmp);
            let mid = unit_positions.len() / 2;
            let median = if unit_positions.len() % 2 == 1 {
                unit_positions[mid]
            } else {
                (unit_positions[mid - 1] + unit_positions[mid]) / 2.0
            };
            let avg = unit_positions.iter().sum::<f64>() / unit_positions.len() as f64;
            fine.insert(child, (median + avg) / 2.0 + order as f64 * 1e-3);
        }

        let adopted = block
            .parents
            .iter()
            .any(|p| view.person(*p).adopted_children.contains(&child));
        // A child leveled into some other row (married upward) keeps its
        // position; it still gets its edge but joins no sibling group here.
        match nodes.get(&child) {
            None => {
                nodes.insert(
                    child,
                    NodeBox {
                        generation: child_gen,
                        x: cursor,
                        y: child_y,
                        w: cfg.card_w,
                        h: cfg.card_h,
                    },
                );
                placed.push(child);
            }
            Some(n) if n.generation == child_gen => placed.push(child),
            Some(_) => {}
        }
        let child_key = view.key(child);
        edges.push(LayoutEdge {
            id: format!("e-{uid}-{child_key}"),
            from: uid.clone(),
            to: child_key.to_string(),
            from_side: Side::Bottom,
            to_side: Side::Top,
            adopted,
        });
        cursor += cfg.card_w + cfg.min_child_gap;
    }

    if !placed.is_empty() {
        let order_index = parent_order_by_gen.entry(child_gen).or_default();
        for &id in &placed {
            order_index.insert(id, order);
        }
        register_child_group(groups_by_gen, child_gen, order, placed);
        parent_centers
            .entry((child_gen, order))
            .or_default()
            .push(union_center);
    }

    for &parent in &block.parents {
        let parent_key = view.key(parent);
        edges.push(LayoutEdge {
            id: format!("e-{parent_key}-{uid}"),
            from: parent_key.to_string(),
            to: uid.clone(),
            from_side: Side::Bottom,
            to_side: Side::Top,
            adopted: false,
        });
    }
}
