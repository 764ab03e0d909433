//! Median-sweep layer ordering (Sugiyama style). Couples are fused into
//! supernodes so they can never be separated by the reordering, and layers
//! are swept top-down / bottom-up until the rough crossing count stops
//! improving. Heuristic by design; exact minimization is not attempted.

use std::collections::{BTreeMap, HashMap};

use crate::graph::PersonId;

use super::types::View;

/// "C:<a>:<b>" for couples (keys sorted), "S:<a>" for singles. The string
/// form keys the deterministic initial order.
pub(crate) type UnitId = String;

#[derive(Debug, Clone)]
pub(crate) struct Unit {
    pub id: UnitId,
    pub members: Vec<PersonId>,
}

#[derive(Debug, Clone)]
pub(crate) struct UnitGraph {
    /// One vec per generation, `min_gen` first.
    pub layers: Vec<Vec<Unit>>,
    /// Parent unit -> child unit, adjacent layers only. Duplicates are
    /// kept: a couple with two linked parents weighs double in the median.
    pub edges: Vec<(UnitId, UnitId)>,
    pub index_of: HashMap<UnitId, usize>,
    pub layer_of: HashMap<UnitId, usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct SupernodeBuild {
    pub graph: UnitGraph,
    pub min_gen: i32,
    pub max_gen: i32,
    pub unit_of: HashMap<PersonId, UnitId>,
}

pub(crate) fn couple_unit_id(a: &str, b: &str) -> UnitId {
    let (x, y) = if a <= b { (a, b) } else { (b, a) };
    format!("C:{x}:{y}")
}

pub(crate) fn single_unit_id(a: &str) -> UnitId {
    format!("S:{a}")
}

/// Group the generation-assigned members into one unit per couple or
/// single, build the unit layers and the inter-layer edges.
pub(crate) fn build_supernode_layers(
    view: View<'_>,
    gens: &BTreeMap<PersonId, i32>,
) -> SupernodeBuild {
    let mut by_gen: BTreeMap<i32, Vec<PersonId>> = BTreeMap::new();
    for id in view.iter() {
        if let Some(&g) = gens.get(&id) {
            by_gen.entry(g).or_default().push(id);
        }
    }
    let (min_gen, max_gen) = match (by_gen.keys().next(), by_gen.keys().next_back()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (0, 0),
    };

    let mut layers: Vec<Vec<Unit>> = vec![Vec::new(); (max_gen - min_gen + 1) as usize];
    let mut unit_of: HashMap<PersonId, UnitId> = HashMap::new();

    for (&g, members) in &by_gen {
        let layer = &mut layers[(g - min_gen) as usize];
        for &m in members {
            if unit_of.contains_key(&m) {
                continue;
            }
            let spouse = view
                .spouse(m)
                .filter(|s| gens.get(s) == Some(&g) && !unit_of.contains_key(s));
            if let Some(s) = spouse {
                let id = couple_unit_id(view.key(m), view.key(s));
                unit_of.insert(m, id.clone());
                unit_of.insert(s, id.clone());
                layer.push(Unit {
                    id,
                    members: vec![m, s],
                });
            } else {
                let id = single_unit_id(view.key(m));
                unit_of.insert(m, id.clone());
                layer.push(Unit {
                    id,
                    members: vec![m],
                });
            }
        }
    }

    // Deterministic starting order before any sweep runs.
    for layer in &mut layers {
        layer.sort_by(|a, b| a.id.cmp(&b.id));
    }

    let mut edges: Vec<(UnitId, UnitId)> = Vec::new();
    for id in view.iter() {
        let Some(&g) = gens.get(&id) else { continue };
        for c in view.children(id) {
            if gens.get(&c) != Some(&(g + 1)) {
                continue;
            }
            if let (Some(from), Some(to)) = (unit_of.get(&id), unit_of.get(&c)) {
                edges.push((from.clone(), to.clone()));
            }
        }
    }

    let mut index_of = HashMap::new();
    let mut layer_of = HashMap::new();
    for (li, layer) in layers.iter().enumerate() {
        for (i, unit) in layer.iter().enumerate() {
            index_of.insert(unit.id.clone(), i);
            layer_of.insert(unit.id.clone(), li);
        }
    }

    SupernodeBuild {
        graph: UnitGraph {
            layers,
            edges,
            index_of,
            layer_of,
        },
        min_gen,
        max_gen,
        unit_of,
    }
}

/// Median of sorted neighbor positions; an even count averages the middle
/// two, an empty list keeps the unit where it is.
fn median_of(positions: &mut Vec<usize>, fallback: f64) -> f64 {
    if positions.is_empty() {
        return fallback;
    }
    positions.sort_unstable();
    let mid = positions.len() / 2;
    if positions.len() % 2 == 1 {
        positions[mid] as f64
    } else {
        (positions[mid - 1] + positions[mid]) as f64 / 2.0
    }
}

/// One sweep: walk the layers in the given direction, reorder each layer
/// by the median index of its neighbors in the already-fixed layer. Sort
/// is stable with the old index as tie-breaker.
fn sweep(graph: &mut UnitGraph, down: bool) {
    let span = graph.layers.len();
    if span <= 1 {
        return;
    }
    let indices: Vec<usize> = if down {
        (1..span).collect()
    } else {
        (0..span - 1).rev().collect()
    };
    for li in indices {
        let fixed_li = if down { li - 1 } else { li + 1 };
        let fixed_index: HashMap<&str, usize> = graph.layers[fixed_li]
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id.as_str(), i))
            .collect();

        let mut neighbors: HashMap<&str, Vec<usize>> = graph.layers[li]
            .iter()
            .map(|u| (u.id.as_str(), Vec::new()))
            .collect();
        for (from, to) in &graph.edges {
            let (fixed_end, moving_end) = if down { (from, to) } else { (to, from) };
            if graph.layer_of.get(moving_end.as_str()) != Some(&li) {
                continue;
            }
            if let Some(&fi) = fixed_index.get(fixed_end.as_str()) {
                if let Some(list) = neighbors.get_mut(moving_end.as_str()) {
                    list.push(fi);
                }
            }
        }

        let mut keyed: Vec<(f64, usize, Unit)> = graph.layers[li]
            .iter()
            .enumerate()
            .map(|(i, u)| {
                let mut list = neighbors.remove(u.id.as_str()).unwrap_or_default();
                (median_of(&mut list, i as f64), i, u.clone())
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        graph.layers[li] = keyed.into_iter().map(|(_, _, u)| u).collect();
        for (i, unit) in graph.layers[li].iter().enumerate() {
            graph.index_of.insert(unit.id.clone(), i);
        }
    }
}

/// Inversion count among adjacent-layer edges, the early-stop measure for
/// the sweeps. Quadratic, which is fine at family-tree sizes.
fn count_crossings(graph: &UnitGraph) -> usize {
    let mut crossings = 0;
    for li in 0..graph.layers.len().saturating_sub(1) {
        let mut pairs: Vec<(usize, usize)> = graph
            .edges
            .iter()
            .filter(|(from, to)| {
                graph.layer_of.get(from.as_str()) == Some(&li)
                    && graph.layer_of.get(to.as_str()) == Some(&(li + 1))
            })
            .map(|(from, to)| (graph.index_of[from.as_str()], graph.index_of[to.as_str()]))
            .collect();
        pairs.sort_unstable();
        for i in 0..pairs.len() {
            for j in i + 1..pairs.len() {
                let (ai, aj) = pairs[i];
                let (bi, bj) = pairs[j];
                if (ai < bi && aj > bj) || (ai > bi && aj < bj) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

/// Alternate top-down and bottom-up sweeps until the crossing count stops
/// improving or the round cap is hit.
pub(crate) fn minimize_crossings(graph: &mut UnitGraph, max_rounds: usize) {
    let mut last = usize::MAX;
    for _ in 0..max_rounds {
        sweep(graph, true);
        sweep(graph, false);
        let current = count_crossings(graph);
        if current >= last {
            break;
        }
        last = current;
    }
}

/// Weighted ancestor index per member: parents, grandparents and so on up
/// to `max_depth` levels contribute their unit index, nearer generations
/// weighing more. A blend of median and weighted average; used to orient
/// couples so each partner sits toward their own ancestry.
pub(crate) fn upstream_index_multi(
    view: View<'_>,
    gens: &BTreeMap<PersonId, i32>,
    build: &SupernodeBuild,
    max_depth: usize,
) -> HashMap<PersonId, f64> {
    let mut out = HashMap::new();
    for id in view.iter() {
        let Some(&g) = gens.get(&id) else { continue };
        let mut acc: Vec<(usize, f64)> = Vec::new();
        gather_ancestors(view, gens, build, id, g, max_depth, max_depth, &mut acc);
        if acc.is_empty() {
            continue;
        }
        acc.sort_by(|a, b| a.0.cmp(&b.0));
        let median = acc[acc.len() / 2].0 as f64;
        let weight_sum: f64 = acc.iter().map(|(_, w)| w).sum();
        let weighted_avg: f64 =
            acc.iter().map(|&(idx, w)| idx as f64 * w).sum::<f64>() / weight_sum;
        out.insert(id, (median + weighted_avg) / 2.0);
    }
    out
}

fn gather_ancestors(
    view: View<'_>,
    gens: &BTreeMap<PersonId, i32>,
    build: &SupernodeBuild,
    id: PersonId,
    target_gen: i32,
    depth: usize,
    max_depth: usize,
    acc: &mut Vec<(usize, f64)>,
) {
    if depth == 0 {
        return;
    }
    for p in view.parents(id) {
        let Some(&pg) = gens.get(&p) else { continue };
        if pg != target_gen - 1 {
            continue;
        }
        if let Some(idx) = build
            .unit_of
            .get(&p)
            .and_then(|u| build.graph.index_of.get(u.as_str()))
        {
            let weight = 1.0 / (max_depth - depth + 1) as f64;
            acc.push((*idx, weight));
        }
        gather_ancestors(view, gens, build, p, pg, depth - 1, max_depth, acc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttachKind, FamilyGraph, Sex};
    use crate::layout::visible_all;
    use crate::layout::generations::assign_generations;

    #[test]
    fn median_averages_even_counts() {
        assert_eq!(median_of(&mut vec![1, 3], 0.0), 2.0);
        assert_eq!(median_of(&mut vec![4, 1, 3], 0.0), 3.0);
        assert_eq!(median_of(&mut Vec::new(), 7.0), 7.0);
    }

    #[test]
    fn couples_become_single_units() {
        let mut g = FamilyGraph::new("Vater", "Mutter");
        let root = g.root();
        g.add_member(root, "Kind", Sex::Male, AttachKind::Child { adopted: false })
            .unwrap();
        let visible = visible_all(&g);
        let view = View {
            graph: &g,
            visible: &visible,
        };
        let gens = assign_generations(view, root, 3);
        let build = build_supernode_layers(view, &gens);
        assert_eq!(build.graph.layers.len(), 2);
        assert_eq!(build.graph.layers[0].len(), 1);
        assert_eq!(build.graph.layers[0][0].members.len(), 2);
        assert_eq!(build.graph.layers[1].len(), 1);
        // Both linked parents contribute an edge to the child unit.
        assert_eq!(build.graph.edges.len(), 2);
    }

    #[test]
    fn sweeps_are_deterministic() {
        let mut g = FamilyGraph::new("Vater", "Mutter");
        let root = g.root();
        for name in ["A", "B", "C", "D"] {
            g.add_member(root, name, Sex::Female, AttachKind::Child { adopted: false })
                .unwrap();
        }
        let visible = visible_all(&g);
        let view = View {
            graph: &g,
            visible: &visible,
        };
        let gens = assign_generations(view, root, 3);
        let mut first = build_supernode_layers(view, &gens);
        let mut second = build_supernode_layers(view, &gens);
        minimize_crossings(&mut first.graph, 10);
        minimize_crossings(&mut second.graph, 10);
        let order = |b: &SupernodeBuild| -> Vec<Vec<UnitId>> {
            b.graph
                .layers
                .iter()
                .map(|l| l.iter().map(|u| u.id.clone()).collect())
                .collect()
        };
        assert_eq!(order(&first), order(&second));
    }
}
