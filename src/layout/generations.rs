use std::collections::{BTreeMap, VecDeque};

use crate::graph::PersonId;

use super::types::View;

/// Assign an integer generation to every visible person reachable from
/// `root`: root 0, parents one up, children one down, spouse level.
///
/// A spouse reached through a different path can land one row off before
/// the direct link is processed; the post-pass levels every married pair
/// to the rounded average. One pass fixes each couple at most once, the
/// cap only guards against a pathological ping-pong between couples.
pub(crate) fn assign_generations(
    view: View<'_>,
    root: PersonId,
    level_passes: usize,
) -> BTreeMap<PersonId, i32> {
    let mut gens: BTreeMap<PersonId, i32> = BTreeMap::new();
    if !view.contains(root) {
        return gens;
    }
    let mut queue: VecDeque<PersonId> = VecDeque::new();
    gens.insert(root, 0);
    queue.push_back(root);

    while let Some(cur) = queue.pop_front() {
        let g = gens[&cur];
        for p in view.parents(cur) {
            if !gens.contains_key(&p) {
                gens.insert(p, g - 1);
                queue.push_back(p);
            }
        }
        for c in view.children(cur) {
            if !gens.contains_key(&c) {
                gens.insert(c, g + 1);
                queue.push_back(c);
            }
        }
        if let Some(s) = view.spouse(cur) {
            if !gens.contains_key(&s) {
                gens.insert(s, g);
                queue.push_back(s);
            }
        }
    }

    for _ in 0..level_passes {
        let mut changed = false;
        for id in view.iter() {
            let Some(spouse) = view.spouse(id) else {
                continue;
            };
            let (Some(&ga), Some(&gb)) = (gens.get(&id), gens.get(&spouse)) else {
                continue;
            };
            if ga != gb {
                let leveled = ((ga + gb) as f64 / 2.0).round() as i32;
                gens.insert(id, leveled);
                gens.insert(spouse, leveled);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    gens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttachKind, FamilyGraph, Sex};
    use crate::layout::visible_all;

    #[test]
    fn root_couple_and_children() {
        let mut g = FamilyGraph::new("Vater", "Mutter");
        let root = g.root();
        for (name, sex) in [
            ("Kind1", Sex::Male),
            ("Kind2", Sex::Female),
            ("Kind3", Sex::Male),
        ] {
            g.add_member(root, name, sex, AttachKind::Child { adopted: false })
                .unwrap();
        }
        let visible = visible_all(&g);
        let view = View {
            graph: &g,
            visible: &visible,
        };
        let gens = assign_generations(view, root, 3);
        let mutter = g.person(root).spouse.unwrap();
        assert_eq!(gens[&root], 0);
        assert_eq!(gens[&mutter], 0);
        let child_gens: Vec<i32> = g
            .person(root)
            .children
            .iter()
            .map(|c| gens[c])
            .collect();
        assert_eq!(child_gens, vec![1, 1, 1]);
    }

    #[test]
    fn grandparent_is_negative_relative_to_root() {
        let mut g = FamilyGraph::new("Vater", "Mutter");
        let root = g.root();
        let opa = g
            .add_member(
                root,
                "Opa",
                Sex::Male,
                AttachKind::Parent {
                    marry_existing_parent: false,
                },
            )
            .unwrap();
        let visible = visible_all(&g);
        let view = View {
            graph: &g,
            visible: &visible,
        };
        // Root moved to Opa by add_parent; generations are root-relative.
        let gens = assign_generations(view, g.root(), 3);
        assert_eq!(gens[&opa], 0);
        assert_eq!(gens[&root], 1);
    }
}
