use thiserror::Error;

use crate::graph::{FamilyGraph, PersonId, Sex};
use crate::traverse::{
    children_of, collect_connected, father_of, locate, mother_of, parent_of, siblings_of,
    spouse_of,
};

/// The computed answer to "what is X to Y". Coarse beyond one generation:
/// anything two or more levels away is Ancestor or Descendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Ancestor,
    Descendant,
    Spouse,
    Brother,
    Sister,
    BrotherInLaw,
    SisterInLaw,
    Cousin,
    CousinInLaw,
    Father,
    Mother,
    FatherInLaw,
    MotherInLaw,
    Son,
    Daughter,
    SonInLaw,
    DaughterInLaw,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Ancestor => "ANCESTOR",
            Relation::Descendant => "DESCENDANT",
            Relation::Spouse => "SPOUSE",
            Relation::Brother => "BROTHER",
            Relation::Sister => "SISTER",
            Relation::BrotherInLaw => "BROTHER-IN-LAW",
            Relation::SisterInLaw => "SISTER-IN-LAW",
            Relation::Cousin => "COUSIN",
            Relation::CousinInLaw => "COUSIN-IN-LAW",
            Relation::Father => "FATHER",
            Relation::Mother => "MOTHER",
            Relation::FatherInLaw => "FATHER-IN-LAW",
            Relation::MotherInLaw => "MOTHER-IN-LAW",
            Relation::Son => "SON",
            Relation::Daughter => "DAUGHTER",
            Relation::SonInLaw => "SON-IN-LAW",
            Relation::DaughterInLaw => "DAUGHTER-IN-LAW",
        }
    }
}

/// A relationship kind that can be asked for as a flat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    PaternalUncle,
    MaternalUncle,
    PaternalAunt,
    MaternalAunt,
    SisterInLaw,
    BrotherInLaw,
    Cousin,
    Father,
    Mother,
    Child,
    Son,
    Daughter,
    Brother,
    Sister,
    GrandChild,
    GrandSon,
    GrandDaughter,
    Sibling,
    Spouse,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("person not found: {id}")]
    NotFound { id: String },
}

fn is_male(graph: &FamilyGraph, id: PersonId) -> bool {
    graph.person(id).sex == Sex::Male
}

fn is_female(graph: &FamilyGraph, id: PersonId) -> bool {
    graph.person(id).sex == Sex::Female
}

/// Compute what `other` is to `subject`, or `Ok(None)` when the model has
/// no name for the relation. Both endpoints must be reachable from the
/// graph root; an unreachable endpoint is an error, not a null answer.
pub fn relationship_between(
    graph: &FamilyGraph,
    subject: PersonId,
    other: PersonId,
) -> Result<Option<Relation>, QueryError> {
    let (_, s_depth) = locate(graph, subject).ok_or_else(|| QueryError::NotFound {
        id: graph.person(subject).key.clone(),
    })?;
    let (_, o_depth) = locate(graph, other).ok_or_else(|| QueryError::NotFound {
        id: graph.person(other).key.clone(),
    })?;

    let delta = s_depth - o_depth;
    if delta >= 2 {
        return Ok(Some(Relation::Ancestor));
    }
    if delta <= -2 {
        return Ok(Some(Relation::Descendant));
    }

    let relation = match delta {
        0 => same_level_relation(graph, subject, other),
        1 => level_up_relation(graph, subject, other),
        -1 => level_down_relation(graph, subject, other),
        _ => None,
    };
    Ok(relation)
}

fn same_level_relation(
    graph: &FamilyGraph,
    subject: PersonId,
    other: PersonId,
) -> Option<Relation> {
    if graph.person(subject).spouse == Some(other) {
        return Some(Relation::Spouse);
    }

    let siblings = siblings_of(graph, subject);
    if siblings.contains(&other) {
        return Some(if is_male(graph, other) {
            Relation::Brother
        } else {
            Relation::Sister
        });
    }

    // In-laws: spouses of own siblings, and siblings of the own spouse.
    let spouse_siblings = match graph.person(subject).spouse {
        Some(sp) => siblings_of(graph, sp),
        None => Vec::new(),
    };
    let mut in_laws: Vec<PersonId> =
        siblings.iter().filter_map(|&s| spouse_of(graph, s)).collect();
    in_laws.extend(spouse_siblings);
    if in_laws.contains(&other) {
        return Some(if is_male(graph, other) {
            Relation::BrotherInLaw
        } else {
            Relation::SisterInLaw
        });
    }

    let cousin_ids = cousins(graph, subject);
    if cousin_ids.contains(&other) {
        return Some(Relation::Cousin);
    }
    if cousin_ids
        .iter()
        .any(|&c| spouse_of(graph, c) == Some(other))
    {
        return Some(Relation::CousinInLaw);
    }
    None
}

fn level_up_relation(graph: &FamilyGraph, subject: PersonId, other: PersonId) -> Option<Relation> {
    if let Some(p) = parent_of(graph, subject) {
        if p == other || graph.person(p).spouse == Some(other) {
            return Some(if is_male(graph, other) {
                Relation::Father
            } else {
                Relation::Mother
            });
        }
    }
    if let Some(sp) = graph.person(subject).spouse {
        if let Some(p) = parent_of(graph, sp) {
            if p == other || graph.person(p).spouse == Some(other) {
                return Some(if is_male(graph, other) {
                    Relation::FatherInLaw
                } else {
                    Relation::MotherInLaw
                });
            }
        }
    }
    None
}

fn level_down_relation(
    graph: &FamilyGraph,
    subject: PersonId,
    other: PersonId,
) -> Option<Relation> {
    let kids = children_of(graph, subject);
    if kids.contains(&other) {
        return Some(if is_male(graph, other) {
            Relation::Son
        } else {
            Relation::Daughter
        });
    }
    if kids.iter().any(|&k| spouse_of(graph, k) == Some(other)) {
        return Some(if is_male(graph, other) {
            Relation::SonInLaw
        } else {
            Relation::DaughterInLaw
        });
    }
    None
}

/// Everyone standing in `kind` to `id`. Singleton relations come back as a
/// zero- or one-element list; an unknown person simply matches nobody.
pub fn related_by_kind(graph: &FamilyGraph, id: PersonId, kind: RelationKind) -> Vec<PersonId> {
    match kind {
        RelationKind::PaternalUncle => parent_side(graph, id, father_of, Sex::Male),
        RelationKind::MaternalUncle => parent_side(graph, id, mother_of, Sex::Male),
        RelationKind::PaternalAunt => parent_side(graph, id, father_of, Sex::Female),
        RelationKind::MaternalAunt => parent_side(graph, id, mother_of, Sex::Female),
        RelationKind::SisterInLaw => siblings_in_law(graph, id, Sex::Female),
        RelationKind::BrotherInLaw => siblings_in_law(graph, id, Sex::Male),
        RelationKind::Cousin => cousins(graph, id),
        RelationKind::Father => father_of(graph, id).into_iter().collect(),
        RelationKind::Mother => mother_of(graph, id).into_iter().collect(),
        RelationKind::Child => children_of(graph, id),
        RelationKind::Son => filter_sex(graph, children_of(graph, id), Sex::Male),
        RelationKind::Daughter => filter_sex(graph, children_of(graph, id), Sex::Female),
        RelationKind::Brother => filter_sex(graph, siblings_of(graph, id), Sex::Male),
        RelationKind::Sister => filter_sex(graph, siblings_of(graph, id), Sex::Female),
        RelationKind::GrandChild => grandchildren(graph, id),
        RelationKind::GrandSon => filter_sex(graph, grandchildren(graph, id), Sex::Male),
        RelationKind::GrandDaughter => filter_sex(graph, grandchildren(graph, id), Sex::Female),
        RelationKind::Sibling => siblings_of(graph, id),
        RelationKind::Spouse => spouse_of(graph, id).into_iter().collect(),
    }
}

fn filter_sex(graph: &FamilyGraph, ids: Vec<PersonId>, sex: Sex) -> Vec<PersonId> {
    ids.into_iter()
        .filter(|&id| graph.person(id).sex == sex)
        .collect()
}

/// Children of the siblings of either parent.
pub fn cousins(graph: &FamilyGraph, id: PersonId) -> Vec<PersonId> {
    let Some(p) = parent_of(graph, id) else {
        return Vec::new();
    };
    let mut parent_siblings = siblings_of(graph, p);
    if let Some(sp) = graph.person(p).spouse {
        parent_siblings.extend(siblings_of(graph, sp));
    }
    let mut out = Vec::new();
    for s in parent_siblings {
        out.extend(children_of(graph, s));
    }
    out
}

pub fn grandchildren(graph: &FamilyGraph, id: PersonId) -> Vec<PersonId> {
    let mut out = Vec::new();
    for child in children_of(graph, id) {
        out.extend(children_of(graph, child));
    }
    out
}

/// Uncles or aunts on one side: siblings of the father (or mother), each
/// resolved to the member of that couple with the requested sex.
fn parent_side(
    graph: &FamilyGraph,
    id: PersonId,
    pick_parent: fn(&FamilyGraph, PersonId) -> Option<PersonId>,
    sex: Sex,
) -> Vec<PersonId> {
    let Some(parent) = pick_parent(graph, id) else {
        return Vec::new();
    };
    siblings_of(graph, parent)
        .into_iter()
        .filter_map(|sib| {
            if graph.person(sib).sex == sex {
                Some(sib)
            } else {
                spouse_of(graph, sib)
            }
        })
        .collect()
}

/// Siblings-in-law of the requested sex: same-sex siblings of the spouse,
/// plus spouses of the opposite-sex own siblings.
fn siblings_in_law(graph: &FamilyGraph, id: PersonId, sex: Sex) -> Vec<PersonId> {
    let mut out = Vec::new();
    if let Some(sp) = spouse_of(graph, id) {
        out.extend(filter_sex(graph, siblings_of(graph, sp), sex));
    }
    let opposite = match sex {
        Sex::Male => Sex::Female,
        Sex::Female => Sex::Male,
    };
    for sib in filter_sex(graph, siblings_of(graph, id), opposite) {
        if let Some(s) = spouse_of(graph, sib) {
            out.push(s);
        }
    }
    out
}

/// Mothers with the most daughters across the whole connected tree,
/// spouse-side ancestors included. Ties are all reported; childless
/// mothers never appear.
pub fn mothers_with_most_daughters(graph: &FamilyGraph) -> Vec<PersonId> {
    let mut best: Vec<PersonId> = Vec::new();
    let mut max_daughters = 0usize;
    for id in collect_connected(graph) {
        let mother = if is_female(graph, id) {
            Some(id)
        } else {
            graph.person(id).spouse.filter(|&s| is_female(graph, s))
        };
        let Some(mother) = mother else { continue };
        let daughters = filter_sex(graph, children_of(graph, mother), Sex::Female).len();
        if daughters > max_daughters {
            max_daughters = daughters;
            best = vec![mother];
        } else if daughters > 0 && daughters == max_daughters && !best.contains(&mother) {
            best.push(mother);
        }
    }
    best
}
