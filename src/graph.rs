use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arena handle for a person. Never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: PersonId,
    /// Stable external identifier, used by snapshots and layout output.
    pub key: String,
    pub name: String,
    pub sex: Sex,
    pub spouse: Option<PersonId>,
    /// Upward links, at most two.
    pub parents: Vec<PersonId>,
    /// Downward links, kept in insertion order for stable layout.
    pub children: Vec<PersonId>,
    /// Children of this person flagged as adopted on this parent edge.
    /// Always a subset of `children`.
    pub adopted_children: BTreeSet<PersonId>,
}

impl Person {
    pub fn is_married(&self) -> bool {
        self.spouse.is_some()
    }
}

/// How a newly created person attaches to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachKind {
    Child { adopted: bool },
    Spouse,
    Parent { marry_existing_parent: bool },
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{name} is already married to {spouse}")]
    AlreadyMarried { name: String, spouse: String },
    #[error("{name} already has two parents")]
    TooManyParents { name: String },
    #[error("person not found: {id}")]
    NotFound { id: String },
    #[error("duplicate person id: {id}")]
    DuplicateId { id: String },
}

/// The in-memory family graph. People live in an arena and reference each
/// other by `PersonId`; every relation edge is kept symmetric by the
/// mutation methods.
#[derive(Debug, Clone)]
pub struct FamilyGraph {
    persons: Vec<Person>,
    by_key: HashMap<String, PersonId>,
    root: PersonId,
    next_key: u32,
}

impl FamilyGraph {
    /// Start a tree from a root couple, the father being the root.
    pub fn new(father_name: &str, mother_name: &str) -> Self {
        let mut graph = Self {
            persons: Vec::new(),
            by_key: HashMap::new(),
            root: PersonId(0),
            next_key: 0,
        };
        let father = graph.insert(father_name, Sex::Male);
        graph.root = father;
        if !mother_name.is_empty() {
            let mother = graph.insert(mother_name, Sex::Female);
            graph.persons[father.0 as usize].spouse = Some(mother);
            graph.persons[mother.0 as usize].spouse = Some(father);
        }
        graph
    }

    /// Create an empty graph rooted at a single person.
    pub fn with_root(name: &str, sex: Sex) -> Self {
        let mut graph = Self::empty();
        graph.root = graph.insert(name, sex);
        graph
    }

    /// An arena with no people yet. The root is meaningless until
    /// `set_root` is called; only the snapshot rebuild uses this state.
    pub(crate) fn empty() -> Self {
        Self {
            persons: Vec::new(),
            by_key: HashMap::new(),
            root: PersonId(0),
            next_key: 0,
        }
    }

    pub(crate) fn set_root(&mut self, id: PersonId) {
        self.root = id;
    }

    /// Symmetrize one parent/child edge from possibly one-sided snapshot
    /// data. Edges beyond the two-parent cap are dropped, not an error.
    pub(crate) fn link_lenient(&mut self, parent: PersonId, child: PersonId) {
        let c = self.person(child);
        if c.parents.len() >= 2 && !c.parents.contains(&parent) {
            return;
        }
        if !self.person(parent).children.contains(&child) {
            self.person_mut(parent).children.push(child);
        }
        if !self.person(child).parents.contains(&parent) {
            self.person_mut(child).parents.push(parent);
        }
    }

    /// Set the adoption flag for an existing parent edge; a flag for a
    /// non-child is dropped.
    pub(crate) fn mark_adopted(&mut self, parent: PersonId, child: PersonId) {
        if self.person(parent).children.contains(&child) {
            self.person_mut(parent).adopted_children.insert(child);
        }
    }

    pub fn root(&self) -> PersonId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn person(&self, id: PersonId) -> &Person {
        &self.persons[id.0 as usize]
    }

    fn person_mut(&mut self, id: PersonId) -> &mut Person {
        &mut self.persons[id.0 as usize]
    }

    pub fn lookup(&self, key: &str) -> Option<PersonId> {
        self.by_key.get(key).copied()
    }

    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        (0..self.persons.len() as u32).map(PersonId)
    }

    /// Insert a person with a generated key, unattached to anyone.
    pub fn insert(&mut self, name: &str, sex: Sex) -> PersonId {
        loop {
            let key = format!("p{:04}", self.next_key);
            self.next_key += 1;
            if !self.by_key.contains_key(&key) {
                return self
                    .insert_with_key(&key, name, sex)
                    .unwrap_or_else(|_| unreachable!("generated key is fresh"));
            }
        }
    }

    /// Insert a person under an externally supplied key (snapshot rebuild).
    pub fn insert_with_key(
        &mut self,
        key: &str,
        name: &str,
        sex: Sex,
    ) -> Result<PersonId, GraphError> {
        if self.by_key.contains_key(key) {
            return Err(GraphError::DuplicateId {
                id: key.to_string(),
            });
        }
        let id = PersonId(self.persons.len() as u32);
        self.persons.push(Person {
            id,
            key: key.to_string(),
            name: name.to_string(),
            sex,
            spouse: None,
            parents: Vec::new(),
            children: Vec::new(),
            adopted_children: BTreeSet::new(),
        });
        self.by_key.insert(key.to_string(), id);
        Ok(id)
    }

    /// Link two people as spouses. Symmetric; no effect on parents or
    /// children. Re-linking an already married pair is a no-op.
    pub fn add_spouse(&mut self, a: PersonId, b: PersonId) -> Result<(), GraphError> {
        if self.person(a).spouse == Some(b) {
            return Ok(());
        }
        for (person, other) in [(a, b), (b, a)] {
            if let Some(existing) = self.person(person).spouse {
                if existing != other {
                    return Err(GraphError::AlreadyMarried {
                        name: self.person(person).name.clone(),
                        spouse: self.person(existing).name.clone(),
                    });
                }
            }
        }
        self.person_mut(a).spouse = Some(b);
        self.person_mut(b).spouse = Some(a);
        Ok(())
    }

    fn check_parent_cap(&self, parent: PersonId, child: PersonId) -> Result<(), GraphError> {
        let c = self.person(child);
        if c.parents.len() >= 2 && !c.parents.contains(&parent) {
            return Err(GraphError::TooManyParents {
                name: c.name.clone(),
            });
        }
        Ok(())
    }

    /// Link exactly one parent with a child, both directions, without
    /// touching the parent's spouse. Idempotent for an existing edge.
    fn link_parent_one_sided(
        &mut self,
        parent: PersonId,
        child: PersonId,
        adopted: bool,
    ) -> Result<(), GraphError> {
        self.check_parent_cap(parent, child)?;
        if !self.person(parent).children.contains(&child) {
            self.person_mut(parent).children.push(child);
        }
        if !self.person(child).parents.contains(&parent) {
            self.person_mut(child).parents.push(parent);
        }
        if adopted {
            self.person_mut(parent).adopted_children.insert(child);
        }
        Ok(())
    }

    /// Attach a child to the acting parent. When the parent is married to a
    /// spouse of the other sex, the child is linked to both members of the
    /// couple with the same adoption flag; otherwise only to the acting
    /// parent, so a same-sex co-parent is never granted parentage without
    /// an explicit `add_parent` call.
    pub fn add_child(
        &mut self,
        parent: PersonId,
        child: PersonId,
        adopted: bool,
    ) -> Result<(), GraphError> {
        let spouse = self.person(parent).spouse.filter(|&s| {
            self.person(s).sex != self.person(parent).sex
        });
        // Count the links this call would add and check the cap up front,
        // so a failure leaves the graph unchanged.
        let existing = &self.person(child).parents;
        let mut new_links = 0usize;
        if !existing.contains(&parent) {
            new_links += 1;
        }
        if let Some(s) = spouse {
            if !existing.contains(&s) {
                new_links += 1;
            }
        }
        if existing.len() + new_links > 2 {
            return Err(GraphError::TooManyParents {
                name: self.person(child).name.clone(),
            });
        }
        self.link_parent_one_sided(parent, child, adopted)?;
        if let Some(s) = spouse {
            self.link_parent_one_sided(s, child, adopted)?;
        }
        Ok(())
    }

    /// Attach a new parent to a child that has zero or one parents. The link
    /// is strictly one-sided: the new parent's spouse (if any) is not
    /// involved, and existing children are never shared.
    ///
    /// With `marry_existing_parent`, the child's two parents are married if
    /// both are currently unmarried. Returns the new root id when the child
    /// had no parents and was the root or the root's spouse; the graph's
    /// root is updated accordingly.
    pub fn add_parent(
        &mut self,
        child: PersonId,
        new_parent: PersonId,
        marry_existing_parent: bool,
    ) -> Result<Option<PersonId>, GraphError> {
        let had_parents = !self.person(child).parents.is_empty();
        let was_root_or_root_spouse =
            self.root == child || self.person(self.root).spouse == Some(child);

        self.link_parent_one_sided(new_parent, child, false)?;

        if marry_existing_parent {
            let parents = self.person(child).parents.clone();
            if parents.len() == 2 {
                let (p1, p2) = (parents[0], parents[1]);
                let already = self.person(p1).spouse == Some(p2);
                if !already && !self.person(p1).is_married() && !self.person(p2).is_married() {
                    self.add_spouse(p1, p2)?;
                }
            }
        }

        if was_root_or_root_spouse && !had_parents {
            self.root = new_parent;
            return Ok(Some(new_parent));
        }
        Ok(None)
    }

    /// High-level entry used by the editing surface: create a person and
    /// attach it to `source` in one step. Returns the new person's id.
    pub fn add_member(
        &mut self,
        source: PersonId,
        name: &str,
        sex: Sex,
        attach: AttachKind,
    ) -> Result<PersonId, GraphError> {
        let member = self.insert(name, sex);
        let result = match attach {
            AttachKind::Child { adopted } => self.add_child(source, member, adopted),
            AttachKind::Spouse => self.add_spouse(source, member),
            AttachKind::Parent {
                marry_existing_parent,
            } => self
                .add_parent(source, member, marry_existing_parent)
                .map(|_| ()),
        };
        match result {
            Ok(()) => Ok(member),
            Err(err) => {
                // The person was created last, has no edges on failure, and
                // can be dropped from the arena tail.
                debug_assert_eq!(member.0 as usize, self.persons.len() - 1);
                let removed = self.persons.pop();
                if let Some(p) = removed {
                    self.by_key.remove(&p.key);
                }
                Err(err)
            }
        }
    }
}
