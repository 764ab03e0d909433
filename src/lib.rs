#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod graph;
pub mod layout;
pub mod query;
pub mod snapshot;
pub mod traverse;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::LayoutConfig;
pub use graph::{AttachKind, FamilyGraph, GraphError, PersonId, Sex};
pub use layout::{compute_layout, compute_layout_filtered, FilterOptions, KinDepth, LayoutResult};
pub use query::{related_by_kind, relationship_between, Relation, RelationKind};
