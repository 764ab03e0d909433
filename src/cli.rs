use crate::config::load_config;
use crate::graph::{FamilyGraph, PersonId};
use crate::layout::{compute_layout, compute_layout_filtered, FilterOptions, KinDepth};
use crate::query::{
    mothers_with_most_daughters, related_by_kind, relationship_between, RelationKind,
};
use crate::snapshot::{rebuild, StoredTree};
use crate::traverse::find_by_name;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "kin", version, about = "Family tree layout and relationship queries")]
pub struct Args {
    /// Snapshot JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute node and edge positions for the tree, or a filtered view of it
    Layout {
        /// Person (id or name) to filter the bloodline around
        #[arg(long)]
        focus: Option<String>,

        /// Kinship width when focused: 0 direct line, 1 siblings,
        /// 2 cousins, 3 second cousins
        #[arg(long = "kin-depth", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
        kin_depth: u8,

        /// Also show spouses of everyone visible
        #[arg(long)]
        spouses: bool,
    },
    /// Classify what OTHER is to SUBJECT
    Relation { subject: String, other: String },
    /// List everyone standing in one relation to a person
    List {
        person: String,
        #[arg(value_enum)]
        kind: ListKind,
    },
    /// Report the mothers with the most daughters
    Matriarchs,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ListKind {
    PaternalUncles,
    MaternalUncles,
    PaternalAunts,
    MaternalAunts,
    SistersInLaw,
    BrothersInLaw,
    Cousins,
    Father,
    Mother,
    Children,
    Sons,
    Daughters,
    Brothers,
    Sisters,
    Grandchildren,
    Grandsons,
    Granddaughters,
    Siblings,
    Spouse,
}

impl From<ListKind> for RelationKind {
    fn from(kind: ListKind) -> Self {
        match kind {
            ListKind::PaternalUncles => RelationKind::PaternalUncle,
            ListKind::MaternalUncles => RelationKind::MaternalUncle,
            ListKind::PaternalAunts => RelationKind::PaternalAunt,
            ListKind::MaternalAunts => RelationKind::MaternalAunt,
            ListKind::SistersInLaw => RelationKind::SisterInLaw,
            ListKind::BrothersInLaw => RelationKind::BrotherInLaw,
            ListKind::Cousins => RelationKind::Cousin,
            ListKind::Father => RelationKind::Father,
            ListKind::Mother => RelationKind::Mother,
            ListKind::Children => RelationKind::Child,
            ListKind::Sons => RelationKind::Son,
            ListKind::Daughters => RelationKind::Daughter,
            ListKind::Brothers => RelationKind::Brother,
            ListKind::Sisters => RelationKind::Sister,
            ListKind::Grandchildren => RelationKind::GrandChild,
            ListKind::Grandsons => RelationKind::GrandSon,
            ListKind::Granddaughters => RelationKind::GrandDaughter,
            ListKind::Siblings => RelationKind::Sibling,
            ListKind::Spouse => RelationKind::Spouse,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let graph = load_graph(args.input.as_deref())?;

    let output = match &args.command {
        Command::Layout {
            focus,
            kin_depth,
            spouses,
        } => {
            let config = load_config(args.config.as_deref())?;
            let layout = match focus.as_deref() {
                Some(ident) => {
                    let focus_id = resolve(&graph, ident)?;
                    let focus_key = graph.person(focus_id).key.clone();
                    let opts = FilterOptions {
                        kin_depth: KinDepth::from_level(*kin_depth),
                        include_spouses: *spouses,
                    };
                    compute_layout_filtered(&graph, Some(&focus_key), &opts, &config)
                }
                None => compute_layout(&graph, &config),
            };
            serde_json::to_string_pretty(&layout)?
        }
        Command::Relation { subject, other } => {
            let subject_id = resolve(&graph, subject)?;
            let other_id = resolve(&graph, other)?;
            let relation = relationship_between(&graph, subject_id, other_id)?;
            let value = json!({
                "subject": graph.person(subject_id).key,
                "other": graph.person(other_id).key,
                "relation": relation.map(|r| r.as_str()),
            });
            serde_json::to_string_pretty(&value)?
        }
        Command::List { person, kind } => {
            let id = resolve(&graph, person)?;
            let ids = related_by_kind(&graph, id, RelationKind::from(*kind));
            serde_json::to_string_pretty(&people_json(&graph, &ids))?
        }
        Command::Matriarchs => {
            let ids = mothers_with_most_daughters(&graph);
            serde_json::to_string_pretty(&people_json(&graph, &ids))?
        }
    };

    write_output(&output, args.output.as_deref())
}

/// Accept either the stable id or an exact name.
fn resolve(graph: &FamilyGraph, ident: &str) -> Result<PersonId> {
    graph
        .lookup(ident)
        .or_else(|| find_by_name(graph, ident))
        .with_context(|| format!("no person matching '{ident}'"))
}

fn people_json(graph: &FamilyGraph, ids: &[PersonId]) -> serde_json::Value {
    let people: Vec<serde_json::Value> = ids
        .iter()
        .map(|&id| {
            let p = graph.person(id);
            json!({ "id": p.key, "name": p.name })
        })
        .collect();
    json!(people)
}

fn load_graph(input: Option<&Path>) -> Result<FamilyGraph> {
    let text = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let stored: StoredTree = serde_json::from_str(&text).context("invalid snapshot JSON")?;
    Ok(rebuild(&stored)?)
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
