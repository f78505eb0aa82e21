//! Arbor CLI
//!
//! Browse the virtual hierarchies of a project from the command line:
//! - list and select tree configurations
//! - expand roots and children lazily
//! - search records and place each match in its tree
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use arbor_tree::{TreeError, TreeSelection};

mod project;
mod tracing_setup;

use project::{ProjectFile, Workspace};
use tracing_setup::Verbosity;

/// Exit status for a malformed caller-supplied argument.
const EXIT_INVALID_ARGUMENT: i32 = 2;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(author, version, about = "Arbor: virtual hierarchies over a relational object graph")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project file (schema types plus optional settings)
    #[arg(short, long, global = true, default_value = "arbor.json")]
    project: PathBuf,
    /// Dataset of records and links
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,
    /// Override the ancestor search hop limit
    #[arg(long, global = true)]
    max_depth: Option<usize>,
    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every discovered tree configuration.
    Trees,

    /// Show one tree configuration, or the default one.
    ///
    /// An unknown name falls back to the first configured tree.
    Tree {
        /// Root type (qualified or simple name)
        name: Option<String>,
    },

    /// Root nodes of a tree.
    Roots {
        /// Root type (qualified or simple name)
        root_type: String,
    },

    /// Children of one node along a collection field.
    Children {
        /// Parent type (qualified or simple name)
        parent_type: String,
        /// Parent primary key, as text
        parent_id: String,
        /// Collection field to expand
        field: String,
    },

    /// Every ancestor chain from a record up to a root type.
    Paths {
        entity_type: String,
        id: String,
        #[arg(short, long)]
        root: String,
    },

    /// Free-text search; each match is reported once per position in the tree.
    Search {
        query: String,
        /// Root type the matches are placed under
        #[arg(short, long)]
        root: String,
    },
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
    message: String,
}

fn emit<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = &cli.global;
    if global.no_color {
        colored::control::set_override(false);
    }
    tracing_setup::init_subscriber(
        Verbosity::from_flags(global.verbose, global.quiet),
        global.no_color,
    );

    let project = ProjectFile::from_path(&global.project)?;
    let ws = Workspace::open(project, global.data.as_deref(), global.max_depth)?;
    let compact = global.compact;

    match &cli.command {
        Commands::Trees => cmd_trees(&ws, compact),
        Commands::Tree { name } => cmd_tree(&ws, name.as_deref(), compact),
        Commands::Roots { root_type } => emit(&ws.service.fetch_roots(root_type), compact),
        Commands::Children {
            parent_type,
            parent_id,
            field,
        } => cmd_children(&ws, parent_type, parent_id, field, compact),
        Commands::Paths {
            entity_type,
            id,
            root,
        } => cmd_paths(&ws, entity_type, id, root, compact),
        Commands::Search { query, root } => emit(&ws.service.search(query, root), compact),
    }
}

fn cmd_trees(ws: &Workspace, compact: bool) -> Result<()> {
    let trees = ws.service.list_tree_configurations();
    if trees.is_empty() {
        eprintln!("{} no hierarchies are configured", "note".yellow().bold());
    }
    emit(trees, compact)
}

fn cmd_tree(ws: &Workspace, name: Option<&str>, compact: bool) -> Result<()> {
    match ws.service.select_tree(name) {
        TreeSelection::Tree(tree) => emit(tree, compact),
        TreeSelection::NothingConfigured => {
            eprintln!(
                "{} no hierarchies are configured; mark a type as a root to create one",
                "note".yellow().bold()
            );
            emit(&serde_json::Value::Null, compact)
        }
    }
}

fn cmd_children(
    ws: &Workspace,
    parent_type: &str,
    parent_id: &str,
    field: &str,
    compact: bool,
) -> Result<()> {
    match ws.service.try_fetch_children(parent_type, parent_id, field) {
        Ok(children) => emit(&children, compact),
        Err(err @ TreeError::InvalidArgument { .. }) => {
            emit(
                &ErrorReport {
                    error: "invalid_argument",
                    message: err.to_string(),
                },
                compact,
            )?;
            std::process::exit(EXIT_INVALID_ARGUMENT);
        }
    }
}

fn cmd_paths(ws: &Workspace, entity_type: &str, id: &str, root: &str, compact: bool) -> Result<()> {
    let entity = ws
        .service
        .registry()
        .resolve(entity_type)
        .ok_or_else(|| anyhow!("unknown entity type `{entity_type}`"))?;
    let key = entity.key.parse(id)?;
    let record_id = ws
        .store
        .id_of(&entity.name, &key)
        .ok_or_else(|| anyhow!("no `{}` record with key `{key}`", entity.name))?;
    let record = ws
        .store
        .get(record_id)
        .ok_or_else(|| anyhow!("record {record_id} vanished"))?;

    emit(&ws.service.find_paths(&record, root), compact)
}
