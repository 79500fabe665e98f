//! asset-kg CLI: inspect and maintain the asset knowledge graph.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use asset_kg::codec::{NodeGraph, serialize_in};
use asset_kg::config::KgConfig;
use asset_kg::connector::KgConnector;

const DEFAULT_CONFIG: &str = "asset-kg.toml";

#[derive(Parser)]
#[command(name = "asset-kg", version, about = "Asset knowledge-graph persistence engine")]
struct Cli {
    /// Configuration file (defaults to ./asset-kg.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named graph to operate on instead of the configured default.
    #[arg(long, global = true)]
    graph: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show, switch or list named graphs.
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },

    /// Load one node by uri.
    Load {
        #[arg(long)]
        uri: String,

        /// Expansion rounds; 1 loads only the node's own attributes.
        #[arg(long, default_value = "1")]
        depth: usize,

        /// Print the loaded subgraph as Turtle.
        #[arg(long)]
        turtle: bool,
    },

    /// Load every node of one class.
    Class {
        /// Class identifier, e.g. urn:samm:sindit.sintef.no:1.0.0#Connection.
        #[arg(long)]
        class: String,

        #[arg(long, default_value = "1")]
        depth: usize,
    },

    /// Load every node of every registered class.
    All {
        #[arg(long, default_value = "1")]
        depth: usize,
    },

    /// Delete every triple of one node.
    Delete {
        #[arg(long)]
        uri: String,
    },

    /// Look up measurement units.
    Units {
        #[command(subcommand)]
        action: UnitAction,
    },

    /// Inspect relationship types and instances.
    Relationships {
        #[command(subcommand)]
        action: RelationshipAction,
    },

    /// List the supported literal datatypes.
    Datatypes,
}

#[derive(Subcommand)]
enum GraphAction {
    /// Print the active graph.
    Get,
    /// Make a graph the configured default (short names get the base namespace).
    Set { identifier: String },
    /// List named graphs holding data.
    List,
}

#[derive(Subcommand)]
enum UnitAction {
    /// Units whose name, symbol or code contains a term.
    Search { term: String },
    /// Every unit in the catalogue.
    All,
    /// One unit by uri.
    Get { uri: String },
}

#[derive(Subcommand)]
enum RelationshipAction {
    /// Relationship classes declared in the ontology.
    Types,
    /// Every relationship node in the active graph.
    All {
        #[arg(long, default_value = "1")]
        depth: usize,
    },
    /// Relationships whose source or target is a node.
    Of { uri: String },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = load_config(cli.config.as_deref(), &config_path)?;

    let store = config.store.open()?;
    let kg = KgConnector::connect(store, &config)?;
    if let Some(graph) = &cli.graph {
        kg.set_active_graph(graph)?;
    }

    match cli.command {
        Commands::Graph { action } => match action {
            GraphAction::Get => println!("{}", kg.active_graph()),
            GraphAction::Set { identifier } => {
                let resolved = kg.set_active_graph(&identifier)?;
                config.graph.default_graph = resolved.clone();
                config.save(&config_path)?;
                println!("Active graph: {resolved} (saved to {})", config_path.display());
            }
            GraphAction::List => {
                let graphs = kg.graphs()?;
                if graphs.is_empty() {
                    println!("No named graphs hold data.");
                }
                for graph in graphs {
                    println!("{graph}");
                }
            }
        },

        Commands::Load { uri, depth, turtle } => {
            let graph = kg.load_by_uri(&uri, None, depth)?;
            if turtle {
                let root = graph
                    .root()
                    .ok_or_else(|| miette::miette!("load returned no root for {uri}"))?;
                println!("{}", serialize_in(root, &graph)?.to_turtle()?);
            } else if let Some(node) = graph.root().and_then(|n| graph.materialize(n.uri())) {
                print!("{node}");
            }
        }

        Commands::Class { class, depth } => print_roots(&kg.load_by_class(&class, depth)?),

        Commands::All { depth } => print_roots(&kg.load_all(depth)?),

        Commands::Delete { uri } => {
            kg.delete(&uri)?;
            println!("Deleted {uri} from {}", kg.active_graph());
        }

        Commands::Units { action } => match action {
            UnitAction::Search { term } => print_json(&kg.search_units(&term)?)?,
            UnitAction::All => print_json(&kg.all_units()?)?,
            UnitAction::Get { uri } => match kg.unit_by_uri(&uri)? {
                Some(unit) => print_json(&unit)?,
                None => miette::bail!("no unit with uri {uri}"),
            },
        },

        Commands::Relationships { action } => match action {
            RelationshipAction::Types => print_json(&kg.relationship_types()?)?,
            RelationshipAction::All { depth } => print_roots(&kg.all_relationships(depth)?),
            RelationshipAction::Of { uri } => print_roots(&kg.relationships_of(&uri)?),
        },

        Commands::Datatypes => print_json(&kg.data_types())?,
    }

    Ok(())
}

/// An explicit path must exist; the implicit default may be absent.
fn load_config(explicit: Option<&Path>, path: &Path) -> Result<KgConfig> {
    if explicit.is_some() || path.exists() {
        Ok(KgConfig::load(path)?)
    } else {
        Ok(KgConfig::default())
    }
}

fn print_roots(graph: &NodeGraph) {
    let roots: Vec<_> = graph.roots().collect();
    if roots.is_empty() {
        println!("No nodes found.");
        return;
    }
    println!("Nodes ({}):", roots.len());
    for node in roots {
        print!("{node}");
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
