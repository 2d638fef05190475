// SPDX-License-Identifier: MIT

use agentflow_rs::catalog::{Catalog, HttpCatalog};
use agentflow_rs::editor::document::{save_lossless, DocumentLoader, WorkflowDocument};
use agentflow_rs::editor::graph::GraphModel;
use agentflow_rs::editor::template::TemplateLibrary;
use agentflow_rs::editor::{EditorEvent, EditorSession, EditorSettings, Notice, NoticeLevel};
use agentflow_rs::error::FlowError;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Horizontal gap between layout ranks
    #[arg(long, global = true)]
    rank_sep: Option<f64>,

    /// Vertical gap between nodes in one rank
    #[arg(long, global = true)]
    node_sep: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the agents available in the catalog
    Agents,
    /// Fetch a workflow and write its document, migrating legacy layouts
    Pull {
        /// Workflow id
        id: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Save a document file to the catalog
    Push {
        /// Document file (JSON or YAML)
        file: PathBuf,

        /// Workflow name
        #[arg(short, long)]
        name: String,

        /// Update this workflow instead of creating a new one
        #[arg(long)]
        id: Option<String>,
    },
    /// Auto-layout a document file
    Layout {
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report shape problems in a document file
    Check { file: PathBuf },
    /// Instantiate a template into a new document
    Template {
        /// Template key or name
        name: String,

        /// Extra template library (YAML)
        #[arg(long)]
        library: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the built-in templates
    Templates,
    /// Execute a persisted workflow
    Run {
        id: String,

        /// Initial context as JSON
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut settings = EditorSettings::default();
    if let Some(rank_sep) = args.rank_sep {
        settings.spacing.rank_sep = rank_sep;
    }
    if let Some(node_sep) = args.node_sep {
        settings.spacing.node_sep = node_sep;
    }
    let mut session = EditorSession::new(settings);

    match args.command {
        Commands::Agents => {
            let catalog = HttpCatalog::from_env()?;
            for agent in catalog.list_agents().await? {
                match agent.description {
                    Some(desc) => println!("{}\t{}", agent.name, desc),
                    None => println!("{}", agent.name),
                }
            }
        }
        Commands::Pull { id, output } => {
            let catalog = HttpCatalog::from_env()?;
            session.load_from(&catalog, &id).await?;
            print_notices(session.drain_notices());
            write_graph(session.graph(), output)?;
        }
        Commands::Push { file, name, id } => {
            let doc = DocumentLoader::new().load_file(&file)?;
            session.open_document(&doc, id)?;
            print_notices(session.drain_notices());

            let catalog = HttpCatalog::from_env()?;
            let saved = session.save_to(&catalog, &name).await?;
            println!("Saved '{}' as workflow {}", name, saved.unwrap_or_default());
        }
        Commands::Layout { file, output } => {
            let doc = DocumentLoader::new().load_file(&file)?;
            session.open_document(&doc, None)?;
            session.dispatch(EditorEvent::AutoLayout)?;
            print_notices(session.drain_notices());
            write_graph(session.graph(), output)?;
        }
        Commands::Check { file } => {
            let doc = DocumentLoader::new().load_file(&file)?;
            session.open_document(&doc, None)?;
            print_notices(session.drain_notices());

            let issues = session.graph().analyze();
            for issue in &issues {
                println!("warning: {}", issue);
            }
            // Branching is invisible to analyze() but truncates `sequence`
            let (_, incomplete) = save_lossless(session.graph())?;
            for warning in &incomplete {
                println!("warning: {}", warning);
            }
            if issues.is_empty() && incomplete.is_empty() {
                println!(
                    "ok: {} nodes, {} connections",
                    session.graph().len(),
                    session.graph().connections().len()
                );
            }
        }
        Commands::Template {
            name,
            library,
            output,
        } => {
            let loaded;
            let lib = match library {
                Some(path) => {
                    loaded = TemplateLibrary::load_file(path)?;
                    &loaded
                }
                None => TemplateLibrary::builtin(),
            };
            let template = lib.get(&name)?.clone();
            session.apply_template(&template, true)?;
            print_notices(session.drain_notices());
            write_graph(session.graph(), output)?;
        }
        Commands::Templates => {
            for t in TemplateLibrary::builtin().iter() {
                println!(
                    "{:<14} {} {} [{}]: {}",
                    t.key,
                    t.icon,
                    t.name,
                    t.category,
                    t.agents.join(" -> ")
                );
            }
        }
        Commands::Run { id, input } => {
            let input: serde_json::Value = serde_json::from_str(&input)
                .map_err(|e| FlowError::from(format!("--input must be JSON: {}", e)))?;
            let catalog = HttpCatalog::from_env()?;
            let report = catalog.execute_workflow(&id, &input).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => log::info!("{}", notice.message),
            NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{}", notice.message),
        }
    }
}

/// Write the graph as a document, keeping `visual` even when `sequence` falls short
fn write_graph(graph: &GraphModel, output: Option<PathBuf>) -> Result<(), FlowError> {
    let (doc, warnings) = save_lossless(graph)?;
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }
    write_document(&doc, output)
}

fn write_document(doc: &WorkflowDocument, output: Option<PathBuf>) -> Result<(), FlowError> {
    let text = serde_json::to_string_pretty(doc)?;
    match output {
        Some(path) => {
            fs::write(&path, text)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
