//! Command definitions and execution.

use anyhow::{bail, Context, Result};
use bibgraph_core::syntax::{self, Format};
use bibgraph_export::format_query_result;
use bibgraph_ingest::pipeline::parse_uri_list;
use bibgraph_ingest::{load_bulk, load_file, load_resources, HttpClient, IngestReport};
use bibgraph_marc::{bibframe_to_marc, marc_to_bibframe};
use bibgraph_shacl::{validate, ShapesGraph};
use bibgraph_sparql::{canned, execute, prefix_preamble, Binding, QueryResult};
use bibgraph_store::GraphStore;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "bibgraph",
    about = "Assemble, query, validate and convert BIBFRAME graphs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and merge a comma-separated list of resource URIs (fail-fast)
    Load { uris: String },

    /// Bulk-import resources from a paginated API, skipping bad records
    Bulk {
        base_url: String,
        /// Restrict the listing to one group
        #[arg(long)]
        group: Option<String>,
    },

    /// Ingest an RDF file or a zip archive of RDF files
    File { path: PathBuf },

    /// Run a query against the store (bound prefixes are pre-declared)
    Query { query: String },

    /// Run a canned summary query: all | subjects | predicates | objects
    Canned { which: String },

    /// Print the store summary counts
    Summary,

    /// Validate the store (bundled BIBFRAME shapes unless --shapes is given)
    Validate {
        #[arg(long)]
        shapes: Option<PathBuf>,
    },

    /// Serialize the whole store: ttl | nt | xml | json-ld
    Serialize {
        format: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run a query and export the rows: csv | json
    Export {
        query: String,
        format: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Convert a MARC file (.mrc/.marc/.xml) to BIBFRAME and merge it
    Marc2bf { path: PathBuf },

    /// Convert the store to MARC: xml | mrc | marc
    Bf2marc { format: String, output: PathBuf },
}

pub struct CommandResult {
    pub success: bool,
    pub message: String,
}

impl CommandResult {
    fn ok(message: impl Into<String>) -> Self {
        CommandResult {
            success: true,
            message: message.into(),
        }
    }
}

/// Owns the process-lifetime store and executes commands against it.
pub struct CommandExecutor {
    store: GraphStore,
    client: HttpClient,
}

impl CommandExecutor {
    pub fn new() -> Result<Self> {
        Ok(CommandExecutor {
            store: GraphStore::new(),
            client: HttpClient::new()?,
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub async fn execute(&mut self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Load { uris } => {
                let uris = parse_uri_list(&uris);
                let report = load_resources(&mut self.store, &self.client, &uris).await?;
                Ok(CommandResult::ok(ingest_message(&report)))
            }
            Commands::Bulk { base_url, group } => {
                let report =
                    load_bulk(&mut self.store, &self.client, &base_url, group.as_deref()).await?;
                Ok(CommandResult::ok(ingest_message(&report)))
            }
            Commands::File { path } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                let report = load_file(&mut self.store, &file_name(&path), &bytes)?;
                Ok(CommandResult::ok(ingest_message(&report)))
            }
            Commands::Query { query } => {
                let result = self.run_query(&query)?;
                Ok(CommandResult::ok(render_table(&result)))
            }
            Commands::Canned { which } => {
                let query = match which.as_str() {
                    "all" => canned::ALL_TRIPLES,
                    "subjects" => canned::DISTINCT_SUBJECTS,
                    "predicates" => canned::DISTINCT_PREDICATES,
                    "objects" => canned::DISTINCT_OBJECTS,
                    other => bail!("unknown canned query '{}'", other),
                };
                let result = self.run_query(query)?;
                Ok(CommandResult::ok(render_table(&result)))
            }
            Commands::Summary => {
                let summary = self.store.summary();
                Ok(CommandResult::ok(format!(
                    "triples: {}\nsubjects: {}\npredicates: {}\nobjects: {}\nworks: {}\ninstances: {}",
                    summary.triples,
                    summary.subjects,
                    summary.predicates,
                    summary.objects,
                    summary.works,
                    summary.instances
                )))
            }
            Commands::Validate { shapes } => {
                let shapes = match shapes {
                    Some(path) => {
                        let text = tokio::fs::read_to_string(&path)
                            .await
                            .with_context(|| format!("reading {}", path.display()))?;
                        ShapesGraph::from_turtle(&text)?
                    }
                    None => ShapesGraph::bibframe()?,
                };
                let report = validate(self.store.graph(), &shapes);
                let report_graph = report.to_graph();
                let turtle = syntax::serialize(&report_graph, Format::Turtle)?;
                let message = format!(
                    "conforms: {}\nviolations: {}, warnings: {}\nreport ({} triples):\n{}",
                    report.conforms,
                    report.violation_count(),
                    report.warning_count(),
                    report_graph.len(),
                    turtle
                );
                Ok(CommandResult {
                    success: report.conforms,
                    message,
                })
            }
            Commands::Serialize { format, output } => {
                let payload = self.store.serialize(&format)?;
                match output {
                    Some(path) => {
                        tokio::fs::write(&path, &payload)
                            .await
                            .with_context(|| format!("writing {}", path.display()))?;
                        Ok(CommandResult::ok(format!(
                            "wrote {} bytes to {}",
                            payload.len(),
                            path.display()
                        )))
                    }
                    None => Ok(CommandResult::ok(payload)),
                }
            }
            Commands::Export {
                query,
                format,
                output,
            } => {
                let result = self.run_query(&query)?;
                let payload = format_query_result(&result, &format)?;
                match output {
                    Some(path) => {
                        tokio::fs::write(&path, &payload)
                            .await
                            .with_context(|| format!("writing {}", path.display()))?;
                        Ok(CommandResult::ok(format!(
                            "wrote {} row(s) to {}",
                            result.rows.len(),
                            path.display()
                        )))
                    }
                    None => Ok(CommandResult::ok(payload)),
                }
            }
            Commands::Marc2bf { path } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                let graph = marc_to_bibframe(&file_name(&path), &bytes)?;
                let added = self.store.merge(graph);
                let summary = self.store.summary();
                Ok(CommandResult::ok(format!(
                    "merged {} new triple(s); store now {} triples, {} works, {} instances",
                    added, summary.triples, summary.works, summary.instances
                )))
            }
            Commands::Bf2marc { format, output } => {
                let bytes = bibframe_to_marc(self.store.graph(), &format)?;
                tokio::fs::write(&output, &bytes)
                    .await
                    .with_context(|| format!("writing {}", output.display()))?;
                Ok(CommandResult::ok(format!(
                    "wrote {} bytes to {}",
                    bytes.len(),
                    output.display()
                )))
            }
        }
    }

    /// Pre-declare the store's bound prefixes so queries can use bf:,
    /// rdf:, etc. without their own PREFIX lines.
    fn run_query(&self, query: &str) -> Result<QueryResult> {
        let full = format!(
            "{}{}",
            prefix_preamble(self.store.graph().prefixes()),
            query
        );
        Ok(execute(self.store.graph(), &full)?)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn ingest_message(report: &IngestReport) -> String {
    let mut message = format!(
        "merged {} resource(s), {} new triple(s), {} skipped",
        report.merged,
        report.added_triples,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        message.push_str(&format!("\n  skipped {}: {}", skipped.uri, skipped.reason));
    }
    message.push_str(&format!(
        "\nstore: {} triples, {} subjects, {} works, {} instances",
        report.summary.triples, report.summary.subjects, report.summary.works,
        report.summary.instances
    ));
    message
}

fn render_table(result: &QueryResult) -> String {
    let mut out = result.variables.join("\t");
    for row in &result.rows {
        out.push('\n');
        let cells: Vec<&str> = row.iter().map(Binding::lexical).collect();
        out.push_str(&cells.join("\t"));
    }
    out.push_str(&format!("\n{} row(s)", result.rows.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn query_on_empty_store_returns_zero_rows() {
        let mut executor = CommandExecutor::new().unwrap();
        let result = executor
            .execute(Commands::Query {
                query: "SELECT ?s WHERE { ?s ?p ?o . }".to_string(),
            })
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.message.contains("0 row(s)"));
    }

    #[tokio::test]
    async fn file_ingest_then_summary_and_export() {
        let mut file = tempfile::Builder::new().suffix(".ttl").tempfile().unwrap();
        writeln!(
            file,
            "@prefix bf: <http://id.loc.gov/ontologies/bibframe/> .\n\
             <http://x/w/1> a bf:Work ; bf:title \"One\" ."
        )
        .unwrap();

        let mut executor = CommandExecutor::new().unwrap();
        let result = executor
            .execute(Commands::File {
                path: file.path().to_path_buf(),
            })
            .await
            .unwrap();
        assert!(result.message.contains("merged 1 resource(s)"));

        let summary = executor.execute(Commands::Summary).await.unwrap();
        assert!(summary.message.contains("triples: 2"));
        assert!(summary.message.contains("works: 1"));

        let export = executor
            .execute(Commands::Export {
                query: "SELECT ?s WHERE { ?s a bf:Work . }".to_string(),
                format: "csv".to_string(),
                output: None,
            })
            .await
            .unwrap();
        assert!(export.message.starts_with("s\n"));
        assert!(export.message.contains("http://x/w/1"));
    }

    #[tokio::test]
    async fn validate_reports_nonconformance_via_exit_status() {
        let mut file = tempfile::Builder::new().suffix(".ttl").tempfile().unwrap();
        writeln!(
            file,
            "@prefix bf: <http://id.loc.gov/ontologies/bibframe/> .\n\
             <http://x/w/1> a bf:Work ."
        )
        .unwrap();

        let mut executor = CommandExecutor::new().unwrap();
        executor
            .execute(Commands::File {
                path: file.path().to_path_buf(),
            })
            .await
            .unwrap();
        let result = executor.execute(Commands::Validate { shapes: None }).await.unwrap();
        assert!(!result.success);
        assert!(result.message.contains("conforms: false"));
    }
}
