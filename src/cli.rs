//! CLI argument parsing and command handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use crate::models::{Category, IndexConfig, IndexStats};
use crate::output;
use crate::query::SearchOptions;
use crate::system::IndexSystem;

/// Fathom: local-first file indexing and search for project trees
#[derive(Parser, Debug)]
#[command(
    name = "fathom",
    version,
    about = "A local-first file indexing and search engine",
    long_about = "Fathom scans a project tree, extracts structural facts from each file \
                  (declared symbols, imports/exports, keywords, tags), and answers ranked \
                  queries against the persisted index in .fathom/."
)]
pub struct Cli {
    /// Enable verbose logging (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the project tree and rebuild the index
    Build {
        /// Directory to index (defaults to current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Suppress the progress bar and summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Query the index
    ///
    /// Matches rank by signal strength: filename hits above declared-symbol
    /// hits, above keyword hits, above per-line content hits.
    Search {
        /// Search pattern (case-insensitive substring)
        query: String,

        /// Filter by category (script, markup, stylesheet, structured-data, documentation)
        #[arg(short, long)]
        category: Option<String>,

        /// Require at least one of these tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Skip per-line content matches
        #[arg(long)]
        no_content: bool,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (only with --json)
        #[arg(long)]
        pretty: bool,
    },

    /// Show index statistics
    Stats {
        /// Output format as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output (only with --json)
        #[arg(long)]
        pretty: bool,
    },

    /// Start a local HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "7878")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Setup logging based on verbosity
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .init();

        match self.command {
            Command::Build { path, quiet } => handle_build(&path, quiet),
            Command::Search {
                query,
                category,
                tags,
                no_content,
                limit,
                json,
                pretty,
            } => handle_search(query, category, tags, no_content, limit, json, pretty),
            Command::Stats { json, pretty } => handle_stats(json, pretty),
            Command::Serve { port, host } => handle_serve(port, host),
        }
    }
}

/// Handle the `build` subcommand
fn handle_build(path: &PathBuf, quiet: bool) -> Result<()> {
    log::info!("Starting index build for {:?}", path);

    let system = IndexSystem::open(path, IndexConfig::default());
    let start = Instant::now();
    let stats = system.build_index(!quiet)?;

    if !quiet {
        println!("Indexing complete in {:.2?}", start.elapsed());
        println!("  Files indexed: {}", stats.total_files);
        println!("  Total size: {}", format_bytes(stats.total_size_bytes));

        if !stats.files_by_category.is_empty() {
            println!("  Files by category:");
            let mut categories: Vec<_> = stats.files_by_category.iter().collect();
            categories.sort();
            for (category, count) in categories {
                println!("    {:<16} {}", category, count);
            }
        }
    }

    Ok(())
}

/// Handle the `search` subcommand
fn handle_search(
    query: String,
    category: Option<String>,
    tags: Vec<String>,
    no_content: bool,
    limit: Option<usize>,
    as_json: bool,
    pretty: bool,
) -> Result<()> {
    let system = IndexSystem::open(".", IndexConfig::default());

    if system.stats().total_files == 0 {
        output::warn("Index is empty. Run 'fathom build' to index the current directory.");
    }

    let options = SearchOptions {
        category: parse_category(category.as_deref())?,
        tags: if tags.is_empty() { None } else { Some(tags) },
        include_content: !no_content,
        max_results: limit.unwrap_or(0),
    };

    let start = Instant::now();
    let results = system.search(&query, &options);
    let elapsed = start.elapsed();

    if as_json {
        let json_str = if pretty {
            serde_json::to_string_pretty(&results)?
        } else {
            serde_json::to_string(&results)?
        };
        println!("{}", json_str);
    } else {
        for result in &results {
            match result.line {
                Some(line) => println!(
                    "{}:{}  [{}] {}  ({})",
                    result.file, line, result.match_kind, result.content, result.relevance
                ),
                None => println!(
                    "{}  [{}] {}  ({})",
                    result.file, result.match_kind, result.content, result.relevance
                ),
            }
        }
        println!("\n{} results in {:.2?}", results.len(), elapsed);
    }

    Ok(())
}

/// Handle the `stats` subcommand
fn handle_stats(as_json: bool, pretty: bool) -> Result<()> {
    let system = IndexSystem::open(".", IndexConfig::default());
    let stats = system.stats();

    if as_json {
        let json_str = if pretty {
            serde_json::to_string_pretty(&stats)?
        } else {
            serde_json::to_string(&stats)?
        };
        println!("{}", json_str);
        return Ok(());
    }

    if stats.total_files == 0 {
        println!("Index is empty. Run 'fathom build' to index the current directory.");
        return Ok(());
    }

    println!("Index Statistics");
    println!("================");
    println!("Total files:  {}", stats.total_files);
    println!("Total size:   {}", format_bytes(stats.total_size_bytes));
    if let Some(when) = chrono::DateTime::from_timestamp_millis(stats.last_updated_epoch_ms) {
        println!("Last updated: {}", when.to_rfc3339());
    }

    println!("\nBy category:");
    let mut categories: Vec<_> = stats.files_by_category.iter().collect();
    categories.sort();
    for (category, count) in categories {
        let lines = stats.lines_by_category.get(category).copied().unwrap_or(0);
        println!("  {:<16} {:>6} files  {:>8} lines", category, count, lines);
    }

    Ok(())
}

fn parse_category(value: Option<&str>) -> Result<Option<Category>> {
    match value {
        None => Ok(None),
        Some(s) => {
            let category = s.parse::<Category>().map_err(|_| {
                anyhow::anyhow!(
                    "Unknown category '{}'. Supported: script, markup, stylesheet, \
                     structured-data, documentation",
                    s
                )
            })?;
            Ok(Some(category))
        }
    }
}

/// Handle the `serve` subcommand
fn handle_serve(port: u16, host: String) -> Result<()> {
    println!("Starting Fathom HTTP server on {}:{}", host, port);
    println!("\nEndpoints:");
    println!("  GET  /search?q=<pattern>&category=&tags=&maxResults=");
    println!("  GET  /file/<relative-path>");
    println!("  GET  /tags");
    println!("  GET  /stats");
    println!("  GET  /dependencies/<relative-path>");
    println!("  POST /rebuild");
    println!("  GET  /health");
    println!("\nPress Ctrl+C to stop.");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { run_server(port, host).await })
}

/// Run the HTTP server
async fn run_server(port: u16, host: String) -> Result<()> {
    use axum::{
        extract::{Path as AxumPath, Query as AxumQuery, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::{get, post},
        Router,
    };
    use std::sync::Arc;
    use tower_http::cors::{Any, CorsLayer};

    // Server state shared across requests
    #[derive(Clone)]
    struct AppState {
        system: Arc<IndexSystem>,
    }

    // Query parameters for GET /search
    #[derive(Debug, serde::Deserialize)]
    struct SearchParams {
        q: String,
        #[serde(default)]
        category: Option<String>,
        /// Comma-separated tag list
        #[serde(default)]
        tags: Option<String>,
        #[serde(default, rename = "maxResults")]
        max_results: Option<i64>,
        #[serde(default = "default_include_content", rename = "includeContent")]
        include_content: bool,
    }

    fn default_include_content() -> bool {
        true
    }

    // GET /search endpoint
    async fn handle_search_endpoint(
        State(state): State<Arc<AppState>>,
        AxumQuery(params): AxumQuery<SearchParams>,
    ) -> Result<Json<Vec<crate::models::SearchResult>>, (StatusCode, String)> {
        log::info!("Search request: q={}", params.q);

        let category = match params.category.as_deref() {
            None | Some("") => None,
            Some(s) => match s.parse::<Category>() {
                Ok(category) => Some(category),
                Err(_) => {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        format!(
                            "Unknown category '{}'. Supported: script, markup, stylesheet, \
                             structured-data, documentation",
                            s
                        ),
                    ));
                }
            },
        };

        let tags: Option<Vec<String>> = params.tags.as_deref().map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Negative or missing caps normalize to the engine default
        let max_results = params
            .max_results
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(0);

        let options = SearchOptions {
            category,
            tags,
            include_content: params.include_content,
            max_results,
        };

        Ok(Json(state.system.search(&params.q, &options)))
    }

    // GET /file/*path endpoint
    async fn handle_file_endpoint(
        State(state): State<Arc<AppState>>,
        AxumPath(path): AxumPath<String>,
    ) -> Result<Json<crate::models::FileRecord>, (StatusCode, String)> {
        match state.system.file_record(&path) {
            Some(record) => Ok(Json(record)),
            None => Err((StatusCode::NOT_FOUND, format!("File not indexed: {}", path))),
        }
    }

    // GET /tags endpoint
    async fn handle_tags_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
        Json(state.system.tags())
    }

    // GET /stats endpoint
    async fn handle_stats_endpoint(State(state): State<Arc<AppState>>) -> Json<IndexStats> {
        Json(state.system.stats())
    }

    // GET /dependencies/*path endpoint
    async fn handle_dependencies_endpoint(
        State(state): State<Arc<AppState>>,
        AxumPath(path): AxumPath<String>,
    ) -> Json<Vec<String>> {
        Json(state.system.dependents(&path))
    }

    // POST /rebuild endpoint
    async fn handle_rebuild_endpoint(
        State(state): State<Arc<AppState>>,
    ) -> Result<Json<IndexStats>, (StatusCode, String)> {
        log::info!("Rebuild request");

        match state.system.build_index(false) {
            Ok(stats) => Ok(Json(stats)),
            Err(e) => {
                log::error!("Rebuild error: {:#}", e);
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Rebuild failed: {}", e),
                ))
            }
        }
    }

    // Health check endpoint
    async fn handle_health() -> impl IntoResponse {
        (StatusCode::OK, "Fathom is running")
    }

    // Create shared state; the index loads once at bootstrap
    let state = Arc::new(AppState {
        system: Arc::new(IndexSystem::open(".", IndexConfig::default())),
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .route("/search", get(handle_search_endpoint))
        .route("/file/*path", get(handle_file_endpoint))
        .route("/tags", get(handle_tags_endpoint))
        .route("/stats", get(handle_stats_endpoint))
        .route("/dependencies/*path", get(handle_dependencies_endpoint))
        .route("/rebuild", post(handle_rebuild_endpoint))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    // Bind to the specified address
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    log::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

/// Format a byte count for humans
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}
