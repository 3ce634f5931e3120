use anyhow::Result;
use clap::{Parser, Subcommand};
use esdsl_client::{init_logging, Config, ElasticsearchClient};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "esdsl")]
#[command(about = "esdsl CLI - query and administer Elasticsearch")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.esdsl/config.toml")]
    config: PathBuf,

    /// Elasticsearch URL, overrides the config file
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show cluster name and version
    Info,

    /// Show cluster health
    Health {
        /// Restrict to these indices
        #[arg(short, long, value_delimiter = ',')]
        index: Vec<String>,

        /// Wait until the cluster reaches this status (green, yellow, red)
        #[arg(long)]
        wait_for: Option<String>,

        /// Server-side wait timeout, e.g. 30s
        #[arg(long)]
        timeout: Option<String>,
    },

    /// Search one or more indices
    Search {
        /// Target indices (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        index: Vec<String>,

        /// Free-text query
        #[arg(short, long)]
        query: Option<String>,

        /// Fields the free-text query runs against
        #[arg(short, long, value_delimiter = ',')]
        field: Vec<String>,

        /// YAML file with query, sort, size and source settings
        #[arg(long)]
        file: Option<PathBuf>,

        /// Number of hits
        #[arg(short, long)]
        size: Option<u32>,

        /// Offset of the first hit
        #[arg(long)]
        from: Option<u32>,

        /// Sort specs such as `price:asc` or `_score`
        #[arg(long, value_delimiter = ',')]
        sort: Vec<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Count matching documents
    Count {
        #[arg(short, long, value_delimiter = ',')]
        index: Vec<String>,

        /// Free-text query
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Bulk index a JSONL file
    Bulk {
        /// Target index
        #[arg(short, long)]
        index: String,

        /// JSONL file, one document per line
        #[arg(short, long)]
        file: PathBuf,

        /// Document field used as _id
        #[arg(long)]
        id_field: Option<String>,

        /// Documents per bulk request
        #[arg(long, default_value = "500")]
        batch_size: usize,

        /// Refresh the index after the last batch
        #[arg(long)]
        refresh: bool,
    },

    /// Create an index
    CreateIndex {
        name: String,

        #[arg(long)]
        shards: Option<u32>,

        #[arg(long)]
        replicas: Option<u32>,

        /// YAML file with `properties: {field: type}` and optional `dynamic`
        #[arg(short, long)]
        mapping: Option<PathBuf>,
    },

    /// Delete one or more indices
    DeleteIndex {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(&cli.config)?;
    if let Some(url) = cli.url {
        config.elasticsearch.url = url;
    }
    init_logging(&config.logging);

    tracing::debug!(url = %config.elasticsearch.url, "connecting");
    let client = ElasticsearchClient::new(&config.elasticsearch)?;

    let result = match cli.command {
        Commands::Info => commands::run_info(&client).await,
        Commands::Health {
            index,
            wait_for,
            timeout,
        } => commands::run_health(&client, &index, wait_for.as_deref(), timeout.as_deref()).await,
        Commands::Search {
            index,
            query,
            field,
            file,
            size,
            from,
            sort,
            json,
        } => {
            let options = commands::SearchOptions {
                indices: index,
                text: query,
                fields: field,
                file,
                size,
                from,
                sort,
                json,
            };
            commands::run_search(&client, options).await
        }
        Commands::Count { index, query } => {
            commands::run_count(&client, &index, query.as_deref()).await
        }
        Commands::Bulk {
            index,
            file,
            id_field,
            batch_size,
            refresh,
        } => {
            commands::run_bulk(
                &client,
                &index,
                &file,
                id_field.as_deref(),
                batch_size,
                refresh,
            )
            .await
        }
        Commands::CreateIndex {
            name,
            shards,
            replicas,
            mapping,
        } => commands::run_create_index(&client, &name, shards, replicas, mapping.as_deref()).await,
        Commands::DeleteIndex { names } => commands::run_delete_index(&client, &names).await,
    };

    client.close();
    result
}
