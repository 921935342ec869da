//! mongobject CLI - MongoDB CRUD from the command line
//!
//! Usage:
//!   mongobject info [--server]                  Show address, database and collection
//!   mongobject databases                        List databases
//!   mongobject collections [--filter JSON]      List collections of the database
//!   mongobject insert '{"a": 1}'                Insert a document (or a JSON array)
//!   mongobject find --filter '{"a": 1}'         Find documents
//!   mongobject update FILTER UPDATE [--one]     Update documents
//!   mongobject delete FILTER [--one]            Delete documents
//!   mongobject init                             Write a mongobject.toml
//!
//! Connection:
//!   mongobject --uri mongodb://localhost:27017 -d shop -c orders find
//!   mongobject --host db.internal --port 27018 -d shop collections
//!   MONGOBJECT_URI=mongodb://... mongobject -d shop databases

mod config;

use anyhow::{Context, Result};
use bson::Document as BsonDocument;
use clap::{Parser, Subcommand};
use mongobject::blocking::Mongobject;
use mongobject::{parse_json_document, parse_json_payload, to_json, FindOption, FindQuery};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "mongobject")]
#[command(about = "MongoDB CRUD from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./mongobject.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Connection string (mongodb:// or mongodb+srv://)
    #[arg(long, env = "MONGOBJECT_URI", global = true)]
    uri: Option<String>,

    /// Server host name
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Database name
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Collection name
    #[arg(short, long, global = true)]
    collection: Option<String>,

    /// Force TLS on or off
    #[arg(long, global = true)]
    tls: Option<bool>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configured address, database and collection
    Info {
        /// Also query the server's build info
        #[arg(long)]
        server: bool,
    },
    /// Write the effective configuration to a file
    Init {
        /// Output path
        #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// List databases
    Databases {
        /// Filter document (JSON)
        #[arg(long)]
        filter: Option<String>,
    },
    /// List collections of the selected database
    Collections {
        /// Filter document (JSON)
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create a collection in the selected database
    CreateCollection {
        name: String,
    },
    /// Drop the selected collection
    DropCollection,
    /// Drop the selected database
    DropDatabase,
    /// Insert a JSON object or an array of objects
    Insert {
        document: String,
    },
    /// Find documents
    Find {
        /// Filter document (JSON)
        #[arg(long, default_value = "{}")]
        filter: String,

        /// Projection document (JSON)
        #[arg(long)]
        projection: Option<String>,

        /// Sort document (JSON)
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, default_value = "0")]
        skip: u64,

        /// Maximum number of documents, 0 for no limit
        #[arg(long, default_value = "0")]
        limit: i64,

        /// find, find_one, find_one_and_delete, find_one_and_replace, find_one_and_update
        #[arg(long, default_value = "find")]
        option: FindOption,

        /// Replacement or update document for the find_one_and_* options
        #[arg(long)]
        document: Option<String>,

        #[arg(long)]
        upsert: bool,

        /// Return the document after modification instead of before
        #[arg(long)]
        after: bool,
    },
    /// Update documents matching a filter
    Update {
        filter: String,
        update: String,

        #[arg(long)]
        upsert: bool,

        /// Only the first match
        #[arg(long)]
        one: bool,
    },
    /// Replace documents matching a filter
    Replace {
        filter: String,
        replacement: String,

        #[arg(long)]
        upsert: bool,

        /// Only the first match
        #[arg(long)]
        one: bool,
    },
    /// Delete documents matching a filter
    Delete {
        filter: String,

        /// Only the first match
        #[arg(long)]
        one: bool,
    },
    /// Count documents matching a filter
    Count {
        #[arg(long, default_value = "{}")]
        filter: String,

        #[arg(long, default_value = "0")]
        skip: u64,

        /// 0 for no limit
        #[arg(long, default_value = "0")]
        limit: u64,
    },
    /// Distinct values of a field
    Distinct {
        key: String,

        #[arg(long)]
        filter: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let overrides = config::Overrides {
        uri: cli.uri,
        host: cli.host,
        port: cli.port,
        database: cli.database,
        collection: cli.collection,
        tls: cli.tls,
    };
    let connection_config = overrides.apply(config::load_or_default(cli.config.as_deref())?);

    if let Commands::Init { output, force } = &cli.command {
        return run_init(&connection_config, output, *force);
    }

    let mut mongobject =
        Mongobject::new(connection_config).context("Invalid connection configuration")?;
    let info = mongobject.get_info();
    debug!(
        address = %info.address,
        database = ?info.database,
        collection = ?info.collection,
        "effective configuration"
    );

    if let Commands::Info { server: false } = cli.command {
        return print_json(&serde_json::to_value(mongobject.get_info())?);
    }

    mongobject.open().context("Failed to open MongoDB client")?;
    let output = run_command(&mut mongobject, cli.command)?;
    print_json(&output)
}

fn run_command(mongobject: &mut Mongobject, command: Commands) -> Result<Value> {
    let output = match command {
        Commands::Info { .. } => {
            let server = mongobject.server_info().context("Failed to query server info")?;
            json!({
                "instance": serde_json::to_value(mongobject.get_info())?,
                "server": to_json(&server),
            })
        }
        Commands::Init { .. } => anyhow::bail!("init runs without a connection"),
        Commands::Databases { filter } => {
            json!(mongobject.get_available_databases(parse_optional(filter.as_deref())?)?)
        }
        Commands::Collections { filter } => {
            json!(mongobject.get_available_collections(parse_optional(filter.as_deref())?)?)
        }
        Commands::CreateCollection { name } => {
            mongobject.create_collection(&name)?;
            json!({ "created": name })
        }
        Commands::DropCollection => json!({ "dropped": mongobject.drop_collection()? }),
        Commands::DropDatabase => json!({ "dropped": mongobject.drop_database()? }),
        Commands::Insert { document } => {
            let payload = parse_json_payload(&document).context("Invalid document")?;
            json!({ "inserted": mongobject.insert(payload)? })
        }
        Commands::Find {
            filter,
            projection,
            sort,
            skip,
            limit,
            option,
            document,
            upsert,
            after,
        } => {
            let mut query = FindQuery::new()
                .filter(parse(&filter)?)
                .skip(skip)
                .limit(limit)
                .option(option)
                .upsert(upsert)
                .return_document_before(!after);
            if let Some(projection) = parse_optional(projection.as_deref())? {
                query = query.projection(projection);
            }
            if let Some(sort) = parse_optional(sort.as_deref())? {
                query = query.sort(sort);
            }
            if let Some(document) = parse_optional(document.as_deref())? {
                query = query.document(document);
            }

            let found = mongobject.find(query)?;
            Value::Array(
                found
                    .into_iter()
                    .map(|found| to_json(&found.into_document()))
                    .collect(),
            )
        }
        Commands::Update {
            filter,
            update,
            upsert,
            one,
        } => json!({ "updated": mongobject.update(parse(&filter)?, parse(&update)?, upsert, one)? }),
        Commands::Replace {
            filter,
            replacement,
            upsert,
            one,
        } => json!({
            "replaced": mongobject.replace(parse(&filter)?, parse(&replacement)?, upsert, one)?
        }),
        Commands::Delete { filter, one } => {
            json!({ "deleted": mongobject.delete(parse(&filter)?, one)? })
        }
        Commands::Count {
            filter,
            skip,
            limit,
        } => json!(mongobject.count(parse(&filter)?, skip, limit)?),
        Commands::Distinct { key, filter } => {
            let values = mongobject.distinct(&key, parse_optional(filter.as_deref())?)?;
            Value::Array(values.into_iter().map(|v| v.into_relaxed_extjson()).collect())
        }
    };
    Ok(output)
}

fn run_init(config: &mongobject::ConnectionConfig, output: &std::path::Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }
    // Fail early on a config that could never connect
    config.address().context("Invalid connection configuration")?;
    config::save(config, output)?;
    eprintln!("Wrote {}", output.display());
    Ok(())
}

fn parse(input: &str) -> Result<BsonDocument> {
    parse_json_document(input).with_context(|| format!("Invalid JSON document: {}", input))
}

fn parse_optional(input: Option<&str>) -> Result<Option<BsonDocument>> {
    input.map(parse).transpose()
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging based on log level
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}
