//! Voice tools CLI
//!
//! Lists the enabled tools or invokes one of them with JSON arguments.
//!
//! # Usage
//!
//! ```bash
//! # Configure providers through the environment
//! export BRAVE_API_KEY="..."
//! export FINNHUB_API_KEY="..."
//!
//! # Show the tool definitions advertised to the agent
//! cargo run --bin voice-tools -p voice-resolver -- list
//!
//! # Call a tool
//! cargo run --bin voice-tools -p voice-resolver -- call get_financial_data \
//!     --args '{"query_type": "stock", "symbol": "BTC"}'
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use voice_resolver::{EngineConfig, ToolDispatcher, build_registry};
use voice_utils::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "voice-tools")]
#[command(about = "Resolve voice agent tool calls from the command line", long_about = None)]
struct Args {
    /// JSON configuration file; the environment is used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogArg::Pretty, global = true)]
    log_format: LogArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the definitions of every enabled tool
    List,
    /// Invoke a tool
    Call {
        /// Tool name, e.g. search_web
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogArg {
    Pretty,
    Json,
}

impl From<LogArg> for LogFormat {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Pretty => LogFormat::Pretty,
            LogArg::Json => LogFormat::Json,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => EngineConfig::from_env().context("failed to read configuration from environment")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    voice_utils::init_tracing_with("warn,voice_resolver=info", args.log_format.into());

    let config = load_config(args.config.as_ref())?;
    let dispatcher = Arc::new(ToolDispatcher::from_config(config)?);
    let _sweeper = dispatcher.spawn_cache_sweeper();
    let registry = build_registry(Arc::clone(&dispatcher));

    info!("Enabled tools: {:?}", registry.names());

    match args.command {
        Command::List => {
            println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
        },
        Command::Call { tool, args } => {
            let params: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;

            match registry.execute(&tool, params).await {
                Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
                Err(e) => {
                    let report = serde_json::json!({ "error": e.kind(), "message": e.to_string() });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    std::process::exit(1);
                },
            }
        },
    }

    Ok(())
}
