//! varnish-admin CLI
//!
//! Command-line interface for the Varnish admin socket.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use varnish_admin::{AdminError, AdminSession, Config, Result};

/// varnish-admin CLI
#[derive(Parser, Debug)]
#[command(name = "varnish-admin")]
#[command(about = "Control a Varnish cache through its admin socket")]
#[command(version)]
struct Args {
    /// Admin socket host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Admin socket port
    #[arg(short, long, default_value = "6082")]
    port: u16,

    /// Varnish version, e.g. 3.0.4 or 4.1
    #[arg(long = "protocol-version", default_value = "3")]
    protocol_version: String,

    /// File holding the shared secret (used verbatim, newline included)
    #[arg(short = 'S', long)]
    secret_file: Option<PathBuf>,

    /// Connect and read timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and print the banner
    Banner,

    /// Ban objects matching an expression
    Purge {
        /// Ban expression, e.g. "req.http.host == example.com"
        expr: String,
    },

    /// Ban objects by URL
    PurgeUrl {
        /// URL or URL regex
        url: String,
    },

    /// Start the child process
    Start,

    /// Stop the child process
    Stop,

    /// Print the child process state
    Status,

    /// List backends
    BackendList,

    /// Send a raw command and print the response
    Raw {
        /// Command words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,

        /// Expected status code
        #[arg(short, long, default_value = "200")]
        expect: u16,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,varnish_admin=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder()
        .host(&args.host)
        .port(args.port)
        .version(&args.protocol_version)
        .timeout_secs(args.timeout);

    if let Some(path) = &args.secret_file {
        let secret = std::fs::read_to_string(path).map_err(|e| {
            AdminError::Config(format!("cannot read secret file {}: {}", path.display(), e))
        })?;
        builder = builder.secret(secret);
    }

    let config = builder.build()?;
    tracing::debug!("Using {:?}", config);

    let mut admin = AdminSession::new(config);
    let banner = admin.connect()?;

    let result = execute(&mut admin, args.command, &banner);
    admin.quit();
    result
}

fn execute(admin: &mut AdminSession, command: Commands, banner: &str) -> Result<()> {
    match command {
        Commands::Banner => println!("{}", banner),
        Commands::Purge { expr } => print_body(&admin.purge(&expr)?),
        Commands::PurgeUrl { url } => print_body(&admin.purge_url(&url)?),
        Commands::Start => {
            admin.start()?;
        }
        Commands::Stop => {
            admin.stop()?;
        }
        Commands::Status => {
            let state = admin.child_state()?;
            println!("{:?}", state);
        }
        Commands::BackendList => print_body(&admin.backend_list()?),
        Commands::Raw { words, expect } => print_body(&admin.command(&words.join(" "), expect)?),
    }
    Ok(())
}

fn print_body(body: &str) {
    let body = body.trim_end();
    if !body.is_empty() {
        println!("{}", body);
    }
}
