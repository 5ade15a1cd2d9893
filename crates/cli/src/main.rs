mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// buildmeta - Extract metadata from finished build outputs
#[derive(Parser)]
#[command(name = "buildmeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Store directory (defaults to $BUILDMETA_STORE_DIR, then /nix/store)
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  /// Output format
  #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Extract products, metrics and sizes from a derivation's outputs
  Extract {
    /// Derivation JSON (`{"outputs": {...}}` or `nix derivation show` output)
    #[arg(long)]
    drv: Option<PathBuf>,

    /// Output given directly as NAME=PATH (repeatable)
    #[arg(short = 'p', long = "path", value_name = "NAME=PATH")]
    paths: Vec<String>,
  },

  /// Show NAR size, references and closure size of a store path
  PathInfo {
    /// Store path to inspect
    path: PathBuf,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Extract { drv, paths } => cmd::cmd_extract(cli.store.as_deref(), drv.as_deref(), &paths, cli.output),
    Commands::PathInfo { path } => cmd::cmd_path_info(cli.store.as_deref(), &path, cli.output),
  };

  if let Err(e) = result {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}
