//! swaggerfold CLI entrypoint
//! Parses command-line arguments and dispatches to the core resolver.

// Internal imports (std, crate)
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

// External imports (alphabetized)
use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::Confirm;
use notify::{RecursiveMode, Watcher};
use serde_json::Value as JsonValue;
use swaggerfold_core::output::{self, OutputFormat};
use swaggerfold_core::{differences, source, Config, Resolver};
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swaggerfold")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML or TOML). Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Resolve references and normalize every operation of a Swagger 2.0 document
    Resolve(ResolveArgs),
    /// Resolve two documents and report where they differ
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Path or URL to the document (YAML or JSON)
    ///
    /// Example: --input specs/petstore.yaml
    /// Example: --input https://petstore.swagger.io/v2/swagger.json
    #[arg(long, short)]
    input: String,
    /// Write the result here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Output format (json, yaml). Defaults to the output file's extension.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Deepest schema nesting followed before a fragment is dropped
    #[arg(long)]
    max_depth: Option<usize>,
    /// Let operations inherit path-level responses
    #[arg(long)]
    path_level_responses: bool,
    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
    /// Overwrite the output file without asking
    #[arg(long)]
    force: bool,
    /// Resolve again whenever the input file changes
    #[arg(long)]
    watch: bool,
    /// Only expand definitions; skip operation normalization
    #[arg(long)]
    definitions_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Path or URL of the first document
    left: String,
    /// Path or URL of the second document
    right: String,
    /// Compare after definition expansion only, without normalizing operations
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging; stdout is reserved for documents
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::discover()
            .await
            .context("Failed to load configuration")?,
    };

    match &cli.command {
        Commands::Resolve(args) => {
            let config = apply_overrides(config, args);
            resolve(args, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare(args) => compare(args, config).await,
    }
}

/// Command-line flags win over the configuration file.
fn apply_overrides(mut config: Config, args: &ResolveArgs) -> Config {
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if args.path_level_responses {
        config.path_level_responses = true;
    }
    if let Some(format) = args
        .format
        .or_else(|| args.output.as_deref().and_then(OutputFormat::from_path))
    {
        config.output_format = format;
    }
    if args.compact {
        config.pretty = false;
    }
    config
}

async fn resolve(args: &ResolveArgs, config: &Config) -> anyhow::Result<()> {
    resolve_once(args, config, args.force).await?;
    if !args.watch {
        return Ok(());
    }
    if source::is_remote(&args.input) {
        bail!("--watch needs a local file, not {}", args.input);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => error!("File watch error: {}", e),
        }
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(Path::new(&args.input), RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", args.input))?;
    info!("Watching {} for changes", args.input);

    while rx.recv().await.is_some() {
        // One save usually arrives as a burst of events.
        while rx.try_recv().is_ok() {}
        // Our own output is overwritten on every change.
        if let Err(e) = resolve_once(args, config, true).await {
            error!("{:#}", e);
        }
    }
    Ok(())
}

async fn resolve_once(args: &ResolveArgs, config: &Config, force: bool) -> anyhow::Result<()> {
    let text = source::load(&args.input)
        .await
        .with_context(|| format!("Failed to load document from {}", args.input))?;

    let mut resolver = Resolver::with_config(text, config.clone());
    if resolver.document().is_none() {
        bail!("{} did not resolve to a document", args.input);
    }
    let document = if args.definitions_only {
        resolver
            .document()
            .and_then(|d| d.get("definitions"))
            .cloned()
            .unwrap_or_else(|| JsonValue::Object(Default::default()))
    } else {
        resolver
            .parse()
            .with_context(|| format!("Failed to parse {}", args.input))?
            .clone()
    };

    let dropped = resolver.diagnostics().len();
    if dropped > 0 {
        warn!("{} unit(s) dropped while resolving {}", dropped, args.input);
    }

    let mut text = output::render(&document, config.output_format, config.pretty)?;
    if !text.ends_with('\n') {
        text.push('\n');
    }
    write_output(&text, args.output.as_deref(), force).await
}

async fn write_output(text: &str, output: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let Some(path) = output else {
        print!("{}", text);
        return Ok(());
    };

    if path.exists() && !force && !confirm_overwrite(path)? {
        info!("Left {} unchanged", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() {
        bail!("{} already exists; pass --force to overwrite it", path.display());
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

async fn compare(args: &CompareArgs, config: Config) -> anyhow::Result<ExitCode> {
    let left_text = source::load(&args.left)
        .await
        .with_context(|| format!("Failed to load document from {}", args.left))?;
    let right_text = source::load(&args.right)
        .await
        .with_context(|| format!("Failed to load document from {}", args.right))?;

    let mut left = Resolver::with_config(left_text, config);
    if left.document().is_none() {
        bail!("{} did not resolve to a document", args.left);
    }
    if !args.raw {
        left.parse()
            .with_context(|| format!("Failed to parse {}", args.left))?;
    }
    let Some(right) = left.resolve_other(right_text) else {
        bail!("{} did not resolve to a comparable document", args.right);
    };
    let Some(left) = left.document() else {
        bail!("{} did not resolve to a document", args.left);
    };

    let found = differences(left, &right);
    if found.is_empty() {
        println!("Documents are structurally equal");
        return Ok(ExitCode::SUCCESS);
    }
    for difference in &found {
        println!("{}", difference);
    }
    println!("{} difference(s)", found.len());
    Ok(ExitCode::from(1))
}
