//! CLI command definitions, routing, and tracing setup.

use std::path::Path;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use modelpack_core::bundle::read_pack;
use modelpack_core::overlay::DEFAULT_OVERLAY;
use modelpack_core::pipeline::{
    PipelineStage, ProgressReporter, SavePackRequest, load_cdb_and_save_modelpack,
    load_cdb_and_save_modelpack_in_def_location,
};
use modelpack_shared::{AppConfig, ModelPaths, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// modelpack: build deployable concept-recognition model packs.
#[derive(Parser)]
#[command(
    name = "modelpack",
    version,
    about = "Combine a concept database and a vocabulary into a distributable model pack.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Root models directory (contains cdb/, vocab/ and modelpack/).
    #[arg(long, global = true)]
    pub models_root: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build a model pack from an explicit concept database path.
    Create {
        /// Concept database to pack.
        #[arg(long)]
        cdb: String,

        /// File name of the produced pack.
        #[arg(short, long)]
        name: String,

        /// Output directory (defaults to <models-root>/modelpack).
        #[arg(short, long)]
        out: Option<String>,

        /// Vocabulary file (defaults to <models-root>/vocab/vocab.dat).
        #[arg(long)]
        vocab: Option<String>,
    },

    /// Build a model pack from a named CDB using the default layout.
    CreateDefault {
        /// CDB file name inside <models-root>/cdb.
        cdb_name: String,

        /// File name of the produced pack.
        pack_name: String,
    },

    /// Verify a model pack and print its contents.
    Inspect {
        /// Path to the pack file.
        pack: String,
    },

    /// Print the configuration overlay applied to every pack.
    Overlay,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration and paths.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "modelpack=warn",
        1 => "modelpack=info",
        2 => "modelpack=debug",
        _ => "modelpack=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    // Init must work even when the existing config file is unreadable
    if let Command::Config {
        action: ConfigAction::Init,
    } = cli.command
    {
        return cmd_config_init();
    }

    let config = load_config()?;
    let paths = resolve_paths(&config, cli.models_root.as_deref())?;

    match cli.command {
        Command::Create {
            cdb,
            name,
            out,
            vocab,
        } => cmd_create(&paths, &cdb, &name, out.as_deref(), vocab.as_deref()),
        Command::CreateDefault {
            cdb_name,
            pack_name,
        } => cmd_create_default(&paths, &cdb_name, &pack_name),
        Command::Inspect { pack } => cmd_inspect(Path::new(&pack)),
        Command::Overlay => cmd_overlay(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config, &paths),
        },
    }
}

/// Resolve default locations once: flag > config file > built-in default.
fn resolve_paths(config: &AppConfig, models_root: Option<&str>) -> Result<ModelPaths> {
    let cwd =
        std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    let mut config = config.clone();
    if let Some(root) = models_root {
        config.paths.models_root = root.to_string();
    }
    Ok(ModelPaths::resolve(&config, &cwd))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_create(
    paths: &ModelPaths,
    cdb: &str,
    name: &str,
    out: Option<&str>,
    vocab: Option<&str>,
) -> Result<()> {
    let mut request = SavePackRequest::new(cdb, name, paths);
    if let Some(dir) = out {
        request = request.with_pack_dir(dir);
    }
    if let Some(vocab) = vocab {
        request = request.with_vocab_path(vocab);
    }

    info!(
        cdb = %request.cdb_path.display(),
        vocab = %request.vocab_path.display(),
        out = %request.pack_dir.display(),
        "creating model pack"
    );

    let reporter = CliProgress::new();
    let result = load_cdb_and_save_modelpack(&request, &reporter);
    reporter.spinner.finish_and_clear();

    print_created(&result?);
    Ok(())
}

fn cmd_create_default(paths: &ModelPaths, cdb_name: &str, pack_name: &str) -> Result<()> {
    let reporter = CliProgress::new();
    let result =
        load_cdb_and_save_modelpack_in_def_location(paths, cdb_name, pack_name, &reporter);
    reporter.spinner.finish_and_clear();

    print_created(&result?);
    Ok(())
}

fn print_created(path: &Path) {
    println!();
    println!("  Model pack created successfully!");
    println!("  Path: {}", path.display());
    println!();
}

fn cmd_inspect(pack_path: &Path) -> Result<()> {
    let pack = read_pack(pack_path)?;
    let manifest = &pack.manifest;

    println!();
    println!("  Name:       {}", manifest.name);
    println!("  ID:         {}", manifest.id);
    println!("  Created:    {}", manifest.created_at.to_rfc3339());
    println!("  Tool:       {}", manifest.tool_version);
    println!("  Concepts:   {}", manifest.concept_count);
    println!("  Vocabulary: {} words", manifest.vocab_size);
    println!();
    println!("  Components:");
    for component in &manifest.components {
        println!(
            "    {:<12} {:>10} bytes  sha256:{}",
            component.filename, component.size_bytes, component.sha256
        );
    }
    println!();
    println!("  Overlaid settings:");
    for entry in DEFAULT_OVERLAY {
        let value = pack
            .config
            .get(entry.section, entry.key)
            .map(ToString::to_string)
            .unwrap_or_else(|| "<missing>".to_string());
        println!("    {}.{} = {value}", entry.section, entry.key);
    }
    println!();

    Ok(())
}

fn cmd_overlay() -> Result<()> {
    for entry in DEFAULT_OVERLAY {
        let value = modelpack_artifacts::SettingValue::from(entry.value);
        println!("{:<26} {:<30} {value}", entry.section, entry.key);
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig, paths: &ModelPaths) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    println!("# resolved");
    print_path("models_root", &paths.models_root);
    print_path("cdb_dir", &paths.cdb_dir);
    print_path("vocab_path", &paths.vocab_path);
    print_path("modelpack_dir", &paths.modelpack_dir);
    Ok(())
}

fn print_path(label: &str, path: &Path) {
    println!("# {label:<14} {}", path.display());
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: PipelineStage) {
        let msg = match stage {
            PipelineStage::Unloaded => "Loading concept database",
            PipelineStage::Loaded => "Applying configuration overlay",
            PipelineStage::Overlaid => "Loading vocabulary and writing pack",
            PipelineStage::Assembled => "Finishing",
        };
        self.spinner.set_message(msg);
    }

    fn done(&self, _pack_path: &Path) {
        self.spinner.finish_and_clear();
    }
}
