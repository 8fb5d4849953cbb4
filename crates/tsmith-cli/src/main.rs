//! tsmith CLI tool.

mod config;
mod walk;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tsmith_codegen::pass::GenerationContext;
use tsmith_codegen::typescript::full_stack;
use tsmith_codegen::typescript::passes::express::ROUTES_FILE;
use tsmith_codegen::typescript::passes::registry::REGISTRY_FILE;
use tsmith_codegen::Project;
use tsmith_infer::infer_interface;

use config::{read_config, resolve_samples, ConfigFile};

#[derive(Parser)]
#[command(name = "tsmith")]
#[command(author, version, about = "TypeScript scaffolding from JSON samples and endpoint configs", long_about = None)]
struct Cli {
    /// Directory for daily log files
    #[arg(long, default_value = "logs", global = true)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate TypeScript sources from a config file or a directory of configs
    Generate {
        /// Config file, or a directory of config files
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for generated sources
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Infer a TypeScript interface from a JSON sample file
    Infer {
        /// Input JSON sample
        input: PathBuf,

        /// Name for the root interface
        #[arg(short, long)]
        name: String,

        /// Write output to a file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a config file without generating code
    Check {
        /// Input config file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // The guard flushes the file appender on drop; keep it for the whole run.
    let _guard = match init_logging(&cli.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging setup failed: {e}");
            None
        }
    };

    let result = match cli.command {
        Commands::Generate { input, output } => run_generate(&input, &output),
        Commands::Infer {
            input,
            name,
            output,
        } => run_infer(&input, &name, output.as_deref()),
        Commands::Check { input } => run_check(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Console output plus a daily-rotated append-only log file. Debug events are
/// gated behind `RUST_LOG` (e.g. `RUST_LOG=tsmith=debug`).
fn init_logging(
    log_dir: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    std::fs::create_dir_all(log_dir)?;

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tsmith=info,tsmith_codegen=info,tsmith_infer=info".to_string());

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "tsmith.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}

/// Batch driver over a directory, or fail-fast driver over a single file.
///
/// The directory driver logs and skips a config it cannot process, then logs
/// a final "generation completed"; the single-file driver propagates the
/// first error instead.
fn run_generate(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if input.is_dir() {
        let mut configs: Vec<PathBuf> = vec![];
        walk::walk(input, ".json", None, &mut |path, _relative| {
            // Sample files referenced by configs live alongside them.
            let is_sample = path
                .to_str()
                .is_some_and(|p| p.ends_with(".sample.json"));
            if !is_sample {
                configs.push(path.to_path_buf());
            }
        })?;

        let mut generated = 0usize;
        for path in &configs {
            match process_config(path, output) {
                Ok(true) => generated += 1,
                // Not a usable config; the reader already logged why.
                Ok(false) => {}
                Err(err) => {
                    warn!(target: "generate", config = %path.display(), %err, "skipping config");
                }
            }
        }
        info!(target: "generate", configs = generated, "generation completed");
        Ok(())
    } else if process_config(input, output)? {
        info!(target: "generate", "generation completed");
        Ok(())
    } else {
        Err(format!("unreadable or invalid config: {}", input.display()).into())
    }
}

/// Runs the full pass stack for one config file, seeding the context with
/// whatever output files already exist so re-runs converge.
fn process_config(path: &Path, output: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(config) = read_config(path) else {
        return Ok(false);
    };

    let file_base = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("api")
        .to_string();
    let config_dir = path.parent().unwrap_or(Path::new("."));

    let project = match config {
        ConfigFile::Client(mut client) => {
            resolve_samples(&mut client, config_dir)?;
            Project::for_client(file_base, client)
        }
        ConfigFile::Webhooks(hooks) => Project::for_webhooks(file_base, hooks),
    };

    let ctx = seed_existing(&project, output);
    let files = full_stack().run_with(&project, ctx)?;
    files.write_to(output)?;

    info!(
        target: "generate",
        config = %path.display(),
        files = files.files.len(),
        "generated"
    );
    Ok(true)
}

/// Reads the on-disk state of every file this project may touch, so the
/// mutator merges instead of starting over. The full file is read up front
/// and written back whole after all passes ran.
fn seed_existing(project: &Project, output: &Path) -> GenerationContext {
    let candidates = [
        project.types_file(),
        project.client_file(),
        project.retry_helper_file(),
        project.error_helper_file(),
        project.auth_helper_file(),
        project.webhooks_file(),
        ROUTES_FILE.to_string(),
        REGISTRY_FILE.to_string(),
    ];

    let mut ctx = GenerationContext::new();
    for name in candidates {
        if let Ok(text) = std::fs::read_to_string(output.join(&name)) {
            ctx.set_file(name, text);
        }
    }
    ctx
}

fn run_infer(
    input: &Path,
    name: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(input)?;
    let filename = input.display().to_string();

    match infer_interface(&source, name) {
        Ok(Some(text)) => {
            match output {
                Some(out) => {
                    std::fs::write(out, &text)?;
                    println!("Wrote {} to {}", name, out.display());
                }
                None => print!("{text}"),
            }
            Ok(())
        }
        Ok(None) => Err("inference produced no output (see warnings)".into()),
        Err(e) => {
            e.report(&filename, &source);
            Err("inference failed".into())
        }
    }
}

fn run_check(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match read_config(input) {
        Some(ConfigFile::Client(config)) => {
            println!("✓ {} is a valid client config", input.display());
            println!("  baseUrl: {}", config.base_url);
            println!("  {} endpoints", config.endpoints.len());

            for endpoint in &config.endpoints {
                let sample = if endpoint.response_sample.is_some()
                    || endpoint.response_sample_file.is_some()
                {
                    "sample"
                } else {
                    "no sample"
                };
                println!(
                    "    {} {} -> {} ({})",
                    endpoint.method, endpoint.path, endpoint.name, sample
                );
            }
            Ok(())
        }
        Some(ConfigFile::Webhooks(config)) => {
            println!("✓ {} is a valid webhook config", input.display());
            println!("  {} webhooks", config.webhooks.len());

            for webhook in &config.webhooks {
                println!("    {} {} -> {}", webhook.method, webhook.path, webhook.name);
            }
            Ok(())
        }
        None => Err("validation failed".into()),
    }
}
