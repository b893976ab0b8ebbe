use clap::{Parser, Subcommand};
use image_versions::imaging::RustBackend;
use image_versions::{config, output, process};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Shared flag for commands that read a versions file.
#[derive(clap::Args, Clone)]
struct ConfigArgs {
    /// Versions file
    #[arg(long, short, default_value = "versions.toml")]
    config: PathBuf,
}

#[derive(Parser)]
#[command(name = "image-versions")]
#[command(about = "Derive named image versions from source images")]
#[command(long_about = "\
Derive named image versions from source images

Versions are declared in a TOML file. Each version is a list of steps
(resize, crop, blur, quality, convert, strip, auto-orient) and may build on
other versions, whose steps run first:

  [versions.thumb]
  steps = [{ op = \"resize_to_fit\", width = 150, height = 150 }]

  [versions.blurred_thumb]
  dependencies = [\"thumb\"]
  steps = [{ op = \"gaussian_blur\", sigma = 10.0 }]

Output naming:
  no --output, or --output FILE  ->  <dir>/<stem>-<version><ext>
  --output DIR                   ->  DIR/<version><source ext>

Run 'image-versions gen-config' to generate a documented versions.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write versions for one or more source images
    Run {
        #[command(flatten)]
        config: ConfigArgs,
        /// Only write these versions (repeatable; default: all)
        #[arg(long = "version", value_name = "NAME")]
        versions: Vec<String>,
        /// Base path: an existing file to write next to, or a directory
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Print a JSON report of written files instead of progress
        #[arg(long)]
        json: bool,
        /// Source images
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
    /// Show versions, their steps and the order they run in
    List(ConfigArgs),
    /// Validate a versions file without processing anything
    Check(ConfigArgs),
    /// Print a stock versions.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            config: config_args,
            versions,
            output: base,
            json,
            sources,
        } => {
            let versions_config = config::load_config(&config_args.config)?;
            let registry = versions_config.to_registry::<RustBackend>()?;
            let backend = RustBackend::new();

            if json {
                let reports = process::process_sources(
                    &backend,
                    &registry,
                    &sources,
                    base.as_deref(),
                    &versions,
                    None,
                )?;
                println!("{}", serde_json::to_string_pretty(&reports)?);
                return Ok(());
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process_sources(
                &backend,
                &registry,
                &sources,
                base.as_deref(),
                &versions,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_run_summary(&result?);
        }
        Command::List(args) => {
            let versions_config = config::load_config(&args.config)?;
            let registry = versions_config.to_registry::<RustBackend>()?;
            output::print_version_list(&versions_config, &registry);
        }
        Command::Check(args) => {
            let versions_config = config::load_config(&args.config)?;
            output::print_check_output(&args.config, &versions_config);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
