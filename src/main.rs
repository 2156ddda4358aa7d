use clap::{Parser, Subcommand};
use magick_interop::{config, generate, output, schema};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "magick-interop")]
#[command(about = "Generate Rust bindings for native image-library classes")]
#[command(long_about = "\
Generate Rust bindings for native image-library classes

Each JSON document in the schema directory describes one native class: its
flags, constructor, properties and methods. The generator emits one module
per class with the extern \"C\" table and a Native<Class> wrapper that owns
the handle, marshals arguments and turns the native exception slot into
Result values.

Schema structure:

  schema/
  ├── generator.toml               # Generator config (optional)
  ├── MagickImage.json             # One class per document
  ├── MagickGeometry.json
  └── formats/                     # Subdirectories are scanned too
      └── MagickFormatInfo.json

Run 'magick-interop gen-config' to generate a documented generator.toml.")]
#[command(version)]
struct Cli {
    /// Schema directory
    #[arg(long, default_value = "schema", global = true)]
    schema: PathBuf,

    /// Output directory for generated modules
    #[arg(long, default_value = "src/native", global = true)]
    output: PathBuf,

    /// Log debug output (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the schema without generating
    Check,
    /// Show the emission decisions for each class
    Plan {
        /// Classes to show (all when omitted)
        classes: Vec<String>,
    },
    /// Print the resolved schema as JSON
    Dump,
    /// Write the generated modules
    Generate {
        /// Ignore the output cache and rewrite every file
        #[arg(long)]
        no_cache: bool,
    },
    /// Print a stock generator.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check => {
            println!("==> Checking {}", cli.schema.display());
            let manifest = schema::load_schema(&cli.schema)?;
            output::print_check_output(&manifest);
            println!("==> Schema is valid");
        }
        Command::Plan { classes } => {
            let manifest = schema::load_schema(&cli.schema)?;
            let selected = if classes.is_empty() {
                manifest.classes.iter().collect::<Vec<_>>()
            } else {
                classes
                    .iter()
                    .map(|name| {
                        manifest
                            .classes
                            .iter()
                            .find(|c| &c.name == name)
                            .ok_or_else(|| format!("unknown class '{name}'"))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            };
            output::print_plan_output(&selected);
        }
        Command::Dump => {
            let manifest = schema::load_schema(&cli.schema)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Command::Generate { no_cache } => {
            println!("==> Loading schema {}", cli.schema.display());
            let manifest = schema::load_schema(&cli.schema)?;
            println!("==> Generating {}", cli.output.display());
            let result = generate::generate(&manifest, &cli.output, !no_cache)?;
            output::print_generate_output(&result, &cli.output);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `--verbose` raises the default level to debug.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let subscriber = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
