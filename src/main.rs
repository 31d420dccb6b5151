use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use plantcatalog::cli::commands;
use plantcatalog::config::CatalogConfig;

#[derive(Parser)]
#[command(name = "plantcatalog")]
#[command(about = "Register plant assets into the game's JSON catalogs and rebuild authoring documents")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the plant described by an authoring document
    Register {
        /// Authoring document (defaults to document_path from the config)
        #[arg(short, long)]
        document: Option<String>,

        /// Directory holding the images named by image_filename
        #[arg(short, long)]
        images: Option<String>,

        /// Replace existing catalog entries without asking
        #[arg(long)]
        overwrite: bool,

        /// Answer yes to every confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Rebuild the authoring document for one plant from the catalogs
    Reverse {
        /// Seed type, e.g. Art
        #[arg(short, long)]
        seed: String,

        /// Plant type, e.g. SakuraA
        #[arg(short, long)]
        plant: String,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Copy the plant's module images into this directory
        #[arg(long)]
        export_images: Option<String>,

        /// Empty the export directory first (asks for confirmation)
        #[arg(long)]
        clear: bool,

        /// Answer yes to every confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a blank authoring document
    Template {
        /// Number of placeholder parts
        #[arg(short, long, default_value_t = 2)]
        parts: usize,

        /// Output file (defaults to document_path from the config)
        #[arg(short, long)]
        output: Option<String>,

        /// Replace an existing file without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Print catalog entries for a seed or one of its plants
    Show {
        #[arg(short, long)]
        seed: String,

        #[arg(short, long)]
        plant: Option<String>,
    },
}

fn init_tracing(config: &CatalogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match CatalogConfig::load(cli.config.as_deref().map(Path::new)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Register {
            document,
            images,
            overwrite,
            yes,
        } => commands::register(
            &config,
            document.as_deref(),
            images.as_deref(),
            overwrite,
            yes,
        ),

        Commands::Reverse {
            seed,
            plant,
            output,
            export_images,
            clear,
            yes,
        } => commands::reverse(
            &config,
            &seed,
            &plant,
            output.as_deref(),
            export_images.as_deref(),
            clear,
            yes,
        ),

        Commands::Template { parts, output, yes } => {
            commands::template(&config, parts, output.as_deref(), yes)
        }

        Commands::Show { seed, plant } => commands::show(&config, &seed, plant.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
