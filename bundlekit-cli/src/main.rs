use anyhow::Result;
use bundlekit_cli::commands;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bundlekit")]
#[command(about = "Bundlekit - Inspect and salvage device diagnostic bundles", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a bundle and list its sections and warnings
    Scan {
        /// Input bundle
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the scan report
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },

    /// Check bundle integrity
    Verify {
        /// Input bundle, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Fail on any warning
        #[arg(long)]
        strict: bool,
    },

    /// Write each section payload to its own file
    Extract {
        /// Input bundle
        #[arg(short, long)]
        input: String,

        /// Output directory
        #[arg(short, long)]
        output: String,
    },

    /// Build a bundle from a JSON manifest
    Pack {
        /// Input JSON manifest (array of sections)
        #[arg(short, long)]
        input: String,

        /// Output bundle file
        #[arg(short, long)]
        output: String,

        /// Container format version (1 or 2)
        #[arg(long, default_value = "2")]
        format_version: u32,
    },

    /// Show firmware identity and the matching release image
    Firmware {
        /// Input bundle
        #[arg(short, long)]
        input: String,

        /// Directory of released ELF images
        #[arg(long)]
        releases: Option<String>,

        /// Explicit ELF image, overrides the release lookup
        #[arg(long)]
        elf: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Scan {
            input,
            output,
            stats_only,
        } => commands::scan::execute(&input, output.as_deref(), stats_only),

        Commands::Verify { input, strict } => commands::verify::execute(&input, strict),

        Commands::Extract { input, output } => commands::extract::execute(&input, &output),

        Commands::Pack {
            input,
            output,
            format_version,
        } => commands::pack::execute(&input, &output, format_version),

        Commands::Firmware {
            input,
            releases,
            elf,
        } => commands::firmware::execute(&input, releases.as_deref(), elf.as_deref()),
    }
}
