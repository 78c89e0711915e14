use clap::{CommandFactory, Parser, Subcommand};
use libremold::config::ColorChoice;
use std::path::PathBuf;

mod commands;
mod context;
mod format;
mod store;

/// remold - Container Image Manifest Converter
///
/// Inspect container image manifests and convert them between the OCI,
/// Docker schema 2 and Docker schema 1 formats.
#[derive(Parser, Debug)]
#[command(name = "remold")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    /// Configuration file (defaults to $REMOLD_CONFIG or the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Summarize the image a manifest describes
    Inspect {
        /// Manifest file
        manifest: PathBuf,
        /// Blob directory (blobs/<alg>/<hex>) holding the config blob
        #[arg(long)]
        blobs: Option<PathBuf>,
        /// Config blob file, checked against the manifest's config digest
        #[arg(long)]
        config_blob: Option<PathBuf>,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// List the layers of a manifest, base layer first
    Layers {
        /// Manifest file
        manifest: PathBuf,
        /// Show only layer digests
        #[arg(short, long)]
        quiet: bool,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Convert a manifest to another format
    Convert {
        /// Manifest file
        manifest: PathBuf,
        /// Target manifest media type
        #[arg(long)]
        to: Option<String>,
        /// Blob directory used to read the config and store new blobs
        #[arg(long)]
        blobs: Option<PathBuf>,
        /// Config blob file, checked against the manifest's config digest
        #[arg(long)]
        config_blob: Option<PathBuf>,
        /// Image reference to embed (schema 1 only)
        #[arg(long)]
        name: Option<String>,
        /// Write the converted manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a media type against the supported catalog
    MediaType {
        /// Media type to check
        media_type: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let ctx = match context::AppContext::build(
        cli.color.as_deref().map(ColorChoice::from),
        context::VerbosityLevel::from_count(cli.verbose),
        cli.config.as_deref(),
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    ctx.init_logging();

    let output_format = |flag: Option<String>| match flag {
        Some(f) => format::OutputFormat::from(f.as_str()),
        None => ctx.config.output.format,
    };

    match cli.command {
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Inspect {
            manifest,
            blobs,
            config_blob,
            format,
        } => {
            commands::inspect::handle_inspect(
                &ctx,
                &manifest,
                blobs.as_deref(),
                config_blob.as_deref(),
                output_format(format),
            )
            .await;
        }
        Commands::Layers {
            manifest,
            quiet,
            format,
        } => {
            commands::layers::handle_layers(&ctx, &manifest, quiet, output_format(format));
        }
        Commands::Convert {
            manifest,
            to,
            blobs,
            config_blob,
            name,
            output,
        } => {
            let request = commands::convert::ConvertRequest {
                target: to.as_deref(),
                blobs: blobs.as_deref(),
                config_blob: config_blob.as_deref(),
                name: name.as_deref(),
                ..commands::convert::ConvertRequest::new(&manifest)
            };
            commands::convert::handle_convert(&ctx, &request, output.as_deref()).await;
        }
        Commands::MediaType { media_type, format } => {
            commands::media_type::handle_media_type(&ctx, &media_type, output_format(format));
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
