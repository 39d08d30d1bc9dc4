//! voxtex CLI
//!
//! Pack tile images into a VTF atlas, or slice an atlas back into tiles.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use voxtex::{pack, slice, PackOptions, VoxtexError};

#[derive(Parser)]
#[command(name = "voxtex")]
#[command(author, version, about = "Pack tile images into a VTF atlas texture, or slice an atlas into tiles", long_about = None)]
struct Cli {
    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack images into an atlas texture
    Pack {
        /// The directory to load PNG images from
        source_dir: PathBuf,

        /// The name of the file to save. It should be a VTF file
        dest_file: PathBuf,

        /// Make a point-sampled texture and don't generate mipmaps
        #[arg(long)]
        simple: bool,

        /// Wrap each tile in a border of its opposite edges
        #[arg(long)]
        pad: bool,

        /// Also write the tile layout as JSON
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },

    /// Slice an atlas texture into individual images
    Slice {
        /// The PNG (or VTF) file to slice apart
        source_file: PathBuf,

        /// The directory to save images in. The directory must exist
        dest_dir: PathBuf,

        /// Number of slices to make on the x axis
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        w: u32,

        /// Number of slices to make on the y axis
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        h: u32,
    },
}

/// Accept the single-dash spelling of the long flags (`-simple`, `-pad`).
fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-simple") => OsString::from("--simple"),
            Some("-pad") => OsString::from("--pad"),
            Some("-manifest") => OsString::from("--manifest"),
            _ => arg,
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

/// Render an error with its causes, skipping causes already spelled out by
/// the wrapping message.
fn describe(err: &VoxtexError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.ends_with(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_legacy_flags(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version land here too
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    let success = match cli.command {
        Commands::Pack {
            source_dir,
            dest_file,
            simple,
            pad,
            manifest,
        } => {
            let mut options = PackOptions::default().with_simple(simple).with_padding(pad);
            if let Some(path) = manifest {
                options = options.with_manifest(path);
            }
            run_pack(&source_dir, &dest_file, &options)
        }
        Commands::Slice {
            source_file,
            dest_dir,
            w,
            h,
        } => run_slice(&source_file, &dest_dir, w, h),
    };

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_pack(source_dir: &Path, dest_file: &Path, options: &PackOptions) -> bool {
    let report = match pack(source_dir, dest_file, options) {
        Ok(report) => report,
        Err(err) => {
            println!("[Pack] {}", describe(&err));
            return false;
        }
    };

    if let Some(manifest) = &report.manifest {
        println!("[Pack] Layout written to {:?}", manifest);
    }
    println!("[Pack] Success! Texture saved!");
    true
}

fn run_slice(source_file: &Path, dest_dir: &Path, columns: u32, rows: u32) -> bool {
    match slice(source_file, dest_dir, columns, rows) {
        Ok(report) => {
            println!(
                "[Slice] Output dimensions: {} x {}",
                report.tile_width, report.tile_height
            );
            println!("[Slice] Success! Saved all {} images.", report.count);
            true
        }
        Err(err) => {
            println!("[Slice] {}", describe(&err));
            false
        }
    }
}
