//! Command-line interface implementation.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure.
#[derive(Parser, Debug)]
#[command(author, version, about = "cms: localized static site generator", long_about = None)]
pub struct Args {
    /// Path to the content repository (or directory with --live)
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory the generated site is written to
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Revision of the repository to generate from
    #[arg(short, long, default_value = "HEAD")]
    pub rev: String,

    /// Read the working directory instead of a repository revision
    #[arg(long)]
    pub live: bool,

    /// Site URL to use instead of general.siteurl from settings.ini
    #[arg(long, value_name = "URL")]
    pub site_url: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
