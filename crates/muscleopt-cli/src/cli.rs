use clap::{Args, Parser, Subcommand};
use muscleopt::core::quantity::QuantityKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

pub const DEFAULT_SETUP_FILE: &str = "default_Setup_MuscleOptimize.toml";

#[derive(Parser, Debug)]
#[command(
    author = "Elena Ceseracciu, Luca Modenese",
    version,
    about = "muscleopt - Scales the muscle-tendon parameters of a musculoskeletal model against a reference model, on a selection of coordinates and muscles.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a settings file with default values, to be edited and passed to `run`.
    PrintSetup(PrintSetupArgs),
    /// List the coordinates or muscles of a model after applying a filter.
    Names(NamesArgs),
    /// List the muscle groups defined by a model.
    Groups(GroupsArgs),
    /// Run the muscle optimizer on the selected coordinates and muscles.
    Run(RunArgs),
}

/// Arguments for the `print-setup` subcommand.
#[derive(Args, Debug)]
pub struct PrintSetupArgs {
    /// Where to write the settings file. `.toml` is appended when missing.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_SETUP_FILE)]
    pub output: PathBuf,

    /// Model manifest used to name the optimized model and fill in the model path.
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,
}

/// Picks which quantity kind a command works on.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct KindSelector {
    /// Work on the model's coordinates.
    #[arg(long)]
    pub coordinates: bool,
    /// Work on the model's muscles.
    #[arg(long)]
    pub muscles: bool,
}

impl KindSelector {
    pub fn kind(self) -> QuantityKind {
        if self.coordinates {
            QuantityKind::Coordinate
        } else {
            QuantityKind::Muscle
        }
    }
}

/// Arguments for the `names` subcommand.
#[derive(Args, Debug)]
pub struct NamesArgs {
    /// Path to the model manifest (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    #[command(flatten)]
    pub kind: KindSelector,

    /// Only show names containing this pattern (`*` and `?` wildcards, `|` alternatives).
    #[arg(short, long, value_name = "TEXT", conflicts_with = "group")]
    pub pattern: Option<String>,

    /// Only show, and select, the members of this group.
    #[arg(short, long, value_name = "NAME")]
    pub group: Option<String>,

    /// Settings file providing the current selection. Everything is selected without one.
    #[arg(short, long, value_name = "PATH")]
    pub setup: Option<PathBuf>,
}

/// Arguments for the `groups` subcommand.
#[derive(Args, Debug)]
pub struct GroupsArgs {
    /// Path to the model manifest (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the settings file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub setup: PathBuf,

    /// Path to the model manifest (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// The optimizer executable, invoked as `<PROGRAM> -S <settings>`.
    #[arg(long, required = true, value_name = "PROGRAM")]
    pub optimizer: PathBuf,

    /// Keep only selected coordinates containing this pattern.
    #[arg(long, value_name = "TEXT")]
    pub coordinates_pattern: Option<String>,

    /// Keep only selected muscles containing this pattern.
    #[arg(long, value_name = "TEXT")]
    pub muscles_pattern: Option<String>,

    /// Select every name matching the patterns instead of only narrowing the selection.
    #[arg(long)]
    pub select_shown: bool,

    /// Override the output model file from the settings.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
