use std::path::PathBuf;

/// Zone crosswalk builder (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "zonewalk", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build a fine-zone crosswalk (forbids stdout)
    Build(BuildArgs),

    /// Check a written crosswalk against its fine-zone layer
    Validate(ValidateArgs),

    /// Describe a shapefile and the id columns the aliases select
    Inspect(InspectArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FallbackArg {
    NearestCentroid,
    NearestBoundary,
    Reject,
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Fine-zone shapefile carrying fine and medium ids
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub fine: PathBuf,

    /// Coarse-zone shapefile
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub coarse: PathBuf,

    /// Region reference table (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Output crosswalk file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Minimum overlap as a share of the medium zone's area
    #[arg(long, conflicts_with = "min_overlap_area")]
    pub min_overlap_fraction: Option<f64>,

    /// Minimum overlap in squared CRS units
    #[arg(long)]
    pub min_overlap_area: Option<f64>,

    /// Assignment for medium zones without a usable overlap
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackArg>,

    /// Per-medium-zone resolution audit CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Replace existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Crosswalk CSV to check
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub crosswalk: PathBuf,

    /// Fine-zone shapefile the crosswalk was built from
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub fine: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Shapefile to describe
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub layer: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
