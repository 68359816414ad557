use crate::core::community::{QualityFilter, SortBy};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "nephranet",
    version,
    about = "Community water quality reporting: submit pH and turbidity readings, browse and map them"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score a pH / turbidity pair without contacting any service
    Score(ScoreArgs),
    /// Write a default nephranet.toml into the current directory
    Init,
    /// Create an account
    Signup(SignupArgs),
    /// Sign in with e-mail and password
    Login(LoginArgs),
    /// Forget the stored session
    Logout(CommonArgs),
    /// Show the signed-in user
    Whoami(CommonArgs),
    /// Submit a measurement for a named location
    Upload(UploadArgs),
    /// Browse community measurements
    Community(CommunityArgs),
    /// Summary statistics over all measurements
    Stats(CommonArgs),
    /// Export measurements with coordinates for mapping
    Map(MapArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub ph: f64,
    /// Turbidity in NTU
    #[arg(long, allow_negative_numbers = true)]
    pub turbidity: f64,
    /// Exit with status 1 when the WQI is below this value
    #[arg(long)]
    pub min_score: Option<u8>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "NEPHRANET_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Display name shown next to your uploads
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "NEPHRANET_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// City, district or landmark
    #[arg(long)]
    pub location: String,
    #[arg(long, allow_negative_numbers = true)]
    pub ph: f64,
    /// Turbidity in NTU
    #[arg(long, allow_negative_numbers = true)]
    pub turbidity: f64,
}

#[derive(Debug, Args)]
pub struct CommunityArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Match against location or username
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, value_enum, default_value_t = SortBy::Date)]
    pub sort: SortBy,
    #[arg(long, value_enum, default_value_t = QualityFilter::All)]
    pub filter: QualityFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MapFormat {
    Geojson,
    Html,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = MapFormat::Geojson)]
    pub format: MapFormat,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
