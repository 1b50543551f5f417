use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "download-portal-item-data",
    version,
    about = "Download portal item data and organize it by file type"
)]
pub struct Cli {
    /// Property list mapping portal URLs to the items (identifier, filename) to download
    pub portal_items: PathBuf,

    /// Property list mapping subdirectory names to the file extensions stored in them
    pub file_types: PathBuf,

    /// Directory to download into; created if missing
    pub download_dir: PathBuf,

    /// Maximum number of concurrent downloads (defaults to no limit)
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<NonZeroUsize>,

    /// HTTP attempts per item before the batch is aborted
    #[arg(long = "attempts", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: u32,

    /// Seconds to wait for a connection to the portal
    #[arg(long = "connect-timeout", default_value_t = 30u64)]
    pub connect_timeout_secs: u64,
}
