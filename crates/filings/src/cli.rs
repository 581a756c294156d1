use clap::{Args, Parser, Subcommand, ValueEnum};
use filings_spider::facts::ExtractionProfile;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    ///
    /// Without one, progress bars and summaries are drawn to the terminal instead.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,

    /// Root of the per-entity XBRL/, XLSX/ and CSV/ directories [env: FILINGS_DATA_DIR].
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory of the per-entity record collections [env: FILINGS_LISTINGS_DIR].
    #[arg(long, global = true)]
    pub listings_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch each symbol's quarterly results from the exchange into a record collection.
    Listings {
        /// File of symbols, one per line [env: FILINGS_SYMBOLS].
        #[arg(short, long)]
        symbols: Option<PathBuf>,
    },

    /// Download the XBRL documents of every record collection.
    Fetch(Entities),

    /// Convert downloaded XBRL documents to spreadsheets through the remote converter.
    Convert(Entities),

    /// Extract facts from the spreadsheets into one CSV dataset per entity.
    Extract {
        #[command(flatten)]
        entities: Entities,

        /// Which facts to extract.
        #[arg(short, long, value_enum, default_value_t = Profile::ShareCapital)]
        profile: Profile,
    },

    /// Run every stage in order; listings only when a symbols file is given.
    Run {
        /// File of symbols, one per line [env: FILINGS_SYMBOLS].
        #[arg(short, long)]
        symbols: Option<PathBuf>,

        /// Which facts to extract.
        #[arg(short, long, value_enum, default_value_t = Profile::ShareCapital)]
        profile: Profile,
    },
}

#[derive(Args, Debug)]
pub struct Entities {
    /// Specify the entities to process.
    ///
    /// If no entities are provided, every entity with input for the stage is processed.
    #[arg(short, long, num_args = 1..)]
    pub entities: Option<Vec<String>>,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Paid-up equity share capital and face value.
    ShareCapital,

    /// Profit for the period and basic earnings per share.
    Earnings,
}

impl From<Profile> for ExtractionProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::ShareCapital => ExtractionProfile::ShareCapital,
            Profile::Earnings => ExtractionProfile::Earnings,
        }
    }
}
