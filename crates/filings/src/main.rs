mod cli;
mod spider;

// remote imports
use clap::Parser;
use cli::{Cli, Commands, TraceLevel};
use filings_spider::facts::ExtractionProfile;
use filings_spider::{Config, Stage};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preprocess the trace level
fn preprocess(trace_level: Level) -> anyhow::Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        })?;
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // environment first, command line overrides
    let mut config = Config::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(listings_dir) = cli.listings_dir {
        config.listings_dir = listings_dir;
    }
    trace!("configuration: {config:?}");

    // read cli inputs; only the extract stage reads a profile
    let default_profile = ExtractionProfile::default();
    match cli.command {
        // `filings listings [--symbols <FILE>]`
        Commands::Listings { symbols } => {
            if symbols.is_some() {
                config.symbols_file = symbols;
            }
            spider::stage(&config, Stage::Listings, None, default_profile, tui).await?
        }

        // `filings fetch [--entities <ENTITY>...]`
        Commands::Fetch(args) => {
            spider::stage(&config, Stage::Fetch, args.entities, default_profile, tui).await?
        }

        // `filings convert [--entities <ENTITY>...]`
        Commands::Convert(args) => {
            spider::stage(&config, Stage::Convert, args.entities, default_profile, tui).await?
        }

        // `filings extract [--entities <ENTITY>...] [--profile <PROFILE>]`
        Commands::Extract { entities, profile } => {
            spider::stage(
                &config,
                Stage::Extract,
                entities.entities,
                profile.into(),
                tui,
            )
            .await?
        }

        // `filings run [--symbols <FILE>] [--profile <PROFILE>]`
        Commands::Run { symbols, profile } => {
            if symbols.is_some() {
                config.symbols_file = symbols;
            }
            spider::run(&config, profile.into(), tui).await?
        }
    }

    Ok(())
}
