use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use trends_capture::{CaptureConfig, CaptureSession, ChromeBrowser, TrendsQuery};

#[derive(Parser, Debug)]
#[command(
    name = "trends-capture",
    about = "Capture Google Trends widget data with a headless browser"
)]
struct Args {
    /// Search term to explore
    #[arg(default_value = "cryptocurrency")]
    query: String,

    /// Region code, e.g. US
    #[arg(long, default_value = "US")]
    geo: String,

    /// Interface language
    #[arg(long, default_value = "en-US")]
    locale: String,

    /// Directory the JSON files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = 8)]
    settle_secs: u64,

    #[arg(long, default_value_t = 3)]
    scroll_settle_secs: u64,

    /// Stop waiting as soon as both widgets have been captured
    #[arg(long)]
    complete_early: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("chromiumoxide", log::LevelFilter::Warn)
        .filter_module("tungstenite", log::LevelFilter::Warn)
        .init();

    let args = Args::parse();

    let config = CaptureConfig::default()
        .with_output_dir(&args.output_dir)
        .with_settle_delay(Duration::from_secs(args.settle_secs))
        .with_scroll_settle_delay(Duration::from_secs(args.scroll_settle_secs))
        .with_complete_early(args.complete_early)
        .with_headless(!args.headed);

    let query = TrendsQuery::with_locale(&args.query, &args.geo, &args.locale)?;
    let session = CaptureSession::new(Box::new(ChromeBrowser::from_config(&config)), config);

    let result = session.capture(&query).await;
    session.stats().print_summary();
    result?;

    Ok(())
}
