#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use clap::Parser;
use rollcall_bot::{
    clips::CspanClipResolver,
    config::Config,
    cursor::CursorStore,
    publish::HttpPublishClient,
    runner::Runner,
    votes::HttpVoteSource,
};

#[derive(Parser)]
#[command(
    name = "rollcall-bot",
    about = "Polls roll-call votes and republishes each as an ordered post thread"
)]
struct Args {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Run a single poll cycle and exit.
    #[arg(long)]
    once: bool,

    /// Compose and log threads without posting, regardless of config.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // Load and validate configuration first (fail-fast)
    let mut config = Config::load_from(&args.config).map_err(|e| anyhow::anyhow!("{e}"))?;
    if args.dry_run {
        config.publisher.posting_enabled = false;
    }

    // Set up logging from config
    std::env::set_var("RUST_LOG", &config.logging.level);
    tracing_subscriber::fmt::init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        posting_enabled = config.publisher.posting_enabled,
        "rollcall-bot starting up"
    );

    let source = HttpVoteSource::new(
        &config.votes.base_url,
        &config.votes.api_key,
        config.poll.max_range_window_days,
    );
    let clips = CspanClipResolver::new()?;
    let publish_client = HttpPublishClient::new(&config.publisher.base_url, &config.publisher.token);
    let cursor = CursorStore::new(&config.cursor.path);

    let runner = Runner::new(&config, &source, &clips, &publish_client, cursor);

    if args.once {
        let published = runner.run_cycle().await?;
        tracing::info!(published, "single cycle complete");
        return Ok(());
    }

    runner.run().await?;
    Ok(())
}
