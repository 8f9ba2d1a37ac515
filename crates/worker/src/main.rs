use anyhow::Context;
use clap::Parser;
use picks_core::config::{EngineOptions, Settings};
use picks_core::market::batch::BatchEnricher;
use picks_core::market::finnhub::FinnhubClient;
use picks_core::market::MarketDataSource;
use picks_core::service::RecommendationService;
use picks_core::source::memory::InMemoryRatingSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "picks_worker")]
struct Args {
    /// JSON array of analyst rating actions.
    #[arg(long)]
    input: PathBuf,

    /// Number of recommendations (1..=100, otherwise 50).
    #[arg(long)]
    limit: Option<i64>,

    /// Only consider records whose ticker or company contains this text.
    #[arg(long)]
    search: Option<String>,

    /// Reference instant for momentum decay (RFC 3339). Defaults to now.
    #[arg(long)]
    now: Option<String>,

    /// Print only the single best recommendation.
    #[arg(long)]
    best: bool,

    /// Skip live market data even if FINNHUB_API_KEY is set.
    #[arg(long)]
    no_market_data: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match run(&settings, args).await {
        Ok(()) => Ok(()),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "ranking run failed");
            Err(err)
        }
    }
}

async fn run(settings: &Settings, args: Args) -> anyhow::Result<()> {
    let options = EngineOptions::from_env();
    let now = resolve_now(args.now.as_deref())?;

    let source = InMemoryRatingSource::from_json_file(&args.input)?;
    tracing::info!(
        input = %args.input.display(),
        records = source.len(),
        %now,
        "loaded rating actions"
    );

    let market = if args.no_market_data {
        None
    } else {
        build_market_source(settings, &options)?
    };
    let enriched = market.is_some();

    let service = RecommendationService::new(source, market, options);

    let out = if args.best {
        let best = service.best_recommendation_at(now).await?;
        serde_json::to_string_pretty(&best)?
    } else {
        let top = service
            .top_recommendations_at(now, args.limit, args.search.as_deref())
            .await?;
        tracing::info!(count = top.len(), enriched, "ranked recommendations");
        serde_json::to_string_pretty(&top)?
    };

    println!("{out}");
    Ok(())
}

fn build_market_source(
    settings: &Settings,
    options: &EngineOptions,
) -> anyhow::Result<Option<Arc<dyn MarketDataSource>>> {
    if settings.finnhub_api_key.is_none() {
        tracing::warn!("FINNHUB_API_KEY missing; ranking without live market data");
        return Ok(None);
    }

    let client = FinnhubClient::from_settings(settings, options)?;
    let enricher: Arc<dyn MarketDataSource> =
        Arc::new(BatchEnricher::new(Arc::new(client), options));
    Ok(Some(enricher))
}

fn resolve_now(arg: Option<&str>) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    match arg {
        Some(s) => Ok(chrono::DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("--now is not an RFC 3339 timestamp: {s}"))?
            .with_timezone(&chrono::Utc)),
        None => Ok(chrono::Utc::now()),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
