//! # Example: boot
//!
//! Boots a small application: configuration first, then storage and a flaky
//! cache that needs two retries, then the HTTP layer. A lazy search index is
//! loaded on demand once the eager pass finished.
//!
//! ## Flow
//! ```text
//! priority 0:  config (critical)
//!                 │ barrier
//! priority 10: database ── depends on config
//!              cache    ── fails twice, loads on attempt 3 (after 1s + 2s)
//!                 │ barrier
//! priority 20: http     ── depends on database, cache
//!
//! on demand:   search (lazy) ── depends on database
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=initvisor=debug cargo run --example boot
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use initvisor::{
    BackoffPolicy, ComponentOptions, Config, LoaderError, LoaderFn, LogWriter, Orchestrator,
    Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

static CACHE_ATTEMPTS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct Settings {
    listen: &'static str,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("initvisor=info")),
        )
        .init();

    // 1. Configure: shorter retry delays than the 1s/2s/3s default
    let mut cfg = Config::default();
    cfg.backoff = BackoffPolicy {
        first: Duration::from_millis(200),
        ..BackoffPolicy::default()
    };
    cfg.timeout = Duration::from_secs(5);

    // 2. Build the orchestrator with a log subscriber and a profile for `config`
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let orch = Orchestrator::builder(cfg)
        .with_subscribers(subs)
        .with_profile("config", ComponentOptions::new().priority(0).critical(true))
        .build();

    // 3. Register components
    orch.register(
        "config",
        LoaderFn::arc(|_ctx: CancellationToken| async {
            Ok::<_, LoaderError>(Settings { listen: "0.0.0.0:8080" })
        }),
        ComponentOptions::new(),
    )?;

    orch.register(
        "database",
        LoaderFn::arc(|ctx: CancellationToken| async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(150)) => Ok(String::from("pool(8)")),
                _ = ctx.cancelled() => Err(LoaderError::Canceled),
            }
        }),
        ComponentOptions::new().priority(10).depends_on(["config"]),
    )?;

    orch.register(
        "cache",
        LoaderFn::arc(|_ctx: CancellationToken| async {
            let attempt = CACHE_ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt <= 2 {
                return Err(LoaderError::fail(format!("cache node unreachable (#{attempt})")));
            }
            Ok(attempt)
        }),
        ComponentOptions::new().priority(10),
    )?;

    orch.register(
        "http",
        LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>(()) }),
        ComponentOptions::new()
            .priority(20)
            .depends_on(["database", "cache"]),
    )?;

    orch.register(
        "search",
        LoaderFn::arc(|_ctx: CancellationToken| async { Ok::<_, LoaderError>(vec!["idx-0", "idx-1"]) }),
        ComponentOptions::new().lazy(true).depends_on(["database"]),
    )?;

    println!("dependency order of http: {:?}", orch.dependency_order("http")?);

    // 4. Eager pass
    let report = orch.load_all().await?;
    println!(
        "loaded {}/{} (success rate {:.0}%)",
        report.loaded,
        report.loaded + report.failed,
        report.success_rate * 100.0
    );

    if let Some(settings) = orch.export::<Settings>("config") {
        println!("listening on {}", settings.listen);
    }

    // 5. On-demand component
    orch.load_lazy("search").await?;
    if let Some(index) = orch.export::<Vec<&'static str>>("search") {
        println!("search shards: {index:?}");
    }

    // 6. Diagnostics
    let stats = orch.advanced_statistics();
    println!(
        "attempts={} retries={} median={:?}",
        stats.total_attempts, stats.retries, stats.median_duration
    );
    println!("{}", orch.export_loading_report().to_json()?);

    orch.shutdown().await;
    Ok(())
}
