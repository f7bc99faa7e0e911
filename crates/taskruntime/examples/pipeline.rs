//! Demo pipeline: nested flows, cached tasks, retries, and a gate.
//!
//! Run with `cargo run --example pipeline`. Cache entries and
//! invocation logs land in `./target/pipeline-demo/`.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use taskruntime::{Args, Engine, EngineConfig, Flow, Gate, RetryDelay, Scope, Task};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let base = PathBuf::from("target/pipeline-demo");
    let engine = Engine::with_config(EngineConfig {
        cache_root: Some(base.join("cache")),
        log_root: Some(base.join("logs")),
    });

    let attempts = Arc::new(AtomicU32::new(0));
    let flow = Flow::new("pipeline");
    let fetch = Task::new("fetch")
        .cache_on(["city"])
        .default_arg("units", "metric");
    let summarize = Task::new("summarize")
        .retries(3)
        .retry_delay(RetryDelay::fixed_millis(200))
        .gate(Gate::suspending(2));

    let report = flow
        .run(&engine.root(), |scope| {
            let attempts = Arc::clone(&attempts);
            let fetch = &fetch;
            let summarize = &summarize;
            async move {
                let mut summaries = Vec::new();
                for city in ["lisbon", "oslo", "lisbon"] {
                    // The second "lisbon" is served from the cache.
                    let reading = fetch
                        .run(&scope, &Args::new().arg("city", city), |inner: Scope| async move {
                            inner.log(format!("fetching reading for {}", city)).await;
                            Ok::<_, String>(format!("{}: 21C, clear", city))
                        })
                        .await
                        .map_err(|e| anyhow::anyhow!("fetch failed: {}", e))?;

                    let attempts = Arc::clone(&attempts);
                    let summary = summarize
                        .run(&scope, &Args::new(), move |inner: Scope| {
                            let attempts = Arc::clone(&attempts);
                            let reading = reading.clone();
                            async move {
                                inner
                                    .log(format!("attempt {} for {}", inner.attempt(), reading))
                                    .await;
                                // First attempt of each city fails to
                                // show the retry path.
                                if inner.attempt() == 0 && attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                                    return Err("summarizer warming up".to_string());
                                }
                                Ok(format!("summary[{}] via {}", reading, inner.index()))
                            }
                        })
                        .await
                        .map_err(|e| anyhow::anyhow!("summarize failed: {}", e))?;
                    summaries.push(summary);
                }
                Ok::<_, anyhow::Error>(summaries)
            }
        })
        .await?;

    for line in &report {
        println!("{}", line);
    }
    let (active, fingerprints) = engine.active_tasks();
    println!("active tasks after run: {} {:?}", active, fingerprints);
    Ok(())
}
