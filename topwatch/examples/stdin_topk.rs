//! Pipe any line stream through and watch the Top-K table refresh.
//!
//! ```bash
//! tail -f access.log | cargo run --example stdin_topk
//! ```

use std::error::Error;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use topwatch::config::Config;
use topwatch::ingest::IngestDriver;
use topwatch::pipeline::TopkPipeline;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config {
        k: 10,
        window: Duration::from_secs(60),
        tick: Duration::from_secs(1),
        ..Config::default()
    };
    let pipeline = Arc::new(TopkPipeline::new(&config)?);

    // Wall ticker: advances the window until data timestamps take over
    let ticker = Arc::clone(&pipeline);
    thread::spawn(move || loop {
        ticker.wall_tick(chrono::Utc::now());
        thread::sleep(Duration::from_millis(250));
    });

    // Rank refresher: one snapshot per second
    let refresher = Arc::clone(&pipeline);
    thread::spawn(move || loop {
        let (items, _) = refresher.refresh(Instant::now(), 0);
        let stats = refresher.metrics().snapshot();
        println!(
            "-- top {} | {} events | {:.1}/s --",
            items.len(),
            stats.records,
            stats.ingest_rps
        );
        for (rank, entry) in items.iter().enumerate() {
            println!("{:>3}. {:>8}  {}", rank + 1, entry.count, entry.item);
        }
        thread::sleep(Duration::from_secs(1));
    });

    let driver = IngestDriver::new(io::stdin().lock(), Arc::clone(&pipeline), &config);
    let summary = driver.run()?;

    let (items, _) = pipeline.refresh(Instant::now(), 0);
    println!(
        "done: {} lines, {} events, {} skipped; {} items tracked",
        summary.lines_read,
        summary.events,
        summary.skipped,
        items.len()
    );
    Ok(())
}
