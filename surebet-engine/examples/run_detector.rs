//! Run the surebet detector against in-memory bookmaker feeds.
//!
//! Three bookmakers quote a handful of football markets. A background task nudges their prices
//! every second so surebets appear, refresh and expire. Stop with Ctrl-C.
//!
//! ```sh
//! RUST_LOG=surebet_engine=debug cargo run --example run_detector
//! ```

use chrono::Utc;
use rust_decimal_macros::dec;
use std::{sync::Arc, time::Duration};
use surebet_data::{OddsFeed, StaticFeed};
use surebet_engine::{DetectionPipeline, EngineConfig};
use surebet_instrument::{SelectionRecord, SnapshotRecord};
use tracing::{error, info};

const EVENTS: [&str; 3] = ["rma-fcb", "ars-che", "juv-int"];

/// Base 1X2 prices per bookmaker, before drift.
const BOOKMAKERS: [(&str, [f64; 3]); 3] = [
    ("pinnacle", [2.30, 3.30, 3.90]),
    ("bet365", [2.15, 3.60, 4.10]),
    ("betfair", [2.20, 3.40, 4.80]),
];

#[tokio::main]
async fn main() {
    init_logging();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid configuration");
            return;
        }
    };

    let feeds = BOOKMAKERS
        .iter()
        .map(|(bookmaker, prices)| Arc::new(StaticFeed::new(*bookmaker, quotes(bookmaker, prices, 0))))
        .collect::<Vec<_>>();

    // Drift prices so opportunities come and go
    let drifting = feeds.clone();
    tokio::spawn(async move {
        let mut tick = 0u64;
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            tick += 1;
            for (feed, (bookmaker, prices)) in drifting.iter().zip(BOOKMAKERS.iter()) {
                feed.replace(quotes(bookmaker, prices, tick));
            }
        }
    });

    let pipeline = match DetectionPipeline::new(config) {
        Ok(pipeline) => pipeline.with_feeds(feeds.into_iter().map(|feed| feed as Arc<dyn OddsFeed>)),
        Err(error) => {
            error!(%error, "invalid configuration");
            return;
        }
    };
    info!(?pipeline, "starting surebet detector");

    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "failed to listen for Ctrl-C");
        }
    };

    if let Err(error) = pipeline
        .run_periodic(Duration::from_secs(2), dec!(1000), shutdown)
        .await
    {
        error!(%error, "detector stopped");
    }

    for opportunity in pipeline.active_above_threshold() {
        match serde_json::to_string(&opportunity.record()) {
            Ok(json) => info!(%json, "active surebet at shutdown"),
            Err(error) => error!(%error, "failed to serialise opportunity"),
        }
    }
}

fn quotes(bookmaker: &str, prices: &[f64; 3], tick: u64) -> Vec<SnapshotRecord> {
    EVENTS
        .iter()
        .enumerate()
        .map(|(event_index, event)| {
            let selections = ["Home", "Draw", "Away"]
                .iter()
                .zip(prices)
                .enumerate()
                .map(|(outcome_index, (outcome, price))| {
                    let phase = (tick + event_index as u64 * 3 + outcome_index as u64 * 5) % 7;
                    let odds = price + (phase as f64 - 3.0) * 0.05;
                    SelectionRecord::new(*outcome, (odds * 100.0).round() / 100.0, bookmaker)
                })
                .collect();

            SnapshotRecord::new(*event, "1X2", selections, Utc::now())
        })
        .collect()
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init()
}
