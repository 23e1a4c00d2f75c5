use std::sync::Arc;
use std::time::Duration;

use adapters::{ExchangeClient, WsExchangeClient};
use engine::RouteIndex;
use executor::ExecutionOrchestrator;
use market::{BalanceStore, OrderBookStore, PairIndex};
use scheduler::{run_periodic_refresh, Dispatcher, TickerStore};
use tokio::sync::{mpsc, watch};

use crate::config::AppConfig;
use crate::error::AppError;

/// Resolves the configured starting-asset set (§6): the explicit list
/// if non-empty, otherwise every asset currently holding a nonzero free
/// balance, minus `exclude_assets` either way.
async fn resolve_start_assets(
    config: &AppConfig,
    balances: &BalanceStore,
) -> Result<Vec<String>, AppError> {
    let candidates: Vec<String> = if config.start_assets.is_empty() {
        balances
            .all()
            .await
            .into_iter()
            .filter(|(_, b)| b.free > 0.0)
            .map(|(asset, _)| asset)
            .collect()
    } else {
        config.start_assets.clone()
    };

    let resolved: Vec<String> = candidates
        .into_iter()
        .filter(|a| !config.exclude_assets.contains(a))
        .collect();

    if resolved.is_empty() {
        return Err(AppError::NoStartAssets);
    }
    Ok(resolved)
}

/// Builds every long-lived piece of the engine and runs it to
/// completion (process shutdown signal or a fatal execution failure).
/// Returns the process exit code (§7: "0 normal shutdown, non-zero on
/// fatal").
pub async fn run(config: AppConfig) -> anyhow::Result<i32> {
    let client = Arc::new(WsExchangeClient::new(config.ws_url.clone()));

    let pairs = client.all_pairs().await?;
    let pair_index = PairIndex::build(pairs, config.pair_cap).map_err(AppError::Market)?;
    tracing::info!(pair_count = pair_index.len(), "pair catalog loaded");

    let balances = BalanceStore::new();
    client.update_balance(&balances).await?;

    let tickers = TickerStore::new();
    tickers.replace_all(client.all_tickers().await?).await;

    let start_assets = resolve_start_assets(&config, &balances).await?;
    tracing::info!(?start_assets, "resolved starting-asset set");

    let routes = RouteIndex::build(&pair_index, &start_assets);
    tracing::info!(cycle_count = routes.len(), "route enumeration complete");

    let books = OrderBookStore::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (changed_tx, changed_rx) = mpsc::unbounded_channel::<String>();
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<String>();

    let orchestrator = Arc::new(ExecutionOrchestrator::new(
        client.clone(),
        balances.clone(),
        config.orchestrator,
        fatal_tx,
    ));

    let dispatcher = Dispatcher::new(
        routes,
        books.clone(),
        balances.clone(),
        tickers.clone(),
        orchestrator,
        config.dispatcher_config(),
    );
    tokio::spawn(async move { dispatcher.run(changed_rx).await });

    tokio::spawn(run_periodic_refresh(
        client.clone(),
        tickers,
        balances,
        config.ticker_refresh_interval,
        shutdown_rx.clone(),
    ));

    // One subscription task per pair, bounded by the configured
    // connection limit (§4.F, §6). A flapping pair's reconnect loop
    // lives entirely inside `run_pair_subscription` and never affects
    // its siblings.
    let subscribed = pair_index
        .enabled_pairs()
        .take(config.orderbook_connection_limit)
        .map(|p| p.name.clone())
        .collect::<Vec<_>>();
    tracing::info!(
        subscribed = subscribed.len(),
        limit = config.orderbook_connection_limit,
        "starting order-book subscriptions"
    );

    for pair_name in subscribed {
        let client = client.clone();
        let books = books.clone();
        let changed_tx = changed_tx.clone();
        let shutdown_rx = shutdown_rx.clone();
        let mode = config.stream_mode;
        tokio::spawn(async move {
            adapters::run_pair_subscription(
                client.as_ref(),
                &pair_name,
                mode,
                &books,
                changed_tx,
                shutdown_rx,
            )
            .await;
        });
    }
    drop(changed_tx);

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
            Ok(0)
        }
        Some(reason) = fatal_rx.recv() => {
            tracing::error!(reason, "fatal execution failure; shutting down");
            let _ = shutdown_tx.send(true);
            Ok(1)
        }
    }
}
