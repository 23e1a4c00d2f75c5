use std::collections::HashSet;
use std::time::Duration;

use adapters::StreamMode;
use cli::Cli;
use engine::EvaluatorConfig;
use executor::OrchestratorConfig;
use scheduler::DispatcherConfig;

/// The assembled, immutable run configuration — "parse once at
/// startup, pass an immutable value down" (same shape as the teacher's
/// `AppConfig::from_env`, just `clap`-sourced per spec.md §6 instead of
/// env-sourced).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ws_url: String,
    pub pair_cap: usize,
    pub orderbook_connection_limit: usize,
    pub stream_mode: StreamMode,
    pub start_assets: Vec<String>,
    pub exclude_assets: HashSet<String>,
    pub min_usd_balance: f64,
    pub evaluator: EvaluatorConfig,
    pub orchestrator: OrchestratorConfig,
    pub ticker_refresh_interval: Duration,
    pub trade_size_usd: f64,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let evaluator = cli.evaluator_config();

        Self {
            ws_url: cli.ws_url.clone(),
            pair_cap: cli.pair_cap,
            orderbook_connection_limit: cli.orderbook_connection_limit,
            stream_mode: cli.stream_mode(),
            start_assets: cli.start_assets.clone(),
            exclude_assets: cli.exclude_assets.iter().cloned().collect(),
            min_usd_balance: cli.min_usd_balance,
            evaluator,
            orchestrator: OrchestratorConfig {
                fee: cli.fee,
                ..OrchestratorConfig::default()
            },
            ticker_refresh_interval: Duration::from_secs(3600),
            trade_size_usd: cli.trade_size_usd,
        }
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            excluded_assets: self.exclude_assets.clone(),
            min_usd_balance: self.min_usd_balance,
            trade_size_usd: self.trade_size_usd,
            evaluator: self.evaluator,
        }
    }
}
