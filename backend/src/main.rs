use backend::config::AppConfig;
use clap::Parser;
use cli::Cli;
use common::init_tracing;

/// Built by hand rather than via `#[tokio::main]` so the CLI's `--cpu-cap`
/// (spec.md §6) can actually bound the runtime's worker threads instead of
/// being parsed and ignored.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cli.cpu_cap.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        tracing::info!(cpu_cap = cli.cpu_cap, "starting kaskade engine");

        let config = AppConfig::from_cli(&cli);
        let exit_code = backend::startup::run(config).await?;

        std::process::exit(exit_code);
    })
}
