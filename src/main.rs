//! Momentum Rebalancer - Main Entry Point

use anyhow::Result;
use clap::Parser;
use momentum_rebalancer::config::Config;
use momentum_rebalancer::exchange::{AccountGateway, HorusClient, RoostooClient};
use momentum_rebalancer::risk::DrawdownGate;
use momentum_rebalancer::rules::RuleRegistry;
use momentum_rebalancer::scheduler::CycleRunner;
use momentum_rebalancer::strategy::RebalanceEngine;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Momentum Rebalancer CLI
#[derive(Parser)]
#[command(name = "momentum-rebalancer")]
#[command(version, about = "Momentum-based rebalancing bot for crypto pairs quoted in fiat")]
struct Cli {
    /// Run a single rebalance cycle and exit
    #[arg(long)]
    once: bool,

    /// Log orders instead of submitting them to the venue
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    info!(
        "Momentum Rebalancer v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let mut config = Config::load()?;
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    config.validate()?;
    log_config(&config);

    if config.runtime.dry_run {
        info!("DRY RUN mode - orders will be logged, not submitted");
    }

    let account = Arc::new(RoostooClient::new(&config.venue)?);
    let market = Arc::new(HorusClient::new(&config.market_data)?);

    // Initial cash snapshot, mostly for the operator's benefit.
    match account.balances().await {
        Ok(balances) => {
            let cash = balances.get("USD").copied().unwrap_or(Decimal::ZERO);
            info!(cash = %cash.round_dp(2), "Account reachable");
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Initial balance fetch failed, continuing");
        }
    }

    // Trade rules are loaded once and immutable for the process lifetime.
    let rules = RuleRegistry::load(account.as_ref()).await;
    if rules.is_empty() {
        warn!("No trade rules loaded; every symbol will be skipped this session");
    }

    let symbols = config.strategy.parsed_symbols()?;
    let engine = RebalanceEngine::new(config.strategy.clone(), rules);
    let gate = Box::new(DrawdownGate::new(config.risk.max_drawdown));
    let mut runner = CycleRunner::new(market, account, engine, gate, symbols, &config.runtime);

    if cli.once {
        let report = runner.run_cycle().await?;
        info!(
            total_value = %report.total_value,
            vetoed = report.vetoed,
            orders = report.orders_submitted,
            failures = report.order_failures,
            skipped = report.symbols_skipped,
            "Single cycle complete"
        );
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    runner.run(shutdown).await;

    Ok(())
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "momentum-rebalancer.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard to keep the writer alive for the program duration
    Box::leak(Box::new(_guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("momentum_rebalancer=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_ansi(true)
        .init();

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("Configuration:");
    info!("   Symbols tracked: {}", config.strategy.symbols.len());
    info!("   Base allocation: ${}", config.strategy.base_allocation);
    info!(
        "   Max allocation: {:.0}%",
        config.strategy.max_allocation_pct * Decimal::new(100, 0)
    );
    info!(
        "   Downside clamp: {:.0}%",
        config.strategy.downside_clamp * Decimal::new(100, 0)
    );
    info!(
        "   Min trade notional: ${}",
        config.strategy.min_trade_notional
    );
    info!(
        "   Momentum interval: {}",
        config.strategy.momentum_interval
    );
    info!(
        "   Cycle interval: {}s",
        config.runtime.cycle_interval_secs
    );
    info!(
        "   Max drawdown: {:.0}%",
        config.risk.max_drawdown * Decimal::new(100, 0)
    );
}
