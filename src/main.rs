use std::panic;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tabled::{Table, Tabled, settings::Style};

use coinhero_sync::utils::{clock_label, format_duration};
use coinhero_sync::{Cli, Dashboard, DashboardSnapshot};

/// How often the console summary is reprinted.
const SUMMARY_EVERY: Duration = Duration::from_secs(15);

#[derive(Tabled)]
struct SourceRow {
    source: String,
    age: String,
    ticks: u64,
    failures: u64,
    error: String,
}

fn source_table(snapshot: &DashboardSnapshot) -> String {
    let rows: Vec<SourceRow> = snapshot
        .poll_stats
        .iter()
        .map(|&(kind, ref stats)| SourceRow {
            source: kind.to_string(),
            age: snapshot
                .state
                .age_secs(kind)
                .map(|secs| format_duration(secs * 1000))
                .unwrap_or_else(|| "-".to_string()),
            ticks: stats.ticks,
            failures: stats.failures,
            error: snapshot.state.poll_error(kind).unwrap_or("").to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_summary(snapshot: &DashboardSnapshot) {
    let state = &snapshot.state;
    println!(
        "KRW {:.0} | total {:.0} | holdings {} | automation {} (signals {}) | channel {} (reconnects {})",
        state.krw_balance(),
        state.total_value(),
        state.held_coins().len(),
        if state.automation_running() { "ON" } else { "off" },
        state.config.signal_floor_label(),
        if snapshot.channel.connected { "up" } else { "down" },
        snapshot.channel.reconnects,
    );
    println!("{}", source_table(snapshot));
    for (label, ring) in [("buy", &state.buy_log), ("sell", &state.sell_log)] {
        if let Some(entry) = ring.latest() {
            println!("[{label} {}] {}", clock_label(&entry.time), entry.message);
        }
    }
    if let Some(signal) = state.signals.latest() {
        println!(
            "signal: {} {} ({:.0})",
            signal.ticker, signal.strategy, signal.strength
        );
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let dashboard = Dashboard::connect(args.settings()).context("building the API client")?;
    dashboard.mount().await;

    if args.auto_buy {
        dashboard.enable_auto_buy();
    }
    if args.auto_sell {
        dashboard.enable_auto_sell();
    }
    if args.thoughts {
        dashboard.enable_thoughts();
    }

    let mut summary = tokio::time::interval(SUMMARY_EVERY);
    loop {
        tokio::select! {
            _ = summary.tick() => print_summary(&dashboard.snapshot()),
            result = tokio::signal::ctrl_c() => {
                result.context("listening for ctrl-c")?;
                break;
            }
        }
    }

    dashboard.shutdown();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, global_level)
        .filter(Some("coinhero_sync"), my_code_level)
        .filter(Some("coinhero"), my_code_level)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    // Everything in the sync layer is I/O bound; one thread is plenty.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting the tokio runtime")?;
    runtime.block_on(run(args))
}
