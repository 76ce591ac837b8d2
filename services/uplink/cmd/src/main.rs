//! Uplink client binary.
//!
//! Brings the link up, keeps it up, and runs periodic request/reply
//! transactions against a remote endpoint on a cooperative scheduler.
//! SIGUSR1 stands in for the external trigger line and queues an
//! out-of-band transaction.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uplink_link::{ConnectionManager, HostedLink, LinkState};
use uplink_sched::{Scheduler, TaskFuture, TriggerBridge};
use uplink_session::{LogIndicator, RunnerConfig, TcpConnector, TransactionRunner};
use uplink_wire::Tag;

mod config;
mod logging;

use config::UplinkConfig;
use logging::UplinkLogFormatter;

/// Network uplink client with periodic and triggered transactions
#[derive(Parser, Debug)]
#[command(name = "uplink", version, about = "Network uplink transaction client")]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "config.yaml")]
    config: std::path::PathBuf,

    /// Network SSID (overrides config)
    #[arg(long)]
    ssid: Option<String>,

    /// Network passphrase (overrides config)
    #[arg(long)]
    passphrase: Option<String>,

    /// Remote host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Remote port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Link manage cadence, e.g. 5s
    #[arg(long)]
    manage_interval: Option<humantime::Duration>,

    /// Periodic transaction cadence, e.g. 1s
    #[arg(long)]
    transact_interval: Option<humantime::Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Everything the scheduled tasks share. The scheduler hands it out by
/// `&mut`, one task at a time.
struct Uplink {
    state: LinkState,
    manager: ConnectionManager<HostedLink>,
    runner: TransactionRunner<TcpConnector, LogIndicator>,
}

/// One-shot events delivered through the scheduler queue.
#[derive(Debug, Clone)]
enum UplinkEvent {
    ManualTransaction,
}

fn manage_link(ctx: &mut Uplink) -> TaskFuture<'_> {
    Box::pin(async move {
        ctx.manager.manage(&mut ctx.state).await;
    })
}

fn periodic_transaction(ctx: &mut Uplink) -> TaskFuture<'_> {
    Box::pin(async move {
        let Uplink {
            state,
            manager,
            runner,
        } = ctx;
        runner.run(Tag::Periodic, state, manager).await;
    })
}

fn dispatch_event(ctx: &mut Uplink, event: UplinkEvent) -> TaskFuture<'_> {
    Box::pin(async move {
        match event {
            UplinkEvent::ManualTransaction => {
                let Uplink {
                    state,
                    manager,
                    runner,
                } = ctx;
                runner.run(Tag::Manual, state, manager).await;
            }
        }
    })
}

/// Forward SIGUSR1 into the scheduler queue. The handler body stays
/// minimal; the transaction itself runs on the scheduler.
#[cfg(unix)]
fn spawn_trigger_listener(bridge: Arc<TriggerBridge<UplinkEvent>>) -> anyhow::Result<()> {
    let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1())
        .map_err(|e| anyhow::anyhow!("failed to install SIGUSR1 handler: {}", e))?;
    tokio::spawn(async move {
        while signal.recv().await.is_some() {
            bridge.fire();
        }
        warn!("trigger signal stream closed");
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_trigger_listener(_bridge: Arc<TriggerBridge<UplinkEvent>>) -> anyhow::Result<()> {
    warn!("no trigger source on this platform; manual transactions disabled");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::new("info")
        .add_directive(format!("uplink={}", args.log_level).parse()?)
        .add_directive(format!("uplink_link={}", args.log_level).parse()?)
        .add_directive(format!("uplink_sched={}", args.log_level).parse()?)
        .add_directive(format!("uplink_session={}", args.log_level).parse()?)
        .add_directive(format!("uplink_wire={}", args.log_level).parse()?);

    let formatter = UplinkLogFormatter::new("uplink".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(true)
        .event_format(formatter)
        .init();

    info!("Starting uplink client v{}", env!("CARGO_PKG_VERSION"));

    let mut config = UplinkConfig::load(Some(&args.config))?;

    // Command line beats file and environment
    if let Some(ssid) = args.ssid {
        config.network.ssid = ssid;
    }
    if let Some(passphrase) = args.passphrase {
        config.network.passphrase = passphrase;
    }
    if let Some(host) = args.host {
        config.remote.host = host;
    }
    if let Some(port) = args.port {
        config.remote.port = port;
    }
    let manage_interval = args
        .manage_interval
        .map(Duration::from)
        .unwrap_or_else(|| config.timing.manage_interval());
    let transact_interval = args
        .transact_interval
        .map(Duration::from)
        .unwrap_or_else(|| config.timing.transact_interval());

    let ctx = Uplink {
        state: LinkState::new(),
        manager: ConnectionManager::new(
            HostedLink::default(),
            config.network.ssid.clone(),
            config.network.passphrase.clone(),
            config.network.security,
        ),
        runner: TransactionRunner::new(
            TcpConnector,
            LogIndicator::default(),
            RunnerConfig {
                host: config.remote.host.clone(),
                port: config.remote.port,
                session_timeout: config.timing.session_timeout(),
                send_capacity: config.buffers.send_capacity,
                recv_capacity: config.buffers.recv_capacity,
            },
        ),
    };

    let mut scheduler = Scheduler::new(16, dispatch_event);
    scheduler.schedule_recurring("manage-link", manage_interval, manage_link);
    scheduler.schedule_recurring("transact", transact_interval, periodic_transaction);

    let bridge = Arc::new(TriggerBridge::new(
        scheduler.handle(),
        UplinkEvent::ManualTransaction,
        "sigusr1",
    ));
    spawn_trigger_listener(bridge)?;

    info!(
        remote = %format!("{}:{}", config.remote.host, config.remote.port),
        manage_interval = %humantime::format_duration(manage_interval),
        transact_interval = %humantime::format_duration(transact_interval),
        "uplink client started"
    );

    scheduler.run(ctx).await;
    Ok(())
}
