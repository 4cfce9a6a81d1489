//! vsdd - Vehicle Status Daemon
//!
//! Keeps the local cache of one vehicle's remote operational flags
//! (door lock, voice prompt, active delivery schedule) synchronized
//! with the delivery reservation service and republishes it after
//! every completed fetch cycle.
//!
//! Usage:
//!   vsdd [config.toml]
//!
//! The service URL and access token come from the config file or the
//! VSD_SERVICE_URL / VSD_ACCESS_TOKEN environment variables; both are
//! required.

mod config;
mod ingress;

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vsd_client::ReservationClient;
use vsd_sync::{BroadcastSink, Coordinator};

use config::DaemonConfig;
use ingress::{IngressState, Trigger};

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args { config_path: None };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"vsdd - Vehicle Status Daemon

Usage: vsdd [config.toml]

Required configuration (config file or environment):
  service_url   / VSD_SERVICE_URL    Base URL of the reservation service
  access_token  / VSD_ACCESS_TOKEN   API access token

Optional configuration (config file, with defaults):
  fetch_connect_timeout_ms   (800)   submit_connect_timeout_ms  (1000)
  fetch_read_timeout_ms     (1000)   submit_read_timeout_ms     (2000)
  submit_max_retries           (5)   submit_backoff_ms           (300)
  poll_interval_ms          (3000)   listen_port                (8700)
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vsdd=info,vsd_sync=info,vsd_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();
    let settings = DaemonConfig::load(args.config_path.as_deref())?.into_settings()?;

    tracing::info!(
        service_url = %settings.service_url,
        poll_interval = ?settings.poll_interval,
        "starting vsdd"
    );

    let client = ReservationClient::with_timeouts(
        &settings.service_url,
        &settings.access_token,
        settings.timeouts,
    )?;

    let sink = BroadcastSink::new(16);
    let latest = sink.latest();
    let mut coordinator = Coordinator::new(client, sink);

    // Triggers queue here while a cycle is running; the ingress drops
    // new ones once the queue is full.
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<Trigger>(8);

    let router = ingress::router(IngressState { trigger_tx, latest });
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.listen_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("ingress listening on http://{addr}");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("ingress server failed: {e}");
        }
    });

    let mut poll = tokio::time::interval(settings.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Single-writer event loop: one trigger at a time, each cycle runs
    // to completion before the next is handled.
    loop {
        tokio::select! {
            _ = poll.tick() => coordinator.on_timer_tick().await,
            trigger = trigger_rx.recv() => match trigger {
                Some(Trigger::IdentityUpdate(raw)) => coordinator.on_identity_update(&raw),
                Some(Trigger::LockChange(desired)) => coordinator.on_lock_change(desired).await,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
