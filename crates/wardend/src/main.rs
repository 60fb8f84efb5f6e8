//! wardend - the power-management supervisor
//!
//! The companion controller owns the physical power switch for this
//! host and runs its own host watchdog. wardend's job:
//! - keep that watchdog fed so a healthy host is never powered off
//! - decide from the configured power window when the host should
//!   voluntarily shut down, arm the controller's countdown, and invoke
//!   the OS shutdown
//! - expose an IPC surface so other processes can postpone an imminent
//!   shutdown ("stay on until ...")

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use warden_api::{
    Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, Response, ResponsePayload,
    StateSnapshot, WindowStatus, API_VERSION,
};
use warden_config::{load_config, DEFAULT_BUS_PATH, DEFAULT_CONTROLLER_ADDRESS};
use warden_core::{
    run_watchdog, CoreEvent, LinuxSystem, OverrideStore, Scheduler, INITIAL_GRACE_PERIOD,
};
use warden_ipc::{IpcServer, ServerMessage};
use warden_link::{ControllerLink, I2cBus};
use warden_util::{
    default_config_path, format_duration, ClientId, PowerWindow, RateLimiter, WardenError,
};

/// wardend - power-management supervisor for battery-backed hosts
#[derive(Parser, Debug)]
#[command(name = "wardend")]
#[command(about = "Power-management supervisor for battery-backed hosts", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set WARDEN_SOCKET env var)
    #[arg(short, long, env = "WARDEN_SOCKET")]
    socket: Option<PathBuf>,

    /// Evaluate the power window immediately instead of waiting the
    /// initial grace period
    #[arg(long)]
    skip_grace_period: bool,

    /// Arm the controller's countdown but don't shut down the
    /// operating system
    #[arg(long)]
    skip_system_shutdown: bool,

    /// Include timestamps in log output (the journal normally adds its
    /// own)
    #[arg(short, long)]
    timestamps: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

type Link = Arc<ControllerLink<I2cBus>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if args.timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "wardend starting");

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let settings = match load_config(&args.config) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(
                config = %args.config.display(),
                error = %e,
                "error parsing config, will just ping the watchdog"
            );
            return watchdog_only().await;
        }
    };

    info!("connecting to companion controller");
    let bus = I2cBus::open(&settings.controller.bus_path, settings.controller.address)
        .with_context(|| {
            format!(
                "failed to open controller bus {}",
                settings.controller.bus_path.display()
            )
        })?;

    let link: Option<Link> = match ControllerLink::connect(bus).await {
        Some(link) => {
            info!("connected to companion controller");
            Some(Arc::new(link))
        }
        None => {
            info!("companion controller not present");
            None
        }
    };

    if let Some(link) = &link {
        match link.check_is_on_battery() {
            Ok(true) => info!("on battery power"),
            Ok(false) => info!("not on battery"),
            Err(e) => warn!(error = %e, "could not read power source"),
        }

        if settings.battery.enable_readings {
            match link.read_battery_value() {
                Ok(raw) => info!(raw, "battery sense reading"),
                Err(e) => warn!(error = %e, "could not read battery sense"),
            }
        }
    }

    // IPC server
    let socket_path = args
        .socket
        .clone()
        .unwrap_or_else(|| settings.daemon.socket_path.clone());
    let mut ipc = IpcServer::new(&socket_path);
    ipc.start().await?;
    let ipc = Arc::new(ipc);

    let mut ipc_messages = ipc
        .take_message_receiver()
        .await
        .expect("Message receiver should be available");

    let ipc_accept = ipc.clone();
    tokio::spawn(async move {
        if let Err(e) = ipc_accept.run().await {
            error!(error = %e, "IPC server error");
        }
    });

    // Shared supervisor state
    let overrides = Arc::new(OverrideStore::new(warden_util::now()));
    let (core_event_tx, mut core_events) = mpsc::unbounded_channel();
    let mut rate_limiter = RateLimiter::new(30, Duration::from_secs(1));

    // Watchdog heartbeats, only with a controller to hear them
    let mut watchdog: Option<JoinHandle<WardenError>> = link
        .as_ref()
        .map(|link| tokio::spawn(run_watchdog(link.clone())));

    // Scheduling loop
    let mut scheduler: Option<JoinHandle<warden_util::Result<()>>> =
        match (settings.window, &link) {
            (Some(window), Some(link)) => {
                info!(window = %window, "power window loaded");

                let scheduler = Scheduler::new(
                    window,
                    overrides.clone(),
                    link.clone(),
                    Arc::new(LinuxSystem),
                    core_event_tx,
                    args.skip_system_shutdown,
                );
                let skip_grace = args.skip_grace_period;

                Some(tokio::spawn(async move {
                    if !skip_grace {
                        info!(
                            grace = %format_duration(INITIAL_GRACE_PERIOD),
                            "waiting before applying the power window"
                        );
                        tokio::time::sleep(INITIAL_GRACE_PERIOD).await;
                    }
                    scheduler.run().await
                }))
            }
            (None, _) => {
                info!("no power window configured, pinging watchdog only");
                None
            }
            (Some(_), None) => {
                info!("controller absent, power scheduling disabled");
                None
            }
        };

    let watchdog_running = watchdog.is_some();

    // Signal handlers
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    info!("Service running");

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, shutting down");
                break;
            }

            // A watchdog failure means the controller may already be
            // counting down to an uncommanded power-off
            err = join_fatal(&mut watchdog) => {
                error!(error = %err, "watchdog loop failed");
                ipc.shutdown();
                return Err(err.into());
            }

            result = join_scheduler(&mut scheduler) => {
                match result {
                    Ok(()) => {
                        info!("shutdown sequence complete");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "scheduling loop failed");
                        ipc.shutdown();
                        return Err(e.into());
                    }
                }
            }

            Some(event) = core_events.recv() => {
                broadcast_core_event(&ipc, event);
            }

            Some(msg) = ipc_messages.recv() => {
                handle_ipc_message(
                    &ipc,
                    &link,
                    &overrides,
                    settings.window,
                    watchdog_running,
                    settings.battery.enable_readings,
                    &mut rate_limiter,
                    msg,
                )
                .await;
            }
        }
    }

    ipc.shutdown();
    info!("Shutdown complete");
    Ok(())
}

/// Degraded mode for a broken configuration: keep the controller
/// informed of host liveness and do nothing else.
async fn watchdog_only() -> Result<()> {
    info!("connecting to companion controller");
    let bus = I2cBus::open(DEFAULT_BUS_PATH, DEFAULT_CONTROLLER_ADDRESS)
        .with_context(|| format!("failed to open controller bus {}", DEFAULT_BUS_PATH))?;

    let Some(link) = ControllerLink::connect(bus).await else {
        info!("companion controller not present");
        return Ok(());
    };
    info!("connected to companion controller");

    let err = run_watchdog(Arc::new(link)).await;
    error!(error = %err, "watchdog loop failed");
    Err(err.into())
}

/// Await an optional fatal-error task; pends forever when absent.
async fn join_fatal(handle: &mut Option<JoinHandle<WardenError>>) -> WardenError {
    match handle {
        Some(handle) => handle
            .await
            .unwrap_or_else(|e| WardenError::internal(format!("watchdog task panicked: {e}"))),
        None => std::future::pending().await,
    }
}

/// Await the optional scheduler task; pends forever when absent.
async fn join_scheduler(
    handle: &mut Option<JoinHandle<warden_util::Result<()>>>,
) -> warden_util::Result<()> {
    match handle {
        Some(handle) => handle
            .await
            .unwrap_or_else(|e| Err(WardenError::internal(format!("scheduler task panicked: {e}")))),
        None => std::future::pending().await,
    }
}

fn broadcast_core_event(ipc: &Arc<IpcServer>, event: CoreEvent) {
    match event {
        CoreEvent::PowerOffArmed { minutes } => {
            ipc.broadcast_event(Event::new(EventPayload::PowerOffArmed { minutes }));
        }
        CoreEvent::ShuttingDown => {
            ipc.broadcast_event(Event::new(EventPayload::ShuttingDown));
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_ipc_message(
    ipc: &Arc<IpcServer>,
    link: &Option<Link>,
    overrides: &Arc<OverrideStore>,
    window: Option<PowerWindow>,
    watchdog_running: bool,
    battery_readings: bool,
    rate_limiter: &mut RateLimiter,
    msg: ServerMessage,
) {
    match msg {
        ServerMessage::Request { client_id, request } => {
            if !rate_limiter.check(&client_id) {
                let response = Response::error(
                    request.request_id,
                    ErrorInfo::new(ErrorCode::RateLimited, "Too many requests"),
                );
                let _ = ipc.send_response(&client_id, response).await;
                return;
            }

            let response = handle_command(
                ipc,
                link,
                overrides,
                window,
                watchdog_running,
                battery_readings,
                &client_id,
                request.request_id,
                request.command,
            )
            .await;

            let _ = ipc.send_response(&client_id, response).await;
        }

        ServerMessage::ClientDisconnected { client_id } => {
            rate_limiter.remove_client(&client_id);
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_command(
    ipc: &Arc<IpcServer>,
    link: &Option<Link>,
    overrides: &Arc<OverrideStore>,
    window: Option<PowerWindow>,
    watchdog_running: bool,
    battery_readings: bool,
    client_id: &ClientId,
    request_id: u64,
    command: Command,
) -> Response {
    match command {
        Command::GetState => {
            let snapshot = take_snapshot(link, overrides, window, battery_readings);
            Response::success(request_id, ResponsePayload::State(snapshot))
        }

        Command::StayOnUntil { until } => {
            if let Some(info) = ipc.get_client_info(client_id).await
                && !info.role.can_stay_on()
            {
                return Response::error(
                    request_id,
                    ErrorInfo::new(ErrorCode::PermissionDenied, "Admin role required"),
                );
            }

            match overrides.stay_on_until(warden_util::now(), until) {
                Ok(()) => {
                    ipc.broadcast_event(Event::new(EventPayload::OverrideExtended { until }));
                    Response::success(request_id, ResponsePayload::StayOnSet { until })
                }
                Err(e @ WardenError::InvalidDelay { .. }) => {
                    Response::error(request_id, ErrorInfo::new(ErrorCode::InvalidDelay, e.to_string()))
                }
                Err(e) => {
                    Response::error(request_id, ErrorInfo::new(ErrorCode::InternalError, e.to_string()))
                }
            }
        }

        Command::GetHealth => {
            let health = HealthStatus {
                live: true,
                controller_present: link.is_some(),
                watchdog_running,
                window_configured: window.is_some(),
            };
            Response::success(request_id, ResponsePayload::Health(health))
        }

        Command::SubscribeEvents => Response::success(
            request_id,
            ResponsePayload::Subscribed {
                client_id: client_id.clone(),
            },
        ),

        Command::UnsubscribeEvents => Response::success(request_id, ResponsePayload::Unsubscribed),

        Command::Ping => Response::success(request_id, ResponsePayload::Pong),
    }
}

fn take_snapshot(
    link: &Option<Link>,
    overrides: &Arc<OverrideStore>,
    window: Option<PowerWindow>,
    battery_readings: bool,
) -> StateSnapshot {
    let now = warden_util::now();

    let (on_battery, battery_raw) = match link {
        Some(link) => {
            let on_battery = link.check_is_on_battery().ok();
            let battery_raw = if battery_readings {
                link.read_battery_value().ok()
            } else {
                None
            };
            (on_battery, battery_raw)
        }
        None => (None, None),
    };

    let window = window.map(|w| WindowStatus {
        wake: w.wake.to_string(),
        sleep: w.sleep.to_string(),
        active: w.is_active(&now),
        minutes_until_active: (w.until_active(&now).as_secs() / 60) as i64,
        minutes_until_end: (w.until_end(&now).as_secs() / 60) as i64,
    });

    StateSnapshot {
        api_version: API_VERSION,
        controller_present: link.is_some(),
        on_battery,
        battery_raw,
        window,
        stay_on_until: overrides.deadline(),
    }
}
