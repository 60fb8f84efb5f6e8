//! wardenctl - control client for wardend
//!
//! Talks NDJSON over the daemon's Unix socket. The most important
//! subcommand in the field is `stay-on`: it postpones an imminent
//! scheduled shutdown while someone is working on the device.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden_api::{Command as ApiCommand, ResponsePayload, ResponseResult, StateSnapshot};
use warden_ipc::IpcClient;
use warden_util::default_socket_path;

/// Control client for wardend
#[derive(Parser, Debug)]
#[command(name = "wardenctl")]
#[command(about = "Control client for wardend", long_about = None)]
#[command(version)]
struct Args {
    /// Socket path (or set WARDEN_SOCKET env var)
    #[arg(short, long, env = "WARDEN_SOCKET")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand, Debug)]
enum CtlCommand {
    /// Show the supervisor state
    Status,

    /// Postpone a scheduled shutdown
    StayOn {
        /// Minutes from now to stay on (the daemon caps this at 12 hours)
        #[arg(short, long, default_value_t = 60)]
        minutes: i64,
    },

    /// Show daemon health
    Health,

    /// Stream events as they happen
    Watch,

    /// Check that the daemon answers
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let socket = args.socket.unwrap_or_else(default_socket_path);
    let mut client = IpcClient::connect(&socket)
        .await
        .with_context(|| format!("failed to connect to wardend at {}", socket.display()))?;

    match args.command {
        CtlCommand::Status => {
            match expect_ok(client.send(ApiCommand::GetState).await?)? {
                ResponsePayload::State(state) => print_state(&state),
                other => bail!("unexpected response: {:?}", other),
            }
        }

        CtlCommand::StayOn { minutes } => {
            let until = warden_util::now() + chrono::Duration::minutes(minutes);
            match expect_ok(client.send(ApiCommand::StayOnUntil { until }).await?)? {
                ResponsePayload::StayOnSet { until } => {
                    println!("staying on until {}", until.format("%Y-%m-%d %H:%M:%S"));
                }
                other => bail!("unexpected response: {:?}", other),
            }
        }

        CtlCommand::Health => {
            match expect_ok(client.send(ApiCommand::GetHealth).await?)? {
                ResponsePayload::Health(health) => {
                    println!("live:               {}", health.live);
                    println!("controller present: {}", health.controller_present);
                    println!("watchdog running:   {}", health.watchdog_running);
                    println!("window configured:  {}", health.window_configured);
                }
                other => bail!("unexpected response: {:?}", other),
            }
        }

        CtlCommand::Watch => {
            let mut events = client.subscribe().await?;
            loop {
                let event = events.next().await?;
                println!("{}", serde_json::to_string(&event)?);
            }
        }

        CtlCommand::Ping => {
            match expect_ok(client.send(ApiCommand::Ping).await?)? {
                ResponsePayload::Pong => println!("pong"),
                other => bail!("unexpected response: {:?}", other),
            }
        }
    }

    Ok(())
}

fn expect_ok(response: warden_api::Response) -> Result<ResponsePayload> {
    match response.result {
        ResponseResult::Ok(payload) => Ok(payload),
        ResponseResult::Err(e) => bail!("{:?}: {}", e.code, e.message),
    }
}

fn print_state(state: &StateSnapshot) {
    println!(
        "controller:    {}",
        if state.controller_present {
            "present"
        } else {
            "absent"
        }
    );

    match state.on_battery {
        Some(true) => println!("power source:  battery"),
        Some(false) => println!("power source:  external"),
        None => println!("power source:  unknown"),
    }

    if let Some(raw) = state.battery_raw {
        println!("battery sense: {}", raw);
    }

    match &state.window {
        Some(w) => {
            println!("power window:  {}-{}", w.wake, w.sleep);
            if w.active {
                println!("window state:  active, {} minutes remaining", w.minutes_until_end);
            } else {
                println!(
                    "window state:  inactive, opens in {} minutes",
                    w.minutes_until_active
                );
            }
        }
        None => println!("power window:  none (host never powers off)"),
    }

    println!(
        "stay on until: {}",
        state.stay_on_until.format("%Y-%m-%d %H:%M:%S")
    );
}
