/*
 *  main.rs
 *
 *  LedMux - ambient state, one panel at a time
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::net::IpAddr;

use env_logger::Env;
use local_ip_address::local_ip;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};

use ledmux::config::{self, Config};
use ledmux::display::DisplayDriverFactory;
use ledmux::{Engine, EngineConfig, SetupError};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Forward newline-separated topics from stdin, then idle once it closes
async fn feed_topics(engine: &Engine) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let topic = line.trim();
                if !topic.is_empty() && engine.motion_detected(topic) {
                    debug!("Motion on {}", topic);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Topic feed stopped: {}", e);
                break;
            }
        }
    }
    info!("Topic feed closed.");
    std::future::pending::<()>().await
}

fn identity(cfg: &Config) -> Result<IpAddr, SetupError> {
    if let Some(addr) = cfg.identity()? {
        return Ok(addr);
    }
    Ok(local_ip().unwrap_or_else(|e| {
        warn!("No local address ({}), identity shows loopback", e);
        IpAddr::from([127, 0, 0, 1])
    }))
}

#[cfg(feature = "rpi")]
fn start_motion(
    cfg: &Config,
    engine: &mut Engine,
) -> Result<Option<ledmux::motion::MotionSource<ledmux::gpio::RppalInput>>, SetupError> {
    let Some(motion) = cfg.motion.as_ref() else {
        return Ok(None);
    };
    let input = ledmux::gpio::RppalInput::new()?;
    let mut source = ledmux::motion::MotionSource::new(input, motion.pin, motion.pull)?;
    source.enable()?;
    engine.attach_motion(source.queue(), motion.zone.clone());
    Ok(Some(source))
}

#[cfg(not(feature = "rpi"))]
fn start_motion(cfg: &Config, _engine: &mut Engine) -> Result<Option<()>, SetupError> {
    if let Some(motion) = cfg.motion.as_ref() {
        warn!("Built without the rpi feature, motion input on pin {} disabled", motion.pin);
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, cli) = config::load()?;

    // Initialize the logger; RUST_LOG wins over the configured level
    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This {} keeps the house lit", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let identity = identity(&cfg)?;
    info!("Identity {}", identity);

    let display = DisplayDriverFactory::create_from_config(&cfg.display_config()).map_err(SetupError::from)?;
    let mut engine = Engine::start(display, EngineConfig::from_config(&cfg, identity))?;

    // the source owns the interrupt registration, keep it alive until shutdown
    let _motion = start_motion(&cfg, &mut engine)?;

    tokio::select! {
        res = signal_handler() => res?,
        _ = feed_topics(&engine), if cli.topics_stdin => {}
    }

    engine.shutdown().await;
    info!("Bye.");
    Ok(())
}
