//! Main entry point for the vidlink session client
//!
//! Joins a channel, sends local media according to the role and renders
//! remote video when `--use-sdl` is given. Runs until Ctrl-C / SIGTERM or
//! until the connection is closed; an abnormal close exits with status 1.

mod args;
mod demo;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};
use vidlink_client_core::client::spawn_signal_listener;
use vidlink_client_core::logging::{log_welcome, setup_logging};
use vidlink_client_core::loopback::LoopbackEngine;
use vidlink_client_core::platform::PlatformGuard;
use vidlink_client_core::{DisconnectReason, SessionController, SessionEvent, VERSION};

use crate::args::Args;
use crate::demo::{LogRenderer, TestPatternLibrary};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match run(args).await {
        Ok(reason) if reason.is_normal() => {}
        Ok(reason) => {
            eprintln!("Session closed abnormally: {}", reason);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<DisconnectReason> {
    let _platform = PlatformGuard::acquire().context("platform initialization failed")?;
    setup_logging(args.logging_config())?;
    log_welcome("vidlink", VERSION);

    let config = args.session_config()?;
    let display = config.display.clone();

    let mut builder = SessionController::builder(config)
        .engine(LoopbackEngine::new())
        .capture(Arc::new(TestPatternLibrary));
    if let Some(display) = display {
        builder = builder.renderer(LogRenderer::new(display));
    }
    let controller = builder.build()?;

    spawn_signal_listener(controller.handle());
    tokio::spawn(log_session_events(controller.subscribe()));

    let reason = controller.run().await?;
    info!("session finished: {}", reason);
    Ok(reason)
}

async fn log_session_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::StateChanged { previous, current, .. }) => {
                info!(%previous, %current, "state changed");
            }
            Ok(SessionEvent::TrackAttachFailed { track_id, error }) => {
                warn!(%track_id, "track not sent: {}", error);
            }
            Ok(SessionEvent::DataChannelOpened { label }) => info!(%label, "data channel opened"),
            Ok(SessionEvent::Notify { text }) => info!("notify: {}", text),
            Ok(SessionEvent::Push { text }) => info!("push: {}", text),
            Ok(SessionEvent::Message { label, data }) => info!(%label, "message: {}", data),
            Ok(SessionEvent::Closed(_)) | Err(broadcast::error::RecvError::Closed) => break,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event log fell behind");
            }
        }
    }
}
