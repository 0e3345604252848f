// main.rs - Headless engine worker speaking newline-delimited JSON
//
// stdin:  one inbound message per line, e.g. {"type":"init","width":240,"height":135}
// stdout: one snapshot per tick, {"cellAges":[[key,age],...],"width":..,"height":..,"generation":..}
// Logs go to stderr (RUST_LOG=debug for lifecycle detail).

use std::sync::Arc;

use life_engine::{Config, EngineHandle, Inbound, Result, Snapshot};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::watch;

mod idle;

use idle::IdleDetector;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let idle = IdleDetector::new(&config.interaction);
    let mut engine = EngineHandle::spawn(config)?;
    let writer = tokio::spawn(write_snapshots(engine.snapshots()));

    let result = read_messages(&engine, idle).await;

    engine.terminate().await;
    match writer.await {
        Ok(Err(err)) => log::warn!("snapshot writer stopped: {err}"),
        Err(err) => log::warn!("snapshot writer panicked: {err}"),
        Ok(Ok(())) => {}
    }
    log::info!("worker exiting");
    result
}

enum Event {
    Line(Option<String>),
    Idle,
}

/// Forward stdin messages to the engine until EOF, injecting idle waves.
async fn read_messages(engine: &EngineHandle, mut idle: IdleDetector) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line?),
            _ = idle.wait() => Event::Idle,
        };

        match event {
            Event::Line(None) => break,
            Event::Line(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Inbound>(line) {
                    Ok(message) => {
                        idle.observe(&message);
                        engine.send(message)?;
                    }
                    Err(err) => log::warn!("skipping malformed message: {err}"),
                }
            }
            Event::Idle => {
                log::debug!("idle wave");
                engine.wave()?;
            }
        }
    }
    log::debug!("stdin closed");
    Ok(())
}

/// Stream the newest snapshot to stdout after every tick. A slow pipe only
/// skips snapshots; it never holds up the engine.
async fn write_snapshots(mut snapshots: watch::Receiver<Arc<Snapshot>>) -> Result<()> {
    let mut stdout = io::stdout();
    while snapshots.changed().await.is_ok() {
        let snapshot = Arc::clone(&snapshots.borrow_and_update());
        let mut line = serde_json::to_vec(snapshot.as_ref())?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }
    Ok(())
}
