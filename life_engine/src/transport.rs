// transport.rs - Message boundary between the background engine and its consumer
//
// Inbound messages are queued on an unbounded channel and applied in arrival
// order on the engine task. Snapshots go out on a `watch` channel, so neither
// side waits on the other.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::grid::{Cell, CellKey, GridDimensions};
use crate::scheduler::{self, SnapshotSink, TickScheduler};

/// Messages accepted by the engine, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inbound {
    /// Reset, seed a random population and start ticking
    Init {
        width: i64,
        height: i64,
        /// Missing or zero falls back to the configured cap
        #[serde(rename = "maxAlive", default, skip_serializing_if = "Option::is_none")]
        max_alive: Option<usize>,
    },
    Resize { width: i64, height: i64 },
    Activate {
        #[serde(rename = "centerX")]
        center_x: i32,
        #[serde(rename = "centerY")]
        center_y: i32,
        radius: i32,
    },
    Wave,
}

/// Age map after a step. Keys are packed with `width`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub cell_ages: Vec<(CellKey, u32)>,
    pub width: u32,
    pub height: u32,
    pub generation: u64,
}

impl Snapshot {
    pub fn cells(&self) -> impl Iterator<Item = (Cell, u32)> + '_ {
        let dims = GridDimensions { width: self.width, height: self.height };
        self.cell_ages.iter().map(move |&(key, age)| (dims.cell_of(key), age))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub(crate) enum Command {
    Message(Inbound),
    Terminate,
}

/// Consumer-side handle to an engine running on its own tokio task.
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
    task: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Start the engine task on the current tokio runtime. It stays idle until `init`.
    pub fn spawn(config: Config) -> Result<Self> {
        Self::spawn_inner(config, None)
    }

    /// Like `spawn`, with a fixed RNG seed for reproducible runs.
    pub fn spawn_seeded(config: Config, seed: u64) -> Result<Self> {
        Self::spawn_inner(config, Some(seed))
    }

    fn spawn_inner(config: Config, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (commands, inbox) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(Arc::new(Snapshot::default()));
        let worker = Worker::new(config, seed, publisher);
        let task = runtime.spawn(worker.run(inbox));
        Ok(Self {
            commands,
            snapshots,
            task: Some(task),
        })
    }

    /// Queue a message. Fails with `Closed` once the engine has terminated.
    pub fn send(&self, message: Inbound) -> Result<()> {
        self.commands
            .send(Command::Message(message))
            .map_err(|_| EngineError::Closed)
    }

    pub fn send_json(&self, json: &str) -> Result<()> {
        self.send(serde_json::from_str(json)?)
    }

    pub fn init(&self, width: i64, height: i64, max_alive: Option<usize>) -> Result<()> {
        self.send(Inbound::Init { width, height, max_alive })
    }

    pub fn resize(&self, width: i64, height: i64) -> Result<()> {
        self.send(Inbound::Resize { width, height })
    }

    pub fn activate(&self, center_x: i32, center_y: i32, radius: i32) -> Result<()> {
        self.send(Inbound::Activate { center_x, center_y, radius })
    }

    pub fn wave(&self) -> Result<()> {
        self.send(Inbound::Wave)
    }

    /// A receiver that always holds the newest snapshot.
    pub fn snapshots(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the timer, drop all engine state and wait for the task to finish.
    /// Anything queued before this call is still applied first. Later sends
    /// fail with `Closed` and have no effect.
    pub async fn terminate(&mut self) {
        let _ = self.commands.send(Command::Terminate);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                log::warn!("engine task ended abnormally: {err}");
            }
        }
    }
}

enum Event {
    Command(Option<Command>),
    Tick,
}

/// The engine task: owns all simulation state and is its only writer.
pub(crate) struct Worker<S> {
    config: Config,
    seed: Option<u64>,
    engine: Option<Engine>,
    scheduler: TickScheduler,
    sink: S,
}

impl<S: SnapshotSink> Worker<S> {
    pub(crate) fn new(config: Config, seed: Option<u64>, sink: S) -> Self {
        let scheduler = TickScheduler::new(config.simulation.tick_interval());
        Self {
            config,
            seed,
            engine: None,
            scheduler,
            sink,
        }
    }

    pub(crate) async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        loop {
            // Pending messages win over a due tick so they show in the next snapshot.
            let event = tokio::select! {
                biased;
                command = inbox.recv() => Event::Command(command),
                _ = self.scheduler.tick() => Event::Tick,
            };
            match event {
                Event::Command(Some(Command::Message(message))) => self.handle(message),
                Event::Command(Some(Command::Terminate)) | Event::Command(None) => break,
                Event::Tick => self.tick(),
            }
        }
        self.scheduler.stop();
        self.engine = None;
        log::debug!("engine terminated");
    }

    fn handle(&mut self, message: Inbound) {
        match message {
            Inbound::Init { width, height, max_alive } => self.init(width, height, max_alive),
            Inbound::Resize { width, height } => match self.engine.as_mut() {
                Some(engine) => engine.resize(width, height),
                None => log::debug!("resize before init ignored"),
            },
            Inbound::Activate { center_x, center_y, radius } => match self.engine.as_mut() {
                Some(engine) => engine.activate(center_x, center_y, radius),
                None => log::debug!("activate before init ignored"),
            },
            Inbound::Wave => match self.engine.as_mut() {
                Some(engine) => engine.wave(),
                None => log::debug!("wave before init ignored"),
            },
        }
    }

    fn init(&mut self, width: i64, height: i64, max_alive: Option<usize>) {
        let dims = GridDimensions::new(width, height);
        let max_alive = max_alive
            .filter(|&cap| cap > 0)
            .unwrap_or(self.config.simulation.max_alive);

        let sim = &self.config.simulation;
        let eraser = self.config.interaction.eraser_radius;
        let seed = self.seed;
        let engine = self.engine.get_or_insert_with(|| {
            let engine = match seed {
                Some(seed) => Engine::with_seed(sim.clone(), dims, seed),
                None => Engine::new(sim.clone(), dims),
            };
            engine.with_eraser_radius(eraser)
        });
        engine.reset(dims, max_alive);
        let seeded = engine.seed(sim.initial_spawn_count);
        log::info!(
            "engine init: {}x{} grid, cap {}, {} seeded",
            dims.width,
            dims.height,
            max_alive,
            seeded
        );

        self.scheduler.start();
    }

    fn tick(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            scheduler::fire(engine, &mut self.sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_wire_format() {
        let init: Inbound = serde_json::from_str(r#"{"type":"init","width":120,"height":80,"maxAlive":25000}"#).unwrap();
        assert_eq!(init, Inbound::Init { width: 120, height: 80, max_alive: Some(25_000) });

        let init: Inbound = serde_json::from_str(r#"{"type":"init","width":1,"height":2}"#).unwrap();
        assert_eq!(init, Inbound::Init { width: 1, height: 2, max_alive: None });

        let activate: Inbound = serde_json::from_str(r#"{"type":"activate","centerX":5,"centerY":-1,"radius":4}"#).unwrap();
        assert_eq!(activate, Inbound::Activate { center_x: 5, center_y: -1, radius: 4 });

        assert_eq!(serde_json::from_str::<Inbound>(r#"{"type":"wave"}"#).unwrap(), Inbound::Wave);
        assert_eq!(
            serde_json::to_string(&Inbound::Resize { width: 3, height: 4 }).unwrap(),
            r#"{"type":"resize","width":3,"height":4}"#
        );
    }

    #[test]
    fn unknown_message_is_rejected() {
        assert!(serde_json::from_str::<Inbound>(r#"{"type":"explode"}"#).is_err());
        assert!(serde_json::from_str::<Inbound>(r#"{"width":3}"#).is_err());
    }

    #[test]
    fn snapshot_wire_format() {
        let snapshot = Snapshot {
            cell_ages: vec![(3, 15), (12, 80)],
            width: 10,
            height: 5,
            generation: 7,
        };
        assert_eq!(
            snapshot.to_json().unwrap(),
            r#"{"cellAges":[[3,15],[12,80]],"width":10,"height":5,"generation":7}"#
        );
        let cells: Vec<_> = snapshot.cells().collect();
        assert_eq!(cells, vec![(Cell::new(3, 0), 15), (Cell::new(2, 1), 80)]);
    }

    fn test_worker(max_alive: usize) -> (Worker<mpsc::UnboundedSender<Snapshot>>, mpsc::UnboundedReceiver<Snapshot>) {
        let mut config = Config::default();
        config.simulation.max_alive = max_alive;
        config.simulation.initial_spawn_count = 0;
        let (tx, rx) = mpsc::unbounded_channel();
        (Worker::new(config, Some(1), tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn messages_before_init_are_ignored() {
        let (mut worker, _rx) = test_worker(100);
        worker.handle(Inbound::Activate { center_x: 5, center_y: 5, radius: 5 });
        worker.handle(Inbound::Wave);
        worker.handle(Inbound::Resize { width: 3, height: 3 });
        assert!(worker.engine.is_none());
        assert!(!worker.scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn init_scenario() {
        let (mut worker, mut rx) = test_worker(100);
        worker.handle(Inbound::Init { width: 10, height: 10, max_alive: Some(100) });
        assert!(worker.scheduler.is_running());
        worker.handle(Inbound::Activate { center_x: 5, center_y: 5, radius: 5 });
        worker.tick();

        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.generation, 1);
        assert!(!snapshot.cell_ages.is_empty());
        for (cell, age) in snapshot.cells() {
            assert!((0..10).contains(&cell.x) && (0..10).contains(&cell.y));
            assert!(age > 0);
        }
        // The eraser zone stays empty after a single step.
        let engine = worker.engine.as_ref().unwrap();
        for (dx, dy) in [(0, 0), (1, 0), (0, -1), (-1, 1)] {
            assert!(!engine.is_alive(Cell::new(5 + dx, 5 + dy)));
        }
        assert!(engine.alive_count() <= 100);
    }

    #[tokio::test(start_paused = true)]
    async fn init_without_cap_uses_config() {
        let (mut worker, _rx) = test_worker(321);
        worker.handle(Inbound::Init { width: 10, height: 10, max_alive: None });
        assert_eq!(worker.engine.as_ref().unwrap().max_alive(), 321);
        assert_eq!(worker.engine.as_ref().unwrap().eraser_radius(), 3);
        worker.handle(Inbound::Init { width: 10, height: 10, max_alive: Some(0) });
        assert_eq!(worker.engine.as_ref().unwrap().max_alive(), 321);
    }

    #[tokio::test(start_paused = true)]
    async fn reinit_replaces_state() {
        let (mut worker, _rx) = test_worker(1_000);
        worker.handle(Inbound::Init { width: 20, height: 20, max_alive: None });
        worker.handle(Inbound::Activate { center_x: 10, center_y: 10, radius: 5 });
        worker.tick();
        worker.handle(Inbound::Init { width: 8, height: 8, max_alive: None });

        let engine = worker.engine.as_ref().unwrap();
        assert_eq!(engine.alive_count(), 0);
        assert_eq!(engine.tracked_count(), 0);
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.dimensions(), GridDimensions::new(8, 8));
    }
}
