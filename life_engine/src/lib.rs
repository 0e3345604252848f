//! Aging Game of Life engine.
//!
//! A sparse, hard-edged Life grid where every cell also carries an age that
//! rises while it lives and decays after it dies, so consumers can fade cells
//! in and out. The engine runs on its own tokio task behind [`EngineHandle`]:
//! callers send [`Inbound`] messages and read [`Snapshot`]s of the age map
//! published after every tick.
//!
//! ```no_run
//! # async fn demo() -> life_engine::Result<()> {
//! use life_engine::{Config, EngineHandle};
//!
//! let mut engine = EngineHandle::spawn(Config::default())?;
//! engine.init(240, 135, None)?;
//! engine.activate(120, 60, 4)?;
//!
//! let mut snapshots = engine.snapshots();
//! snapshots.changed().await.ok();
//! println!("{} visible cells", snapshots.borrow().cell_ages.len());
//! engine.terminate().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod patterns;
pub mod scheduler;
pub mod transport;

pub use config::{Config, GridConfig, InteractionConfig, SimulationConfig};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use grid::{Cell, CellKey, GridDimensions, decode, encode};
pub use scheduler::{SnapshotSink, TickScheduler};
pub use transport::{EngineHandle, Inbound, Snapshot};
