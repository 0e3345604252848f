// config.rs - Engine configuration
//
// Defaults match the tuning of the site background. Every value can be
// overridden from the environment (`LIFE_*`) or a JSON document.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::grid::{Cell, GridDimensions};

/// Rule and population tuning, fixed for a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Age increase per step while alive
    pub age_gain_rate: u32,
    /// Age decrease per step while dead
    pub age_decay_rate: u32,
    /// Age given to cells spawned by seeding or interaction
    pub initial_age: u32,
    pub max_age: u32,
    /// Hard cap on simultaneously alive cells
    pub max_alive: usize,
    /// Step interval in milliseconds (50ms = 20 steps/sec)
    pub tick_ms: u64,
    /// Random cells placed on init
    pub initial_spawn_count: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            age_gain_rate: 15,
            age_decay_rate: 8,
            initial_age: 1,
            max_age: 80,
            max_alive: 25_000,
            tick_ms: 50,
            initial_spawn_count: 500,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Age bonus for touching a cell that is already alive.
    pub fn nudge(&self) -> u32 {
        self.age_gain_rate / 3
    }
}

/// Pointer and idle-wave tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    /// Eraser radius in cells; activation inside it kills instead of spawning
    pub eraser_radius: i32,
    /// Inactivity before idle waves start
    pub wave_timeout_ms: u64,
    /// Time between idle waves
    pub wave_interval_ms: u64,
    /// Whether hosts should drive idle waves at all
    pub idle_waves: bool,
}

impl InteractionConfig {
    pub fn wave_timeout(&self) -> Duration {
        Duration::from_millis(self.wave_timeout_ms)
    }

    pub fn wave_interval(&self) -> Duration {
        Duration::from_millis(self.wave_interval_ms)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            eraser_radius: 3,
            wave_timeout_ms: 10_000,
            wave_interval_ms: 2_000,
            idle_waves: true,
        }
    }
}

/// Mapping from viewport pixels to grid cells.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Pixel size of one cell
    pub cell_size: f64,
    /// Extra simulated space beyond the viewport
    pub scale_factor: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 8.0,
            scale_factor: 1.2,
        }
    }
}

impl GridConfig {
    pub fn dimensions_for(&self, px_width: f64, px_height: f64) -> GridDimensions {
        GridDimensions::from_viewport(px_width, px_height, self.cell_size, self.scale_factor)
    }

    /// Grid cell under a pointer at screen pixel `(px_x, px_y)`.
    pub fn to_cell(&self, px_x: f64, px_y: f64) -> Cell {
        Cell::new((px_x / self.cell_size).floor() as i32, (px_y / self.cell_size).floor() as i32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub interaction: InteractionConfig,
    pub grid: GridConfig,
}

impl Config {
    /// Defaults overridden by any `LIFE_*` environment variables that parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        let sim = &mut config.simulation;
        override_from_env("LIFE_AGE_GAIN", &mut sim.age_gain_rate);
        override_from_env("LIFE_AGE_DECAY", &mut sim.age_decay_rate);
        override_from_env("LIFE_INITIAL_AGE", &mut sim.initial_age);
        override_from_env("LIFE_MAX_AGE", &mut sim.max_age);
        override_from_env("LIFE_MAX_ALIVE", &mut sim.max_alive);
        override_from_env("LIFE_TICK_MS", &mut sim.tick_ms);
        override_from_env("LIFE_INITIAL_SPAWN", &mut sim.initial_spawn_count);

        let interaction = &mut config.interaction;
        override_from_env("LIFE_ERASER_RADIUS", &mut interaction.eraser_radius);
        override_from_env("LIFE_WAVE_TIMEOUT_MS", &mut interaction.wave_timeout_ms);
        override_from_env("LIFE_WAVE_INTERVAL_MS", &mut interaction.wave_interval_ms);
        override_from_env("LIFE_IDLE_WAVES", &mut interaction.idle_waves);

        override_from_env("LIFE_CELL_SIZE", &mut config.grid.cell_size);
        override_from_env("LIFE_SCALE_FACTOR", &mut config.grid.scale_factor);

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulation.max_age == 0 {
            return Err(EngineError::config("max_age must be positive"));
        }
        if self.simulation.tick_ms == 0 {
            return Err(EngineError::config("tick_ms must be positive"));
        }
        if !(self.grid.cell_size > 0.0) || !(self.grid.scale_factor > 0.0) {
            return Err(EngineError::config("cell_size and scale_factor must be positive"));
        }
        if self.interaction.eraser_radius < 0 {
            return Err(EngineError::config("eraser_radius must not be negative"));
        }
        Ok(())
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => log::warn!("ignoring unparsable {key}={raw:?}"),
        }
    }
}
