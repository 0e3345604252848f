// interaction.rs - Pointer activation, idle waves and resizes applied between steps

use std::f64::consts::TAU;
use std::ops::RangeInclusive;

use rand::Rng;

use crate::engine::Engine;
use crate::grid::{Cell, GridDimensions};

pub const DEFAULT_ERASER_RADIUS: i32 = 3;

const WAVE_FREQUENCY: f64 = 0.05;
const WAVE_EXTENT: f64 = 0.4;       // Ring reaches 40% of the shorter side
const WAVE_ANGLE_STEP: f64 = 0.15;  // Radians between ring samples
const WAVE_DENSITY: f64 = 0.5;      // Chance each sample spawns

impl Engine {
    pub fn with_eraser_radius(mut self, radius: i32) -> Self {
        self.eraser_radius = radius.max(0);
        self
    }

    pub fn eraser_radius(&self) -> i32 {
        self.eraser_radius
    }

    /// Touch a filled disk around `(center_x, center_y)`.
    ///
    /// Cells within the eraser radius are killed and lose their trail. Cells in
    /// the surrounding annulus are spawned, or aged a little if already alive.
    /// Only the part of the disk that overlaps the grid is visited. A negative
    /// radius does nothing.
    pub fn activate(&mut self, center_x: i32, center_y: i32, radius: i32) {
        if radius < 0 {
            return;
        }
        let r = radius as i64;
        let inner = (self.eraser_radius as i64).min(r);
        let (cx, cy) = (center_x as i64, center_y as i64);
        let nudge = self.config().nudge();
        let dims = self.dimensions();

        // Erasing also reaches trails left outside a shrunken grid.
        self.erase_disk(cx, cy, inner);

        for y in clipped(cy, r, dims.height) {
            for x in clipped(cx, r, dims.width) {
                let (dx, dy) = (x - cx, y - cy);
                let dist_sq = dx * dx + dy * dy;
                if dist_sq <= inner * inner || dist_sq > r * r {
                    continue;
                }
                let cell = Cell::new(x as i32, y as i32);
                if self.is_alive(cell) {
                    self.nudge(cell, nudge);
                } else {
                    self.spawn(cell);
                }
            }
        }
    }

    /// One beat of the idle animation: a ring around the grid centre whose
    /// radius pulses with every call. Each ring sample spawns with 50% odds.
    pub fn wave(&mut self) {
        let dims = self.dimensions();
        let center = dims.center();
        let max_radius = dims.width.min(dims.height) as f64 * WAVE_EXTENT;
        let distance = (self.wave_time as f64 * WAVE_FREQUENCY).sin() * max_radius * 0.5 + max_radius * 0.5;

        let mut angle = 0.0_f64;
        while angle < TAU {
            let x = (center.x as f64 + angle.cos() * distance).floor() as i32;
            let y = (center.y as f64 + angle.sin() * distance).floor() as i32;
            let cell = Cell::new(x, y);
            if dims.contains(cell) && self.rng.gen_bool(WAVE_DENSITY) {
                self.spawn(cell);
            }
            angle += WAVE_ANGLE_STEP;
        }

        self.wave_time += 1;
    }

    pub fn wave_time(&self) -> u64 {
        self.wave_time
    }

    /// Adopt new dimensions. Cells keep their coordinates; anything now out of
    /// bounds stops taking part in steps and fades out.
    pub fn resize(&mut self, width: i64, height: i64) {
        let dims = GridDimensions::new(width, height);
        log::debug!("resize {}x{} -> {}x{}", self.dimensions().width, self.dimensions().height, dims.width, dims.height);
        self.set_dimensions(dims);
    }
}

/// In-grid coordinates of `[center - radius, center + radius]` along an axis of `len` cells.
fn clipped(center: i64, radius: i64, len: u32) -> RangeInclusive<i64> {
    let last = (len as i64 - 1).min(i32::MAX as i64);
    (center - radius).max(0)..=(center + radius).min(last)
}
