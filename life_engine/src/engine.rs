// engine.rs - Aging Game of Life: alive set, age trail and the step transition

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::grid::{Cell, GridDimensions, clamp_coord};
use crate::transport::Snapshot;

pub type SimRng = StdRng;

/// Sparse grid of alive cells plus the fading age trail they leave behind.
///
/// `alive` is the simulation truth. `ages` drives the visuals and may hold
/// cells that are no longer alive but are still fading out. Both are ordered
/// row-major so population truncation and snapshots are deterministic.
pub struct Engine {
    config: SimulationConfig,
    dims: GridDimensions,
    max_alive: usize,
    alive: BTreeSet<Cell>,
    ages: BTreeMap<Cell, u32>,
    generation: u64,
    pub(crate) eraser_radius: i32,
    pub(crate) wave_time: u64,
    pub(crate) rng: SimRng,
}

impl Engine {
    pub fn new(config: SimulationConfig, dims: GridDimensions) -> Self {
        Self::with_rng(config, dims, SimRng::from_entropy())
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(config: SimulationConfig, dims: GridDimensions, seed: u64) -> Self {
        Self::with_rng(config, dims, SimRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, dims: GridDimensions, rng: SimRng) -> Self {
        let max_alive = config.max_alive;
        Self {
            config,
            dims,
            max_alive,
            alive: BTreeSet::new(),
            ages: BTreeMap::new(),
            generation: 0,
            eraser_radius: crate::interaction::DEFAULT_ERASER_RADIUS,
            wave_time: 0,
            rng,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    pub(crate) fn set_dimensions(&mut self, dims: GridDimensions) {
        self.dims = dims;
    }

    pub fn max_alive(&self) -> usize {
        self.max_alive
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Cells with a visible age, alive or fading.
    pub fn tracked_count(&self) -> usize {
        self.ages.len()
    }

    pub fn is_alive(&self, cell: Cell) -> bool {
        self.alive.contains(&cell)
    }

    /// Age of a cell, 0 when untracked.
    pub fn age(&self, cell: Cell) -> u32 {
        self.ages.get(&cell).copied().unwrap_or(0)
    }

    pub fn alive_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.alive.iter().copied()
    }

    pub fn cell_ages(&self) -> impl Iterator<Item = (Cell, u32)> + '_ {
        self.ages.iter().map(|(&cell, &age)| (cell, age))
    }

    /// Drop all state and start over on a new grid.
    pub fn reset(&mut self, dims: GridDimensions, max_alive: usize) {
        self.dims = dims;
        self.max_alive = max_alive;
        self.alive.clear();
        self.ages.clear();
        self.generation = 0;
        self.wave_time = 0;
    }

    /// Place up to `count` distinct random cells. Stops early at the population
    /// cap or when the grid is full. Returns the number placed.
    pub fn seed(&mut self, count: usize) -> usize {
        let free = self.dims.capacity().saturating_sub(self.alive.len());
        let room = self.max_alive.saturating_sub(self.alive.len());
        let target = count.min(free).min(room);

        let mut added = 0;
        while added < target {
            let x = self.rng.gen_range(0..self.dims.width) as i32;
            let y = self.rng.gen_range(0..self.dims.height) as i32;
            if self.spawn(Cell::new(x, y)) {
                added += 1;
            }
        }
        log::debug!("seeded {added} cells on {}x{}", self.dims.width, self.dims.height);
        added
    }

    /// Bring a dead in-bounds cell to life with `initial_age` unless the cap is reached.
    /// An existing trail keeps its age. Returns whether the cell was added.
    pub fn spawn(&mut self, cell: Cell) -> bool {
        if !self.dims.contains(cell) || self.alive.contains(&cell) || self.alive.len() >= self.max_alive {
            return false;
        }
        self.alive.insert(cell);
        self.ages.entry(cell).or_insert(self.config.initial_age);
        true
    }

    pub(crate) fn erase(&mut self, cell: Cell) {
        self.alive.remove(&cell);
        self.ages.remove(&cell);
    }

    /// Kill and forget every tracked cell within `radius` of `(cx, cy)`, in or
    /// out of bounds. Only the rows the disk covers are visited.
    pub(crate) fn erase_disk(&mut self, cx: i64, cy: i64, radius: i64) {
        if radius < 0 {
            return;
        }
        let first = Cell { y: clamp_coord(cy - radius), x: i32::MIN };
        let last = Cell { y: clamp_coord(cy + radius), x: i32::MAX };
        let within = |cell: &Cell| {
            let (dx, dy) = (cell.x as i64 - cx, cell.y as i64 - cy);
            dx.abs() <= radius && dx * dx + dy * dy <= radius * radius
        };
        let doomed: Vec<Cell> = self
            .ages
            .range(first..=last)
            .map(|(cell, _)| *cell)
            .chain(self.alive.range(first..=last).copied())
            .filter(within)
            .collect();
        for cell in doomed {
            self.erase(cell);
        }
    }

    /// Raise the age of an alive cell by `amount`, capped at `max_age`.
    pub(crate) fn nudge(&mut self, cell: Cell, amount: u32) {
        let max_age = self.config.max_age;
        let age = self.ages.entry(cell).or_insert(0);
        *age = age.saturating_add(amount).min(max_age);
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        // Each alive cell counts towards itself and its 8 neighbours.
        let mut counts: HashMap<Cell, u8> = HashMap::with_capacity(self.alive.len() * 9);
        for &cell in &self.alive {
            for n in cell.neighbourhood() {
                *counts.entry(n).or_insert(0) += 1;
            }
        }

        let mut next: BTreeSet<Cell> = counts
            .into_iter()
            .filter(|&(cell, count)| {
                let lives = match (self.alive.contains(&cell), count) {
                    (true, 3) | (true, 4) => true, // Survival: 2 or 3 neighbours plus self
                    (false, 3) => true,            // Birth
                    _ => false,
                };
                lives && self.dims.contains(cell)
            })
            .map(|(cell, _)| cell)
            .collect();

        // Keep the first `max_alive` cells in row-major order.
        let cutoff = next.iter().nth(self.max_alive).copied();
        if let Some(cutoff) = cutoff {
            let dropped = next.split_off(&cutoff);
            log::trace!("population cap dropped {} cells", dropped.len());
        }

        let gain = self.config.age_gain_rate;
        let decay = self.config.age_decay_rate;
        let max_age = self.config.max_age;

        let mut ages = BTreeMap::new();
        for (&cell, &age) in &self.ages {
            if !next.contains(&cell) && age > decay {
                ages.insert(cell, age - decay);
            }
        }
        for &cell in &next {
            let old = self.ages.get(&cell).copied().unwrap_or(0);
            let age = old.saturating_add(gain).min(max_age);
            if age > 0 {
                ages.insert(cell, age);
            }
        }

        self.alive = next;
        self.ages = ages;
        self.generation += 1;
        log::trace!(
            "generation {}: {} alive, {} tracked",
            self.generation,
            self.alive.len(),
            self.ages.len()
        );
    }

    /// Age map packed against the current width. Cells outside the current
    /// bounds (left behind by a shrinking resize) are not representable and
    /// are skipped until they fade.
    pub fn snapshot(&self) -> Snapshot {
        let dims = self.dims;
        Snapshot {
            cell_ages: self
                .ages
                .iter()
                .filter(|(cell, _)| dims.contains(**cell))
                .map(|(&cell, &age)| (dims.key_of(cell), age))
                .collect(),
            width: dims.width,
            height: dims.height,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            max_alive: 1_000,
            ..SimulationConfig::default()
        }
    }

    fn engine_with(cells: &[(i32, i32)]) -> Engine {
        let mut engine = Engine::with_seed(config(), GridDimensions::new(20, 20), 7);
        for &(x, y) in cells {
            assert!(engine.spawn(Cell::new(x, y)));
        }
        engine
    }

    fn alive(engine: &Engine) -> Vec<(i32, i32)> {
        engine.alive_cells().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn blinker_oscillates() {
        let mut engine = engine_with(&[(4, 5), (5, 5), (6, 5)]);
        engine.step();
        assert_eq!(alive(&engine), vec![(5, 4), (5, 5), (5, 6)]);
        engine.step();
        assert_eq!(alive(&engine), vec![(4, 5), (5, 5), (6, 5)]);
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn block_is_still() {
        let mut engine = engine_with(&[(2, 2), (3, 2), (2, 3), (3, 3)]);
        engine.step();
        assert_eq!(alive(&engine), vec![(2, 2), (3, 2), (2, 3), (3, 3)]);
    }

    #[test]
    fn full_3x3_block_keeps_only_corners() {
        let cells: Vec<_> = (4..7).flat_map(|y| (4..7).map(move |x| (x, y))).collect();
        let mut engine = engine_with(&cells);
        engine.step();
        // Corners have 3 neighbours (count 4) and survive, edges and centre are
        // overcrowded, and the middle of each outer side gets a birth.
        assert_eq!(
            alive(&engine),
            vec![(5, 3), (4, 4), (6, 4), (3, 5), (7, 5), (4, 6), (6, 6), (5, 7)]
        );
    }

    #[test]
    fn lone_cell_dies_and_fades() {
        let mut engine = engine_with(&[(10, 10)]);
        let cell = Cell::new(10, 10);
        assert_eq!(engine.age(cell), 1);
        engine.step();
        assert!(!engine.is_alive(cell));
        // Age 1 minus decay 8 drops the trail immediately.
        assert_eq!(engine.age(cell), 0);
        assert_eq!(engine.tracked_count(), 0);
    }

    #[test]
    fn ages_grow_then_decay() {
        let mut engine = engine_with(&[(2, 2), (3, 2), (2, 3), (3, 3)]);
        let cell = Cell::new(2, 2);
        for n in 1..=3 {
            engine.step();
            assert_eq!(engine.age(cell), 1 + 15 * n);
        }
        for _ in 0..10 {
            engine.step();
        }
        assert_eq!(engine.age(cell), 80);

        engine.erase(Cell::new(3, 3));
        // Three cells of an L: each has two neighbours, the missing corner is born.
        engine.step();
        assert_eq!(engine.age(Cell::new(3, 3)), 15);

        let mut lonely = engine_with(&[(0, 0), (1, 0)]);
        lonely.step();
        lonely.ages.insert(Cell::new(9, 9), 30);
        lonely.step();
        assert_eq!(lonely.age(Cell::new(9, 9)), 22);
        lonely.step();
        assert_eq!(lonely.age(Cell::new(9, 9)), 14);
        lonely.step();
        assert_eq!(lonely.age(Cell::new(9, 9)), 6);
        lonely.step();
        assert_eq!(lonely.age(Cell::new(9, 9)), 0);
        assert_eq!(lonely.tracked_count(), 0);
    }

    #[test]
    fn births_born_from_nothing_start_at_gain() {
        let mut engine = engine_with(&[(4, 5), (5, 5), (6, 5)]);
        engine.step();
        assert_eq!(engine.age(Cell::new(5, 4)), 15);
        assert_eq!(engine.age(Cell::new(5, 5)), 16);
        // The blinker's ends are dead now and fade from age 1.
        assert_eq!(engine.age(Cell::new(4, 5)), 0);
    }

    #[test]
    fn edges_are_hard() {
        // A blinker on the top edge cannot grow above row 0.
        let mut engine = engine_with(&[(4, 0), (5, 0), (6, 0)]);
        engine.step();
        assert_eq!(alive(&engine), vec![(5, 0), (5, 1)]);
        for cell in engine.alive_cells() {
            assert!(engine.dimensions().contains(cell));
        }
    }

    #[test]
    fn population_cap_truncates_row_major() {
        let capped = SimulationConfig {
            max_alive: 3,
            ..SimulationConfig::default()
        };
        let mut engine = Engine::with_seed(capped, GridDimensions::new(20, 20), 1);
        // Two blinkers, inserted directly so the cap does not reject them.
        for (x, y) in [(4, 5), (5, 5), (6, 5), (14, 5), (15, 5), (16, 5)] {
            engine.alive.insert(Cell::new(x, y));
            engine.ages.insert(Cell::new(x, y), 1);
        }
        assert_eq!(engine.alive_count(), 6);
        engine.step();
        assert_eq!(engine.alive_count(), 3);
        assert_eq!(alive(&engine), vec![(5, 4), (15, 4), (5, 5)]);
    }

    #[test]
    fn invariants_hold_over_random_run() {
        let capped = SimulationConfig {
            max_alive: 200,
            ..SimulationConfig::default()
        };
        let mut engine = Engine::with_seed(capped, GridDimensions::new(30, 30), 2024);
        assert_eq!(engine.seed(300), 200);
        for _ in 0..50 {
            engine.step();
            assert!(engine.alive_count() <= 200);
            for cell in engine.alive_cells() {
                assert!(engine.dimensions().contains(cell));
                assert!(engine.age(cell) > 0);
            }
            for (_, age) in engine.cell_ages() {
                assert!((1..=80).contains(&age));
            }
        }
    }

    #[test]
    fn empty_step_is_noop() {
        let mut engine = Engine::with_seed(config(), GridDimensions::new(0, 0), 3);
        engine.step();
        assert_eq!(engine.alive_count(), 0);
        assert_eq!(engine.seed(10), 0);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn seed_respects_cap_and_capacity() {
        let mut engine = Engine::with_seed(config(), GridDimensions::new(3, 3), 11);
        assert_eq!(engine.seed(500), 9);
        assert_eq!(engine.alive_count(), 9);
        assert!(engine.cell_ages().all(|(_, age)| age == 1));

        let capped = SimulationConfig {
            max_alive: 5,
            ..SimulationConfig::default()
        };
        let mut engine = Engine::with_seed(capped, GridDimensions::new(30, 30), 11);
        assert_eq!(engine.seed(500), 5);
        assert_eq!(engine.seed(500), 0);
    }

    #[test]
    fn snapshot_packs_current_width() {
        let mut engine = engine_with(&[(1, 0), (0, 1)]);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.cell_ages, vec![(1, 1), (20, 1)]);

        engine.set_dimensions(GridDimensions::new(5, 5));
        engine.spawn(Cell::new(4, 4));
        engine.alive.insert(Cell::new(12, 0));
        engine.ages.insert(Cell::new(12, 0), 40);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.width, 5);
        assert_eq!(snapshot.cell_ages, vec![(1, 1), (5, 1), (24, 1)]);
    }
}
