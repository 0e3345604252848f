// grid.rs - Grid coordinates, dimensions and the packed cell key codec

/// Packed cell identifier, `x + y * width`. Only meaningful for the width it was built with.
pub type CellKey = i64;

/// A grid cell by coordinate. Ordering is row-major (y first, then x), which
/// matches ascending `CellKey` order for in-bounds cells of any fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub y: i32,
    pub x: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    /// Saturates at the edges of the coordinate space, which is always off-grid.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// The cell itself followed by its 8 Moore neighbours.
    pub fn neighbourhood(self) -> impl Iterator<Item = Cell> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| self.offset(dx, dy)))
    }
}

/// Narrow a wide coordinate into the `Cell` range.
pub(crate) fn clamp_coord(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

pub fn encode(x: i32, y: i32, width: u32) -> CellKey {
    x as CellKey + y as CellKey * width as CellKey
}

/// Inverse of [`encode`] for in-range coordinates. A zero width has no valid keys
/// and decodes everything to the origin.
pub fn decode(key: CellKey, width: u32) -> (i32, i32) {
    if width == 0 {
        return (0, 0);
    }
    let w = width as CellKey;
    (key.rem_euclid(w) as i32, key.div_euclid(w) as i32)
}

/// Grid size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDimensions {
    pub width: u32,
    pub height: u32,
}

impl GridDimensions {
    /// Negative sizes clamp to zero.
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width: width.clamp(0, u32::MAX as i64) as u32,
            height: height.clamp(0, u32::MAX as i64) as u32,
        }
    }

    /// Grid covering a viewport of `px_width × px_height` pixels, oversized by `scale_factor`.
    pub fn from_viewport(px_width: f64, px_height: f64, cell_size: f64, scale_factor: f64) -> Self {
        if cell_size <= 0.0 {
            return Self::default();
        }
        let cells = |px: f64| ((px.max(0.0) * scale_factor) / cell_size).floor() as i64;
        Self::new(cells(px_width), cells(px_height))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as i64) < self.width as i64 && (cell.y as i64) < self.height as i64
    }

    pub fn capacity(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> Cell {
        Cell::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn key_of(&self, cell: Cell) -> CellKey {
        encode(cell.x, cell.y, self.width)
    }

    pub fn cell_of(&self, key: CellKey) -> Cell {
        let (x, y) = decode(key, self.width);
        Cell::new(x, y)
    }
}
