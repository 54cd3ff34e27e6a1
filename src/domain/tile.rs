/// Tile grid: fixed for the lifetime of a level.
///
/// Cells hold the tile letter (`A`..=`Z`) or nothing. The letter only
/// matters to the renderer; any populated cell is solid.

#[derive(Clone, Debug, Default)]
pub struct TileGrid {
    width: usize,
    height: usize,
    /// Indexed `[y][x]`.
    cells: Vec<Vec<Option<char>>>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        TileGrid { width, height, cells: vec![vec![None; width]; height] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn set(&mut self, x: usize, y: usize, tile: char) {
        if x < self.width && y < self.height {
            self.cells[y][x] = Some(tile);
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<char> {
        if x < 0 || y < 0 { return None; }
        self.cells.get(y as usize)?.get(x as usize).copied().flatten()
    }

    /// Blocks motion. Columns left or right of the grid are walls; rows
    /// above or below it are open.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || x as usize >= self.width { return true; }
        self.get(x, y).is_some()
    }
}
