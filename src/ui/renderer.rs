/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The world is in pixels. Each terminal cell samples one block of
/// `tile_size / 4` by `tile_size / 2` pixels, so a tile is 4 columns by 2
/// rows; sprites are drawn by sampling their current frame image at the
/// centre of every block they cover.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::collision::{pixels_to_tiles, round_px};
use crate::domain::sprite::Sprite;
use crate::sim::assets::Resources;
use crate::sim::game::GameState;
use crate::sim::world::GameMap;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the gap
    /// between rows matches the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, gap + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const TILE_FALLBACK: Color = Color::Rgb { r: 120, g: 110, b: 100 };

/// World pixels covered by one terminal cell.
fn cell_pixels(tile_size: u32) -> (i32, i32) {
    let ts = tile_size as i32;
    ((ts / 4).max(1), (ts / 2).max(1))
}

fn rgb(p: [u8; 4]) -> Color {
    Color::Rgb { r: p[0], g: p[1], b: p[2] }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_state: Option<GameState>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_state: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Draw one frame. While running, the camera is sized to the terminal
    /// and creatures inside the visible span are woken up.
    pub fn render(&mut self, state: GameState, map: Option<&mut GameMap>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_state != Some(state) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_state = Some(state);
        }

        self.front.clear();
        match (state, map) {
            (GameState::Running, Some(map)) => {
                self.size_camera(map);
                let (left, right) = map.camera.span_x();
                map.wake_up_visible(left, right);
                self.compose_game(map);
            }
            (GameState::Finished, Some(map)) => self.compose_finished(map),
            _ => self.compose_loading(),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn size_camera(&self, map: &mut GameMap) {
        let (pw, ph) = cell_pixels(map.tile_size);
        let rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        map.camera.view_w = self.term_w as i32 * pw;
        map.camera.view_h = rows as i32 * ph;
        map.follow_player();
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG and show line artifacts.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, map: &GameMap) {
        let hud = format!(
            " Level {}  Lives {}  Medallions {}  Ammo {}  Fuel {:>3}%{} ",
            map.level + 1,
            map.lives,
            map.medallions,
            map.ammo,
            (map.player.fuel / map.player.max_fuel.max(1.0) * 100.0).round() as u32,
            if map.player.jetpack_on { "  JET" } else { "" },
        );
        let hud = match &map.music {
            Some(track) => format!("{hud} [{track}] "),
            None => hud,
        };
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let (pw, ph) = cell_pixels(map.tile_size);
        let rows = self.term_h.saturating_sub(RESERVED_ROWS);
        let resources = map.resources();

        // ── Tiles ──
        for row in 0..rows {
            let wy = map.camera.y + row as i32 * ph + ph / 2;
            for col in 0..self.term_w {
                let wx = map.camera.x + col as i32 * pw + pw / 2;
                if let Some(cell) = tile_cell(map, resources, wx, wy) {
                    self.front.set(col, MAP_ROW + row, cell);
                }
            }
        }

        // ── Sprites, player on top ──
        for e in &map.entities {
            self.compose_sprite(map, &e.sprite, rows);
        }
        self.compose_sprite(map, &map.player.sprite, rows);

        let help_row = MAP_ROW + rows + 1;
        if help_row < self.front.height {
            let help = " Arrows/AD:Move  Up/W:Jump  Shift/J:Jetpack  Space:Shoot  R:Restart  Esc:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_sprite(&mut self, map: &GameMap, sprite: &Sprite, rows: usize) {
        let (pw, ph) = cell_pixels(map.tile_size);
        let cam = &map.camera;
        let img = sprite.image();
        let (sx, sy) = (round_px(sprite.pos.x), round_px(sprite.pos.y));
        let (w, h) = (img.width() as i32, img.height() as i32);

        // Cells whose sample point falls inside the sprite.
        let first_col = (sx - cam.x - pw / 2).div_euclid(pw).max(0);
        let last_col = (sx + w - cam.x - pw / 2).div_euclid(pw);
        let first_row = (sy - cam.y - ph / 2).div_euclid(ph).max(0);
        let last_row = (sy + h - cam.y - ph / 2).div_euclid(ph);

        for row in first_row..=last_row {
            if row as usize >= rows { break; }
            let wy = cam.y + row * ph + ph / 2;
            for col in first_col..=last_col {
                if col as usize >= self.term_w { break; }
                let wx = cam.x + col * pw + pw / 2;
                let (ix, iy) = (wx - sx, wy - sy);
                if ix < 0 || iy < 0 || ix >= w || iy >= h { continue; }
                if !img.is_opaque(ix as u32, iy as u32) { continue; }
                let color = rgb(img.pixel(ix as u32, iy as u32));
                self.front.set(col as usize, MAP_ROW + row as usize, Cell::new(' ', Color::White, color));
            }
        }
    }

    fn compose_loading(&mut self) {
        self.front.put_str(4, 3, "Loading assets...", Color::White, Color::Reset);
    }

    fn compose_finished(&mut self, map: &GameMap) {
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        let green = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(6, 4, "+-----------------------------+", gold, Color::Reset);
        self.front.put_str(6, 5, "|          YOU  WIN!          |", gold, Color::Reset);
        self.front.put_str(6, 6, "+-----------------------------+", gold, Color::Reset);
        let lives = format!("Lives left: {}", map.lives);
        self.front.put_str(8, 8, &lives, Color::White, Color::Reset);
        self.front.put_str(8, 10, "R: play again", green, Color::Reset);
        self.front.put_str(8, 11, "Esc: quit", Color::DarkGrey, Color::Reset);
    }
}

/// The tile under world pixel `(wx, wy)`, if any.
fn tile_cell(map: &GameMap, resources: &Resources, wx: i32, wy: i32) -> Option<Cell> {
    let tx = pixels_to_tiles(wx as f32, map.tile_size);
    let ty = pixels_to_tiles(wy as f32, map.tile_size);
    let tile = map.tiles.get(tx, ty)?;
    let color = match resources.tile_image(tile) {
        Some(img) => {
            let ts = map.tile_size as i32;
            let ix = (wx - tx * ts).clamp(0, img.width() as i32 - 1) as u32;
            let iy = (wy - ty * ts).clamp(0, img.height() as i32 - 1) as u32;
            rgb(img.pixel(ix, iy))
        }
        None => TILE_FALLBACK,
    };
    Some(Cell::new(' ', Color::White, color))
}
