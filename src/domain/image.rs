/// RGBA images used as animation frames and collision masks.
///
/// Decoding real image formats is out of scope; images come from the asset
/// manifest as solid rectangles or character masks.

/// Alpha at or above this counts as opaque for pixel collision.
pub const ALPHA_LEVEL: u8 = 20;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Image {
    width: u32,
    height: u32,
    /// Row-major RGBA.
    pixels: Vec<[u8; 4]>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Image { width, height, pixels }
    }

    /// Fully opaque rectangle of one colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let px = [rgb[0], rgb[1], rgb[2], 255];
        Image::new(width, height, vec![px; (width * height) as usize])
    }

    /// Build from text rows: space or '.' is transparent, '+' is half
    /// transparent (below the collision threshold), anything else opaque.
    /// Every mask cell becomes a `scale` x `scale` block.
    pub fn from_mask(rows: &[String], scale: u32, rgb: [u8; 3]) -> Self {
        let scale = scale.max(1);
        let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let width = cols * scale;
        let height = rows.len() as u32 * scale;
        let mut pixels = vec![[0, 0, 0, 0]; (width * height) as usize];
        for (my, row) in rows.iter().enumerate() {
            for (mx, ch) in row.chars().enumerate() {
                let alpha = match ch {
                    ' ' | '.' => 0,
                    '+' => ALPHA_LEVEL / 2,
                    _ => 255,
                };
                if alpha == 0 { continue; }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = mx as u32 * scale + dx;
                        let y = my as u32 * scale + dy;
                        pixels[(y * width + x) as usize] = [rgb[0], rgb[1], rgb[2], alpha];
                    }
                }
            }
        }
        Image::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y)[3]
    }

    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        self.alpha(x, y) >= ALPHA_LEVEL
    }

    /// Horizontal mirror.
    pub fn mirrored(&self) -> Image {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for y in 0..self.height {
            for x in (0..self.width).rev() {
                pixels.push(self.pixel(x, y));
            }
        }
        Image::new(self.width, self.height, pixels)
    }

    /// Vertical flip.
    pub fn flipped(&self) -> Image {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                pixels.push(self.pixel(x, y));
            }
        }
        Image::new(self.width, self.height, pixels)
    }

    /// Split a sheet into `rows * cols` equal cells, row-major.
    /// Returns `None` when the sheet does not divide evenly.
    pub fn slice(&self, rows: u32, cols: u32) -> Option<Vec<Image>> {
        if rows == 0 || cols == 0 || self.width % cols != 0 || self.height % rows != 0 {
            return None;
        }
        let cw = self.width / cols;
        let ch = self.height / rows;
        let mut cells = Vec::with_capacity((rows * cols) as usize);
        for r in 0..rows {
            for c in 0..cols {
                let mut pixels = Vec::with_capacity((cw * ch) as usize);
                for y in 0..ch {
                    for x in 0..cw {
                        pixels.push(self.pixel(c * cw + x, r * ch + y));
                    }
                }
                cells.push(Image::new(cw, ch, pixels));
            }
        }
        Some(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> Image {
        let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        Image::from_mask(&rows, 1, [255, 255, 255])
    }

    #[test]
    fn mask_alpha_levels() {
        let img = mask(&["#+."]);
        assert!(img.is_opaque(0, 0));
        assert!(!img.is_opaque(1, 0));
        assert!(img.alpha(1, 0) > 0);
        assert_eq!(img.alpha(2, 0), 0);
    }

    #[test]
    fn mask_scale_expands_cells() {
        let rows = vec!["#.".to_string()];
        let img = Image::from_mask(&rows, 3, [0, 0, 0]);
        assert_eq!((img.width(), img.height()), (6, 3));
        assert!(img.is_opaque(2, 2));
        assert!(!img.is_opaque(3, 0));
    }

    #[test]
    fn mirror_and_flip() {
        let img = mask(&["#.", ".."]);
        assert!(img.mirrored().is_opaque(1, 0));
        assert!(img.flipped().is_opaque(0, 1));
        assert!(!img.flipped().is_opaque(0, 0));
    }

    #[test]
    fn slice_row_major() {
        let img = mask(&["#...", "..#."]);
        let cells = img.slice(2, 2).unwrap();
        assert_eq!(cells.len(), 4);
        assert!(cells[0].is_opaque(0, 0));
        assert!(!cells[1].is_opaque(0, 0));
        assert!(cells[3].is_opaque(0, 0));
        assert_eq!(cells[0].width(), 2);
    }

    #[test]
    fn slice_rejects_uneven_division() {
        let img = Image::solid(5, 4, [1, 2, 3]);
        assert!(img.slice(1, 2).is_none());
        assert!(img.slice(0, 1).is_none());
    }
}
