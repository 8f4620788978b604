/// Placeholder pixel display. CHAR coordinates are 4-bit cell indices, so
/// the framebuffer covers the reachable 16x16 grid of 8x8 glyphs. Nothing
/// here feeds back into VM control flow.
pub const GLYPH_DIM: usize = 8;
pub const GRID_DIM: usize = 16;
pub const WIDTH: usize = GRID_DIM * GLYPH_DIM;
pub const HEIGHT: usize = GRID_DIM * GLYPH_DIM;

const PIXEL_ON: u32 = 0xFFFF_FFFF;

#[derive(Clone)]
pub struct Display {
    fb: Vec<u32>,
}

impl Display {
    pub fn new() -> Self {
        Self { fb: vec![0; WIDTH * HEIGHT] }
    }

    pub fn clear(&mut self) {
        self.fb.fill(0);
    }

    /// Raster an 8x8 glyph from the font table at cell (x, y). Rows scan
    /// left-to-right from the high bit, the way the font data is laid out.
    pub fn draw_glyph(&mut self, font: &[u8], glyph: u8, x: u8, y: u8) {
        let base = (glyph as usize & 0xF) * GLYPH_DIM;
        let sx = (x as usize & 0xF) * GLYPH_DIM;
        let sy = (y as usize & 0xF) * GLYPH_DIM;
        for (row, &bits) in font[base..base + GLYPH_DIM].iter().enumerate() {
            for col in 0..GLYPH_DIM {
                if bits & (0x80 >> col) != 0 {
                    self.fb[(sy + row) * WIDTH + (sx + col)] = PIXEL_ON;
                }
            }
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.fb[y * WIDTH + x]
    }

    pub fn framebuffer(&self) -> &[u32] {
        &self.fb
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
