//! An RGB pixel surface drawn into the terminal with half-block cells.
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the `▀` foreground, the lower one as the background. Pixels persist between
//! frames, so translucent fills leave trails the way a canvas does.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

use super::color::Rgb;

const UPPER_HALF: &str = "▀";

#[derive(Debug, Clone, Default)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width * height],
        }
    }

    /// Reallocate (and clear) when the dimensions change.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    /// Canvas sized for a terminal area: one column per cell, two rows per cell.
    pub fn fit(&mut self, area: Rect) {
        self.resize(usize::from(area.width), usize::from(area.height) * 2);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.pixels[idx] = self.pixels[idx].over(color, alpha);
    }

    /// Blend a diagonal gradient from the top-left to the bottom-right corner.
    pub fn wash(&mut self, stops: &[(f32, Rgb)], alpha: f32) {
        let (w, h) = (self.width as f32, self.height as f32);
        let norm = w * w + h * h;
        if norm == 0.0 || stops.is_empty() {
            return;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let t = ((x as f32 + 0.5) * w + (y as f32 + 0.5) * h) / norm;
                let color = gradient_at(stops, t);
                let idx = y * self.width + x;
                self.pixels[idx] = self.pixels[idx].over(color, alpha);
            }
        }
    }

    /// Fill the pixels whose centres fall inside the rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, alpha: f32) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let x0 = (x - 0.5).ceil().max(0.0) as i64;
        let y0 = (y - 0.5).ceil().max(0.0) as i64;
        let x1 = ((x + w - 0.5).ceil() as i64).min(self.width as i64);
        let y1 = ((y + h - 0.5).ceil() as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, alpha);
            }
        }
    }

    /// A straight stroke `thickness` pixels wide.
    pub fn line(
        &mut self,
        (x0, y0): (f32, f32),
        (x1, y1): (f32, f32),
        thickness: f32,
        color: Rgb,
        alpha: f32,
    ) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        let half = (thickness.max(1.0) - 1.0) / 2.0;
        let reach = half.ceil() as i64;
        let mut last = None;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let cx = (x0 + (x1 - x0) * t).floor() as i64;
            let cy = (y0 + (y1 - y0) * t).floor() as i64;
            if last == Some((cx, cy)) {
                continue;
            }
            last = Some((cx, cy));
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    self.blend(cx + dx, cy + dy, color, alpha);
                }
            }
        }
    }

    /// A ring of radius `r` around `(cx, cy)`.
    pub fn circle(&mut self, (cx, cy): (f32, f32), r: f32, thickness: f32, color: Rgb, alpha: f32) {
        if r <= 0.0 {
            return;
        }
        let half = thickness.max(1.0) / 2.0;
        let outer = r + half;
        let x0 = (cx - outer).floor().max(0.0) as i64;
        let y0 = (cy - outer).floor().max(0.0) as i64;
        let x1 = ((cx + outer).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((cy + outer).ceil() as i64).min(self.height as i64 - 1);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if ((dx * dx + dy * dy).sqrt() - r).abs() <= half {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    /// Copy the canvas into `buf`, clipped to both `area` and the buffer.
    pub fn blit(&self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        for row in 0..area.height {
            for col in 0..area.width {
                let x = usize::from(col);
                let y = usize::from(row) * 2;
                let (Some(top), Some(bottom)) = (self.pixel(x, y), self.pixel(x, y + 1)) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(UPPER_HALF)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }
    }
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn gradient_at(stops: &[(f32, Rgb)], t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mut prev = stops[0];
    if t <= prev.0 {
        return prev.1;
    }
    for &stop in &stops[1..] {
        if t <= stop.0 {
            let span = stop.0 - prev.0;
            let local = if span > 0.0 { (t - prev.0) / span } else { 1.0 };
            return prev.1.lerp(stop.1, local);
        }
        prev = stop;
    }
    prev.1
}
