use std::f32::consts::TAU;
use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use crate::audio::{Analyzer, AnalyzerFrame};

use super::canvas::PixelCanvas;
use super::color::{Rgb, hsl};

/// Purple, blue, indigo.
const WASH: [(f32, Rgb); 3] = [
    (0.0, Rgb::new(147, 51, 234)),
    (0.5, Rgb::new(59, 130, 246)),
    (1.0, Rgb::new(99, 102, 241)),
];
const WASH_ALPHA: f32 = 0.1;

/// Virtual viewport height the scene geometry is laid out for.
const REFERENCE_HEIGHT: f32 = 720.0;

const RINGS: usize = 5;
const WAVES: usize = 3;

/// Canvas renderer behind the whole screen.
///
/// Paints the spectrum scene while a local analyzer is available and audio is
/// playing, and the idle rings otherwise.
pub struct Visualizer {
    canvas: PixelCanvas,
    epoch: Instant,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            canvas: PixelCanvas::default(),
            epoch: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    /// Render one frame into `area`.
    pub fn paint(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        analyzer: Option<&mut Analyzer>,
        playing: bool,
    ) {
        self.canvas.fit(area);
        let frame = analyzer.filter(|_| playing).map(|a| a.snapshot());
        let now_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.render(now_ms, frame.as_ref());
        self.canvas.blit(area, buf);
    }

    /// Draw onto the canvas at a given clock, without touching the terminal.
    pub fn render(&mut self, now_ms: f64, frame: Option<&AnalyzerFrame>) {
        wash(&mut self.canvas);
        match frame {
            Some(frame) if !frame.is_empty() => {
                bars(&mut self.canvas, frame);
                spokes(&mut self.canvas, frame, now_ms);
                waves(&mut self.canvas, frame, now_ms);
            }
            Some(_) => {}
            None => idle(&mut self.canvas, now_ms),
        }
    }

    #[cfg(test)]
    pub fn resize(&mut self, width: usize, height: usize) {
        self.canvas.resize(width, height);
    }
}

pub(super) fn wash(canvas: &mut PixelCanvas) {
    canvas.wash(&WASH, WASH_ALPHA);
}

fn scale(canvas: &PixelCanvas) -> f32 {
    canvas.width().min(canvas.height()) as f32 / REFERENCE_HEIGHT
}

fn level(magnitude: u8) -> f32 {
    f32::from(magnitude) / 255.0
}

fn bars(canvas: &mut PixelCanvas, frame: &AnalyzerFrame) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let count = frame.len() as f32;
    let bar_width = w / count * 2.5;
    let mut x = 0.0;
    for (i, &magnitude) in frame.bins().iter().enumerate() {
        if x >= w {
            break;
        }
        let m = level(magnitude);
        let bar_height = m * h * 0.8;
        if bar_height > 0.0 {
            let hue = i as f32 / count * 360.0;
            let saturation = 70.0 + m * 30.0;
            let lightness = 50.0 + m * 30.0;
            let glow = hsl(hue, saturation, lightness);
            let top = h - bar_height;

            let halo = bar_width * 0.5;
            canvas.fill_rect(
                x - halo,
                top - halo,
                bar_width + 2.0 * halo,
                bar_height + halo,
                glow,
                0.15,
            );
            canvas.fill_rect(x, top, bar_width, bar_height, glow, 0.6);
            canvas.fill_rect(
                x + bar_width * 0.25,
                top,
                bar_width * 0.5,
                bar_height,
                hsl(hue, saturation, lightness + 20.0),
                0.8,
            );
        }
        x += bar_width + 1.0;
    }
}

fn spokes(canvas: &mut PixelCanvas, frame: &AnalyzerFrame, now_ms: f64) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let center = (w / 2.0, h / 2.0);
    let radius = w.min(h) * 0.15;
    let thickness = (3.0 * scale(canvas)).max(1.0);
    let drift = (now_ms * 0.1 % 360.0) as f32;
    let count = frame.len() as f32;

    for (i, &magnitude) in frame.bins().iter().enumerate().step_by(4) {
        let angle = i as f32 / count * TAU;
        let amplitude = level(magnitude) * radius * 0.5;
        let (sin, cos) = angle.sin_cos();
        let start = (center.0 + cos * radius, center.1 + sin * radius);
        let end = (
            center.0 + cos * (radius + amplitude),
            center.1 + sin * (radius + amplitude),
        );
        let hue = i as f32 / count * 360.0 + drift;
        canvas.line(start, end, thickness, hsl(hue, 70.0, 60.0), 0.8);
    }
}

fn waves(canvas: &mut PixelCanvas, frame: &AnalyzerFrame, now_ms: f64) {
    let (w, h) = (canvas.width(), canvas.height() as f32);
    let s = scale(canvas);
    if w == 0 || s <= 0.0 {
        return;
    }
    let center_y = h / 2.0;
    let time = (now_ms * 0.005) as f32;
    let amplitude = level(frame.peak()) * 50.0 * s;

    for wave in 0..WAVES {
        let k = wave as f32;
        let color = hsl((k * 120.0 + time * 50.0) % 360.0, 60.0, 50.0);
        let alpha = 0.3 - k * 0.1;
        let thickness = ((2.0 + k) * s).max(1.0);
        let y_at = |x: f32| {
            let vx = x / s;
            center_y
                + (vx * 0.01 + time + k * 2.0).sin() * amplitude * (1.0 + k * 0.5)
                + (vx * 0.005 + time * 2.0 + k).sin() * amplitude * 0.5
        };

        let mut prev = (0.0, y_at(0.0));
        for x in 1..=w {
            let point = (x as f32, y_at(x as f32));
            canvas.line(prev, point, thickness, color, alpha);
            prev = point;
        }
    }
}

fn idle(canvas: &mut PixelCanvas, now_ms: f64) {
    let center = (canvas.width() as f32 / 2.0, canvas.height() as f32 / 2.0);
    let s = scale(canvas);
    let time = (now_ms * 0.001) as f32;
    let thickness = (2.0 * s).max(1.0);

    for ring in 0..RINGS {
        let k = ring as f32;
        let radius = (50.0 + k * 30.0 + (time + k).sin() * 10.0) * s;
        let hue = (k * 60.0 + time * 30.0) % 360.0;
        let alpha = 0.2 - k * 0.03;
        canvas.circle(center, radius, thickness, hsl(hue, 40.0, 40.0), alpha);
    }
}
