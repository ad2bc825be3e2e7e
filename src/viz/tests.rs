use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

use super::canvas::PixelCanvas;
use super::color::{Rgb, hsl};
use super::scene::wash;
use super::*;
use crate::audio::AnalyzerFrame;

fn lit(canvas: &PixelCanvas) -> usize {
    canvas.pixels().iter().filter(|p| **p != Rgb::BLACK).count()
}

#[test]
fn hsl_matches_css() {
    assert_eq!(hsl(0.0, 100.0, 50.0), Rgb::new(255, 0, 0));
    assert_eq!(hsl(120.0, 100.0, 50.0), Rgb::new(0, 255, 0));
    assert_eq!(hsl(240.0, 100.0, 50.0), Rgb::new(0, 0, 255));
    assert_eq!(hsl(480.0, 100.0, 50.0), hsl(120.0, 100.0, 50.0));
    assert_eq!(hsl(200.0, 0.0, 40.0), Rgb::new(102, 102, 102));
    assert_eq!(hsl(10.0, 50.0, 130.0), Rgb::new(255, 255, 255));
}

#[test]
fn blending_is_linear() {
    let c = Rgb::BLACK.over(Rgb::new(200, 100, 0), 0.5);
    assert_eq!(c, Rgb::new(100, 50, 0));
    assert_eq!(Rgb::BLACK.over(Rgb::new(9, 9, 9), 0.0), Rgb::BLACK);
}

#[test]
fn canvas_fits_two_pixels_per_cell() {
    let mut canvas = PixelCanvas::default();
    canvas.fit(Rect::new(0, 0, 40, 12));
    assert_eq!((canvas.width(), canvas.height()), (40, 24));
    canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::new(255, 255, 255), 1.0);
    canvas.fit(Rect::new(0, 0, 40, 12));
    assert_eq!(lit(&canvas), 16, "same size keeps the pixels");
    canvas.fit(Rect::new(0, 0, 20, 12));
    assert_eq!(lit(&canvas), 0, "resize clears");
}

#[test]
fn primitives_clip_at_the_edges() {
    let mut canvas = PixelCanvas::new(10, 10);
    let white = Rgb::new(255, 255, 255);
    canvas.fill_rect(-5.0, -5.0, 8.0, 8.0, white, 1.0);
    assert_eq!(lit(&canvas), 9);
    canvas.line((-20.0, 5.0), (40.0, 5.0), 1.0, white, 1.0);
    canvas.circle((5.0, 5.0), 30.0, 2.0, white, 1.0);
    canvas.circle((5.0, 5.0), 0.0, 2.0, white, 1.0);
    assert!(canvas.pixel(9, 5).is_some_and(|p| p == white));
    assert!(canvas.pixel(10, 5).is_none());
}

#[test]
fn blit_writes_half_blocks() {
    let mut canvas = PixelCanvas::new(2, 2);
    canvas.blend(0, 0, Rgb::new(255, 0, 0), 1.0);
    canvas.blend(0, 1, Rgb::new(0, 0, 255), 1.0);
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    canvas.blit(area, &mut buf);

    let cell = &buf[(0, 0)];
    assert_eq!(cell.symbol(), "▀");
    assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
    assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    assert_eq!(buf[(1, 0)].fg, Color::Rgb(0, 0, 0));
}

#[test]
fn idle_scene_draws_rings_without_data() {
    let mut viz = Visualizer::new();
    viz.resize(160, 96);
    viz.render(1_000.0, None);

    let mut washed = PixelCanvas::new(160, 96);
    wash(&mut washed);
    assert_ne!(viz.canvas().pixels(), washed.pixels());
    assert_eq!(lit(viz.canvas()), 160 * 96);
}

#[test]
fn empty_frame_draws_only_the_wash() {
    let mut viz = Visualizer::new();
    viz.resize(64, 32);
    viz.render(5_000.0, Some(&AnalyzerFrame::default()));

    let mut washed = PixelCanvas::new(64, 32);
    wash(&mut washed);
    assert_eq!(viz.canvas().pixels(), washed.pixels());
}

#[test]
fn loud_frame_lights_the_bottom_left_bars() {
    let mut quiet = Visualizer::new();
    quiet.resize(128, 64);
    quiet.render(0.0, Some(&AnalyzerFrame::new(vec![0; 128])));

    let mut loud = Visualizer::new();
    loud.resize(128, 64);
    loud.render(0.0, Some(&AnalyzerFrame::new(vec![255; 128])));

    let q = quiet.canvas().pixel(0, 63).map(Rgb::luma).unwrap_or(0.0);
    let l = loud.canvas().pixel(0, 63).map(Rgb::luma).unwrap_or(0.0);
    assert!(l > q + 50.0, "bar pixel {l} vs wash {q}");
}

#[test]
fn degenerate_sizes_never_panic() {
    let mut viz = Visualizer::new();
    for (w, h) in [(0, 0), (1, 0), (0, 7), (1, 1), (3, 2)] {
        viz.resize(w, h);
        viz.render(12.0, None);
        viz.render(12.0, Some(&AnalyzerFrame::new(vec![200; 4])));
        viz.render(12.0, Some(&AnalyzerFrame::default()));
    }

    let mut buf = Buffer::empty(Rect::new(0, 0, 0, 0));
    viz.paint(Rect::new(0, 0, 0, 0), &mut buf, None, true);
}

#[test]
fn paint_without_analyzer_uses_the_idle_scene() {
    let area = Rect::new(0, 0, 30, 10);
    let mut buf = Buffer::empty(area);
    let mut viz = Visualizer::new();
    viz.paint(area, &mut buf, None, true);
    assert_eq!((viz.canvas().width(), viz.canvas().height()), (30, 20));
    assert_eq!(buf[(15, 5)].symbol(), "▀");
}
