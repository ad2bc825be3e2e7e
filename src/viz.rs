//! Audio-reactive background.

mod canvas;
mod color;
mod scene;

pub use scene::Visualizer;

#[cfg(test)]
mod tests;
