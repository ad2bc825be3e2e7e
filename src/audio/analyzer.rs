//! Frequency analysis of the local audio element.
//!
//! `AnalyzerTap` sits between the decoder and the sink: it yields every sample
//! unchanged and copies a mono mix into a [`SampleRing`]. [`Analyzer`] turns
//! the latest ring contents into byte magnitudes, one per frequency bin, with
//! the usual Blackman window, temporal smoothing and decibel mapping.

use std::f32::consts::PI;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::source::SeekError;
use rodio::{ChannelCount, Sample, SampleRate, Source};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::config::AudioSettings;

/// Mono samples are handed to the ring in chunks of this size.
const FLUSH_LEN: usize = 128;

#[derive(Debug)]
struct RingState {
    samples: Vec<f32>,
    /// Next write position.
    head: usize,
}

/// Fixed-size history of the most recent mono samples.
#[derive(Debug, Clone)]
pub struct SampleRing {
    inner: Arc<Mutex<RingState>>,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RingState {
                samples: vec![0.0; capacity.max(1)],
                head: 0,
            })),
        }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.inner.lock().map(|r| r.samples.len()).unwrap_or(0)
    }

    pub fn extend(&self, chunk: &[f32]) {
        let Ok(mut ring) = self.inner.lock() else {
            return;
        };
        let len = ring.samples.len();
        for &s in chunk {
            let head = ring.head;
            ring.samples[head] = s;
            ring.head = (head + 1) % len;
        }
    }

    /// Copy the ring into `out`, oldest sample first.
    pub fn copy_ordered(&self, out: &mut [f32]) {
        let Ok(ring) = self.inner.lock() else {
            return;
        };
        let (newer, older) = ring.samples.split_at(ring.head);
        for (dst, src) in out.iter_mut().zip(older.iter().chain(newer)) {
            *dst = *src;
        }
    }

    pub fn clear(&self) {
        if let Ok(mut ring) = self.inner.lock() {
            ring.samples.fill(0.0);
            ring.head = 0;
        }
    }
}

/// Pass-through source feeding a [`SampleRing`].
pub struct AnalyzerTap<S> {
    inner: S,
    ring: SampleRing,
    channels: ChannelCount,
    sample_rate: SampleRate,
    frame_sum: f32,
    frame_pos: ChannelCount,
    pending: Vec<f32>,
}

impl<S: Source> AnalyzerTap<S> {
    pub fn new(inner: S, ring: SampleRing) -> Self {
        let channels = inner.channels().max(1);
        let sample_rate = inner.sample_rate();
        Self {
            inner,
            ring,
            channels,
            sample_rate,
            frame_sum: 0.0,
            frame_pos: 0,
            pending: Vec::with_capacity(FLUSH_LEN),
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.ring.extend(&self.pending);
            self.pending.clear();
        }
    }
}

impl<S: Source> Iterator for AnalyzerTap<S> {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(sample) = self.inner.next() else {
            self.flush();
            return None;
        };

        self.frame_sum += sample;
        self.frame_pos += 1;
        if self.frame_pos >= self.channels {
            self.pending.push(self.frame_sum / f32::from(self.channels));
            self.frame_sum = 0.0;
            self.frame_pos = 0;
            if self.pending.len() >= FLUSH_LEN {
                self.flush();
            }
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for AnalyzerTap<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.channels
    }

    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.frame_sum = 0.0;
        self.frame_pos = 0;
        self.pending.clear();
        self.inner.try_seek(pos)
    }
}

/// Magnitudes (0..=255) for one rendered frame, one per frequency bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzerFrame(Vec<u8>);

impl AnalyzerFrame {
    #[cfg(test)]
    pub fn new(bins: Vec<u8>) -> Self {
        Self(bins)
    }

    pub fn bins(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest magnitude, `0` for an empty frame.
    pub fn peak(&self) -> u8 {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

pub struct Analyzer {
    ring: SampleRing,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl Analyzer {
    /// `ring` must hold `settings.fft_size` samples.
    pub fn new(ring: SampleRing, settings: &AudioSettings) -> Self {
        let size = settings.fft_size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);
        Self {
            ring,
            fft,
            window: blackman(size),
            samples: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; size / 2],
            smoothing: settings.smoothing,
            min_db: settings.min_decibels,
            max_db: settings.max_decibels,
        }
    }

    #[cfg(test)]
    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Analyze the most recent `fft_size` samples.
    pub fn snapshot(&mut self) -> AnalyzerFrame {
        self.ring.copy_ordered(&mut self.samples);
        for ((dst, &s), &w) in self.spectrum.iter_mut().zip(&self.samples).zip(&self.window) {
            *dst = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.spectrum);

        let norm = 1.0 / self.samples.len() as f32;
        let range = self.max_db - self.min_db;
        let bins = self
            .smoothed
            .iter_mut()
            .zip(&self.spectrum)
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * norm;
                *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
                let db = if *smoothed > 0.0 {
                    20.0 * smoothed.log10()
                } else {
                    f32::NEG_INFINITY
                };
                let scaled = 255.0 * (db - self.min_db) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect();
        AnalyzerFrame(bins)
    }
}

fn blackman(size: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}
