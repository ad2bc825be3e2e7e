//! Builds `rodio` sinks from [`Media`].
//!
//! Every decoded source is wrapped in an [`AnalyzerTap`] so the analyzer sees
//! exactly what is played.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::analyzer::{AnalyzerTap, SampleRing};
use super::types::{AudioError, Media};

pub(super) struct LoadedSink {
    pub sink: Sink,
    pub duration: Option<Duration>,
}

/// Create a paused `Sink` playing `media`.
pub(super) fn create_sink(
    stream: &OutputStream,
    media: Media,
    ring: &SampleRing,
    volume: f32,
) -> Result<LoadedSink, AudioError> {
    match media {
        Media::File(path) => {
            let file = File::open(&path).map_err(|source| AudioError::Open {
                path: path.clone(),
                source,
            })?;
            connect(stream, BufReader::new(file), ring, volume)
        }
        Media::Bytes(bytes) => connect(stream, Cursor::new(bytes), ring, volume),
    }
}

fn connect<R>(
    stream: &OutputStream,
    reader: R,
    ring: &SampleRing,
    volume: f32,
) -> Result<LoadedSink, AudioError>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let source = Decoder::new(reader)?;
    let duration = source.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.set_volume(volume);
    sink.append(AnalyzerTap::new(source, ring.clone()));
    Ok(LoadedSink { sink, duration })
}
