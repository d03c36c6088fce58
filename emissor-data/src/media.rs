//! Media collaborators
//!
//! A [`MediaSource`] turns a source locator into audio samples or image
//! bytes. [`materialize_files`] copies the media referenced by a finalized
//! signal into the scenario folder and returns the stored relative paths.

use emissor_common::{Modality, Segment, Signal};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Locator scheme of media kept in the shared backend storage
pub const STORAGE_SCHEME: &str = "cltl-storage:";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Wrong sample depth: {0} bits")]
    UnsupportedSampleDepth(u16),

    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Invalid segment for {0}")]
    InvalidSegment(String),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// Interleaved 16-bit PCM samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub rate: u32,
}

impl AudioClip {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// Encoded PNG image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub png: Vec<u8>,
}

/// Source of signal media
///
/// Each call acquires and releases its underlying resource.
pub trait MediaSource: Send + Sync {
    /// Load `length` frames starting at frame `offset`; a negative length
    /// reads to the end
    fn load_audio(&self, locator: &str, offset: i64, length: i64) -> MediaResult<AudioClip>;

    fn load_image(&self, locator: &str) -> MediaResult<ImageFrame>;
}

/// Relative storage path of `locator` with extension `ext`
///
/// Strips the storage scheme and rejects paths escaping the scenario folder.
pub fn relative_path(locator: &str, ext: &str) -> MediaResult<String> {
    let path = locator.strip_prefix(STORAGE_SCHEME).unwrap_or(locator);
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(MediaError::InvalidLocator(locator.to_string()));
    }

    Ok(format!("{}.{}", path, ext))
}

/// Media source reading WAV and PNG files below a local root folder
#[derive(Debug, Clone)]
pub struct LocalMediaSource {
    root: PathBuf,
}

impl LocalMediaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, locator: &str, ext: &str) -> MediaResult<PathBuf> {
        let path = self.root.join(relative_path(locator, ext)?);
        if !path.is_file() {
            return Err(MediaError::NotFound(path.display().to_string()));
        }
        Ok(path)
    }
}

impl MediaSource for LocalMediaSource {
    fn load_audio(&self, locator: &str, offset: i64, length: i64) -> MediaResult<AudioClip> {
        let path = self.resolve(locator, "wav")?;
        let mut reader = hound::WavReader::open(&path)?;
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(MediaError::UnsupportedSampleDepth(spec.bits_per_sample));
        }

        let channels = spec.channels as usize;
        let to_samples = |frames: i64| {
            usize::try_from(frames)
                .ok()
                .and_then(|frames| frames.checked_mul(channels))
                .ok_or_else(|| MediaError::InvalidSegment(locator.to_string()))
        };
        let skip = to_samples(offset.max(0))?;
        let take = if length < 0 { usize::MAX } else { to_samples(length)? };

        let samples = reader
            .samples::<i16>()
            .skip(skip)
            .take(take)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Loaded {} samples at {}Hz from {}",
            samples.len(),
            spec.sample_rate,
            path.display()
        );

        Ok(AudioClip {
            samples,
            channels: spec.channels,
            rate: spec.sample_rate,
        })
    }

    fn load_image(&self, locator: &str) -> MediaResult<ImageFrame> {
        let path = self.resolve(locator, "png")?;
        Ok(ImageFrame {
            png: fs::read(path)?,
        })
    }
}

/// Store copies of the media of `signal` below `scenario_dir`
///
/// Returns the relative paths of the files stored. A file that cannot be
/// fetched or written is logged and left out.
pub fn materialize_files(media: &dyn MediaSource, signal: &Signal, scenario_dir: &Path) -> Vec<String> {
    let ext = match signal.modality {
        Modality::Audio => "wav",
        Modality::Image => "png",
        Modality::Text | Modality::Video => return Vec::new(),
    };

    let mut stored = Vec::with_capacity(signal.files.len());
    for locator in &signal.files {
        let result = relative_path(locator, ext).and_then(|relative| {
            let destination = scenario_dir.join(&relative);
            store_file(media, signal, locator, &destination)?;
            info!("Copy signal data from {} to {}", locator, destination.display());
            Ok(relative)
        });

        match result {
            Ok(relative) => stored.push(relative),
            Err(e) => error!("Failed to store {} for signal {}: {}", locator, signal.id, e),
        }
    }

    stored
}

fn store_file(media: &dyn MediaSource, signal: &Signal, locator: &str, destination: &Path) -> MediaResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    match signal.modality {
        Modality::Audio => {
            let (offset, length) = audio_window(&signal.ruler)
                .ok_or_else(|| MediaError::InvalidSegment(signal.id.clone()))?;
            let clip = media.load_audio(locator, offset, length)?;
            write_wav(destination, &clip)
        }
        Modality::Image => {
            let frame = media.load_image(locator)?;
            fs::write(destination, frame.png)?;
            Ok(())
        }
        Modality::Text | Modality::Video => Ok(()),
    }
}

/// Frame offset and length covered by an audio ruler
///
/// `None` when the ruler has no span or its length does not fit an `i64`.
fn audio_window(ruler: &Segment) -> Option<(i64, i64)> {
    let (start, end) = ruler.span()?;
    let length = if end < 0 { -1 } else { end.checked_sub(start)? };
    Some((start, length))
}

fn write_wav(destination: &Path, clip: &AudioClip) -> MediaResult<()> {
    let spec = hound::WavSpec {
        channels: clip.channels,
        sample_rate: clip.rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(destination, spec)?;
    for sample in &clip.samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}
