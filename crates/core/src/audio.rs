//! Uploaded audio clips and duration probing.
//!
//! Only MP3 and WAV uploads are accepted. Probing uses symphonia's format
//! readers and never decodes samples, so it is cheap enough to run once per
//! job, but it is still blocking I/O over the whole buffer and callers on an
//! async runtime should move it to `spawn_blocking`.

use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Container formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// Detect the format from an uploaded file name's extension
    /// (case-insensitive). Returns `None` for anything but `.mp3` / `.wav`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        Self::parse(ext)
    }

    /// Parse a bare extension such as `"wav"`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }
}

/// Errors raised while probing an audio buffer.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("unsupported or corrupt audio: {0}")]
    Unsupported(String),

    #[error("no audio track found")]
    NoTrack,

    #[error("audio track has no sample rate")]
    MissingSampleRate,

    #[error("failed to read audio packets: {0}")]
    Read(String),
}

/// An uploaded audio file held in memory.
///
/// The buffer is reference-counted so a clip can be handed to a blocking
/// decode task and to the inference client without copying.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Arc<[u8]>,
    pub format: Option<AudioFormat>,
}

impl AudioClip {
    pub fn new(data: impl Into<Arc<[u8]>>, format: Option<AudioFormat>) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File name sent alongside the bytes to the inference server.
    pub fn upload_name(&self) -> String {
        match self.format {
            Some(format) => format!("audio.{}", format.extension()),
            None => "audio".to_string(),
        }
    }

    /// Duration of the default audio track in seconds.
    ///
    /// Uses the container's frame count when present (WAV, MP3 with a
    /// Xing/Info header) and otherwise sums packet durations.
    pub fn duration_secs(&self) -> Result<f64, AudioError> {
        let source = Cursor::new(Arc::clone(&self.data));
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        if let Some(format) = self.format {
            hint.with_extension(format.extension());
        }

        let detected = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::Unsupported(e.to_string()))?;
        let mut reader = detected.format;

        let (track_id, sample_rate, n_frames) = {
            let track = reader
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or(AudioError::NoTrack)?;
            let sample_rate = track
                .codec_params
                .sample_rate
                .ok_or(AudioError::MissingSampleRate)?;
            (track.id, sample_rate, track.codec_params.n_frames)
        };

        if let Some(frames) = n_frames {
            return Ok(frames as f64 / f64::from(sample_rate));
        }

        let mut frames: u64 = 0;
        loop {
            match reader.next_packet() {
                Ok(packet) => {
                    if packet.track_id() == track_id {
                        frames += packet.dur;
                    }
                }
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(AudioError::Read(e.to_string())),
            }
        }

        Ok(frames as f64 / f64::from(sample_rate))
    }
}

/// Encode `frames` samples of silence as a 16-bit mono PCM WAV file.
#[cfg(any(test, feature = "test-util"))]
pub fn silent_wav(sample_rate: u32, frames: u32) -> Vec<u8> {
    const BITS_PER_SAMPLE: u16 = 16;
    const CHANNELS: u16 = 1;

    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = frames * u32::from(block_align);

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}
