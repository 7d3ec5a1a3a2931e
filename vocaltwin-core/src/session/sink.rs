use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::sync::Arc;

use hound::{WavSpec, WavWriter};
use parking_lot::Mutex;

use crate::models::audio::{AudioEncoding, EncodedAudio, SampleSpec};
use crate::models::error::SessionError;
use crate::processing::resample::sample_to_i16;

/// Whether an encoder for `encoding` is compiled into this build.
///
/// Only the PCM WAV encoder (hound) ships today; the Opus and FLAC slots keep
/// the preference order aligned with the product's upload policy and light up
/// when an encoder is added.
pub fn is_encoding_supported(encoding: AudioEncoding) -> bool {
    matches!(encoding, AudioEncoding::Wav)
}

/// Walk the preference list and commit to the first supported encoding.
///
/// Support is probed, never assumed. When nothing in the list probes as
/// supported, fall back to WAV (the most widely supported default) rather
/// than failing the whole session.
pub fn select_encoding(preferences: &[AudioEncoding]) -> AudioEncoding {
    for &encoding in preferences {
        if is_encoding_supported(encoding) {
            return encoding;
        }
        log::debug!("encoding {:?} not supported by this runtime", encoding);
    }
    log::warn!("no preferred encoding supported, falling back to WAV");
    AudioEncoding::Wav
}

/// Growable in-memory target for the encoder, shared so the finalized bytes
/// can be retrieved after hound consumes the writer half.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Cursor<Vec<u8>>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock()).into_inner()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

impl Seek for SharedBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.lock().seek(pos)
    }
}

struct ActiveEncoder {
    writer: WavWriter<SharedBuffer>,
    buffer: SharedBuffer,
    encoding: AudioEncoding,
}

/// Durably encodes the live stream into one binary object for upload.
///
/// Consumes the capture stream alongside the live analyzer; it never owns the
/// stream and never closes it.
pub struct RecordingSink {
    preferences: Vec<AudioEncoding>,
    active: Option<ActiveEncoder>,
}

impl RecordingSink {
    pub fn new(preferences: Vec<AudioEncoding>) -> Self {
        Self {
            preferences,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// The encoding committed to at `start`, while recording.
    pub fn encoding(&self) -> Option<AudioEncoding> {
        self.active.as_ref().map(|a| a.encoding)
    }

    /// Pick the best-supported encoding and begin buffering encoded samples.
    pub fn start(&mut self, spec: SampleSpec) -> Result<(), SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyCapturing);
        }

        let encoding = select_encoding(&self.preferences);
        let writer_spec = WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let buffer = SharedBuffer::default();
        let writer = WavWriter::new(buffer.clone(), writer_spec)
            .map_err(|e| SessionError::EncodingFailed(e.to_string()))?;

        log::info!(
            "recording sink started: {:?}, {} Hz, {} ch",
            encoding,
            spec.sample_rate,
            spec.channels
        );
        self.active = Some(ActiveEncoder {
            writer,
            buffer,
            encoding,
        });
        Ok(())
    }

    /// Buffer a block of f32 samples.
    ///
    /// Samples arriving when no encoder is active (e.g. one capture callback
    /// racing the stop) are dropped silently.
    pub fn append(&mut self, samples: &[f32]) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        for &sample in samples {
            if let Err(e) = active.writer.write_sample(sample_to_i16(sample)) {
                log::error!("failed to buffer sample: {}", e);
                break;
            }
        }
    }

    /// Finalize the recording into one encoded buffer.
    ///
    /// Returns only after the encoder confirms the flush. The internal buffer
    /// is released; the returned `EncodedAudio` is the sole remaining copy.
    /// Fails with `NotRecording` when called before `start`.
    pub fn stop(&mut self) -> Result<EncodedAudio, SessionError> {
        let active = self.active.take().ok_or(SessionError::NotRecording)?;

        active
            .writer
            .finalize()
            .map_err(|e| SessionError::EncodingFailed(e.to_string()))?;

        let data = active.buffer.take();
        log::info!(
            "recording finalized: {:.2} KiB as {:?}",
            data.len() as f64 / 1024.0,
            active.encoding
        );
        Ok(EncodedAudio {
            data,
            encoding: active.encoding,
        })
    }
}
