use serde::{Deserialize, Serialize};

/// Audio container/codec for the finalized recording.
///
/// Ordered by upload preference: generic compressed containers first, PCM WAV
/// last. Which of these the runtime can actually produce is decided by probing
/// (`session::sink::is_encoding_supported`), never assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    OggOpus,
    Flac,
    Wav,
}

impl AudioEncoding {
    /// File suffix used when naming the upload payload.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::OggOpus => ".ogg",
            Self::Flac => ".flac",
            Self::Wav => ".wav",
        }
    }

    /// MIME type sent with the multipart upload.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::OggOpus => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }
}

/// The finalized binary recording, ready for upload.
///
/// Produced exactly once per session by the recording sink; ownership moves to
/// the analysis call at submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio {
    pub data: Vec<u8>,
    pub encoding: AudioEncoding,
}

impl EncodedAudio {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// PCM layout of the samples handed to the recording sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

/// A microphone device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicrophoneInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matches_encoding() {
        assert_eq!(AudioEncoding::Wav.extension(), ".wav");
        assert_eq!(AudioEncoding::OggOpus.extension(), ".ogg");
        assert_eq!(AudioEncoding::Flac.extension(), ".flac");
    }

    #[test]
    fn mime_matches_encoding() {
        assert_eq!(AudioEncoding::Wav.mime_type(), "audio/wav");
        assert_eq!(AudioEncoding::OggOpus.mime_type(), "audio/ogg");
        assert_eq!(AudioEncoding::Flac.mime_type(), "audio/flac");
    }
}
