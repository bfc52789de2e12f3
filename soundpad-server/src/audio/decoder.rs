//! Audio decoder using symphonia
//!
//! Streams a file packet by packet instead of decoding it up front, so a
//! long clip starts playing immediately and memory stays bounded by one
//! packet.

use crate::audio::AudioSource;
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Pull-based decoder over one audio file
pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,
    total_frames: Option<u64>,
    /// Interleaved samples decoded but not yet handed out
    pending: Vec<f32>,
    pending_pos: usize,
    finished: bool,
}

impl SymphoniaSource {
    /// Open and probe an audio file.
    ///
    /// # Errors
    /// - Failed to open file
    /// - Unsupported or unrecognized format
    /// - No decodable audio track
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening audio source: {}", path.display());

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Extension hint helps the probe pick a reader
        let mut hint = Hint::new();
        if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext_str);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        debug!(
            "Audio format: sample_rate={}, channels={}, frames={:?}",
            sample_rate, channels, codec_params.n_frames
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            total_frames: codec_params.n_frames,
            pending: Vec::new(),
            pending_pos: 0,
            finished: false,
        })
    }

    /// Decode the next packet of our track into `pending`.
    ///
    /// Returns false once the stream has ended.
    fn decode_next_packet(&mut self) -> Result<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of file");
                    self.finished = true;
                    return Ok(false);
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    self.finished = true;
                    return Ok(false);
                }
            };

            // Skip packets for other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    if decoded.frames() == 0 {
                        continue;
                    }
                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    buf.copy_interleaved_ref(decoded);

                    self.pending.clear();
                    self.pending.extend_from_slice(buf.samples());
                    self.pending_pos = 0;
                    return Ok(true);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet: drop it and keep going
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decoder failed: {}", e)));
                }
            }
        }
    }
}

impl AudioSource for SymphoniaSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    fn read_frames(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<usize> {
        out.clear();
        let channels = self.channels as usize;
        let wanted = max_frames * channels;

        while out.len() < wanted {
            if self.pending_pos < self.pending.len() {
                let take = (wanted - out.len()).min(self.pending.len() - self.pending_pos);
                out.extend_from_slice(&self.pending[self.pending_pos..self.pending_pos + take]);
                self.pending_pos += take;
                continue;
            }

            if self.finished || !self.decode_next_packet()? {
                break;
            }
        }

        Ok(out.len() / channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = SymphoniaSource::open(Path::new("/nonexistent/clip.wav"));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(matches!(SymphoniaSource::open(&path), Err(Error::Decode(_))));
    }
}
