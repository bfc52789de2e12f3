//! WAV fixture generation

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write a 16-bit stereo WAV of `frames` frames holding a constant level
pub fn write_constant_wav(path: &Path, sample_rate: u32, frames: usize, level: f32) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    let value = (level.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;

    for _ in 0..frames {
        writer.write_sample(value)?;
        writer.write_sample(value)?;
    }

    writer.finalize()
}
