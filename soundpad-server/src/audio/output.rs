//! Audio output using cpal
//!
//! Each [`CpalOutput`] owns one cpal stream fed from a ring buffer sized to
//! two chunks. `write` blocks until the device callback has drained enough
//! room, which paces the playback loop at the device's real-time rate.
//!
//! cpal streams are not `Send`: outputs must be opened, written and closed
//! on the same thread.

use crate::audio::{AudioBackend, AudioSource, DeviceInfo, OutputStream, OutputTarget, StreamSpec};
use crate::audio::decoder::SymphoniaSource;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Sleep between attempts to push into a full ring buffer
const WRITE_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// A write making no progress for this long means the device stopped pulling
const WRITE_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on waiting for queued audio at close
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Production backend over every available cpal host
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    /// Flattened output-device enumeration across all hosts
    fn enumerate() -> Result<Vec<(DeviceInfo, Device)>> {
        let mut devices = Vec::new();

        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id)
                .map_err(|e| Error::AudioOutput(format!("Failed to open host {}: {}", host_id.name(), e)))?;

            let outputs = host.output_devices().map_err(|e| {
                Error::AudioOutput(format!("Failed to enumerate devices on {}: {}", host_id.name(), e))
            })?;

            for device in outputs {
                let info = DeviceInfo {
                    index: devices.len(),
                    name: device.name().unwrap_or_else(|_| "Unknown".to_string()),
                    host: host_id.name().to_string(),
                };
                devices.push((info, device));
            }
        }

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    fn device_for(target: OutputTarget) -> Result<(String, Device)> {
        match target {
            OutputTarget::Default => {
                let device = cpal::default_host()
                    .default_output_device()
                    .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;
                let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                Ok((name, device))
            }
            OutputTarget::Device(index) => Self::enumerate()?
                .into_iter()
                .find(|(info, _)| info.index == index)
                .map(|(info, device)| (info.name, device))
                .ok_or_else(|| Error::AudioOutput(format!("Output device #{} disappeared", index))),
        }
    }
}

impl AudioBackend for CpalBackend {
    fn output_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(Self::enumerate()?.into_iter().map(|(info, _)| info).collect())
    }

    fn open_source(&self, path: &Path) -> Result<Box<dyn AudioSource>> {
        Ok(Box::new(SymphoniaSource::open(path)?))
    }

    fn open_output(&self, target: OutputTarget, spec: StreamSpec) -> Result<Box<dyn OutputStream>> {
        let (name, device) = Self::device_for(target)?;
        let output = CpalOutput::open(&device, spec)?;
        info!(
            "Opened output on {} ({} Hz, {} ch, {} frames/chunk)",
            name, spec.sample_rate, spec.channels, spec.chunk_frames
        );
        Ok(Box::new(output))
    }
}

/// One playing cpal stream
pub struct CpalOutput {
    stream: Stream,
    producer: HeapProd<f32>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Build and start a stream matching the source's rate and channel count
    pub fn open(device: &Device, spec: StreamSpec) -> Result<Self> {
        let (config, sample_format) = Self::select_config(device, spec)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}, buffer_size={:?}",
            config.sample_rate.0, config.channels, sample_format, config.buffer_size
        );

        let capacity = (spec.chunk_frames * spec.channels as usize * 2).max(1);
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        let error_flag = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(device, &config, consumer, Arc::clone(&error_flag))?,
            SampleFormat::I16 => build_stream::<i16>(device, &config, consumer, Arc::clone(&error_flag))?,
            SampleFormat::U16 => build_stream::<u16>(device, &config, consumer, Arc::clone(&error_flag))?,
            other => {
                return Err(Error::AudioOutput(format!("Unsupported sample format: {:?}", other)));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        Ok(Self {
            stream,
            producer,
            error_flag,
        })
    }

    /// Pick a supported config with the exact channel count and rate.
    ///
    /// Prefers f32 samples. Requests a fixed buffer of one chunk when the
    /// device allows it.
    fn select_config(device: &Device, spec: StreamSpec) -> Result<(StreamConfig, SampleFormat)> {
        let supported: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?
            .filter(|c| {
                c.channels() == spec.channels
                    && c.min_sample_rate().0 <= spec.sample_rate
                    && c.max_sample_rate().0 >= spec.sample_rate
            })
            .collect();

        let rank = |format: SampleFormat| match format {
            SampleFormat::F32 => 0,
            SampleFormat::I16 => 1,
            SampleFormat::U16 => 2,
            _ => 3,
        };

        let chosen = supported
            .into_iter()
            .min_by_key(|c| rank(c.sample_format()))
            .ok_or_else(|| {
                Error::AudioOutput(format!(
                    "Device has no output config for {} ch at {} Hz",
                    spec.channels, spec.sample_rate
                ))
            })?;

        let sample_format = chosen.sample_format();
        let buffer_size = match *chosen.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max }
                if (min as usize..=max as usize).contains(&spec.chunk_frames) =>
            {
                cpal::BufferSize::Fixed(spec.chunk_frames as u32)
            }
            _ => cpal::BufferSize::Default,
        };

        let mut config = chosen.with_sample_rate(cpal::SampleRate(spec.sample_rate)).config();
        config.buffer_size = buffer_size;

        Ok((config, sample_format))
    }

    fn check_stream(&self) -> Result<()> {
        if self.error_flag.load(Ordering::SeqCst) {
            return Err(Error::AudioOutput("Audio stream reported an error".to_string()));
        }
        Ok(())
    }
}

impl OutputStream for CpalOutput {
    fn write(&mut self, samples: &[f32]) -> Result<()> {
        let mut offset = 0;
        let mut last_progress = Instant::now();

        while offset < samples.len() {
            self.check_stream()?;

            let pushed = self.producer.push_slice(&samples[offset..]);
            if pushed > 0 {
                offset += pushed;
                last_progress = Instant::now();
                continue;
            }

            if last_progress.elapsed() > WRITE_STALL_TIMEOUT {
                return Err(Error::AudioOutput("Audio device stopped consuming samples".to_string()));
            }
            thread::sleep(WRITE_POLL_INTERVAL);
        }

        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        let started = Instant::now();
        while !self.producer.is_empty() && started.elapsed() < DRAIN_TIMEOUT {
            if self.error_flag.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(WRITE_POLL_INTERVAL);
        }

        self.stream
            .pause()
            .map_err(|e| Error::AudioOutput(format!("Failed to stop stream: {}", e)))?;
        Ok(())
    }

    fn abort(self: Box<Self>) -> Result<()> {
        // Dropping the stream afterwards frees the ring buffer with whatever it held
        self.stream
            .pause()
            .map_err(|e| Error::AudioOutput(format!("Failed to stop stream: {}", e)))?;
        Ok(())
    }
}

/// Build an output stream whose callback drains `consumer`, padding with
/// silence on underrun
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut consumer: HeapCons<f32>,
    error_flag: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    let value = consumer.try_pop().unwrap_or(0.0).clamp(-1.0, 1.0);
                    *sample = T::from_sample(value);
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                error_flag.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}
