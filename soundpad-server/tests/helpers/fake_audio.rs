//! Scripted in-memory audio backend
//!
//! Devices, sources and outputs are all fake: outputs record every write so
//! tests can inspect exactly which samples reached which device, and a
//! per-write delay stands in for the device's real-time pacing.

use soundpad_server::audio::{AudioBackend, AudioSource, DeviceInfo, OutputStream, OutputTarget, StreamSpec};
use soundpad_server::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Host name every fake device reports
pub const FAKE_HOST: &str = "FakeHost";

/// Routed device name fragment matching [`FakeBackend::with_routed_device`]
pub const ROUTED_FRAGMENT: &str = "virtual cable input";

/// Decoded audio served by the fake backend
#[derive(Debug, Clone)]
pub struct FakeClip {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples
    pub samples: Vec<f32>,
}

impl FakeClip {
    /// Stereo clip of `frames` frames, every sample equal to `value`
    pub fn constant(frames: usize, value: f32) -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            samples: vec![value; frames * 2],
        }
    }
}

/// Everything written to one opened output
#[derive(Debug)]
pub struct RecordedOutput {
    pub target: OutputTarget,
    pub spec: StreamSpec,
    writes: Mutex<Vec<Vec<f32>>>,
    closed: AtomicBool,
    /// Closed without draining
    aborted: AtomicBool,
}

impl RecordedOutput {
    /// Every write, in order
    pub fn writes(&self) -> Vec<Vec<f32>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// All samples concatenated
    pub fn samples(&self) -> Vec<f32> {
        self.writes().concat()
    }

    /// True after either `close` or `abort`
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// True if the output was released with its queued audio discarded
    pub fn was_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

pub struct FakeBackend {
    devices: Vec<DeviceInfo>,
    clips: Mutex<HashMap<PathBuf, FakeClip>>,
    outputs: Mutex<Vec<Arc<RecordedOutput>>>,
    enumerations: AtomicUsize,
    /// Highest number of simultaneously unclosed outputs seen at open time
    max_open: AtomicUsize,
    write_delay: Duration,
    fail_target: Mutex<Option<OutputTarget>>,
}

impl FakeBackend {
    /// Backend with a speaker device and no routed device
    pub fn new() -> Self {
        Self {
            devices: vec![DeviceInfo {
                index: 0,
                name: "Fake Speakers".to_string(),
                host: FAKE_HOST.to_string(),
            }],
            clips: Mutex::new(HashMap::new()),
            outputs: Mutex::new(Vec::new()),
            enumerations: AtomicUsize::new(0),
            max_open: AtomicUsize::new(0),
            write_delay: Duration::from_millis(2),
            fail_target: Mutex::new(None),
        }
    }

    /// Add a device; its index is its position
    pub fn with_device(mut self, name: &str, host: &str) -> Self {
        self.devices.push(DeviceInfo {
            index: self.devices.len(),
            name: name.to_string(),
            host: host.to_string(),
        });
        self
    }

    /// Add one device matching [`ROUTED_FRAGMENT`] on [`FAKE_HOST`]
    pub fn with_routed_device(self) -> Self {
        self.with_device("Virtual Cable Input (Fake Audio)", FAKE_HOST)
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Serve `clip` when `path` is opened
    pub fn add_clip(&self, path: impl Into<PathBuf>, clip: FakeClip) {
        self.clips.lock().unwrap().insert(path.into(), clip);
    }

    /// Make opening `target` fail
    pub fn fail_output(&self, target: OutputTarget) {
        *self.fail_target.lock().unwrap() = Some(target);
    }

    /// Number of device enumerations so far
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Most outputs that were open at the same time
    pub fn max_open_outputs(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    /// Every output opened so far, in open order
    pub fn outputs(&self) -> Vec<Arc<RecordedOutput>> {
        self.outputs.lock().unwrap().clone()
    }

    /// Most recently opened output for `target`
    pub fn last_output(&self, target: OutputTarget) -> Option<Arc<RecordedOutput>> {
        self.outputs().into_iter().rev().find(|o| o.target == target)
    }
}

impl AudioBackend for FakeBackend {
    fn output_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Ok(self.devices.clone())
    }

    fn open_source(&self, path: &Path) -> Result<Box<dyn AudioSource>> {
        let clip = self
            .clips
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Decode(format!("no fake clip at {}", path.display())))?;
        Ok(Box::new(FakeSource { clip, position: 0 }))
    }

    fn open_output(&self, target: OutputTarget, spec: StreamSpec) -> Result<Box<dyn OutputStream>> {
        if *self.fail_target.lock().unwrap() == Some(target) {
            return Err(Error::AudioOutput(format!("scripted failure opening {:?}", target)));
        }
        if let OutputTarget::Device(index) = target {
            if !self.devices.iter().any(|d| d.index == index) {
                return Err(Error::AudioOutput(format!("no fake device #{}", index)));
            }
        }

        let record = Arc::new(RecordedOutput {
            target,
            spec,
            writes: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        });
        {
            let mut outputs = self.outputs.lock().unwrap();
            outputs.push(Arc::clone(&record));
            let open = outputs.iter().filter(|o| !o.is_closed()).count();
            self.max_open.fetch_max(open, Ordering::SeqCst);
        }

        Ok(Box::new(FakeOutput {
            record,
            delay: self.write_delay,
        }))
    }
}

struct FakeSource {
    clip: FakeClip,
    /// Sample (not frame) offset
    position: usize,
}

impl AudioSource for FakeSource {
    fn sample_rate(&self) -> u32 {
        self.clip.sample_rate
    }

    fn channels(&self) -> u16 {
        self.clip.channels
    }

    fn total_frames(&self) -> Option<u64> {
        Some((self.clip.samples.len() / self.clip.channels as usize) as u64)
    }

    fn read_frames(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<usize> {
        out.clear();
        let channels = self.clip.channels as usize;
        let end = (self.position + max_frames * channels).min(self.clip.samples.len());
        out.extend_from_slice(&self.clip.samples[self.position..end]);
        self.position = end;
        Ok(out.len() / channels)
    }
}

struct FakeOutput {
    record: Arc<RecordedOutput>,
    delay: Duration,
}

impl OutputStream for FakeOutput {
    fn write(&mut self, samples: &[f32]) -> Result<()> {
        self.record.writes.lock().unwrap().push(samples.to_vec());
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.record.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn abort(self: Box<Self>) -> Result<()> {
        self.record.aborted.store(true, Ordering::SeqCst);
        self.record.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
