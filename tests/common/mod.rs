//! Shared test doubles.
//!
//! [`FakeBackend`] stands in for FFmpeg: probing returns a fixed duration and
//! frame rate, and rendering writes a small text file naming the offset.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use keepshot::{FrameRenderer, ImageFormat, KeepshotError, MediaProbe, MediaProber};

#[derive(Debug, Clone)]
pub struct RenderCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub offset: Duration,
    pub format: ImageFormat,
}

#[derive(Debug)]
pub struct FakeBackend {
    pub duration: Duration,
    pub frame_rate: Option<f64>,
    pub has_video: bool,
    /// Zero-based render call that fails, if any.
    pub fail_on_render: Option<usize>,
    pub probes: AtomicUsize,
    pub probed_paths: Mutex<Vec<PathBuf>>,
    pub renders: Mutex<Vec<RenderCall>>,
}

impl FakeBackend {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            frame_rate: Some(30.0),
            has_video: true,
            fail_on_render: None,
            probes: AtomicUsize::new(0),
            probed_paths: Mutex::new(Vec::new()),
            renders: Mutex::new(Vec::new()),
        }
    }

    pub fn seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    pub fn with_frame_rate(mut self, frame_rate: Option<f64>) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn without_video(mut self) -> Self {
        self.has_video = false;
        self
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_render = Some(call);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> Vec<RenderCall> {
        self.renders.lock().unwrap().clone()
    }
}

impl MediaProber for FakeBackend {
    fn probe(&self, path: &Path) -> Result<MediaProbe, KeepshotError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probed_paths.lock().unwrap().push(path.to_path_buf());

        if !path.is_file() {
            return Err(KeepshotError::FileOpen {
                path: path.to_path_buf(),
                reason: "missing".to_string(),
            });
        }
        if !self.has_video {
            return Err(KeepshotError::NoVideoStream);
        }
        Ok(MediaProbe::new(self.duration, self.frame_rate))
    }
}

impl FrameRenderer for FakeBackend {
    fn render(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
        format: ImageFormat,
    ) -> Result<(), KeepshotError> {
        let mut renders = self.renders.lock().unwrap();
        let call = renders.len();
        renders.push(RenderCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            offset,
            format,
        });

        assert!(input.is_file(), "render input must exist while rendering");

        if self.fail_on_render == Some(call) {
            return Err(KeepshotError::IoError(std::io::Error::other("disk full")));
        }

        fs::write(output, format!("{}ms", offset.as_millis()))?;
        Ok(())
    }
}

pub fn files_in(directory: &Path) -> Vec<PathBuf> {
    match fs::read_dir(directory) {
        Ok(entries) => {
            let mut files: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect();
            files.sort();
            files
        }
        Err(_) => Vec::new(),
    }
}
