//! FFmpeg invocation for the encode step.
//!
//! [`FfmpegCommand`] describes one cleanup encode (input, video handling,
//! audio graph, encoder, output); [`FfmpegRunner`] executes it with an
//! optional deadline and streams `-progress` updates to a callback.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult, Tool};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Diagnostic lines kept for a failure report.
const STDERR_TAIL_LINES: usize = 20;

/// What happens to the video stream of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoStream {
    /// Stream-copy the video untouched
    #[default]
    Copy,
    /// Drop video from the output
    Drop,
}

/// One cleanup encode.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    video: VideoStream,
    /// Compiled `-af` graph
    audio_graph: Option<String>,
    /// `-c:a` / `-b:a` and friends
    encoder_args: Vec<String>,
    /// Anything else, placed just before the output path
    extra_args: Vec<String>,
    overwrite: bool,
}

impl FfmpegCommand {
    /// Encode `input` into `output`, stream-copying video and overwriting.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            video: VideoStream::Copy,
            audio_graph: None,
            encoder_args: Vec::new(),
            extra_args: Vec::new(),
            overwrite: true,
        }
    }

    pub fn copy_video(mut self) -> Self {
        self.video = VideoStream::Copy;
        self
    }

    pub fn drop_video(mut self) -> Self {
        self.video = VideoStream::Drop;
        self
    }

    /// Set the audio filter graph. An empty graph is omitted.
    pub fn audio_filter(mut self, graph: impl Into<String>) -> Self {
        let graph = graph.into();
        self.audio_graph = (!graph.is_empty()).then_some(graph);
        self
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.encoder_args(["-c:a".to_string(), codec.into()])
    }

    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.encoder_args(["-b:a".to_string(), bitrate.into()])
    }

    /// Append audio encoder arguments.
    pub fn encoder_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encoder_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append an argument placed just before the output path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Overwrite (`-y`) or refuse to overwrite (`-n`) an existing output.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn audio_graph(&self) -> Option<&str> {
        self.audio_graph.as_deref()
    }

    /// Arguments after the program name.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            if self.overwrite { "-y" } else { "-n" }.to_string(),
            "-v".to_string(),
            "error".to_string(),
            // Key=value progress blocks on stderr
            "-progress".to_string(),
            "pipe:2".to_string(),
            "-i".to_string(),
            self.input.to_string_lossy().into_owned(),
        ];

        match self.video {
            VideoStream::Copy => args.extend(["-c:v".to_string(), "copy".to_string()]),
            VideoStream::Drop => args.push("-vn".to_string()),
        }

        if let Some(graph) = &self.audio_graph {
            args.push("-af".to_string());
            args.push(graph.clone());
        }

        args.extend(self.encoder_args.iter().cloned());
        args.extend(self.extra_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Last few non-progress stderr lines.
#[derive(Debug, Default)]
struct StderrTail(VecDeque<String>);

impl StderrTail {
    fn push(&mut self, line: String) {
        if self.0.len() == STDERR_TAIL_LINES {
            self.0.pop_front();
        }
        self.0.push_back(line);
    }

    fn into_text(self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.into_iter().collect::<Vec<_>>().join("\n"))
    }
}

/// Runs [`FfmpegCommand`]s.
#[derive(Debug, Default, Clone)]
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill FFmpeg if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run to completion, feeding each progress block to `on_progress`.
    ///
    /// A non-zero exit is returned as [`MediaError::ToolFailed`] carrying
    /// the tail of FFmpeg's diagnostics.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        on_progress: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!(
            input = %cmd.input().display(),
            output = %cmd.output().display(),
            "Running: ffmpeg {}",
            args.join(" ")
        );

        let mut child = create_ffmpeg_command()
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr was not captured"))?;

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut progress = FfmpegProgress::default();
            let mut tail = StderrTail::default();

            while let Ok(Some(line)) = lines.next_line().await {
                if is_progress_line(&line) {
                    if let Some(snapshot) = parse_progress_line(&line, &mut progress) {
                        on_progress(snapshot);
                    }
                } else if !line.trim().is_empty() {
                    tail.push(line);
                }
            }
            tail
        });

        let status = self.wait_bounded(&mut child).await;
        let tail = reader.await.unwrap_or_default();

        match status? {
            status if status.success() => Ok(()),
            status => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                tail.into_text(),
                status.code(),
            )),
        }
    }

    async fn wait_bounded(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let Some(secs) = self.timeout_secs else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!(timeout_secs = secs, "FFmpeg deadline exceeded, killing process");
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Failed to kill timed-out FFmpeg");
                }
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

/// `ffmpeg` with a quiet banner, no stdin, and killed when dropped.
pub fn create_ffmpeg_command() -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner").stdin(Stdio::null()).kill_on_drop(true);
    cmd
}

/// `ffprobe` printing errors only.
pub fn create_ffprobe_command() -> Command {
    let mut cmd = Command::new("ffprobe");
    cmd.args(["-v", "error"]).stdin(Stdio::null()).kill_on_drop(true);
    cmd
}

/// Locate `ffmpeg` on PATH.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::ToolNotFound(Tool::Ffmpeg))
}

/// Locate `ffprobe` on PATH.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::ToolNotFound(Tool::Ffprobe))
}
