//! ffsubsync-based aligner implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use super::config::SyncConfig;
use super::error::SyncError;
use super::progress::ProgressReporter;
use super::slot::CancelSignal;
use super::traits::SubtitleAligner;
use super::types::{AlignmentJob, AlignmentResult};

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})%").expect("percent regex is valid"));

/// Output lines kept for error reports.
const TAIL_LINES: usize = 20;

/// How long output readers may run after the aligner exits or is killed.
///
/// Processes forked by the aligner can keep its pipes open.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Last percentage printed on a line of tool output, if any.
pub fn parse_percent(line: &str) -> Option<u8> {
    PERCENT
        .captures_iter(line)
        .last()
        .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .map(|p| p.min(100) as u8)
}

type OutputTail = Arc<Mutex<VecDeque<String>>>;

/// Runs ffsubsync (`ffs`) as a child process.
pub struct FfsubsyncAligner {
    config: SyncConfig,
}

impl FfsubsyncAligner {
    /// Creates a new aligner with the given configuration.
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Creates an aligner with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SyncConfig::default())
    }

    /// Builds ffsubsync arguments: extra args, then reference, input and output.
    fn build_args(&self, job: &AlignmentJob) -> Vec<String> {
        let mut args = self.config.aligner_args.clone();
        args.extend([
            job.reference.path().to_string_lossy().to_string(),
            "-i".to_string(),
            job.unsynced_path.to_string_lossy().to_string(),
            "-o".to_string(),
            job.output_path.to_string_lossy().to_string(),
        ]);
        args
    }

    fn unavailable(&self, reason: impl ToString) -> SyncError {
        SyncError::tool_unavailable("aligner", &self.config.aligner_path, reason)
    }
}

/// Reads `reader` to EOF, feeding every line to `progress`.
///
/// Progress bars redraw with carriage returns, so both `\r` and `\n` end a line.
fn drain_output<R>(reader: R, progress: ProgressReporter, tail: OutputTail) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = reader;
        let mut chunk = [0u8; 4096];
        let mut pending: Vec<u8> = Vec::new();

        loop {
            let n = match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            pending.extend_from_slice(&chunk[..n]);

            while let Some(pos) = pending.iter().position(|b| *b == b'\r' || *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                handle_line(&line[..line.len() - 1], &progress, &tail);
            }
        }

        if !pending.is_empty() {
            handle_line(&pending, &progress, &tail);
        }
    })
}

fn handle_line(raw: &[u8], progress: &ProgressReporter, tail: &OutputTail) {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if let Some(percent) = parse_percent(line) {
        progress.report(percent);
    }

    let mut tail = tail.lock().unwrap_or_else(|e| e.into_inner());
    if tail.len() == TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(line.to_string());
}

enum Outcome {
    Exited(std::process::ExitStatus),
    Cancelled,
    TimedOut,
}

#[async_trait]
impl SubtitleAligner for FfsubsyncAligner {
    fn name(&self) -> &str {
        "ffsubsync"
    }

    async fn align(
        &self,
        job: &AlignmentJob,
        progress: ProgressReporter,
        mut cancel: CancelSignal,
    ) -> Result<AlignmentResult, SyncError> {
        let start = Instant::now();
        let args = self.build_args(job);
        debug!(
            "Running {} {}",
            self.config.aligner_path.display(),
            args.join(" ")
        );

        let mut child = Command::new(&self.config.aligner_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        let tail: OutputTail = Arc::new(Mutex::new(VecDeque::with_capacity(TAIL_LINES)));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(drain_output(stdout, progress.clone(), Arc::clone(&tail)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(drain_output(stderr, progress.clone(), Arc::clone(&tail)));
        }

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status?),
            _ = cancel.cancelled() => Outcome::Cancelled,
            _ = sleep(timeout_duration) => Outcome::TimedOut,
        };

        if !matches!(outcome, Outcome::Exited(_)) {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill aligner for job {}: {}", job.job_id, e);
            }
        }

        for mut reader in readers {
            if tokio::time::timeout(READER_GRACE, &mut reader).await.is_err() {
                debug!("Output of job {} still open, detaching reader", job.job_id);
                reader.abort();
            }
        }

        match outcome {
            Outcome::Exited(status) if status.success() => Ok(AlignmentResult {
                job_id: job.job_id.clone(),
                output_path: job.output_path.clone(),
                duration_ms: start.elapsed().as_millis() as u64,
            }),
            Outcome::Exited(status) => {
                let output = {
                    let tail = tail.lock().unwrap_or_else(|e| e.into_inner());
                    if tail.is_empty() {
                        None
                    } else {
                        Some(tail.iter().cloned().collect::<Vec<_>>().join("\n"))
                    }
                };
                Err(SyncError::alignment_failed(status.code(), output))
            }
            Outcome::Cancelled => Err(SyncError::Cancelled),
            Outcome::TimedOut => Err(SyncError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }),
        }
    }

    async fn validate(&self) -> Result<(), SyncError> {
        let output = Command::new(&self.config.aligner_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !output.status.success() {
            return Err(self.unavailable(format!(
                "--version exited with {:?}",
                output.status.code()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::progress::ProgressChannel;
    use crate::sync::types::{AlignmentReference, SyncState};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn job(dir: &Path) -> AlignmentJob {
        let unsynced = dir.join("movie.heb.srt");
        std::fs::write(&unsynced, "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();
        AlignmentJob {
            job_id: "job-1".into(),
            reference: AlignmentReference::Media(dir.join("movie.mkv")),
            unsynced_path: unsynced,
            output_path: dir.join("movie.heb.synced.srt"),
        }
    }

    /// Runs `script` through `sh` so the test never execs a freshly written file.
    #[cfg(unix)]
    fn script_aligner(dir: &Path, script: &str, timeout_secs: u64) -> FfsubsyncAligner {
        let path = dir.join("fake-ffs.sh");
        std::fs::write(&path, script).unwrap();
        let config = SyncConfig::with_aligner("sh", vec![path.to_string_lossy().to_string()])
            .with_timeout(timeout_secs);
        FfsubsyncAligner::new(config)
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent(" 42%|####      | 42/100"), Some(42));
        assert_eq!(parse_percent("100%|##########|"), Some(100));
        assert_eq!(parse_percent("10% then 15%"), Some(15));
        assert_eq!(parse_percent("INFO: extracting speech"), None);
    }

    #[test]
    fn test_build_args_order() {
        let aligner = FfsubsyncAligner::new(SyncConfig::with_aligner(
            "ffs",
            vec!["--vad".into(), "webrtc".into()],
        ));
        let job = AlignmentJob {
            job_id: "j".into(),
            reference: AlignmentReference::EmbeddedTrack(PathBuf::from("/m/ref.srt")),
            unsynced_path: PathBuf::from("/m/in.srt"),
            output_path: PathBuf::from("/m/out.srt"),
        };

        assert_eq!(
            aligner.build_args(&job),
            vec!["--vad", "webrtc", "/m/ref.srt", "-i", "/m/in.srt", "-o", "/m/out.srt"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let aligner = FfsubsyncAligner::new(SyncConfig::with_aligner(
            "/nonexistent/ffs",
            Vec::new(),
        ));
        let channel = ProgressChannel::new();
        channel.start("job-1");

        let err = aligner
            .align(&job(dir.path()), channel.reporter("job-1"), CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ToolUnavailable { .. }));

        assert!(matches!(
            aligner.validate().await,
            Err(SyncError::ToolUnavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_progress_parsed_from_carriage_returns() {
        let dir = TempDir::new().unwrap();
        // $1 is the reference, $3 the input, $5 the output.
        let aligner = script_aligner(
            dir.path(),
            "printf '  10%%|#    |\\r  55%%|###  |\\r' >&2\necho ' 80%|#### |'\ncp \"$3\" \"$5\"\n",
            30,
        );
        let channel = ProgressChannel::new();
        channel.start("job-1");
        let job = job(dir.path());

        let result = aligner
            .align(&job, channel.reporter("job-1"), CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(result.output_path, job.output_path);
        assert!(job.output_path.exists());
        assert_eq!(
            channel.state(),
            SyncState::Running {
                job_id: "job-1".into(),
                percent: 80
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_alignment_failure() {
        let dir = TempDir::new().unwrap();
        let aligner = script_aligner(dir.path(), "echo 'could not detect speech' >&2\nexit 3\n", 30);
        let channel = ProgressChannel::new();
        channel.start("job-1");

        let err = aligner
            .align(&job(dir.path()), channel.reporter("job-1"), CancelSignal::never())
            .await
            .unwrap_err();

        match err {
            SyncError::AlignmentFailed { exit_code, output } => {
                assert_eq!(exit_code, Some(3));
                assert!(output.unwrap().contains("could not detect speech"));
            }
            other => panic!("expected alignment failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_process() {
        let dir = TempDir::new().unwrap();
        let aligner = script_aligner(dir.path(), "exec sleep 30\n", 60);
        let channel = ProgressChannel::new();
        channel.start("job-1");
        let (tx, cancel) = CancelSignal::pair();

        let job = job(dir.path());
        let run = aligner.align(&job, channel.reporter("job-1"), cancel);
        let trigger = async {
            sleep(Duration::from_millis(100)).await;
            tx.send(()).unwrap();
        };

        let started = Instant::now();
        let (result, ()) = tokio::join!(run, trigger);
        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_returns_while_grandchild_holds_output() {
        let dir = TempDir::new().unwrap();
        // Without exec, `sleep` outlives the killed shell and keeps the pipes open.
        let aligner = script_aligner(dir.path(), "sleep 6\n", 60);
        let channel = ProgressChannel::new();
        channel.start("job-1");
        let (tx, cancel) = CancelSignal::pair();

        let job = job(dir.path());
        let run = aligner.align(&job, channel.reporter("job-1"), cancel);
        let trigger = async {
            sleep(Duration::from_millis(100)).await;
            tx.send(()).unwrap();
        };

        let started = Instant::now();
        let (result, ()) = tokio::join!(run, trigger);
        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert!(started.elapsed() < READER_GRACE + Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        let aligner = script_aligner(dir.path(), "exec sleep 30\n", 1);
        let channel = ProgressChannel::new();
        channel.start("job-1");

        let err = aligner
            .align(&job(dir.path()), channel.reporter("job-1"), CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Timeout { timeout_secs: 1 }));
    }
}
