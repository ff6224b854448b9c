use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;

use crate::speech::cache::ClipCache;
use crate::speech::{AudioClip, AudioRecorder, SpeechRecognizer, Transcript};

/// A configured command line, split on whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Records from the microphone by running a command that writes audio to
/// stdout, e.g. `arecord -q -d 5 -f cd -t wav`.
pub struct CommandRecorder {
    line: CommandLine,
}

impl CommandRecorder {
    pub fn new(line: CommandLine) -> Self {
        Self { line }
    }
}

impl AudioRecorder for CommandRecorder {
    fn record(&self) -> Option<AudioClip> {
        let output = match self.line.command().stdin(Stdio::null()).output() {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(program = %self.line.program, error = %err, "recorder failed to start");
                return None;
            }
        };
        if !output.status.success() || output.stdout.is_empty() {
            tracing::warn!(status = %output.status, "recorder produced no audio");
            return None;
        }
        Some(AudioClip {
            bytes: output.stdout,
            extension: "wav",
        })
    }
}

/// Transcribes by piping audio into a command and reading the transcript
/// from its stdout. Exit failure is a service error; empty output means
/// nothing was recognized.
pub struct CommandRecognizer {
    line: CommandLine,
}

impl CommandRecognizer {
    pub fn new(line: CommandLine) -> Self {
        Self { line }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn transcribe(&self, audio: &AudioClip) -> Transcript {
        let child = self
            .line
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(err) => return Transcript::OtherError(err.to_string()),
        };

        // Stdin is fed from its own thread while stdout is drained here.
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = stdin.map(|mut stdin| scope.spawn(move || stdin.write_all(&audio.bytes)));
            let output = child.wait_with_output();
            let written = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (output, written)
        });

        let output = match output {
            Ok(output) => output,
            Err(err) => return Transcript::OtherError(err.to_string()),
        };
        // A recognizer may exit without draining its input.
        if let Err(err) = written
            && err.kind() != io::ErrorKind::BrokenPipe
        {
            return Transcript::OtherError(err.to_string());
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Transcript::ServiceError(detail);
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            Transcript::NotRecognized
        } else {
            Transcript::Heard(text)
        }
    }
}

/// Plays clips through an external player, one at a time.
pub struct AudioPlayer {
    line: CommandLine,
    scratch: PathBuf,
    current: Option<Child>,
}

impl AudioPlayer {
    pub fn new(line: CommandLine) -> Option<Self> {
        let scratch = ClipCache::new("playback")?.path_for("current", "bin");
        Some(Self {
            line,
            scratch,
            current: None,
        })
    }

    pub fn play(&mut self, clip: &AudioClip) -> bool {
        self.stop();
        let path = self.scratch.with_extension(clip.extension);
        if std::fs::write(&path, &clip.bytes).is_err() {
            return false;
        }
        match self
            .line
            .command()
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                self.current = Some(child);
                true
            }
            Err(err) => {
                tracing::warn!(program = %self.line.program, error = %err, "audio player failed to start");
                false
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.current.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
