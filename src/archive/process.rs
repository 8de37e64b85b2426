use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;
use std::task::{Context, Poll};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};

use crate::error::archive as ArchiveError;
use crate::error::Error;

/// External command packing its working directory to its standard output.
#[derive(Clone, PartialEq, Debug)]
pub struct Archiver {
    program: String,
    args: Vec<String>,
}

impl Archiver {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new("zip", ["-r", "-q", "-", "."])
    }
}

impl FromStr for Archiver {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace().map(str::to_owned);
        Ok(Self {
            program: parts.next().ok_or("empty archiver command")?,
            args: parts.collect(),
        })
    }
}

impl Display for Archiver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Idle,
    Spawned,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

/// A running archiver whose standard output is read through [`AsyncRead`].
///
/// The exit status is only collected by [`ArchiveProcess::finish`], once the
/// output reached its end. Every other way out goes through
/// [`ArchiveProcess::terminate`], which kills and reaps the child.
#[derive(Debug)]
pub struct ArchiveProcess {
    state: State,
    child: Option<Child>,
    output: Option<ChildStdout>,
    exhausted: bool,
}

impl ArchiveProcess {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            child: None,
            output: None,
            exhausted: false,
        }
    }

    pub fn spawn(&mut self, archiver: &Archiver, dir: &Path) -> Result<(), Error> {
        debug_assert_eq!(self.state, State::Idle);
        let spawned = Command::new(&archiver.program)
            .args(&archiver.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                self.state = State::Failed;
                return Err(ArchiveError::SpawnError(err));
            }
        };

        if let Some(stderr) = child.stderr.take() {
            let pid = child.id();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug!("Archiver {:?}: {}", pid, line);
                }
            });
        }

        self.output = child.stdout.take();
        self.child = Some(child);
        self.state = State::Spawned;
        Ok(())
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    pub async fn finish(&mut self) -> Result<ExitStatus, Error> {
        if !self.exhausted {
            return Err(ArchiveError::OutputRead(io::Error::new(
                io::ErrorKind::Other,
                "archiver output not drained",
            )));
        }
        let child = match self.child.as_mut() {
            Some(child) => child,
            None => {
                return Err(ArchiveError::OutputRead(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "archiver not running",
                )))
            }
        };

        self.output = None;
        let status = child.wait().await.map_err(ArchiveError::Wait)?;
        self.child = None;
        if status.success() {
            self.state = State::Completed;
            Ok(status)
        } else {
            self.state = State::Failed;
            Err(ArchiveError::NonZeroExit(status))
        }
    }

    pub async fn terminate(&mut self) {
        self.output = None;
        if let Some(child) = self.child.as_mut() {
            if !matches!(child.try_wait(), Ok(Some(_))) {
                if let Err(err) = child.start_kill() {
                    log::debug!("Cannot kill archiver: {}", err);
                }
                if let Err(err) = child.wait().await {
                    log::error!("Cannot reap archiver: {}", err);
                }
            }
        }
        self.child = None;
        if matches!(self.state, State::Spawned | State::Streaming) {
            self.state = State::Cancelled;
        }
    }
}

impl Default for ArchiveProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncRead for ArchiveProcess {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let output = match this.output.as_mut() {
            Some(output) => output,
            None => {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "archiver output closed",
                )))
            }
        };
        if this.state == State::Spawned {
            this.state = State::Streaming;
        }

        let before = buf.filled().len();
        let asked = buf.remaining() > 0;
        let polled = Pin::new(output).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &polled {
            if asked && buf.filled().len() == before {
                this.exhausted = true;
            }
        }
        polled
    }
}
