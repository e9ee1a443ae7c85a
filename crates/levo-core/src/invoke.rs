//! External tool invocation.
//!
//! Every stage talks to the outside world through [`Invoker`], so stage
//! logic can be exercised without spawning real processes.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A single external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: PathBuf,

    /// Arguments, in order.
    pub args: Vec<OsString>,

    /// Working directory (inherits the caller's when `None`).
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// File name of the program, without directories.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .to_string()
    }

    /// Command line rendered for logs and error messages.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Exit status and captured output of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` if terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A zero-exit output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the tool exited with status zero.
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// The most useful diagnostic text: stderr, or stdout when stderr is empty.
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs external tools to completion.
pub trait Invoker {
    /// Run the invocation and wait for it to exit.
    ///
    /// An `Err` means the process could not be started at all; a tool that
    /// ran and failed is reported through [`ToolOutput::status`].
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;
}

impl<T: Invoker + ?Sized> Invoker for &T {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        (**self).run(invocation)
    }
}

impl<T: Invoker + ?Sized> Invoker for Box<T> {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        (**self).run(invocation)
    }
}

/// Invoker backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new() -> Self {
        Self
    }
}

impl Invoker for ProcessInvoker {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(command = %invocation, cwd = ?invocation.cwd, "spawning process");

        let output = cmd.output()?;
        let result = ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.stderr.is_empty() {
            tracing::debug!(stderr = %result.stderr.trim_end(), "process stderr");
        }
        tracing::debug!(status = ?result.status, "process exited");

        Ok(result)
    }
}
