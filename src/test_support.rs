//! In-process stand-in for git and tar used by unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::KeyLock;
use crate::process::{CommandError, CommandOutput, CommandRunner, Invocation};
use crate::snapshot::CLONE_DIR;

const CLEAN: &str = "On branch main\nnothing to commit, working tree clean\n";

/// Records every invocation and imitates the side effects the cache relies on:
/// `git clone` creates the clone directory, `tar cf` writes an archive whose
/// content names the snapshot, `tar xf` copies that content into the target.
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    status: String,
    fail: Option<(&'static str, &'static str)>,
    snapshots: AtomicU64,
    watched_lock: Option<PathBuf>,
    lock_states: Mutex<Vec<(String, String, bool)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status: CLEAN.to_string(),
            fail: None,
            snapshots: AtomicU64::new(0),
            watched_lock: None,
            lock_states: Mutex::new(Vec::new()),
        }
    }

    /// Output for `git status`.
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    /// Fail invocations of `program` whose arguments include `arg`.
    pub fn failing(mut self, program: &'static str, arg: &'static str) -> Self {
        self.fail = Some((program, arg));
        self
    }

    /// Record, for every invocation, whether `lock_path` is held by someone.
    pub fn watching_lock(mut self, lock_path: PathBuf) -> Self {
        self.watched_lock = Some(lock_path);
        self
    }

    /// Lock state seen by each `program verb` invocation, in call order.
    pub fn lock_held_during(&self, program: &str, verb: &str) -> Vec<bool> {
        self.lock_states
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, v, _)| p == program && v == verb)
            .map(|(_, _, held)| *held)
            .collect()
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of invocations of `program` with `arg` among the arguments.
    pub fn count(&self, program: &str, arg: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.program == program && c.args_lossy().iter().any(|a| a == arg))
            .count()
    }

    fn resolve(cwd: Option<&Path>, arg: &str) -> PathBuf {
        match cwd {
            Some(dir) => dir.join(arg),
            None => PathBuf::from(arg),
        }
    }

    fn io_failure(program: &str, err: std::io::Error) -> CommandError {
        CommandError::Failed {
            program: program.to_string(),
            status: "exit code 1".to_string(),
            stderr: err.to_string(),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let args = invocation.args_lossy();
        let cwd = invocation.cwd.as_deref();

        if let Some(lock_path) = &self.watched_lock {
            let held = matches!(KeyLock::try_acquire(lock_path), Ok(None));
            let verb = match args.first().map(String::as_str) {
                Some("-C") => args.get(2),
                _ => args.first(),
            };
            self.lock_states.lock().unwrap().push((
                invocation.program.clone(),
                verb.cloned().unwrap_or_default(),
                held,
            ));
        }

        if let Some((program, arg)) = self.fail {
            if invocation.program == program && args.iter().any(|a| a == arg) {
                return Err(CommandError::Failed {
                    program: program.to_string(),
                    status: "exit code 128".to_string(),
                    stderr: format!("fatal: injected {} failure", arg),
                });
            }
        }

        let mut stdout = String::new();
        match (invocation.program.as_str(), args.first().map(String::as_str)) {
            ("git", Some("clone")) => {
                let clone = Self::resolve(cwd, CLONE_DIR);
                std::fs::create_dir_all(clone.join(".git"))
                    .map_err(|e| Self::io_failure("git", e))?;
                std::fs::write(clone.join("README"), "hello")
                    .map_err(|e| Self::io_failure("git", e))?;
            }
            ("git", Some("-C")) if args.get(2).map(String::as_str) == Some("status") => {
                stdout = self.status.clone();
            }
            ("tar", Some("cf")) => {
                let archive = Self::resolve(cwd, &args[1]);
                let n = self.snapshots.fetch_add(1, Ordering::SeqCst) + 1;
                std::fs::write(&archive, format!("snapshot-{}", n))
                    .map_err(|e| Self::io_failure("tar", e))?;
            }
            ("tar", Some("xf")) => {
                let archive = Self::resolve(cwd, &args[1]);
                let target = Self::resolve(cwd, &args[3]);
                let content =
                    std::fs::read(&archive).map_err(|e| Self::io_failure("tar", e))?;
                std::fs::write(target.join("EXTRACTED"), content)
                    .map_err(|e| Self::io_failure("tar", e))?;
            }
            _ => {}
        }

        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}
