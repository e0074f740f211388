//! Daemon lifecycle management
//!
//! `DaemonManager` owns the PID file and the shutdown flag:
//! - PID file management (`<data_dir>/potluck.pid`)
//! - Detection of an already running daemon, with stale PID file cleanup
//! - SIGTERM / Ctrl-C handling through a shared flag
//! - `stop` from another process by signalling the recorded PID
//!
//! The polling loop itself lives in [`runner`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::Config;
use crate::db::Database;
use sdk::errors::EngineError;

pub mod runner;

pub use runner::{build_orchestrator, PlanningLoop, TickReport};

/// Result type for daemon operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone)]
pub struct DaemonStatus {
    pub is_running: bool,
    pub pid: Option<u32>,
    pub pid_file: PathBuf,
}

pub struct DaemonManager {
    pid_file: PathBuf,

    /// Set by the signal handler; the loop finishes its tick and exits
    shutdown_flag: Arc<AtomicBool>,

    database: Option<Database>,
}

impl DaemonManager {
    pub fn new(config: &Config) -> Self {
        Self::with_pid_file(config.pid_file_path())
    }

    pub fn with_pid_file(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            database: None,
        }
    }

    /// Claims the PID file and installs the signal handlers
    ///
    /// Returns `DaemonAlreadyRunning` when the PID file names a live process.
    pub fn start(&self) -> Result<()> {
        if self.is_daemon_running()? {
            return Err(EngineError::DaemonAlreadyRunning);
        }

        self.write_pid_file()?;

        let _signal_handle = Self::setup_signal_handler(Arc::clone(&self.shutdown_flag));
        tracing::info!("Shutdown signal handler installed");

        Ok(())
    }

    /// Sends SIGTERM to the running daemon and waits for it to exit
    pub async fn stop(config: &Config) -> Result<()> {
        let pid_file = config.pid_file_path();
        let pid = Self::read_pid_file(&pid_file)?;

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            tracing::info!("Sending SIGTERM to daemon process {}", pid);
            kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| {
                EngineError::Io(std::io::Error::other(format!(
                    "Failed to send SIGTERM: {}",
                    e
                )))
            })?;

            let wait_result = timeout(Duration::from_secs(60), async {
                while Self::is_process_running(pid) {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            })
            .await;

            if wait_result.is_err() {
                tracing::warn!("Daemon did not stop within 60 seconds");
            } else {
                tracing::info!("Daemon stopped");
            }

            if pid_file.exists() {
                fs::remove_file(&pid_file).map_err(EngineError::Io)?;
            }
            Ok(())
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            Err(EngineError::Config(
                "Stopping the daemon is only supported on Unix".to_string(),
            ))
        }
    }

    pub fn status(config: &Config) -> DaemonStatus {
        let pid_file = config.pid_file_path();
        let pid = Self::read_pid_file(&pid_file)
            .ok()
            .filter(|pid| Self::is_process_running(*pid));

        DaemonStatus {
            is_running: pid.is_some(),
            pid,
            pid_file,
        }
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_flag)
    }

    pub fn signal_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown_signaled(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    pub fn set_database(&mut self, database: Database) {
        self.database = Some(database);
    }

    pub fn pid_file_path(&self) -> &Path {
        &self.pid_file
    }

    /// Flushes the WAL and removes the PID file; errors are logged only
    pub async fn graceful_shutdown(&mut self) {
        tracing::info!("Starting graceful shutdown");
        self.signal_shutdown();

        if let Some(database) = self.database.take() {
            match database.close().await {
                Ok(()) => tracing::info!("Database closed"),
                Err(e) => tracing::error!("Failed to close database: {:#}", e),
            }
        }

        if self.pid_file.exists() {
            match fs::remove_file(&self.pid_file) {
                Ok(()) => tracing::info!("PID file removed"),
                Err(e) => tracing::error!("Failed to remove PID file: {}", e),
            }
        }

        tracing::info!("Graceful shutdown completed");
    }

    #[cfg(unix)]
    fn setup_signal_handler(shutdown_flag: Arc<AtomicBool>) -> JoinHandle<()> {
        use tokio::signal::unix::{signal, SignalKind};

        tokio::spawn(async move {
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    shutdown_flag.store(true, Ordering::Relaxed);
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl-C"),
            }
            shutdown_flag.store(true, Ordering::Relaxed);
        })
    }

    #[cfg(not(unix))]
    fn setup_signal_handler(shutdown_flag: Arc<AtomicBool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl-C");
            }
            shutdown_flag.store(true, Ordering::Relaxed);
        })
    }

    /// A PID file naming a dead process is removed
    fn is_daemon_running(&self) -> Result<bool> {
        if !self.pid_file.exists() {
            return Ok(false);
        }

        let pid = Self::read_pid_file(&self.pid_file)?;
        if pid != std::process::id() && Self::is_process_running(pid) {
            Ok(true)
        } else {
            fs::remove_file(&self.pid_file).map_err(EngineError::Io)?;
            Ok(false)
        }
    }

    fn write_pid_file(&self) -> Result<()> {
        let pid = std::process::id();

        if let Some(parent) = self.pid_file.parent() {
            fs::create_dir_all(parent).map_err(EngineError::Io)?;
        }

        fs::write(&self.pid_file, pid.to_string()).map_err(EngineError::Io)?;
        tracing::info!("Wrote PID {} to {:?}", pid, self.pid_file);
        Ok(())
    }

    fn read_pid_file(pid_file: &Path) -> Result<u32> {
        let content = fs::read_to_string(pid_file).map_err(EngineError::Io)?;

        content
            .trim()
            .parse::<u32>()
            .map_err(|e| EngineError::Config(format!("Invalid PID in file: {}", e)))
    }

    fn is_process_running(pid: u32) -> bool {
        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;

            // Signal 0 only checks that the process exists
            kill(Pid::from_raw(pid as i32), None).is_ok()
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            false
        }
    }
}
