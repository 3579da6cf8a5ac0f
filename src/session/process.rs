use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::session::config::SessionConfig;
use crate::session::error::SessionError;

/// What moved a launched server to the connection phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// A ready marker was seen on stdout.
    Marker(String),
    /// No marker within the fallback window; connection is attempted anyway.
    Fallback,
}

/// The automation server subprocess.
///
/// Stdout is scanned for ready markers and otherwise only logged; stderr is
/// only logged. The child is killed if the handle is dropped.
pub struct ServerProcess {
    child: Child,
    command: String,
    marker_rx: Option<oneshot::Receiver<String>>,
}

/// Resolve the port to hand to the server. `0` asks the OS for a free one.
pub fn negotiate_port(configured: u16) -> Result<u16, SessionError> {
    if configured != 0 {
        return Ok(configured);
    }
    std::net::TcpListener::bind(("127.0.0.1", 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .map_err(|e| SessionError::LaunchFailure {
            command: "port negotiation".into(),
            reason: e.to_string(),
        })
}

impl ServerProcess {
    /// Spawn the configured command with the port exported in `port_env`.
    pub fn spawn(config: &SessionConfig, port: u16) -> Result<Self, SessionError> {
        let command_line = format!("{} {}", config.command, config.args.join(" "));
        info!(command = %command_line.trim(), port, "spawning automation server");

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .env(&config.port_env, port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::LaunchFailure {
                command: config.command.clone(),
                reason: e.to_string(),
            })?;

        let (marker_tx, marker_rx) = oneshot::channel();

        if let Some(stdout) = child.stdout.take() {
            let markers = config.ready_markers.clone();
            tokio::spawn(async move {
                let mut marker_tx = Some(marker_tx);
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %line.trim(), "server stdout");
                    if let Some(marker) = markers.iter().find(|m| line.contains(m.as_str())) {
                        if let Some(tx) = marker_tx.take() {
                            let _ = tx.send(marker.clone());
                        }
                    }
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %line.trim(), "server stderr");
                }
            });
        }

        Ok(Self {
            child,
            command: config.command.clone(),
            marker_rx: Some(marker_rx),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for a ready marker, falling back after `fallback` elapses.
    ///
    /// A non-zero exit before readiness is a launch failure. A clean exit
    /// leaves the decision to the connection phase.
    pub async fn wait_ready(&mut self, fallback: Duration) -> Result<Readiness, SessionError> {
        let deadline = sleep(fallback);
        tokio::pin!(deadline);

        let mut marker_rx = self.marker_rx.take();
        let mut exited = false;

        loop {
            tokio::select! {
                marker = async {
                    match marker_rx.as_mut() {
                        Some(rx) => rx.await,
                        None => std::future::pending().await,
                    }
                } => match marker {
                    Ok(marker) => {
                        info!(%marker, "automation server reported ready");
                        return Ok(Readiness::Marker(marker));
                    }
                    // stdout closed without a marker
                    Err(_) => marker_rx = None,
                },
                status = self.child.wait(), if !exited => match status {
                    Ok(status) if status.success() => {
                        warn!("automation server exited before reporting ready");
                        exited = true;
                    }
                    Ok(status) => {
                        return Err(SessionError::LaunchFailure {
                            command: self.command.clone(),
                            reason: format!("process exited with {}", status),
                        });
                    }
                    Err(e) => {
                        return Err(SessionError::LaunchFailure {
                            command: self.command.clone(),
                            reason: e.to_string(),
                        });
                    }
                },
                _ = &mut deadline => {
                    debug!(fallback_ms = fallback.as_millis() as u64, "no ready marker; trying to connect anyway");
                    return Ok(Readiness::Fallback);
                }
            }
        }
    }

    /// Ask the process to stop, killing it if it is still alive after `grace`.
    pub async fn terminate(&mut self, grace: Duration) {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(%status, "automation server already exited");
            return;
        }

        self.send_terminate();

        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => info!(%status, "automation server stopped"),
            Ok(Err(e)) => warn!("failed waiting for automation server: {}", e),
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "automation server ignored SIGTERM; killing");
                if let Err(e) = self.child.kill().await {
                    warn!("failed to kill automation server: {}", e);
                }
            }
        }
    }

    #[cfg(unix)]
    fn send_terminate(&mut self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id().and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            warn!(pid, "failed to send SIGTERM: {}", e);
        }
    }

    #[cfg(not(unix))]
    fn send_terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!("failed to stop automation server: {}", e);
        }
    }
}
