// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Connection lifecycle.
//
// One connection attempt at a time:
//
//   Idle -> Building -> Running -> Succeeded | Failed | Cancelled -> Idle
//
// The attempt runs on a tokio task.  The caller gets a `ConnectionHandle`
// straight away and receives exactly one `ConnectionReport` through it.
// Cancellation is a single atomic phase word: whichever of "cancel requested"
// and "process finished" flips it first decides the outcome, and a requested
// cancel always reports `Cancelled`.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use rdpconnect_core::config::Configuration;
use rdpconnect_core::error::{LauncherError, Result};
use rdpconnect_core::types::{ConnectionId, ConnectionReport, ConnectionState, TerminalEvent};
use rdpconnect_devices::DeviceProber;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::{Notify, oneshot, watch};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::binary::ClientBinary;
use crate::command::{CommandLine, withheld_arguments};
use crate::version::probe_version;

// Phase word values.  `FINISHED` and `CANCELLED` are final.
const ACTIVE: u8 = 0;
const CANCEL_REQUESTED: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Cancellation state shared by a worker and its handles.
///
/// The worker owns the sending side of `settled`; it flips to `true` once the
/// report is out and closes if the worker is dropped unfinished.
#[derive(Debug)]
struct CancelState {
    phase: AtomicU8,
    wake: Notify,
    settled: watch::Receiver<bool>,
}

impl CancelState {
    fn new(settled: watch::Receiver<bool>) -> Self {
        Self {
            phase: AtomicU8::new(ACTIVE),
            wake: Notify::new(),
            settled,
        }
    }

    fn is_cancel_requested(&self) -> bool {
        self.phase.load(Ordering::Acquire) == CANCEL_REQUESTED
    }

    /// Completes once a cancel has been requested.
    async fn requested(&self) {
        loop {
            let notified = self.wake.notified();
            if self.is_cancel_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Decide the outcome.  A pending cancel request overrides `natural`.
    fn settle(&self, natural: TerminalEvent) -> TerminalEvent {
        match self
            .phase
            .compare_exchange(ACTIVE, FINISHED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => natural,
            Err(_) => {
                self.phase.store(CANCELLED, Ordering::Release);
                TerminalEvent::Cancelled
            }
        }
    }
}

/// Requests cancellation of one connection attempt.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct Canceller {
    state: Arc<CancelState>,
}

impl Canceller {
    /// Ask the attempt to stop and wait until its process has exited.
    ///
    /// Returns `true` if the attempt ends `Cancelled`, `false` if it had
    /// already finished on its own or its worker went away.
    pub async fn cancel(&self) -> bool {
        match self.state.phase.compare_exchange(
            ACTIVE,
            CANCEL_REQUESTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                debug!("cancel requested");
                self.state.wake.notify_one();
            }
            Err(FINISHED) => return false,
            Err(_) => {}
        }

        let mut settled = self.state.settled.clone();
        // Err means the worker was dropped without settling.
        let _ = settled.wait_for(|done| *done).await;
        self.state.phase.load(Ordering::Acquire) == CANCELLED
    }
}

/// A connection attempt in flight.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    started_at: DateTime<Utc>,
    report: oneshot::Receiver<ConnectionReport>,
    canceller: Canceller,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// See [`Canceller::cancel`].
    pub async fn cancel(&self) -> bool {
        self.canceller.cancel().await
    }

    /// Wait for the terminal event.
    pub async fn wait(self) -> ConnectionReport {
        match self.report.await {
            Ok(report) => report,
            Err(_) => ConnectionReport {
                id: self.id,
                event: TerminalEvent::Failed("connection worker stopped unexpectedly".into()),
                started_at: self.started_at,
                finished_at: Utc::now(),
            },
        }
    }
}

/// What the worker starts from.
enum Plan {
    Build {
        config: Box<Configuration>,
        binary: ClientBinary,
        prober: Arc<dyn DeviceProber>,
    },
    Ready(CommandLine),
}

/// Runs client processes, one at a time.
pub struct Orchestrator {
    runtime: Handle,
    binary: ClientBinary,
    prober: Arc<dyn DeviceProber>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl Orchestrator {
    /// Create an orchestrator on the current tokio runtime.
    pub fn new(binary: ClientBinary, prober: Arc<dyn DeviceProber>) -> Result<Self> {
        let runtime =
            Handle::try_current().map_err(|e| LauncherError::NoRuntime(e.to_string()))?;
        Ok(Self::with_runtime(runtime, binary, prober))
    }

    pub fn with_runtime(
        runtime: Handle,
        binary: ClientBinary,
        prober: Arc<dyn DeviceProber>,
    ) -> Self {
        Self {
            runtime,
            binary,
            prober,
            state: Arc::new(watch::Sender::new(ConnectionState::Idle)),
        }
    }

    pub fn binary(&self) -> &ClientBinary {
        &self.binary
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Start a connection for `config`: probe the client, build the
    /// arguments and spawn the client.  Returns as soon as the attempt is
    /// queued.
    pub fn connect(&self, config: &Configuration) -> Result<ConnectionHandle> {
        self.start(Plan::Build {
            config: Box::new(config.clone()),
            binary: self.binary.clone(),
            prober: Arc::clone(&self.prober),
        })
    }

    /// Run a prebuilt command with the same lifecycle as [`connect`](Self::connect).
    pub fn launch(&self, command: CommandLine) -> Result<ConnectionHandle> {
        self.start(Plan::Ready(command))
    }

    fn start(&self, plan: Plan) -> Result<ConnectionHandle> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Idle {
                *state = ConnectionState::Building;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(LauncherError::Busy);
        }

        let id = ConnectionId::new();
        let started_at = Utc::now();
        let (settled_tx, settled_rx) = watch::channel(false);
        let cancel = Arc::new(CancelState::new(settled_rx));
        let (report_tx, report_rx) = oneshot::channel();

        let state = Arc::clone(&self.state);
        let worker_cancel = Arc::clone(&cancel);
        let span = info_span!("connection", %id);
        self.runtime.spawn(
            async move {
                let event = drive(plan, &worker_cancel, &state).await;
                match &event {
                    TerminalEvent::Failed(detail) => warn!(%detail, "connection failed"),
                    other => info!(event = ?other, "connection finished"),
                }

                state.send_replace(event.state());
                state.send_replace(ConnectionState::Idle);
                let _ = report_tx.send(ConnectionReport {
                    id,
                    event,
                    started_at,
                    finished_at: Utc::now(),
                });
                settled_tx.send_replace(true);
            }
            .instrument(span),
        );

        Ok(ConnectionHandle {
            id,
            started_at,
            report: report_rx,
            canceller: Canceller { state: cancel },
        })
    }
}

async fn drive(
    plan: Plan,
    cancel: &CancelState,
    state: &watch::Sender<ConnectionState>,
) -> TerminalEvent {
    let command = match plan {
        Plan::Ready(command) => command,
        Plan::Build {
            config,
            binary,
            prober,
        } => {
            tokio::select! {
                command = prepare(&config, &binary, prober) => command,
                _ = cancel.requested() => return cancel.settle(TerminalEvent::Cancelled),
            }
        }
    };

    if cancel.is_cancel_requested() {
        return cancel.settle(TerminalEvent::Cancelled);
    }

    state.send_replace(ConnectionState::Running);
    info!(command = %command, "starting client");

    let mut child = match Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return cancel.settle(TerminalEvent::Failed(e.to_string())),
    };

    let stdout = tokio::spawn(read_all(child.stdout.take()));
    let stderr = tokio::spawn(read_all(child.stderr.take()));

    let exit = tokio::select! {
        status = child.wait() => Some(status),
        _ = cancel.requested() => None,
    };

    match exit {
        None => {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "could not kill client");
            }
            stdout.abort();
            stderr.abort();
            cancel.settle(TerminalEvent::Cancelled)
        }
        Some(Err(e)) => cancel.settle(TerminalEvent::Failed(e.to_string())),
        Some(Ok(status)) => {
            let out = stdout.await.unwrap_or_default();
            let err = stderr.await.unwrap_or_default();
            debug!(%status, stdout_bytes = out.len(), stderr_bytes = err.len(), "client exited");
            let natural = if status.success() {
                TerminalEvent::Succeeded
            } else {
                TerminalEvent::Failed(err.trim().to_owned())
            };
            cancel.settle(natural)
        }
    }
}

async fn prepare(
    config: &Configuration,
    binary: &ClientBinary,
    prober: Arc<dyn DeviceProber>,
) -> CommandLine {
    let version = probe_version(binary.path()).await;

    let printers = if config.redirect.printers {
        tokio::task::spawn_blocking(move || prober.list_printers())
            .await
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    debug!(
        withheld = ?withheld_arguments(config, version, &printers),
        "redirection arguments not passed to client"
    );

    CommandLine::for_client(binary, config, version)
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "client output read error");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use rdpconnect_core::types::LocalPrinter;
    use rdpconnect_devices::stub::StubProber;
    use std::time::{Duration, Instant};

    fn orchestrator(binary: &str) -> Orchestrator {
        Orchestrator::new(ClientBinary::new(binary), Arc::new(StubProber)).unwrap()
    }

    fn shell(script: &str) -> CommandLine {
        CommandLine::new("/bin/sh", ["-c", script])
    }

    struct SlowProber;

    impl DeviceProber for SlowProber {
        fn name(&self) -> &str {
            "slow"
        }

        fn list_printers(&self) -> Vec<LocalPrinter> {
            std::thread::sleep(Duration::from_millis(500));
            Vec::new()
        }
    }

    #[tokio::test]
    async fn zero_exit_succeeds() {
        let orch = orchestrator("xfreerdp");
        let handle = orch.launch(shell("echo connected")).unwrap();
        let id = handle.id();
        let report = handle.wait().await;

        assert_eq!(report.id, id);
        assert_eq!(report.event, TerminalEvent::Succeeded);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(orch.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn nonzero_exit_reports_trimmed_stderr() {
        let orch = orchestrator("xfreerdp");
        let handle = orch
            .launch(shell("echo '  ERRCONNECT_LOGON_FAILURE  ' >&2; exit 131"))
            .unwrap();
        assert_eq!(
            handle.wait().await.event,
            TerminalEvent::Failed("ERRCONNECT_LOGON_FAILURE".into())
        );
    }

    #[tokio::test]
    async fn spawn_error_is_a_failure() {
        let orch = orchestrator("xfreerdp");
        let handle = orch
            .launch(CommandLine::new("/nonexistent/rdpconnect/xfreerdp", ["/v:host"]))
            .unwrap();
        match handle.wait().await.event {
            TerminalEvent::Failed(detail) => assert!(!detail.is_empty()),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(orch.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn cancel_waits_for_exit_and_wins() {
        let orch = orchestrator("xfreerdp");
        let handle = orch.launch(shell("exec sleep 30")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        assert!(handle.cancel().await);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(orch.state(), ConnectionState::Idle);
        assert_eq!(handle.wait().await.event, TerminalEvent::Cancelled);
    }

    #[tokio::test]
    async fn repeated_cancel_is_harmless() {
        let orch = orchestrator("xfreerdp");
        let handle = orch.launch(shell("exec sleep 30")).unwrap();
        let other = handle.canceller();

        let (a, b) = tokio::join!(handle.cancel(), other.cancel());
        assert!(a && b);
        assert_eq!(handle.wait().await.event, TerminalEvent::Cancelled);
    }

    #[tokio::test]
    async fn cancel_after_natural_exit_is_a_no_op() {
        let orch = orchestrator("xfreerdp");
        let handle = orch.launch(shell("exit 0")).unwrap();
        let canceller = handle.canceller();

        assert_eq!(handle.wait().await.event, TerminalEvent::Succeeded);
        assert!(!canceller.cancel().await);
    }

    #[tokio::test]
    async fn cancel_while_building_never_spawns() {
        let orch = Orchestrator::new(
            ClientBinary::new("/nonexistent/rdpconnect/xfreerdp"),
            Arc::new(SlowProber),
        )
        .unwrap();
        let mut config = Configuration::defaults();
        config.general.server_address = "10.0.0.5".into();
        config.redirect.printers = true;

        let handle = orch.connect(&config).unwrap();
        assert!(handle.cancel().await);
        // A spawn of the missing binary would have reported Failed.
        assert_eq!(handle.wait().await.event, TerminalEvent::Cancelled);
    }

    #[tokio::test]
    async fn second_connect_is_busy() {
        let orch = orchestrator("xfreerdp");
        let handle = orch.launch(shell("exec sleep 30")).unwrap();
        assert_ne!(orch.state(), ConnectionState::Idle);

        assert!(matches!(
            orch.launch(shell("exit 0")),
            Err(LauncherError::Busy)
        ));
        assert!(matches!(
            orch.connect(&Configuration::defaults()),
            Err(LauncherError::Busy)
        ));

        handle.cancel().await;
        handle.wait().await;
        let again = orch.launch(shell("exit 0")).unwrap();
        assert_eq!(again.wait().await.event, TerminalEvent::Succeeded);
    }

    #[tokio::test]
    async fn connect_runs_built_command() {
        // `true` ignores its arguments, prints nothing for `+version` and
        // exits 0, so the whole build-and-run path succeeds.
        let orch = orchestrator("true");
        let mut config = Configuration::defaults();
        config.general.server_address = "10.0.0.5".into();

        let mut states = orch.subscribe();
        let handle = orch.connect(&config).unwrap();
        assert_eq!(handle.wait().await.event, TerminalEvent::Succeeded);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ConnectionState::Idle);
    }

    fn cancel_state() -> (watch::Sender<bool>, CancelState) {
        let (tx, rx) = watch::channel(false);
        (tx, CancelState::new(rx))
    }

    #[test]
    fn requested_cancel_overrides_natural_outcome() {
        for natural in [
            TerminalEvent::Succeeded,
            TerminalEvent::Failed("exit status: 1".into()),
        ] {
            let (_tx, state) = cancel_state();
            state.phase.store(CANCEL_REQUESTED, Ordering::Release);
            assert!(state.is_cancel_requested());
            assert_eq!(state.settle(natural), TerminalEvent::Cancelled);
            assert_eq!(state.phase.load(Ordering::Acquire), CANCELLED);
        }

        let (_tx, state) = cancel_state();
        assert_eq!(
            state.settle(TerminalEvent::Succeeded),
            TerminalEvent::Succeeded
        );
        assert_eq!(state.phase.load(Ordering::Acquire), FINISHED);
    }

    #[tokio::test]
    async fn cancel_returns_when_worker_is_dropped() {
        // Never driven, then shut down: the spawned worker is dropped unpolled.
        let other = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let orch = Orchestrator::with_runtime(
            other.handle().clone(),
            ClientBinary::default(),
            Arc::new(StubProber),
        );
        let handle = orch.launch(shell("exec sleep 30")).unwrap();
        other.shutdown_background();

        let cancelled = tokio::time::timeout(Duration::from_secs(5), handle.cancel())
            .await
            .expect("cancel hung after the worker was dropped");
        assert!(!cancelled);
        assert!(matches!(
            handle.wait().await.event,
            TerminalEvent::Failed(_)
        ));
    }

    #[test]
    fn new_without_runtime_fails() {
        assert!(matches!(
            Orchestrator::new(ClientBinary::default(), Arc::new(StubProber)),
            Err(LauncherError::NoRuntime(_))
        ));
    }
}
