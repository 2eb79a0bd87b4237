//! Stream multiplexer: relays a running worker as typed events
//!
//! Worker stdout is framed into lines and `STREAM:` lines become
//! [`StreamEvent`]s in emission order. stderr lines become `progress`
//! events. Every stream ends with exactly one terminal event (`complete` or
//! `error`), except when the client has gone away, in which case the worker
//! is stopped and nothing more is written.
//!
//! The time budget also bounds delivery: a send blocked on a slow reader
//! gives up at the deadline, and the terminal event waits at most one grace
//! period beyond it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use amplifier_ipc::protocol::is_protocol_line;
use amplifier_ipc::{parse_line, IpcError, LineFramer, LineReader, WorkerLine};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant as Deadline;
use tokio_util::sync::CancellationToken;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::events::{CompleteData, StreamEvent};
use crate::launcher::{EndpointSpec, WorkerLauncher};
use crate::output::{OutputBuffer, WorkerOutput};
use crate::request::ExecutionRequest;

/// Events queued between the multiplexer task and the HTTP body
const EVENT_BUFFER: usize = 64;

/// Lifecycle of one streaming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Starting,
    Running,
    Completing,
    Failing,
    Aborted,
}

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Worker exited 0 and `complete` was sent
    Completed { execution_time_ms: u64 },
    /// Worker exited unsuccessfully
    Failed { exit_code: Option<i32> },
    /// Worker reported an error through the protocol or its final output
    WorkerError,
    /// Request failed validation; no process was started
    Rejected,
    LaunchFailed,
    TimedOut { terminated: bool },
    /// Client disconnected; nothing further was sent
    Aborted,
}

/// What happened to a queued event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Cancelled, or the receiver is gone
    Closed,
    /// The deadline passed while the channel was full
    Expired,
}

/// Sending half of a stream.
///
/// Emits are no-ops once the token is cancelled or the receiver is gone; a
/// dropped receiver cancels the token.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    pub fn channel(buffer: usize, cancel: CancellationToken) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx, cancel), rx)
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves once the receiver has been dropped
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Queue an event; `false` if the stream is already closed
    pub async fn emit(&self, event: StreamEvent) -> bool {
        self.deliver(event, None).await == Delivery::Sent
    }

    /// Queue an event, waiting for channel capacity no later than `deadline`
    pub async fn emit_before(&self, event: StreamEvent, deadline: Deadline) -> Delivery {
        self.deliver(event, Some(deadline)).await
    }

    async fn deliver(&self, event: StreamEvent, deadline: Option<Deadline>) -> Delivery {
        if self.is_closed() {
            debug!(event = event.name(), "Stream closed, dropping event");
            return Delivery::Closed;
        }

        let expiry = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        let name = event.name();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Delivery::Closed,
            sent = self.tx.send(event) => match sent {
                Ok(()) => Delivery::Sent,
                Err(_) => {
                    self.cancel.cancel();
                    Delivery::Closed
                }
            },
            _ = expiry => {
                warn!(event = name, "Client is not reading, dropping event at deadline");
                Delivery::Expired
            }
        }
    }
}

/// Receiving side of a spawned stream
pub struct StreamHandle {
    pub events: mpsc::Receiver<StreamEvent>,
    /// Cancelling stops the worker; tie it to the response body's lifetime
    pub cancel: CancellationToken,
    pub task: JoinHandle<StreamOutcome>,
}

/// Per-request state with an idempotent finalize
struct StreamSession {
    sink: EventSink,
    endpoint: String,
    phase: StreamPhase,
    finalized: bool,
    started: Instant,
    /// Set once the worker is running
    deadline: Option<Deadline>,
    grace_period: Duration,
}

impl StreamSession {
    fn new(sink: EventSink, endpoint: &str, grace_period: Duration) -> Self {
        Self {
            sink,
            endpoint: endpoint.to_string(),
            phase: StreamPhase::Starting,
            finalized: false,
            started: Instant::now(),
            deadline: None,
            grace_period,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn transition(&mut self, next: StreamPhase) {
        debug!(endpoint = %self.endpoint, from = ?self.phase, to = ?next, "Stream phase change");
        self.phase = next;
    }

    async fn emit(&self, event: StreamEvent) -> bool {
        if self.finalized {
            return false;
        }
        self.sink.emit(event).await
    }

    /// Relay a worker event, giving up when the time budget runs out
    async fn relay(&self, event: StreamEvent) -> Delivery {
        self.sink.deliver(event, self.deadline).await
    }

    /// Enter a final phase and send the terminal event. Only the first call has any effect.
    async fn finalize(&mut self, phase: StreamPhase, terminal: Option<StreamEvent>) -> bool {
        if self.finalized {
            return false;
        }
        self.finalized = true;
        self.transition(phase);

        let Some(event) = terminal else {
            return true;
        };
        match self.deadline {
            Some(at) => {
                let limit = at.max(Deadline::now()) + self.grace_period;
                self.sink.emit_before(event, limit).await == Delivery::Sent
            }
            None => self.sink.emit(event).await,
        }
    }
}

enum StreamEnd {
    Disconnected,
    Deadline,
    WorkerError(StreamEvent),
    Exited(Result<std::process::ExitStatus, ExecutionError>),
}

/// Runs workers and relays their output as [`StreamEvent`]s
#[derive(Clone)]
pub struct StreamMultiplexer {
    launcher: Arc<dyn WorkerLauncher>,
    grace_period: Duration,
    max_buffered_output: usize,
}

impl StreamMultiplexer {
    pub fn new(launcher: Arc<dyn WorkerLauncher>, grace_period: Duration, max_buffered_output: usize) -> Self {
        Self {
            launcher,
            grace_period,
            max_buffered_output,
        }
    }

    /// Run a request on a background task and hand back its event receiver
    pub fn spawn(&self, request: ExecutionRequest, endpoint: EndpointSpec) -> StreamHandle {
        let cancel = CancellationToken::new();
        let (sink, events) = EventSink::channel(EVENT_BUFFER, cancel.clone());
        let multiplexer = self.clone();

        let task = tokio::spawn(async move { multiplexer.run(&request, &endpoint, sink).await });

        StreamHandle { events, cancel, task }
    }

    /// Drive one request from launch to its terminal event
    pub async fn run(&self, request: &ExecutionRequest, endpoint: &EndpointSpec, sink: EventSink) -> StreamOutcome {
        let mut session = StreamSession::new(sink, &endpoint.name, self.grace_period);
        session
            .emit(StreamEvent::status("starting", request.starting_message()))
            .await;

        if let Err(e) = request.validate() {
            session
                .finalize(StreamPhase::Failing, Some(StreamEvent::error(e.to_string(), None, None)))
                .await;
            return StreamOutcome::Rejected;
        }

        if session.sink.is_closed() {
            debug!(endpoint = %endpoint.name, "Client gone before launch, not starting worker");
            session.finalize(StreamPhase::Aborted, None).await;
            return StreamOutcome::Aborted;
        }

        let mut worker = match self.launcher.launch(endpoint, &request.to_payload()).await {
            Ok(worker) => worker,
            Err(e) => {
                warn!(endpoint = %endpoint.name, "Worker launch failed: {}", e);
                let elapsed = session.elapsed_ms();
                session
                    .finalize(
                        StreamPhase::Failing,
                        Some(StreamEvent::error(e.to_string(), e.details(), Some(elapsed))),
                    )
                    .await;
                return StreamOutcome::LaunchFailed;
            }
        };
        session.transition(StreamPhase::Running);

        let cancel = session.sink.cancellation();
        let receiver_gone = session.sink.clone();
        let mut stdout = worker.take_stdout().map(|pipe| self.line_reader(pipe));
        let mut stderr = worker.take_stderr().map(|pipe| self.line_reader(pipe));
        let mut stderr_text = OutputBuffer::new(self.max_buffered_output);
        let mut final_output = OutputBuffer::new(self.max_buffered_output);

        let deadline_at = Deadline::now() + endpoint.timeout;
        session.deadline = Some(deadline_at);
        let deadline = tokio::time::sleep_until(deadline_at);
        tokio::pin!(deadline);

        let end = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break StreamEnd::Disconnected,
                _ = receiver_gone.closed() => break StreamEnd::Disconnected,
                _ = &mut deadline => break StreamEnd::Deadline,
                line = next_line(&mut stdout), if stdout.is_some() => match line {
                    Ok(Some(line)) => match classify_stdout(&endpoint.name, &line, &mut final_output) {
                        Some(event @ StreamEvent::Error(_)) => break StreamEnd::WorkerError(event),
                        Some(event) => {
                            if session.relay(event).await == Delivery::Expired {
                                break StreamEnd::Deadline;
                            }
                        }
                        None => {}
                    },
                    Ok(None) => stdout = None,
                    Err(e) => {
                        warn!(endpoint = %endpoint.name, "Failed reading worker stdout: {}", e);
                        stdout = None;
                    }
                },
                line = next_line(&mut stderr), if stderr.is_some() => match line {
                    Ok(Some(line)) => {
                        stderr_text.push_line(&line);
                        if !is_protocol_line(&line)
                            && !line.trim().is_empty()
                            && session.relay(StreamEvent::progress(line)).await == Delivery::Expired
                        {
                            break StreamEnd::Deadline;
                        }
                    }
                    Ok(None) => stderr = None,
                    Err(e) => {
                        warn!(endpoint = %endpoint.name, "Failed reading worker stderr: {}", e);
                        stderr = None;
                    }
                },
                status = worker.wait(), if stdout.is_none() && stderr.is_none() => break StreamEnd::Exited(status),
            }
        };

        let elapsed = session.elapsed_ms();

        match end {
            StreamEnd::Disconnected => {
                session.finalize(StreamPhase::Aborted, None).await;
                let termination = worker.terminate(self.grace_period).await;
                info!(endpoint = %endpoint.name, ?termination, "Client disconnected, worker stopped");
                StreamOutcome::Aborted
            }
            StreamEnd::Deadline => {
                warn!(
                    endpoint = %endpoint.name,
                    budget_secs = endpoint.timeout.as_secs(),
                    "Worker exceeded its time budget"
                );
                let termination = worker.terminate(self.grace_period).await;
                let err = ExecutionError::TimeoutError {
                    budget: endpoint.timeout,
                    execution_time_ms: elapsed,
                    terminated: termination.confirmed(),
                };
                session
                    .finalize(
                        StreamPhase::Failing,
                        Some(StreamEvent::error(err.to_string(), err.details(), Some(elapsed))),
                    )
                    .await;
                StreamOutcome::TimedOut {
                    terminated: termination.confirmed(),
                }
            }
            StreamEnd::WorkerError(event) => {
                info!(endpoint = %endpoint.name, "Worker reported an error, ending stream");
                session
                    .finalize(StreamPhase::Failing, Some(event.with_execution_time(elapsed)))
                    .await;
                worker.terminate(self.grace_period).await;
                StreamOutcome::WorkerError
            }
            StreamEnd::Exited(Ok(status)) if status.success() => {
                let output = WorkerOutput::parse(final_output.as_str());

                if let Some(app) = output.application_error() {
                    session
                        .finalize(
                            StreamPhase::Failing,
                            Some(StreamEvent::error(app.error, app.details, Some(elapsed))),
                        )
                        .await;
                    return StreamOutcome::WorkerError;
                }

                let complete = StreamEvent::Complete(CompleteData {
                    execution_time_ms: elapsed,
                    output: if output.is_empty() {
                        request.empty_output_placeholder().map(JsonValue::from)
                    } else {
                        Some(output.output())
                    },
                    metadata: output.metadata(),
                    message: request.completion_message().map(str::to_string),
                });
                session.finalize(StreamPhase::Completing, Some(complete)).await;
                info!(endpoint = %endpoint.name, execution_time_ms = elapsed, "Stream completed");
                StreamOutcome::Completed {
                    execution_time_ms: elapsed,
                }
            }
            StreamEnd::Exited(Ok(status)) => {
                warn!(endpoint = %endpoint.name, exit_code = ?status.code(), "Worker process failed");
                let details = (!stderr_text.is_empty()).then(|| stderr_text.into_string());
                session
                    .finalize(
                        StreamPhase::Failing,
                        Some(StreamEvent::error(
                            request.failure_message(status.code()),
                            details,
                            Some(elapsed),
                        )),
                    )
                    .await;
                StreamOutcome::Failed {
                    exit_code: status.code(),
                }
            }
            StreamEnd::Exited(Err(e)) => {
                warn!(endpoint = %endpoint.name, "Failed waiting for worker: {}", e);
                session
                    .finalize(
                        StreamPhase::Failing,
                        Some(StreamEvent::error(
                            "Failed to wait for worker process",
                            Some(e.to_string()),
                            Some(elapsed),
                        )),
                    )
                    .await;
                StreamOutcome::Failed { exit_code: None }
            }
        }
    }

    fn line_reader<R: AsyncRead + Unpin>(&self, pipe: R) -> LineReader<R> {
        LineReader::with_framer(pipe, LineFramer::with_max_line_bytes(self.max_buffered_output))
    }
}

async fn next_line<R: AsyncRead + Unpin>(reader: &mut Option<LineReader<R>>) -> Result<Option<String>, IpcError> {
    match reader {
        Some(reader) => reader.next_line().await,
        None => std::future::pending().await,
    }
}

/// Map one stdout line to an outbound event; free text is kept as the final result
fn classify_stdout(endpoint: &str, line: &str, final_output: &mut OutputBuffer) -> Option<StreamEvent> {
    match parse_line(line) {
        WorkerLine::Event(event) => Some(event.into()),
        WorkerLine::Unrecognized { kind } => {
            debug!(endpoint, kind = %kind, "Dropping unrecognized worker event");
            None
        }
        WorkerLine::Malformed { error } => {
            warn!(endpoint, "Dropping malformed worker event: {}", error);
            None
        }
        WorkerLine::Plain(text) => {
            final_output.push_line(&text);
            None
        }
        WorkerLine::Blank => None,
    }
}
