//! Line-delimited JSON ingress
//!
//! Each input line is one [`InboundMessage`]. Messages are dispatched to a
//! worker per conversation, so turns of one conversation are handled in input
//! order while different conversations run concurrently.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chat_agent_agent::TurnReport;
use chat_agent_core::InboundMessage;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};

use crate::session::SessionManager;
use crate::ServerError;

/// A completed turn, as written to the output stream
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedTurn {
    pub conversation_id: String,
    #[serde(flatten)]
    pub report: TurnReport,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngressStats {
    /// Well-formed messages dispatched
    pub received: usize,
    /// Lines that were not a valid message
    pub malformed: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Parse one input line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<InboundMessage>, ServerError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let message: InboundMessage = serde_json::from_str(line)
        .map_err(|e| ServerError::InvalidRequest(format!("malformed message: {}", e)))?;
    if message.conversation_id.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "conversation_id must not be empty".to_string(),
        ));
    }
    Ok(Some(message))
}

/// Routes messages to one worker per active conversation.
///
/// A worker retires after `idle` without a message. Its route is dropped when
/// the worker is reaped; a message for a retired conversation spawns a new
/// worker that first waits for its predecessor to drain.
struct Dispatcher {
    sessions: Arc<SessionManager>,
    output: mpsc::UnboundedSender<ProcessedTurn>,
    idle: Duration,
    routes: HashMap<String, Route>,
    workers: JoinSet<WorkerReport>,
    stats: IngressStats,
}

struct Route {
    queue: mpsc::UnboundedSender<InboundMessage>,
    /// Resolves once the worker behind `queue` has exited
    retired: oneshot::Receiver<()>,
}

struct WorkerReport {
    conversation_id: String,
    completed: usize,
    failed: usize,
}

impl Dispatcher {
    fn new(
        sessions: Arc<SessionManager>,
        output: mpsc::UnboundedSender<ProcessedTurn>,
        idle: Duration,
    ) -> Self {
        Self {
            sessions,
            output,
            idle,
            routes: HashMap::new(),
            workers: JoinSet::new(),
            stats: IngressStats::default(),
        }
    }

    /// Conversations that currently have a worker
    fn active(&self) -> usize {
        self.routes.len()
    }

    fn dispatch(&mut self, message: InboundMessage) {
        self.stats.received += 1;

        let message = match self.routes.get(&message.conversation_id) {
            Some(route) => match route.queue.send(message) {
                Ok(()) => return,
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let id = message.conversation_id.clone();
        let predecessor = self.routes.remove(&id).map(|route| route.retired);
        let (queue, inbox) = mpsc::unbounded_channel();
        let (done, retired) = oneshot::channel();
        self.workers.spawn(conversation_worker(
            id.clone(),
            Arc::clone(&self.sessions),
            inbox,
            self.output.clone(),
            self.idle,
            predecessor,
            done,
        ));
        if let Err(mpsc::error::SendError(message)) = queue.send(message) {
            self.stats.failed += 1;
            tracing::error!(
                conversation_id = %message.conversation_id,
                "Conversation worker is gone"
            );
        }
        self.routes.insert(id, Route { queue, retired });
    }

    fn reap(&mut self, result: Result<WorkerReport, JoinError>) {
        match result {
            Ok(report) => {
                self.stats.completed += report.completed;
                self.stats.failed += report.failed;
                let retired = self
                    .routes
                    .get(&report.conversation_id)
                    .is_some_and(|route| route.queue.is_closed());
                if retired {
                    self.routes.remove(&report.conversation_id);
                    tracing::debug!(
                        conversation_id = %report.conversation_id,
                        active = self.routes.len(),
                        "Conversation worker retired"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Conversation worker panicked");
                self.routes.retain(|_, route| !route.queue.is_closed());
            }
        }
    }

    /// Close every queue and wait for queued turns to finish
    async fn finish(mut self) -> IngressStats {
        self.routes.clear();
        while let Some(result) = self.workers.join_next().await {
            self.reap(result);
        }
        self.stats
    }
}

enum Event {
    Shutdown,
    Line(std::io::Result<Option<String>>),
    Retired(Result<WorkerReport, JoinError>),
}

/// Read messages until EOF or `shutdown` resolves, then wait for every queued
/// turn to finish.
///
/// A conversation's worker retires after `worker_idle` without input.
pub async fn serve_lines<R, F>(
    reader: R,
    sessions: Arc<SessionManager>,
    output: mpsc::UnboundedSender<ProcessedTurn>,
    worker_idle: Duration,
    shutdown: F,
) -> Result<IngressStats, ServerError>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let mut dispatcher = Dispatcher::new(sessions, output, worker_idle);

    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        let event = tokio::select! {
            _ = &mut shutdown => Event::Shutdown,
            Some(result) = dispatcher.workers.join_next(), if !dispatcher.workers.is_empty() => {
                Event::Retired(result)
            }
            line = lines.next_line() => Event::Line(line),
        };

        let line = match event {
            Event::Shutdown => {
                tracing::info!("Shutdown requested, finishing in-flight turns");
                break;
            }
            Event::Retired(result) => {
                dispatcher.reap(result);
                continue;
            }
            Event::Line(line) => line?,
        };
        let Some(line) = line else {
            tracing::info!("Input closed");
            break;
        };

        match parse_line(&line) {
            Ok(Some(message)) => dispatcher.dispatch(message),
            Ok(None) => {}
            Err(e) => {
                dispatcher.stats.malformed += 1;
                tracing::warn!(error = %e, "Skipping input line");
            }
        }
    }

    let stats = dispatcher.finish().await;
    tracing::info!(
        received = stats.received,
        malformed = stats.malformed,
        completed = stats.completed,
        failed = stats.failed,
        "Ingress finished"
    );
    Ok(stats)
}

async fn conversation_worker(
    conversation_id: String,
    sessions: Arc<SessionManager>,
    mut inbox: mpsc::UnboundedReceiver<InboundMessage>,
    output: mpsc::UnboundedSender<ProcessedTurn>,
    idle: Duration,
    predecessor: Option<oneshot::Receiver<()>>,
    _done: oneshot::Sender<()>,
) -> WorkerReport {
    if let Some(predecessor) = predecessor {
        // resolves with an error once the previous worker drops its sender
        let _ = predecessor.await;
    }

    let mut report = WorkerReport {
        conversation_id,
        completed: 0,
        failed: 0,
    };
    loop {
        let message = match tokio::time::timeout(idle, inbox.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_elapsed) => {
                inbox.close();
                match inbox.try_recv() {
                    Ok(message) => message,
                    Err(_) => break,
                }
            }
        };
        run_turn(&sessions, message, &output, &mut report).await;
    }
    report
}

async fn run_turn(
    sessions: &SessionManager,
    message: InboundMessage,
    output: &mpsc::UnboundedSender<ProcessedTurn>,
    report: &mut WorkerReport,
) {
    let conversation_id = message.conversation_id.clone();
    match sessions.handle_turn(message).await {
        Ok(turn) => {
            report.completed += 1;
            // a closed output only loses the echo; the turn already ran
            let _ = output.send(ProcessedTurn {
                conversation_id,
                report: turn,
            });
        }
        Err(e) => {
            report.failed += 1;
            tracing::warn!(conversation_id = %conversation_id, error = %e, "Turn failed");
        }
    }
}
