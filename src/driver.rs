//! Background task that drains a response body into a channel of [StreamOutcome]s

use core::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    config::StreamConfig,
    errors::{BoxError, StreamError},
    event::{EventKind, StreamEvent, StreamOutcome},
    event_stream::ChatEventStream,
};

/// Consumer side of a spawned stream.
///
/// Yields zero or more events, then at most one terminal outcome (`message_end` or an error), then `None`.
/// Dropping it cancels the driver task.
#[derive(Debug)]
pub struct ChatStream {
    receiver: mpsc::Receiver<StreamOutcome>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ChatStream {
    /// Next outcome, `None` once the driver has finished and everything was received
    pub async fn recv(&mut self) -> Option<StreamOutcome> {
        self.receiver.recv().await
    }

    /// Ask the driver to stop. It reports [StreamError::Cancelled] if the channel has room for it, then closes.
    pub fn cancel(&self) {
        self.cancel.cancel()
    }

    /// Token that cancels just this stream
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the driver task has exited. Outcomes may still be waiting in the channel.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Drains the stream and assembles the full answer.
    ///
    /// Fragments are appended in order, a `message_replace` swaps out everything so far. Returns the answer alongside the `message_end` event.
    pub async fn collect_answer(mut self) -> Result<(String, StreamEvent), StreamError> {
        let mut answer = String::new();
        while let Some(outcome) = self.recv().await {
            let event = outcome?;
            match event.event {
                EventKind::Message | EventKind::AgentMessage => answer.push_str(&event.answer),
                EventKind::MessageReplace => answer.clone_from(&event.answer),
                EventKind::MessageEnd => return Ok((answer, event)),
                _ => {}
            }
        }
        // only reachable when a cancellation outcome didn't fit in the channel
        Err(StreamError::Cancelled)
    }
}

impl Stream for ChatStream {
    type Item = StreamOutcome;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns a driver task over `body` and returns the receiving end.
///
/// `cancel` stops the stream from outside. The stream gets a child of it, so [ChatStream::cancel] or dropping the [ChatStream] never cancels the caller's token.
/// Pass [CancellationToken::new] if there's nothing to tie it to.
///
/// # Panics
///
/// Must be called from within a tokio runtime, same as [tokio::spawn].
pub fn spawn_stream<S, E, B>(body: S, config: &StreamConfig, cancel: CancellationToken) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
    B: AsRef<[u8]> + 'static,
{
    let (tx, receiver) = mpsc::channel(config.effective_capacity());
    let cancel = cancel.child_token();
    let task = tokio::spawn(drive(ChatEventStream::new(body), tx, cancel.clone()));
    ChatStream {
        receiver,
        cancel,
        task,
    }
}

/// How the driver loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Completed,
    Failed,
    Cancelled,
    ConsumerGone,
}

async fn drive<S, E, B>(
    events: ChatEventStream<S>,
    tx: mpsc::Sender<StreamOutcome>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<B, E>>,
    E: Into<BoxError>,
    B: AsRef<[u8]>,
{
    let mut events = Box::pin(events);
    let exit = run(events.as_mut(), &tx, &cancel).await;

    // body first so the connection is gone by the time the consumer sees the channel close
    drop(events);
    drop(tx);
    debug!(?exit, "chat stream driver finished");
}

async fn run<S, E, B>(
    mut events: Pin<&mut ChatEventStream<S>>,
    tx: &mpsc::Sender<StreamOutcome>,
    cancel: &CancellationToken,
) -> Exit
where
    S: Stream<Item = Result<B, E>>,
    E: Into<BoxError>,
    B: AsRef<[u8]>,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return report_cancelled(tx),
            next = events.next() => next,
        };
        // the event stream always ends on a terminal outcome, which returns below
        let Some(outcome) = next else {
            return Exit::Completed;
        };

        let exit = classify(&outcome);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return report_cancelled(tx),
            sent = tx.send(outcome) => {
                if sent.is_err() {
                    debug!("chat stream receiver dropped");
                    return Exit::ConsumerGone;
                }
            }
        }

        if let Some(exit) = exit {
            return exit;
        }
    }
}

/// Logs the outcome and says whether it ends the stream
fn classify(outcome: &StreamOutcome) -> Option<Exit> {
    match outcome {
        Ok(event) => {
            debug!(
                kind = %event.event,
                message_id = %event.message_id,
                answer_len = event.answer.len(),
                "chat stream event"
            );
            event.is_terminal().then_some(Exit::Completed)
        }
        Err(StreamError::Transport(e)) => {
            error!(error = %e, "chat stream transport failure");
            Some(Exit::Failed)
        }
        Err(e) => {
            warn!(error = %e, "chat stream failed");
            Some(Exit::Failed)
        }
    }
}

fn report_cancelled(tx: &mpsc::Sender<StreamOutcome>) -> Exit {
    match tx.try_send(Err(StreamError::Cancelled)) {
        Ok(()) => debug!("chat stream cancelled"),
        Err(TrySendError::Full(_)) => {
            debug!("chat stream cancelled, receiver is not draining so the outcome was dropped")
        }
        Err(TrySendError::Closed(_)) => debug!("chat stream cancelled after receiver dropped"),
    }
    Exit::Cancelled
}
