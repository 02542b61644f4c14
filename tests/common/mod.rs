#![allow(dead_code)]

use std::{
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::Stream;

pub const MESSAGE_END: &str = r#"data: {"event": "message_end", "task_id": "t-1", "id": "m-1", "conversation_id": "c-1", "created_at": 1705395332, "metadata": {"usage": {"prompt_tokens": 1033, "prompt_unit_price": "0.001", "prompt_price_unit": "0.001", "prompt_price": "0.0010330", "completion_tokens": 135, "completion_unit_price": "0.002", "completion_price_unit": "0.001", "completion_price": "0.0002700", "total_tokens": 1168, "total_price": "0.0013030", "currency": "USD", "latency": 1.381760165997548}}}"#;

pub fn message(answer: &str) -> String {
    format!(
        r#"data: {{"event": "message", "task_id": "t-1", "id": "m-1", "answer": "{answer}", "created_at": 1705395332, "conversation_id": "c-1"}}"#
    )
}

/// One chunk per line, each with its LF
pub fn lines<I, L>(lines: I) -> Vec<Result<Bytes, std::io::Error>>
where
    I: IntoIterator<Item = L>,
    L: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| Ok(Bytes::from(format!("{}\n", line.as_ref()))))
        .collect()
}

/// Counts how often a body is polled and dropped
#[derive(Clone, Default)]
pub struct Probe {
    polls: Arc<AtomicUsize>,
    drops: Arc<AtomicUsize>,
}

impl Probe {
    pub fn wrap<S>(&self, inner: S) -> TrackedBody<S> {
        TrackedBody {
            inner,
            polls: self.polls.clone(),
            drops: self.drops.clone(),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

pub struct TrackedBody<S> {
    inner: S,
    polls: Arc<AtomicUsize>,
    drops: Arc<AtomicUsize>,
}

impl<S> Stream for TrackedBody<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for TrackedBody<S> {
    fn drop(&mut self) {
        let previous = self.drops.fetch_add(1, Ordering::SeqCst);
        assert_eq!(previous, 0, "body released twice");
    }
}
