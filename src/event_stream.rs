//! Pull-based stream of decoded events, for when you'd rather poll than spawn a driver task

use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures_core::{FusedStream, Stream};
use pin_project_lite::pin_project;

use crate::{
    decoder::decode_frame,
    errors::BoxError,
    event::StreamOutcome,
    frame::FrameStream,
};

pin_project! {
    /// [`Stream`] of [`StreamOutcome`]s read from a body of `data:` frames.
    ///
    /// Finishes right after the first terminal outcome: a `message_end` event or any error.
    /// The inner body is dropped at that point, so the connection is released even if this stream is kept around.
    #[derive(Debug)]
    pub struct ChatEventStream<S> {
        #[pin]
        state: ChatEventStreamState<S>,
    }
}

pin_project! {
    #[derive(Debug)]
    #[project = ChatEventStreamProjection]
    enum ChatEventStreamState<S> {
        Active {
            #[pin]
            frames: FrameStream<S>,
        },
        Inactive,
    }
}

impl<S> ChatEventStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            state: ChatEventStreamState::Active {
                frames: FrameStream::new(stream),
            },
        }
    }
}

impl<S, E, B> Stream for ChatEventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    E: Into<BoxError>,
    B: AsRef<[u8]>,
{
    type Item = StreamOutcome;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let frames = match this.state.as_mut().project() {
            ChatEventStreamProjection::Active { frames } => frames,
            ChatEventStreamProjection::Inactive => return Poll::Ready(None),
        };

        let outcome = match ready!(frames.poll_next(cx)) {
            Some(Ok(frame)) => decode_frame(frame),
            Some(Err(e)) => Err(e.into()),
            // frames always report EOF as an error before ending
            None => {
                this.state.set(ChatEventStreamState::Inactive);
                return Poll::Ready(None);
            }
        };

        let terminal = match &outcome {
            Ok(event) => event.is_terminal(),
            Err(_) => true,
        };
        if terminal {
            this.state.set(ChatEventStreamState::Inactive);
        }
        Poll::Ready(Some(outcome))
    }
}

impl<S, E, B> FusedStream for ChatEventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    E: Into<BoxError>,
    B: AsRef<[u8]>,
{
    fn is_terminated(&self) -> bool {
        matches!(self.state, ChatEventStreamState::Inactive)
    }
}
