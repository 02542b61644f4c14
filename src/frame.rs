//! Line splitting and `data:` frame extraction

use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::{
    constants::{DATA_PREFIX, LF},
    errors::{BoxError, TransportError},
};

/// A full line from the body, without its LF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLine<'a> {
    /// Everything after `data:`, untrimmed
    Data(&'a [u8]),
    /// Blank lines, `: keep-alive` comments, `event:` lines, anything else
    Ignored,
}

/// Classifies a single line (without the trailing LF)
pub fn parse_frame(line: &[u8]) -> RawLine<'_> {
    match line.strip_prefix(DATA_PREFIX.as_slice()) {
        Some(payload) => RawLine::Data(payload),
        None => RawLine::Ignored,
    }
}

/// Tries to read the next [RawLine] from `bytes`. Returns [None] if `bytes` holds no LF yet, otherwise the line and whatever follows its LF.
pub fn parse_line(bytes: &[u8]) -> Option<(RawLine<'_>, &[u8])> {
    let eol = memchr::memchr(LF, bytes)?;
    Some((parse_frame(&bytes[..eol]), &bytes[eol + 1..]))
}

/// Pulls complete lines off the front of `buffer` until one is a data frame and returns its payload.
/// Non-data lines are consumed and dropped. Returns [None] once no complete line is left, any partial line stays in the buffer.
pub fn next_frame_from_buffer(buffer: &mut BytesMut) -> Option<Bytes> {
    loop {
        let (frame, rest) = parse_line(buffer)?;
        let consumed = buffer.len() - rest.len();
        // the payload is always the tail of the line
        let payload_len = match frame {
            RawLine::Data(payload) => Some(payload.len()),
            RawLine::Ignored => None,
        };

        let line = buffer.split_to(consumed).freeze();
        let eol = consumed - 1;
        match payload_len {
            Some(len) => return Some(line.slice(eol - len..eol)),
            None => tracing::trace!(len = eol, "skipping non-data line"),
        }
    }
}

pin_project! {
    /// [`Stream`] that turns a stream of body chunks into `data:` frame payloads.
    ///
    /// The body is expected to be cut short by the consumer once a terminal event shows up, so running out of bytes is reported as [`TransportError::UnexpectedEof`] rather than a clean end.
    /// After yielding any error the stream is finished and only returns [None].
    #[derive(Debug)]
    pub struct FrameStream<S> {
        #[pin]
        state: FrameStreamState<S>,
    }
}

pin_project! {
    #[derive(Debug)]
    #[project = FrameStreamProjection]
    enum FrameStreamState<S> {
        Active { #[pin] stream: S, buffer: BytesMut },
        Terminated,
    }
}

impl<S> FrameStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            state: FrameStreamState::Active {
                stream,
                buffer: BytesMut::new(),
            },
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, FrameStreamState::Terminated)
    }
}

impl<S, E, B> Stream for FrameStream<S>
where
    S: Stream<Item = Result<B, E>>,
    E: Into<BoxError>,
    B: AsRef<[u8]>,
{
    type Item = Result<Bytes, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            let (mut stream, buffer) = match this.state.as_mut().project() {
                FrameStreamProjection::Active { stream, buffer } => (stream, buffer),
                FrameStreamProjection::Terminated => return Poll::Ready(None),
            };

            if let Some(frame) = next_frame_from_buffer(buffer) {
                return Poll::Ready(Some(Ok(frame)));
            }

            match ready!(stream.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => buffer.extend_from_slice(bytes.as_ref()),
                Some(Err(e)) => {
                    this.state.set(FrameStreamState::Terminated);
                    return Poll::Ready(Some(Err(TransportError::Read(e.into()))));
                }
                None => {
                    // a line without its LF is dropped, same as a line that never finished arriving
                    let trailing = buffer.len();
                    this.state.set(FrameStreamState::Terminated);
                    return Poll::Ready(Some(Err(TransportError::UnexpectedEof { trailing })));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::prelude::*;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + use<> {
        futures::stream::iter(
            parts
                .iter()
                .map(|part| Ok(Bytes::from_static(part.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect_frames<S>(stream: FrameStream<S>) -> (Vec<Bytes>, Option<TransportError>)
    where
        FrameStream<S>: Stream<Item = Result<Bytes, TransportError>>,
    {
        let results = stream.collect::<Vec<_>>().await;
        let mut frames = Vec::new();
        let mut error = None;
        for result in results {
            match result {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    assert!(error.is_none(), "more than one error");
                    error = Some(e);
                }
            }
        }
        (frames, error)
    }

    #[test]
    fn parse_frame_strips_exactly_the_prefix() {
        assert_eq!(parse_frame(b"data: {}"), RawLine::Data(b" {}"));
        assert_eq!(parse_frame(b"data:{}"), RawLine::Data(b"{}"));
        assert_eq!(parse_frame(b"data:"), RawLine::Data(b""));
        assert_eq!(parse_frame(b""), RawLine::Ignored);
        assert_eq!(parse_frame(b": ping"), RawLine::Ignored);
        assert_eq!(parse_frame(b"event: message"), RawLine::Ignored);
        assert_eq!(parse_frame(b" data: {}"), RawLine::Ignored);
        assert_eq!(parse_frame(b"DATA: {}"), RawLine::Ignored);
    }

    #[test]
    fn parse_line_needs_lf() {
        assert_eq!(parse_line(b"data: {}"), None);
        assert_eq!(
            parse_line(b"data: {}\nrest"),
            Some((RawLine::Data(b" {}"), b"rest".as_slice()))
        );
        assert_eq!(parse_line(b"\n"), Some((RawLine::Ignored, b"".as_slice())));
    }

    #[test]
    fn buffer_keeps_partial_line() {
        let mut buffer = BytesMut::from(&b": keep-alive\n\ndata: one\ndata: tw"[..]);
        assert_eq!(next_frame_from_buffer(&mut buffer), Some(Bytes::from_static(b" one")));
        assert_eq!(next_frame_from_buffer(&mut buffer), None);
        assert_eq!(&buffer[..], b"data: tw");
    }

    #[test]
    fn buffer_agrees_with_parse_frame() {
        let lines: [&[u8]; 7] = [
            b"data: {}",
            b"data:",
            b"DATA: {}",
            b" data: x",
            b": ping",
            b"",
            b"data:data: x",
        ];
        for line in lines {
            let mut buffer = BytesMut::from(line);
            buffer.extend_from_slice(b"\n");
            let expected = match parse_frame(line) {
                RawLine::Data(payload) => Some(Bytes::copy_from_slice(payload)),
                RawLine::Ignored => None,
            };
            assert_eq!(next_frame_from_buffer(&mut buffer), expected, "{line:?}");
            assert!(buffer.is_empty());
        }
    }

    #[tokio::test]
    async fn yields_data_frames_and_skips_the_rest() {
        let (frames, error) = collect_frames(FrameStream::new(chunks(&[
            ": comment\n",
            "\n",
            "event: message\n",
            "data: {\"a\":1}\n",
            "\n",
            "data:{\"b\":2}\n",
        ])))
        .await;

        assert_eq!(
            frames,
            vec![
                Bytes::from_static(b" {\"a\":1}"),
                Bytes::from_static(b"{\"b\":2}")
            ]
        );
        assert!(matches!(error, Some(TransportError::UnexpectedEof { trailing: 0 })));
    }

    #[tokio::test]
    async fn lines_split_across_chunks() {
        let (frames, _) = collect_frames(FrameStream::new(chunks(&[
            "da",
            "ta: hel",
            "",
            "lo\r\ndata: wor",
            "ld\n",
        ])))
        .await;

        // CR is left in place, it's JSON whitespace as far as the decoder cares
        assert_eq!(
            frames,
            vec![Bytes::from_static(b" hello\r"), Bytes::from_static(b" world")]
        );
    }

    #[tokio::test]
    async fn several_frames_in_one_chunk() {
        let (frames, _) =
            collect_frames(FrameStream::new(chunks(&["data: 1\ndata: 2\n\ndata: 3\n"]))).await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], Bytes::from_static(b" 3"));
    }

    #[tokio::test]
    async fn unterminated_tail_is_reported_not_yielded() {
        let (frames, error) =
            collect_frames(FrameStream::new(chunks(&["data: 1\n", "data: 2"]))).await;
        assert_eq!(frames, vec![Bytes::from_static(b" 1")]);
        assert!(matches!(error, Some(TransportError::UnexpectedEof { trailing: 7 })));
    }

    #[tokio::test]
    async fn transport_errors_end_the_stream() {
        let mut stream = FrameStream::new(futures::stream::iter(vec![
            Ok::<_, &str>(Bytes::from_static(b"data: 1\n")),
            Err("connection reset"),
            Ok::<_, &str>(Bytes::from_static(b"data: 2\n")),
        ]));

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b" 1"));
        match stream.next().await {
            Some(Err(TransportError::Read(e))) => assert_eq!(e.to_string(), "connection reset"),
            other => panic!("expected read error, got {other:?}"),
        }
        assert!(stream.is_terminated());
        assert!(stream.next().await.is_none());
    }
}
