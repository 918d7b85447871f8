//! Idle timeout for relayed response bodies.
//!
//! The client timeout only covers the response head. Once the head has been
//! relayed, [`IdleTimeoutBody`] ends the stream with an error if the backend
//! goes quiet for longer than the same timeout between two frames.
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use axum::BoxError;
use bytes::Bytes;
use hyper::body::{Body, Frame, SizeHint};
use tokio::time::{Instant, Sleep, sleep};

/// Raised when a backend stops sending body frames.
#[derive(Debug, thiserror::Error)]
#[error("backend body stalled for {0:?}")]
pub struct BodyStalled(pub Duration);

/// Wraps a body and fails it after `idle_timeout` without a frame.
pub struct IdleTimeoutBody<B> {
    inner: B,
    idle_timeout: Duration,
    deadline: Pin<Box<Sleep>>,
    expired: bool,
}

impl<B> IdleTimeoutBody<B> {
    pub fn new(inner: B, idle_timeout: Duration) -> Self {
        Self {
            inner,
            idle_timeout,
            deadline: Box::pin(sleep(idle_timeout)),
            expired: false,
        }
    }
}

impl<B> Body for IdleTimeoutBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.expired {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(frame) => {
                let next = Instant::now() + this.idle_timeout;
                this.deadline.as_mut().reset(next);
                Poll::Ready(frame.map(|result| result.map_err(Into::into)))
            }
            Poll::Pending => match this.deadline.as_mut().poll(cx) {
                Poll::Ready(()) => {
                    this.expired = true;
                    tracing::warn!(
                        "Backend body stalled for {:?}, aborting relay",
                        this.idle_timeout
                    );
                    Poll::Ready(Some(Err(BodyStalled(this.idle_timeout).into())))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn is_end_stream(&self) -> bool {
        self.expired || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body_util::{BodyExt, Full};

    use super::*;

    /// Never yields a frame and never ends.
    struct Stalled;

    impl Body for Stalled {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_complete_body_passes_through() {
        let body = IdleTimeoutBody::new(
            Full::new(Bytes::from_static(b"payload")),
            Duration::from_secs(1),
        );
        let collected = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => panic!("unexpected body error: {e}"),
        };
        assert_eq!(collected, Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn test_stalled_body_fails_after_idle_timeout() {
        let started = std::time::Instant::now();
        let result = IdleTimeoutBody::new(Stalled, Duration::from_millis(100))
            .collect()
            .await;

        let error = match result {
            Ok(_) => panic!("stalled body should not complete"),
            Err(e) => e,
        };
        assert!(error.is::<BodyStalled>());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
