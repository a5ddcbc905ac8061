//! # Progress Stream
//!
//! Consumer side of a streaming run. The scheduler sends into an unbounded
//! channel, so a slow reader never holds it back, and dropping the stream
//! leaves in-flight nodes running to completion.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use super::events::ProgressEvent;
use crate::error::{GraphError, Result};
use crate::state::LearningState;

/// Events of one run, ending with `Finished` or `Failed`
#[derive(Debug)]
pub struct ProgressStream {
    inner: UnboundedReceiverStream<ProgressEvent>,
}

impl ProgressStream {
    pub(crate) fn new(rx: UnboundedReceiver<ProgressEvent>) -> Self {
        Self {
            inner: UnboundedReceiverStream::new(rx),
        }
    }

    /// Drain the stream and return the final state.
    pub async fn finish(mut self) -> Result<LearningState> {
        while let Some(event) = self.next().await {
            match event {
                ProgressEvent::Finished { final_state } => return Ok(*final_state),
                ProgressEvent::Failed { error } => return Err(error),
                ProgressEvent::NodeCompleted { .. } => {}
            }
        }
        Err(GraphError::Scheduler(
            "stream closed without a terminal event".to_string(),
        ))
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
