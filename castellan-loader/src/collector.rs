//! Reactive batch collector for `save_batch_async(stream)`.
//!
//! Accepts a `(timeout, max_items, collect_errors)` triple; on timeout or on
//! reaching `max_items` it stops pulling from the upstream stream and returns
//! whatever it has already collected rather than failing the whole batch.

use std::time::Duration;

use futures::{Stream, StreamExt};

/// Options controlling how a result stream is drained.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorOptions {
    pub timeout: Option<Duration>,
    pub max_items: Option<usize>,
    pub collect_errors: bool,
}

impl CollectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn collect_errors(mut self, collect_errors: bool) -> Self {
        self.collect_errors = collect_errors;
        self
    }
}

/// Drains `stream` under the given options, returning every item observed
/// before a stopping condition (end of stream, `max_items`, timeout, or the
/// first error when `collect_errors` is false) was hit. A timeout never
/// discards items already pulled off the stream: `items` lives in this
/// function's own frame, not inside the raced-against future, so it survives
/// the `tokio::select!` branch that loses.
pub async fn collect<T, E>(
    mut stream: impl Stream<Item = Result<T, E>> + Unpin,
    options: CollectorOptions,
) -> Vec<Result<T, E>> {
    let deadline = options.timeout.map(|d| tokio::time::Instant::now() + d);
    let mut items = Vec::new();
    loop {
        let next = stream.next();
        let item = match deadline {
            Some(deadline) => {
                tokio::select! {
                    item = next => item,
                    _ = tokio::time::sleep_until(deadline) => break,
                }
            }
            None => next.await,
        };
        let Some(item) = item else { break };
        let is_err = item.is_err();
        items.push(item);
        if is_err && !options.collect_errors {
            break;
        }
        if let Some(max) = options.max_items {
            if items.len() >= max {
                break;
            }
        }
    }
    items
}
