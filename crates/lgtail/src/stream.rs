//! Async stream adapter for log-shipper pipelines
//!
//! Each blocking `next` call runs on tokio's blocking pool, so a live
//! session can feed an async pipeline without stalling the runtime.

use crate::reader::EventLogReader;
use futures::Stream;
use lgtail_core::{
    cancel::CancellationToken,
    error::{Result, TailError},
    traits::PartReader,
    types::ReadOutcome,
};

/// Turn a reader into a stream of items
///
/// The stream ends on end of stream (batch mode) or cancellation, closing
/// the reader. A part file error surfaced by the reader is yielded and the
/// stream continues with the next part file; any other error is yielded and
/// ends the stream.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use lgtail::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let reader = FileEventLogReader::open("/var/log/app", TailConfig::live())?;
/// let cancel = CancellationToken::new();
/// let mut items = Box::pin(lgtail::stream::item_stream(reader, cancel.clone()));
///
/// while let Some(item) = items.next().await {
///     let item = item?;
///     println!("{} {:?}", item.timestamp, item.fields);
/// }
/// # Ok(())
/// # }
/// ```
pub fn item_stream<R>(
    reader: EventLogReader<R>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<R::Item>>
where
    R: PartReader + Send + 'static,
    R::Store: 'static,
    R::Item: Send + 'static,
{
    futures::stream::unfold(Some(reader), move |state| {
        let cancel = cancel.clone();
        async move {
            let mut reader = state?;
            let joined = tokio::task::spawn_blocking(move || {
                let outcome = reader.next(&cancel);
                (reader, outcome)
            })
            .await;

            match joined {
                Ok((reader, Ok(ReadOutcome::Item(item)))) => Some((Ok(item), Some(reader))),
                Ok((mut reader, Ok(_))) => {
                    if let Err(e) = reader.close() {
                        tracing::warn!("Failed to close event log: {}", e);
                    }
                    None
                }
                Ok((reader, Err(e))) if matches!(e, TailError::UnreadableSegment { .. }) => {
                    Some((Err(e), Some(reader)))
                }
                Ok((_reader, Err(e))) => Some((Err(e), None)),
                Err(e) => Some((
                    Err(TailError::Other(anyhow::anyhow!("Reader task failed: {}", e))),
                    None,
                )),
            }
        }
    })
}
