//! Headless tail: print frames to stdout as they stream in.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use openthermal_client::HttpStreamStore;
use openthermal_core::{PresentationStore, StreamError, StreamStore, WatchStats, run_watch};

pub fn run(
    endpoint: Option<String>,
    stream: Option<String>,
    token: Option<String>,
    format: &str,
    limit: u64,
) {
    let config = super::resolve_config(endpoint, stream, token);
    let store = match HttpStreamStore::new(config.clone()) {
        Ok(store) => store,
        Err(err) => super::fail(&err),
    };

    let rt = tokio::runtime::Runtime::new().unwrap();
    let result = rt.block_on(async {
        let cancel = super::cancel_on_ctrl_c();
        if format == "raw" {
            tail_raw(&store, &config.stream, cancel, limit).await
        } else {
            tail_decoded(&store, &config.stream, cancel, format == "json", limit).await
        }
    });
    if let Err(err) = result {
        super::fail(&err);
    }
}

/// Decode through the standard pipeline; one line per applied frame.
async fn tail_decoded(
    store: &HttpStreamStore,
    stream: &str,
    cancel: CancellationToken,
    json: bool,
    limit: u64,
) -> Result<(), StreamError> {
    let state = PresentationStore::new();
    let stats = Arc::new(WatchStats::new());
    let printed = Arc::new(AtomicU64::new(0));
    {
        let stats = Arc::clone(&stats);
        let printed = Arc::clone(&printed);
        let cancel = cancel.clone();
        state.on_change(move |s| {
            // The snapshot already covers the frame this notification is for.
            let Some(position) = stats.snapshot().last_position else {
                return;
            };
            // Frames past the limit may still apply while cancellation
            // propagates; they must not print.
            let n = printed.fetch_add(1, Ordering::Relaxed);
            if limit > 0 && n >= limit {
                return;
            }
            if json {
                println!("{}", super::frame_json(position, &s.frame));
            } else {
                println!("{}", super::frame_line(position, &s.frame));
            }
            if limit > 0 && n + 1 == limit {
                cancel.cancel();
            }
        });
    }

    let result = run_watch(store, stream, &state, &stats, cancel).await;

    let snap = stats.snapshot();
    eprintln!(
        "{} frame(s), {} malformed, {} idle tick(s)",
        snap.frames, snap.decode_errors, snap.empty_batches
    );
    result
}

/// Wire view: raw record bodies, no decoding, no contiguity checks.
async fn tail_raw(
    store: &HttpStreamStore,
    stream: &str,
    cancel: CancellationToken,
    limit: u64,
) -> Result<(), StreamError> {
    let cursor = store.check_tail(stream).await?;
    let mut subscription = store.subscribe(stream, cursor).await?;
    let mut printed = 0u64;
    loop {
        let event = tokio::select! {
            event = subscription.next() => event,
            _ = cancel.cancelled() => return Ok(()),
        };
        match event {
            Some(Ok(batch)) => {
                for record in batch.records {
                    println!("{}\t{}", record.position, record.body);
                    printed += 1;
                    if limit > 0 && printed >= limit {
                        return Ok(());
                    }
                }
            }
            Some(Err(err)) => return Err(err),
            None => return Ok(()),
        }
    }
}
