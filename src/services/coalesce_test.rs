use serde_json::Value;
use tokio::time::sleep;

use super::*;
use crate::services::stream::StreamHandle;

const WINDOW: Duration = Duration::from_millis(50);

fn setup() -> (BroadcastCoalescer, Arc<StreamRegistry>, StreamHandle) {
    let streams = Arc::new(StreamRegistry::new(8));
    let handle = streams.attach();
    let coalescer = BroadcastCoalescer::spawn(streams.clone(), WINDOW);
    (coalescer, streams, handle)
}

async fn next_batch(handle: &mut StreamHandle) -> Value {
    let frame = handle.rx.recv().await.expect("stream closed without a frame");
    serde_json::from_str(&frame).expect("frame should be valid JSON")
}

fn update_ids(batch: &Value) -> Vec<&str> {
    batch["updates"]
        .as_array()
        .expect("updates array")
        .iter()
        .map(|u| u["id"].as_str().expect("update id"))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn repeated_submissions_dedupe_to_last_write() {
    let (coalescer, _streams, mut handle) = setup();

    coalescer.submit("column-1", "<div>stale</div>");
    coalescer.submit("column-1", "<div>fresh</div>");

    let batch = next_batch(&mut handle).await;
    assert_eq!(update_ids(&batch), vec!["column-1"]);
    assert_eq!(batch["updates"][0]["html"], "<div>fresh</div>");
}

#[tokio::test(start_paused = true)]
async fn distinct_fragments_flush_as_one_batch() {
    let (coalescer, _streams, mut handle) = setup();

    coalescer.submit("column-1", "<div>a</div>");
    coalescer.submit("column-2", "<div>b</div>");

    let batch = next_batch(&mut handle).await;
    assert!(batch["batchId"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(update_ids(&batch), vec!["column-1", "column-2"]);
}

#[tokio::test(start_paused = true)]
async fn nothing_flushes_before_the_window_expires() {
    let (coalescer, _streams, mut handle) = setup();

    coalescer.submit("column-1", "<div>a</div>");
    sleep(WINDOW / 2).await;

    assert!(handle.rx.try_recv().is_err(), "flush fired before the debounce window");

    let batch = next_batch(&mut handle).await;
    assert_eq!(update_ids(&batch), vec!["column-1"]);
}

#[tokio::test(start_paused = true)]
async fn separate_windows_produce_separate_batch_ids() {
    let (coalescer, _streams, mut handle) = setup();

    coalescer.submit("column-1", "<div>a</div>");
    let first = next_batch(&mut handle).await;

    coalescer.submit("column-1", "<div>b</div>");
    let second = next_batch(&mut handle).await;

    assert_ne!(first["batchId"], second["batchId"]);
    assert_eq!(second["updates"][0]["html"], "<div>b</div>");
}

#[tokio::test(start_paused = true)]
async fn quiet_coalescer_broadcasts_nothing() {
    let (coalescer, _streams, mut handle) = setup();

    sleep(WINDOW * 4).await;

    assert!(handle.rx.try_recv().is_err());
    drop(coalescer);
}

#[tokio::test(start_paused = true)]
async fn empty_fragment_id_is_dropped() {
    let (coalescer, _streams, mut handle) = setup();

    coalescer.submit("", "<div>orphan</div>");
    coalescer.submit("column-1", "<div>kept</div>");

    let batch = next_batch(&mut handle).await;
    assert_eq!(update_ids(&batch), vec!["column-1"]);
}
