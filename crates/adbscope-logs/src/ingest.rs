use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::parser::LineParser;
use crate::registry::RefreshHandle;
use crate::table::RecordTable;

/// Yield to the runtime after this many appended records
const YIELD_EVERY: u64 = 10;

/// Flush pending pid registrations after this long without input
const FLUSH_IDLE: Duration = Duration::from_millis(200);

/// Drives one logcat stream into the record table
pub struct StreamIngestor {
    parser: LineParser,
    table: RecordTable,
    refresh: RefreshHandle,
    dropped: Arc<AtomicU64>,
}

impl StreamIngestor {
    pub fn new(table: RecordTable, refresh: RefreshHandle) -> Self {
        Self {
            parser: LineParser::new(),
            table,
            refresh,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter of lines rejected by the parser
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    /// Consume the reader line by line until EOF, error, or cancellation.
    /// Pids seen for the first time are batched toward the refresher; the
    /// batch flushes every few records and after a short idle gap.
    pub async fn run<R>(self, reader: R, cancel: CancellationToken)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut pending: Vec<i32> = Vec::new();
        let mut appended: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Some(pid) = self.ingest_line(&line) {
                            if !self.table.registry().contains(pid) && !pending.contains(&pid) {
                                pending.push(pid);
                            }
                            appended += 1;
                            if appended % YIELD_EVERY == 0 {
                                self.flush(&mut pending);
                                tokio::task::yield_now().await;
                            }
                        }
                    }
                    Ok(None) => {
                        debug!("logcat stream ended after {appended} records");
                        break;
                    }
                    Err(e) => {
                        warn!("logcat stream read failed: {e}");
                        break;
                    }
                },
                _ = tokio::time::sleep(FLUSH_IDLE), if !pending.is_empty() => {
                    self.flush(&mut pending);
                }
            }
        }

        self.flush(&mut pending);
        self.table.mark_stream_ended();
    }

    /// Parse and append one line. Returns the pid on success.
    fn ingest_line(&self, line: &str) -> Option<i32> {
        match self.parser.parse(line) {
            Some(record) => {
                let pid = record.pid();
                let seq = self.table.store().append(record);
                self.table.on_record_appended(seq);
                Some(pid)
            }
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("discarding unparsed line: {line}");
                None
            }
        }
    }

    fn flush(&self, pending: &mut Vec<i32>) {
        if !pending.is_empty() {
            self.refresh.request(mem::take(pending));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessRegistry;
    use crate::store::RecordStore;
    use crate::table::ViewEvent;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn new_table() -> (RecordTable, UnboundedReceiver<ViewEvent>) {
        RecordTable::new(RecordStore::new(), ProcessRegistry::new())
    }

    #[tokio::test]
    async fn ingests_lines_and_counts_rejects() {
        let (table, mut events) = new_table();
        let (refresh, mut batches) = RefreshHandle::channel();
        let ingestor = StreamIngestor::new(table.clone(), refresh);
        let dropped = ingestor.dropped_counter();

        let input = b"\
2020-01-01 10:00:00.000 111 222 I MyTag: hello
--------- beginning of main
2020-01-01 10:00:01.000 333 444 E OtherTag: boom
";
        ingestor.run(&input[..], CancellationToken::new()).await;

        assert_eq!(table.store().len(), 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(dropped.load(Ordering::Relaxed), 1);
        assert_eq!(table.store().get(0).unwrap().message(), "hello");
        assert_eq!(table.store().get(1).unwrap().tag(), "OtherTag");

        // both pids were unseen, so they flush as one batch at EOF
        assert_eq!(batches.recv().await.unwrap(), vec![111, 333]);

        assert_eq!(events.try_recv().unwrap(), ViewEvent::RecordAppended(0));
        assert_eq!(events.try_recv().unwrap(), ViewEvent::RecordAppended(1));
        assert_eq!(events.try_recv().unwrap(), ViewEvent::StreamEnded);
    }

    #[tokio::test]
    async fn repeated_pids_are_requested_once() {
        let (table, _events) = new_table();
        let (refresh, mut batches) = RefreshHandle::channel();
        let ingestor = StreamIngestor::new(table.clone(), refresh);

        let input = b"\
01-01 00:00:00.000 111 1 I Tag: one
01-01 00:00:00.000 111 2 I Tag: two
01-01 00:00:00.000 111 3 I Tag: three
";
        ingestor.run(&input[..], CancellationToken::new()).await;

        assert_eq!(table.store().len(), 3);
        assert_eq!(batches.recv().await.unwrap(), vec![111]);
        assert!(batches.try_recv().is_err());
    }

    #[tokio::test]
    async fn known_pids_are_not_requested() {
        let (table, _events) = new_table();
        table.registry().ensure_known([111]);
        let (refresh, mut batches) = RefreshHandle::channel();
        let ingestor = StreamIngestor::new(table.clone(), refresh);

        let input = b"01-01 00:00:00.000 111 1 I Tag: seen before\n";
        ingestor.run(&input[..], CancellationToken::new()).await;

        assert_eq!(table.store().len(), 1);
        assert!(batches.try_recv().is_err());
    }

    #[tokio::test]
    async fn flushes_each_batch_of_ten() {
        let (table, _events) = new_table();
        let (refresh, mut batches) = RefreshHandle::channel();
        let ingestor = StreamIngestor::new(table.clone(), refresh);

        let mut input = String::new();
        for pid in 1..=25 {
            input.push_str(&format!("01-01 00:00:00.000 {pid} 1 I Tag: m\n"));
        }
        ingestor.run(input.as_bytes(), CancellationToken::new()).await;

        assert_eq!(table.store().len(), 25);
        let first = batches.recv().await.unwrap();
        let second = batches.recv().await.unwrap();
        let last = batches.recv().await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
        assert_eq!(last.len(), 5);
    }
}
