use std::sync::Arc;

use parking_lot::RwLock;

use adbscope_types::LogRecord;

/// Append-only store of every parsed record, addressed by sequence number
///
/// Sequence numbers are dense and start at zero, so a record's number is
/// its index. Records are never evicted; a sequence handed out once stays
/// valid for the life of the store.
#[derive(Clone, Default)]
pub struct RecordStore {
    records: Arc<RwLock<Vec<Arc<LogRecord>>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return its sequence number
    pub fn append(&self, record: LogRecord) -> u64 {
        let mut records = self.records.write();
        let seq = records.len() as u64;
        records.push(Arc::new(record));
        seq
    }

    pub fn get(&self, seq: u64) -> Option<Arc<LogRecord>> {
        self.records.read().get(seq as usize).cloned()
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Iterate records in sequence order. The scan is bounded at the store
    /// length observed here; records appended while scanning are not
    /// yielded, and the lock is not held between items.
    pub fn scan(&self) -> Scan {
        Scan {
            store: self.clone(),
            next: 0,
            end: self.len() as u64,
        }
    }
}

/// Bounded iterator over a RecordStore
pub struct Scan {
    store: RecordStore,
    next: u64,
    end: u64,
}

impl Iterator for Scan {
    type Item = (u64, Arc<LogRecord>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let seq = self.next;
        self.next += 1;
        self.store.get(seq).map(|record| (seq, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineParser;

    fn record(msg: &str) -> LogRecord {
        LineParser::new()
            .parse(&format!("01-01 00:00:00.000 1 1 I T: {msg}"))
            .unwrap()
    }

    #[test]
    fn sequence_numbers_are_dense_from_zero() {
        let store = RecordStore::new();
        for i in 0..5 {
            assert_eq!(store.append(record(&format!("m{i}"))), i);
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.get(3).unwrap().message(), "m3");
        assert!(store.get(5).is_none());
    }

    #[test]
    fn scan_is_bounded_at_creation() {
        let store = RecordStore::new();
        store.append(record("a"));
        store.append(record("b"));

        let mut scan = store.scan();
        assert_eq!(scan.next().unwrap().0, 0);
        store.append(record("c"));
        assert_eq!(scan.next().unwrap().0, 1);
        assert!(scan.next().is_none());

        // a fresh scan picks up the append
        assert_eq!(store.scan().count(), 3);
    }
}
