use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use adbscope_types::{Column, FilterSpec, LogRecord};

use crate::filter::{FilterEngine, FilterError};
use crate::registry::{ProcessLookup, ProcessRegistry};
use crate::store::RecordStore;

/// Change notifications pushed toward the render loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// A record was appended to the store
    RecordAppended(u64),
    /// The visible set was rebuilt and rows may have moved
    VisibleSetChanged,
    /// The logcat stream reached EOF or failed
    StreamEnded,
}

/// The filtered, renderable view over the store
///
/// Row numbers index the visible set; sequence numbers address the store.
#[derive(Clone)]
pub struct RecordTable {
    store: RecordStore,
    registry: ProcessRegistry,
    filter: FilterEngine,
    visible: Arc<RwLock<Vec<u64>>>,
    events: mpsc::UnboundedSender<ViewEvent>,
}

impl RecordTable {
    pub fn new(
        store: RecordStore,
        registry: ProcessRegistry,
    ) -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let table = Self {
            store,
            registry,
            filter: FilterEngine::new(),
            visible: Arc::new(RwLock::new(Vec::new())),
            events,
        };
        (table, rx)
    }

    pub fn store(&self) -> RecordStore {
        self.store.clone()
    }

    pub fn registry(&self) -> ProcessRegistry {
        self.registry.clone()
    }

    /// Number of visible rows
    pub fn row_count(&self) -> usize {
        self.visible.read().len()
    }

    /// Sequence number behind a visible row
    pub fn seq_at(&self, row: usize) -> Option<u64> {
        self.visible.read().get(row).copied()
    }

    /// Record behind a visible row
    pub fn record_at(&self, row: usize) -> Option<Arc<LogRecord>> {
        let seq = self.seq_at(row)?;
        self.store.get(seq)
    }

    /// Rendered text of one cell
    pub fn cell(&self, row: usize, column: Column) -> Option<String> {
        let record = self.record_at(row)?;
        let text = match column {
            Column::Date => record.date().to_string(),
            Column::Time => record.time().to_string(),
            Column::Pid => record.pid_text().to_string(),
            Column::Tid => record.tid().to_string(),
            Column::Ppid => self.registry.lookup_parent_id(record.pid()),
            Column::Name => self.registry.lookup_name(record.pid()),
            Column::Priority => record.priority().to_string(),
            Column::Tag => record.tag().to_string(),
            Column::Message => record.message().to_string(),
        };
        Some(text)
    }

    /// Whether a stored record passes the active filter right now
    pub fn is_visible(&self, seq: u64) -> bool {
        match self.store.get(seq) {
            Some(record) => self.filter.current().matches(&record, &self.registry),
            None => false,
        }
    }

    /// Replace the active filter and rebuild the visible set
    pub fn set_filter(&self, spec: FilterSpec) -> Result<(), FilterError> {
        self.filter.set_spec(spec)?;
        self.rebuild();
        Ok(())
    }

    /// The active filter spec
    pub fn filter_spec(&self) -> FilterSpec {
        self.filter.current().spec().clone()
    }

    /// Re-evaluate every stored record against the active filter.
    /// Called when registry contents change under an unchanged filter.
    pub fn invalidate(&self) {
        self.rebuild();
    }

    fn rebuild(&self) {
        let compiled = self.filter.current();
        let next: Vec<u64> = self
            .store
            .scan()
            .filter(|(_, record)| compiled.matches(record, &self.registry))
            .map(|(seq, _)| seq)
            .collect();
        debug!(
            "visible set rebuilt: {} of {} records",
            next.len(),
            self.store.len()
        );
        *self.visible.write() = next;
        self.notify(ViewEvent::VisibleSetChanged);
    }

    /// Admit a freshly appended record. Appends in arrival order only;
    /// if a rebuild already raced past this sequence the set holds it.
    pub fn on_record_appended(&self, seq: u64) {
        if self.is_visible(seq) {
            let mut visible = self.visible.write();
            if visible.last().map(|&last| last < seq).unwrap_or(true) {
                visible.push(seq);
            }
        }
        self.notify(ViewEvent::RecordAppended(seq));
    }

    /// Signal that the stream is done
    pub fn mark_stream_ended(&self) {
        self.notify(ViewEvent::StreamEnded);
    }

    fn notify(&self, event: ViewEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineParser;
    use crate::registry::ProcessTableSource;
    use adbscope_types::{FieldFilter, FilterField};
    use anyhow::Result;

    struct FakeSource(&'static str);

    impl ProcessTableSource for FakeSource {
        fn list_processes(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn new_table() -> (RecordTable, mpsc::UnboundedReceiver<ViewEvent>) {
        RecordTable::new(RecordStore::new(), ProcessRegistry::new())
    }

    fn ingest(table: &RecordTable, line: &str) -> u64 {
        let record = LineParser::new().parse(line).unwrap();
        let seq = table.store().append(record);
        table.on_record_appended(seq);
        seq
    }

    fn spec_with(field: FilterField, pattern: &str) -> FilterSpec {
        let mut spec = FilterSpec::default();
        *spec.field_mut(field) = FieldFilter::new(pattern, false);
        spec
    }

    #[test]
    fn name_filter_resolves_through_the_registry() {
        let (table, _events) = new_table();

        ingest(&table, "2020-01-01 10:00:00.000 111 222 I MyTag: hello");
        ingest(&table, "2020-01-01 10:00:01.000 333 444 E OtherTag: boom");
        assert_eq!(table.row_count(), 2);

        table
            .registry()
            .refresh(&FakeSource("USER PID PPID NAME\nu0_a11 111 1 app1"))
            .unwrap();
        table.registry().ensure_known([111, 333]);

        assert_eq!(table.cell(0, Column::Name).unwrap(), "app1");
        assert_eq!(table.cell(1, Column::Name).unwrap(), "");

        table.set_filter(spec_with(FilterField::Name, "app1")).unwrap();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.seq_at(0), Some(0));
        assert_eq!(table.cell(0, Column::Message).unwrap(), "hello");
        assert_eq!(table.cell(0, Column::Ppid).unwrap(), "1");
    }

    #[test]
    fn appended_records_respect_the_active_filter() {
        let (table, _events) = new_table();
        table.set_filter(spec_with(FilterField::Tag, "^My")).unwrap();

        let hit = ingest(&table, "01-01 00:00:00.000 1 2 I MyTag: in");
        ingest(&table, "01-01 00:00:00.000 1 2 I Other: out");

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.seq_at(0), Some(hit));
        assert!(table.is_visible(hit));
    }

    #[test]
    fn invalidate_reflects_new_registry_entries() {
        let (table, _events) = new_table();
        table.set_filter(spec_with(FilterField::Name, "app1")).unwrap();

        ingest(&table, "01-01 00:00:00.000 111 2 I Tag: hi");
        assert_eq!(table.row_count(), 0);

        table
            .registry()
            .refresh(&FakeSource("u0_a11 111 1 app1"))
            .unwrap();
        table.invalidate();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn failed_filter_swap_keeps_the_view() {
        let (table, _events) = new_table();
        ingest(&table, "01-01 00:00:00.000 1 2 I Tag: hi");

        assert!(table.set_filter(spec_with(FilterField::Tag, "[")).is_err());
        assert_eq!(table.row_count(), 1);
        assert!(table.filter_spec().is_empty());
    }

    #[test]
    fn events_follow_appends_and_rebuilds() {
        let (table, mut events) = new_table();

        let seq = ingest(&table, "01-01 00:00:00.000 1 2 I Tag: hi");
        assert_eq!(events.try_recv().unwrap(), ViewEvent::RecordAppended(seq));

        table.set_filter(FilterSpec::default()).unwrap();
        assert_eq!(events.try_recv().unwrap(), ViewEvent::VisibleSetChanged);

        table.mark_stream_ended();
        assert_eq!(events.try_recv().unwrap(), ViewEvent::StreamEnded);
    }
}
