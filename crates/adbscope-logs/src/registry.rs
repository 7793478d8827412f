use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use regex::Regex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use adbscope_adb::AdbProcessTable;
use adbscope_types::{FieldSpan, ProcessRecord};

/// Grammar of one ps line: user, pid, ppid, then the process name, which
/// may contain spaces. The header never matches because PID and PPID are
/// not digits.
const PS_LINE_PATTERN: &str = r"(\S+)\s+(\d+)\s+(\d+)\s+(.+)";

/// Anything that can produce a raw process table listing
pub trait ProcessTableSource: Send + Sync {
    fn list_processes(&self) -> Result<String>;
}

impl ProcessTableSource for AdbProcessTable {
    fn list_processes(&self) -> Result<String> {
        self.snapshot()
    }
}

/// Read side of the registry: resolve record pids to process fields
pub trait ProcessLookup: Send + Sync {
    /// Process name for a pid, or "" when unknown
    fn lookup_name(&self, pid: i32) -> String;

    /// Parent pid text for a pid, or "" when unknown
    fn lookup_parent_id(&self, pid: i32) -> String;
}

/// Pid-keyed map of process table entries
///
/// Refreshes only upsert: a pid that disappears from the device keeps its
/// last known entry so older records still resolve.
#[derive(Clone)]
pub struct ProcessRegistry {
    entries: Arc<RwLock<HashMap<i32, ProcessRecord>>>,
    pattern: Regex,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            pattern: Regex::new(PS_LINE_PATTERN).expect("ps line pattern is valid"),
        }
    }

    /// Apply one raw ps listing. Every line is parsed first and the matched
    /// entries are upserted in a single write; a source error leaves the
    /// map untouched. Returns the number of entries applied.
    pub fn refresh(&self, source: &dyn ProcessTableSource) -> Result<usize> {
        let listing = source.list_processes()?;
        let parsed: Vec<ProcessRecord> = listing
            .lines()
            .filter_map(|line| self.parse_ps_line(line))
            .collect();
        let applied = parsed.len();
        let mut entries = self.entries.write();
        for record in parsed {
            entries.insert(record.pid(), record);
        }
        Ok(applied)
    }

    fn parse_ps_line(&self, line: &str) -> Option<ProcessRecord> {
        let caps = self.pattern.captures(line)?;
        let span = |i: usize| caps.get(i).map(|m| FieldSpan::new(m.start(), m.end()));
        let user = span(1)?;
        let pid_span = span(2)?;
        let ppid = span(3)?;
        let name = span(4)?;
        let pid = pid_span.slice(line).parse::<i32>().ok()?;
        Some(ProcessRecord::new(
            line.to_string(),
            pid,
            user,
            pid_span,
            ppid,
            name,
        ))
    }

    /// Insert placeholder entries for pids not yet known. Existing entries,
    /// placeholder or real, are left alone. Returns how many were added.
    pub fn ensure_known(&self, pids: impl IntoIterator<Item = i32>) -> usize {
        let mut entries = self.entries.write();
        let mut added = 0;
        for pid in pids {
            entries.entry(pid).or_insert_with(|| {
                added += 1;
                ProcessRecord::placeholder(pid)
            });
        }
        added
    }

    pub fn contains(&self, pid: i32) -> bool {
        self.entries.read().contains_key(&pid)
    }

    pub fn get(&self, pid: i32) -> Option<ProcessRecord> {
        self.entries.read().get(&pid).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLookup for ProcessRegistry {
    fn lookup_name(&self, pid: i32) -> String {
        self.entries
            .read()
            .get(&pid)
            .map(|r| r.name().to_string())
            .unwrap_or_default()
    }

    fn lookup_parent_id(&self, pid: i32) -> String {
        self.entries
            .read()
            .get(&pid)
            .map(|r| r.parent_id().to_string())
            .unwrap_or_default()
    }
}

/// Requests queued toward the refresher task
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<Vec<i32>>,
}

impl RefreshHandle {
    /// Ask for a refresh. The pids become placeholders even if the
    /// snapshot fails. Requests made while one is in flight coalesce
    /// into a single follow-up pass.
    pub fn request(&self, pids: Vec<i32>) {
        let _ = self.tx.send(pids);
    }

    #[cfg(test)]
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<i32>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

/// Spawn the background refresh task. At most one snapshot runs at a time;
/// requests arriving meanwhile are drained and folded into the next pass.
/// `on_applied` runs after any pass that changed the registry.
pub fn spawn_refresher<F>(
    registry: ProcessRegistry,
    source: Arc<dyn ProcessTableSource>,
    cancel: CancellationToken,
    on_applied: F,
) -> RefreshHandle
where
    F: Fn() + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<i32>>();
    tokio::spawn(async move {
        loop {
            let mut pending = tokio::select! {
                _ = cancel.cancelled() => break,
                batch = rx.recv() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };
            while let Ok(more) = rx.try_recv() {
                pending.extend(more);
            }

            let refreshed = {
                let registry = registry.clone();
                let source = Arc::clone(&source);
                match tokio::task::spawn_blocking(move || registry.refresh(source.as_ref())).await {
                    Ok(Ok(applied)) => {
                        debug!("process table refresh applied {applied} entries");
                        applied > 0
                    }
                    Ok(Err(e)) => {
                        warn!("process table refresh failed: {e:#}");
                        false
                    }
                    Err(e) => {
                        warn!("process table refresh task failed: {e}");
                        false
                    }
                }
            };

            let added = registry.ensure_known(pending);
            if refreshed || added > 0 {
                on_applied();
            }
        }
    });
    RefreshHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
USER PID PPID NAME
root 1 0 init
u0_a11 111 1 app1
media 333 1 media server";

    struct FakeSource(&'static str);

    impl ProcessTableSource for FakeSource {
        fn list_processes(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSource;

    impl ProcessTableSource for FailingSource {
        fn list_processes(&self) -> Result<String> {
            anyhow::bail!("device gone")
        }
    }

    #[test]
    fn refresh_parses_entries_and_skips_the_header() {
        let registry = ProcessRegistry::new();
        let applied = registry.refresh(&FakeSource(LISTING)).unwrap();
        assert_eq!(applied, 3);
        assert_eq!(registry.len(), 3);

        let app = registry.get(111).unwrap();
        assert_eq!(app.user(), "u0_a11");
        assert_eq!(app.name(), "app1");
        assert_eq!(app.parent_id(), "1");

        // names keep their inner spaces
        assert_eq!(registry.get(333).unwrap().name(), "media server");
    }

    #[test]
    fn refresh_upserts_and_keeps_departed_pids() {
        let registry = ProcessRegistry::new();
        registry.refresh(&FakeSource(LISTING)).unwrap();
        registry
            .refresh(&FakeSource("USER PID PPID NAME\nu0_a11 111 1 app1-renamed"))
            .unwrap();

        assert_eq!(registry.lookup_name(111), "app1-renamed");
        // 333 vanished from the listing but its entry survives
        assert_eq!(registry.lookup_name(333), "media server");
    }

    #[test]
    fn failed_refresh_leaves_entries_untouched() {
        let registry = ProcessRegistry::new();
        registry.refresh(&FakeSource(LISTING)).unwrap();
        assert!(registry.refresh(&FailingSource).is_err());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup_name(111), "app1");
    }

    #[test]
    fn placeholders_fill_gaps_without_clobbering() {
        let registry = ProcessRegistry::new();
        registry.refresh(&FakeSource(LISTING)).unwrap();

        assert_eq!(registry.ensure_known([111, 999]), 1);
        assert_eq!(registry.lookup_name(111), "app1");

        let ghost = registry.get(999).unwrap();
        assert_eq!(ghost.user(), "unknown");
        assert_eq!(ghost.name(), "");
        assert_eq!(ghost.parent_id(), "0");
        assert_eq!(ghost.pid_text(), "999");

        // a second pass adds nothing
        assert_eq!(registry.ensure_known([111, 999]), 0);
    }

    #[test]
    fn unknown_pids_resolve_to_empty_fields() {
        let registry = ProcessRegistry::new();
        assert_eq!(registry.lookup_name(42), "");
        assert_eq!(registry.lookup_parent_id(42), "");
    }

    #[tokio::test]
    async fn refresher_applies_snapshot_then_placeholders() {
        let registry = ProcessRegistry::new();
        let cancel = CancellationToken::new();
        let (applied_tx, mut applied_rx) = mpsc::unbounded_channel();
        let handle = spawn_refresher(
            registry.clone(),
            Arc::new(FakeSource(LISTING)),
            cancel.clone(),
            move || {
                let _ = applied_tx.send(());
            },
        );

        handle.request(vec![111, 999]);
        applied_rx.recv().await.unwrap();

        assert_eq!(registry.lookup_name(111), "app1");
        assert_eq!(registry.lookup_name(999), "");
        assert_eq!(registry.lookup_parent_id(999), "0");
        cancel.cancel();
    }
}
