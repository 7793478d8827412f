use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use thiserror::Error;

use adbscope_types::{FieldFilter, FilterField, FilterSpec, LogRecord};

use crate::registry::ProcessLookup;

/// Filter compilation failure, pointing at the offending field
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid {field} pattern: {source}")]
    InvalidPattern {
        field: FilterField,
        #[source]
        source: regex::Error,
    },
}

/// One compiled field predicate
#[derive(Clone, Debug)]
struct FieldPredicate {
    pattern: Regex,
    invert: bool,
}

impl FieldPredicate {
    fn compile(field: FilterField, filter: &FieldFilter) -> Result<Self, FilterError> {
        let pattern = Regex::new(&filter.pattern)
            .map_err(|source| FilterError::InvalidPattern { field, source })?;
        Ok(Self {
            pattern,
            invert: filter.invert,
        })
    }

    /// An empty pattern matches every value, so with invert set it
    /// accepts none.
    fn accepts(&self, value: &str) -> bool {
        self.pattern.is_match(value) != self.invert
    }
}

/// A fully compiled filter. Snapshots are immutable; replacing the active
/// filter swaps the whole set at once.
#[derive(Clone, Debug)]
pub struct CompiledSpec {
    spec: FilterSpec,
    pid: FieldPredicate,
    parent_id: FieldPredicate,
    name: FieldPredicate,
    priority: FieldPredicate,
    tag: FieldPredicate,
}

impl CompiledSpec {
    /// Compile every field or fail with no partial effect
    pub fn compile(spec: FilterSpec) -> Result<Self, FilterError> {
        let pid = FieldPredicate::compile(FilterField::Pid, &spec.pid)?;
        let parent_id = FieldPredicate::compile(FilterField::ParentId, &spec.parent_id)?;
        let name = FieldPredicate::compile(FilterField::Name, &spec.name)?;
        let priority = FieldPredicate::compile(FilterField::Priority, &spec.priority)?;
        let tag = FieldPredicate::compile(FilterField::Tag, &spec.tag)?;
        Ok(Self {
            spec,
            pid,
            parent_id,
            name,
            priority,
            tag,
        })
    }

    /// The spec this was compiled from
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Whether a record passes all five predicates. Name and parent pid
    /// resolve through the lookup; the rest come from the record's line.
    pub fn matches(&self, record: &LogRecord, lookup: &dyn ProcessLookup) -> bool {
        self.pid.accepts(record.pid_text())
            && self.priority.accepts(record.priority())
            && self.tag.accepts(record.tag())
            && self.parent_id.accepts(&lookup.lookup_parent_id(record.pid()))
            && self.name.accepts(&lookup.lookup_name(record.pid()))
    }
}

/// Holds the active filter and swaps it atomically
#[derive(Clone)]
pub struct FilterEngine {
    current: Arc<RwLock<Arc<CompiledSpec>>>,
}

impl FilterEngine {
    pub fn new() -> Self {
        let identity =
            CompiledSpec::compile(FilterSpec::default()).expect("default filter spec compiles");
        Self {
            current: Arc::new(RwLock::new(Arc::new(identity))),
        }
    }

    /// Replace the active filter. On error the previous filter stays active.
    pub fn set_spec(&self, spec: FilterSpec) -> Result<Arc<CompiledSpec>, FilterError> {
        let compiled = Arc::new(CompiledSpec::compile(spec)?);
        *self.current.write() = Arc::clone(&compiled);
        Ok(compiled)
    }

    /// Snapshot of the active filter
    pub fn current(&self) -> Arc<CompiledSpec> {
        Arc::clone(&self.current.read())
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineParser;
    use std::collections::HashMap;

    struct StaticLookup(HashMap<i32, (String, String)>);

    impl StaticLookup {
        fn new(entries: &[(i32, &str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|&(pid, name, ppid)| (pid, (name.to_string(), ppid.to_string())))
                    .collect(),
            )
        }
    }

    impl ProcessLookup for StaticLookup {
        fn lookup_name(&self, pid: i32) -> String {
            self.0.get(&pid).map(|(n, _)| n.clone()).unwrap_or_default()
        }

        fn lookup_parent_id(&self, pid: i32) -> String {
            self.0.get(&pid).map(|(_, p)| p.clone()).unwrap_or_default()
        }
    }

    fn record(line: &str) -> LogRecord {
        LineParser::new().parse(line).unwrap()
    }

    fn spec_with(field: FilterField, pattern: &str, invert: bool) -> FilterSpec {
        let mut spec = FilterSpec::default();
        *spec.field_mut(field) = FieldFilter::new(pattern, invert);
        spec
    }

    #[test]
    fn default_spec_matches_everything() {
        let engine = FilterEngine::new();
        let lookup = StaticLookup::new(&[]);
        let rec = record("01-01 00:00:00.000 1 2 I Tag: hi");
        assert!(engine.current().matches(&rec, &lookup));
        assert!(engine.current().spec().is_empty());
    }

    #[test]
    fn pid_pattern_selects_matching_records() {
        let engine = FilterEngine::new();
        engine
            .set_spec(spec_with(FilterField::Pid, "^111$", false))
            .unwrap();
        let lookup = StaticLookup::new(&[]);

        let hit = record("01-01 00:00:00.000 111 2 I Tag: hi");
        let miss = record("01-01 00:00:00.000 1112 2 I Tag: hi");
        assert!(engine.current().matches(&hit, &lookup));
        assert!(!engine.current().matches(&miss, &lookup));
    }

    #[test]
    fn invert_flips_the_field_predicate() {
        let engine = FilterEngine::new();
        engine
            .set_spec(spec_with(FilterField::Tag, "Noisy", true))
            .unwrap();
        let lookup = StaticLookup::new(&[]);

        let noisy = record("01-01 00:00:00.000 1 2 I NoisyTag: hi");
        let quiet = record("01-01 00:00:00.000 1 2 I Other: hi");
        assert!(!engine.current().matches(&noisy, &lookup));
        assert!(engine.current().matches(&quiet, &lookup));
    }

    #[test]
    fn name_filter_goes_through_the_lookup() {
        let engine = FilterEngine::new();
        engine
            .set_spec(spec_with(FilterField::Name, "app1", false))
            .unwrap();
        let lookup = StaticLookup::new(&[(111, "app1", "1")]);

        let named = record("01-01 00:00:00.000 111 2 I Tag: hi");
        let unnamed = record("01-01 00:00:00.000 333 2 I Tag: hi");
        assert!(engine.current().matches(&named, &lookup));
        assert!(!engine.current().matches(&unnamed, &lookup));
    }

    #[test]
    fn fields_combine_with_and() {
        let engine = FilterEngine::new();
        let mut spec = spec_with(FilterField::Priority, "E", false);
        spec.tag = FieldFilter::new("^My", false);
        engine.set_spec(spec).unwrap();
        let lookup = StaticLookup::new(&[]);

        let both = record("01-01 00:00:00.000 1 2 E MyTag: hi");
        let one = record("01-01 00:00:00.000 1 2 E Other: hi");
        assert!(engine.current().matches(&both, &lookup));
        assert!(!engine.current().matches(&one, &lookup));
    }

    #[test]
    fn invalid_pattern_keeps_previous_filter() {
        let engine = FilterEngine::new();
        engine
            .set_spec(spec_with(FilterField::Tag, "^My", false))
            .unwrap();

        let err = engine
            .set_spec(spec_with(FilterField::Pid, "[", false))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidPattern {
                field: FilterField::Pid,
                ..
            }
        ));
        assert_eq!(engine.current().spec().tag.pattern, "^My");
    }

    #[test]
    fn empty_inverted_pattern_matches_nothing() {
        let engine = FilterEngine::new();
        engine
            .set_spec(spec_with(FilterField::Name, "", true))
            .unwrap();
        let lookup = StaticLookup::new(&[(1, "app", "0")]);
        let rec = record("01-01 00:00:00.000 1 2 I Tag: hi");
        assert!(!engine.current().matches(&rec, &lookup));
    }
}
