//! Turns the backend's flat, parent-pointer-addressed record set into one
//! well-ordered, displayable sequence.
//!
//! The records are indexed into an arena (`Vec` position = node), children are
//! grouped under their parent's index and stably sorted by `(order, start_time)`,
//! then the forest is walked pre-order. Phases are spliced out so their jobs take
//! the phase's place; pending records and checkpoints are dropped afterwards.

use crate::app::{RecordState, RecordType, TimelineRecord};
use crate::status::{Symbol, SymbolTable};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A record placed in the ordered sequence, with its nesting depth after phase collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedRecord {
    pub record: TimelineRecord,
    pub depth: usize,
}

/// Missing order and missing start time both sort last.
fn sibling_cmp(a: &TimelineRecord, b: &TimelineRecord) -> Ordering {
    let order_key = |r: &TimelineRecord| r.order.unwrap_or(i64::MAX);
    order_key(a)
        .cmp(&order_key(b))
        .then_with(|| match (a.start_time, b.start_time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

fn is_hidden(record: &TimelineRecord) -> bool {
    record.state == RecordState::Pending
        || matches!(
            record.record_type,
            Some(RecordType::Checkpoint | RecordType::Phase)
        )
}

/// A phase is never displayed, so its name does not matter for placement.
fn is_placeable(record: &TimelineRecord) -> bool {
    record.is_well_formed() || record.record_type == Some(RecordType::Phase)
}

/// Orders a batch of records. Never fails: dangling parents make roots, records
/// without a type or name go to the end (nameless phases still collapse), cycles
/// are broken.
pub fn order_records(records: Vec<TimelineRecord>) -> Vec<OrderedRecord> {
    let (nodes, malformed): (Vec<_>, Vec<_>) = records.into_iter().partition(is_placeable);

    // First occurrence wins on duplicate ids.
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, r) in nodes.iter().enumerate() {
        index.entry(r.id.as_str()).or_insert(i);
    }

    let mut roots: Vec<usize> = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, r) in nodes.iter().enumerate() {
        match r.parent_id.as_deref().and_then(|p| index.get(p).copied()) {
            Some(parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let by_sibling_order = |a: &usize, b: &usize| sibling_cmp(&nodes[*a], &nodes[*b]);
    roots.sort_by(by_sibling_order);
    for group in &mut children {
        group.sort_by(by_sibling_order);
    }

    let mut visited = vec![false; nodes.len()];
    let mut emitted: Vec<(usize, usize)> = Vec::with_capacity(nodes.len());
    for &root in &roots {
        walk(root, &children, &nodes, &mut visited, &mut emitted);
    }
    // Parent cycles are never reachable from a root.
    for i in 0..nodes.len() {
        if !visited[i] {
            walk(i, &children, &nodes, &mut visited, &mut emitted);
        }
    }

    let mut slots: Vec<Option<TimelineRecord>> = nodes.into_iter().map(Some).collect();
    let mut out: Vec<OrderedRecord> = emitted
        .into_iter()
        .filter_map(|(i, depth)| {
            slots[i]
                .take()
                .map(|record| OrderedRecord { record, depth })
        })
        .collect();
    out.extend(
        malformed
            .into_iter()
            .map(|record| OrderedRecord { record, depth: 0 }),
    );
    out.retain(|o| !is_hidden(&o.record));
    out
}

/// Iterative pre-order walk. Phases are not emitted; their children inherit the
/// phase's depth.
fn walk(
    start: usize,
    children: &[Vec<usize>],
    nodes: &[TimelineRecord],
    visited: &mut [bool],
    emitted: &mut Vec<(usize, usize)>,
) {
    let mut stack = vec![(start, 0usize)];
    while let Some((i, depth)) = stack.pop() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let child_depth = if nodes[i].record_type == Some(RecordType::Phase) {
            depth
        } else {
            emitted.push((i, depth));
            depth + 1
        };
        for &c in children[i].iter().rev() {
            stack.push((c, child_depth));
        }
    }
}

/// One row of the hierarchy as the presentation layer receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub record: TimelineRecord,
    pub depth: usize,
    pub status: &'static str,
    pub symbol: Symbol,
}

/// Rebuilt from scratch on every refresh; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedRecordView {
    entries: Vec<ViewEntry>,
}

impl OrderedRecordView {
    pub fn build(records: Vec<TimelineRecord>, symbols: &SymbolTable) -> Self {
        let entries = order_records(records)
            .into_iter()
            .map(|OrderedRecord { record, depth }| {
                let status = record.canonical_status();
                ViewEntry {
                    symbol: symbols.symbolize(status),
                    status,
                    depth,
                    record,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&ViewEntry> {
        self.entries.get(idx)
    }

    pub fn position(&self, record_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.record.id == record_id)
    }

    pub fn find(&self, record_id: &str) -> Option<&ViewEntry> {
        self.entries.iter().find(|e| e.record.id == record_id)
    }
}
