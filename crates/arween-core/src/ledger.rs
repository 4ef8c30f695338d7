//! Append-only ledger of money movements.
//!
//! The ledger reads newest first, both through [`Ledger::entries`] and on the
//! wire. Entries are only ever added at the head; there is no API to mutate or
//! remove an entry once recorded.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::Amount;

/// Unique ledger entry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(String);

impl EntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("led_{}", Uuid::new_v4().simple()))
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a ledger entry, relative to the ledger owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// Money coming in.
    Credit,
    /// Money going out (or a zero-amount event marker).
    Debit,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "CREDIT"),
            Self::Debit => write!(f, "DEBIT"),
        }
    }
}

/// A single immutable ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID.
    pub id: EntryId,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Human-readable description.
    pub description: String,
    /// Amount moved; zero for non-monetary events.
    pub amount: Amount,
    /// Credit or debit.
    pub kind: EntryKind,
    /// Job the movement belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_job_id: Option<String>,
}

impl LedgerEntry {
    /// Creates a credit entry stamped now.
    #[must_use]
    pub fn credit(description: impl Into<String>, amount: Amount) -> Self {
        Self::new(description, amount, EntryKind::Credit)
    }

    /// Creates a debit entry stamped now.
    #[must_use]
    pub fn debit(description: impl Into<String>, amount: Amount) -> Self {
        Self::new(description, amount, EntryKind::Debit)
    }

    fn new(description: impl Into<String>, amount: Amount, kind: EntryKind) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: Utc::now(),
            description: description.into(),
            amount,
            kind,
            related_job_id: None,
        }
    }

    /// Attaches the job this entry belongs to.
    #[must_use]
    pub fn for_job(mut self, job_id: impl Into<String>) -> Self {
        self.related_job_id = Some(job_id.into());
        self
    }
}

/// Append-only list of [`LedgerEntry`] records, read newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    // Oldest first, so recording is a push.
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records one entry at the head.
    pub fn record(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Records a batch at the head, keeping the batch's own order.
    ///
    /// After `record_batch([a, b, c])` the ledger reads `a, b, c, <older>...`.
    pub fn record_batch(&mut self, batch: impl IntoIterator<Item = LedgerEntry>) {
        let batch: Vec<LedgerEntry> = batch.into_iter().collect();
        self.entries.extend(batch.into_iter().rev());
    }

    /// All entries, newest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LedgerEntry> + ExactSizeIterator {
        self.entries.iter().rev()
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    /// Entries belonging to a job, newest first.
    pub fn for_job<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a LedgerEntry> + 'a {
        self.entries()
            .filter(move |e| e.related_job_id.as_deref() == Some(job_id))
    }

    /// Looks up an entry by ID.
    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Returns true if `older` is an unmodified tail of this ledger.
    ///
    /// This is the append-only law: a later ledger must end with exactly the
    /// entries of any earlier one.
    #[must_use]
    pub fn extends(&self, older: &Self) -> bool {
        self.entries.starts_with(&older.entries)
    }

    /// Sum of all entries of the given kind.
    #[must_use]
    pub fn total(&self, kind: EntryKind) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .fold(Amount::ZERO, |acc, e| {
                acc.checked_add(e.amount).unwrap_or(Amount::MAX)
            })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries())
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entries = Vec::<LedgerEntry>::deserialize(deserializer)?;
        entries.reverse();
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ids_are_unique_and_prefixed() {
        let a = EntryId::new();
        let b = EntryId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("led_"));
    }

    #[test]
    fn record_prepends() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::credit("first", Amount::from_baht(1)));
        ledger.record(LedgerEntry::debit("second", Amount::from_baht(2)));
        let order: Vec<&str> = ledger.entries().map(|e| e.description.as_str()).collect();
        assert_eq!(order, ["second", "first"]);
        assert_eq!(ledger.latest().map(|e| e.description.as_str()), Some("second"));
    }

    #[test]
    fn record_batch_keeps_batch_order_at_head() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::credit("old", Amount::ZERO));
        ledger.record_batch([
            LedgerEntry::debit("gross", Amount::from_baht(10)),
            LedgerEntry::credit("net", Amount::from_baht(8)),
        ]);
        let order: Vec<&str> = ledger.entries().map(|e| e.description.as_str()).collect();
        assert_eq!(order, ["gross", "net", "old"]);
    }

    #[test]
    fn extends_detects_append_only_growth() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::credit("a", Amount::from_baht(1)));
        let before = ledger.clone();
        ledger.record(LedgerEntry::credit("b", Amount::from_baht(1)));
        assert!(ledger.extends(&before));
        assert!(!before.extends(&ledger));
    }

    #[test]
    fn extends_rejects_rewritten_history() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::credit("a", Amount::from_baht(1)));
        let before = ledger.clone();

        let mut forged = Ledger::new();
        forged.record(LedgerEntry::credit("a", Amount::from_baht(2)));
        forged.record(LedgerEntry::credit("b", Amount::from_baht(1)));
        assert!(!forged.extends(&before));
    }

    #[test]
    fn for_job_filters_by_related_id() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::debit("fund", Amount::from_baht(5)).for_job("JOB-1"));
        ledger.record(LedgerEntry::credit("top-up", Amount::from_baht(5)));
        ledger.record(LedgerEntry::debit("fund", Amount::from_baht(7)).for_job("JOB-2"));
        assert_eq!(ledger.for_job("JOB-1").count(), 1);
        assert_eq!(ledger.for_job("JOB-3").count(), 0);
    }

    #[test]
    fn totals_by_kind() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::credit("in", Amount::from_baht(5)));
        ledger.record(LedgerEntry::credit("in", Amount::from_baht(7)));
        ledger.record(LedgerEntry::debit("out", Amount::from_baht(3)));
        assert_eq!(ledger.total(EntryKind::Credit), Amount::from_baht(12));
        assert_eq!(ledger.total(EntryKind::Debit), Amount::from_baht(3));
    }

    #[test]
    fn ledger_serializes_as_plain_array() {
        let mut ledger = Ledger::new();
        let entry = LedgerEntry::credit("in", Amount::from_baht(5));
        let id = entry.id.clone();
        ledger.record(entry);

        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.starts_with('['));
        assert!(!json.contains("related_job_id"));

        let restored: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get(&id).map(|e| e.kind), Some(EntryKind::Credit));
    }

    #[test]
    fn wire_order_is_newest_first() {
        let mut ledger = Ledger::new();
        ledger.record(LedgerEntry::credit("old", Amount::from_baht(1)));
        ledger.record(LedgerEntry::debit("new", Amount::from_baht(2)));

        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json[0]["description"], "new");
        assert_eq!(json[1]["description"], "old");

        let restored: Ledger = serde_json::from_value(json).unwrap();
        assert_eq!(restored, ledger);
        assert!(restored.extends(&Ledger::new()));
    }
}
