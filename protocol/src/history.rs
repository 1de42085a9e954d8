use serde::{Deserialize, Serialize};

/// Storage key the host persists the history under.
pub const HISTORY_KEY: &str = "nova_gateway_history";

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

/// Most-recent-first list of past queries, unique by exact text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHistory {
    entries: Vec<HistoryEntry>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, query: impl Into<String>, timestamp: i64) {
        let query = query.into();
        self.entries.retain(|entry| entry.query != query);
        self.entries.insert(0, HistoryEntry { query, timestamp });
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a stored value, re-applying the capacity and uniqueness rules in case
    /// the stored list was written by something less careful.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let stored: Vec<HistoryEntry> = serde_json::from_str(json)?;
        let mut entries: Vec<HistoryEntry> = Vec::with_capacity(HISTORY_CAPACITY);
        for entry in stored {
            if entries.len() == HISTORY_CAPACITY {
                break;
            }
            if entries.iter().all(|kept| kept.query != entry.query) {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_puts_newest_first_and_dedups() {
        let mut history = QueryHistory::new();
        history.record("alpha", 1);
        history.record("beta", 2);
        history.record("alpha", 3);

        let queries: Vec<_> = history.entries().iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, ["alpha", "beta"]);
        assert_eq!(history.entries()[0].timestamp, 3);
    }

    #[test]
    fn record_caps_length() {
        let mut history = QueryHistory::new();
        for i in 0..15 {
            history.record(format!("q{i}"), i);
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.entries()[0].query, "q14");
        assert_eq!(history.entries()[9].query, "q5");
    }

    #[test]
    fn json_is_a_flat_list() {
        let mut history = QueryHistory::new();
        history.record("alpha", 42);

        let json = history.to_json().unwrap();
        assert_eq!(json, r#"[{"query":"alpha","timestamp":42}]"#);
        assert_eq!(QueryHistory::from_json(&json).unwrap(), history);
    }

    #[test]
    fn from_json_drops_duplicates() {
        let json = r#"[{"query":"a","timestamp":2},{"query":"a","timestamp":1}]"#;
        let history = QueryHistory::from_json(json).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].timestamp, 2);
    }
}
