use crate::item::MatchReport;
use ahash::AHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Match reports keyed by incoming item id, in insertion order.
///
/// Re-inserting an id replaces its report but keeps its original position,
/// so every id appears exactly once.
#[derive(Debug, Clone, Default)]
pub struct ReportMap {
    entries: Vec<(String, MatchReport)>,
    positions: AHashMap<String, usize>,
}

impl ReportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: AHashMap::with_capacity(capacity),
        }
    }

    /// Insert a report, returning the one it replaced
    pub fn insert(&mut self, id: impl Into<String>, report: MatchReport) -> Option<MatchReport> {
        let id = id.into();
        match self.positions.get(&id) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, report)),
            None => {
                self.positions.insert(id.clone(), self.entries.len());
                self.entries.push((id, report));
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&MatchReport> {
        self.positions.get(id).map(|&pos| &self.entries[pos].1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatchReport)> {
        self.entries.iter().map(|(id, r)| (id.as_str(), r))
    }

    /// Number of accepted matches across all reports
    pub fn total_matches(&self) -> usize {
        self.entries.iter().map(|(_, r)| r.matches.len()).sum()
    }
}

impl PartialEq for ReportMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for ReportMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, report) in &self.entries {
            map.serialize_entry(id, report)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(title: &str) -> MatchReport {
        MatchReport {
            incoming_title: title.to_string(),
            incoming_normalized: title.to_lowercase(),
            matches: Vec::new(),
        }
    }

    #[test]
    fn test_insertion_order_and_replacement() {
        let mut map = ReportMap::new();
        assert!(map.insert("b", report("B")).is_none());
        assert!(map.insert("a", report("A")).is_none());
        let replaced = map.insert("b", report("B2"));

        assert_eq!(replaced.map(|r| r.incoming_title), Some("B".to_string()));
        assert_eq!(map.len(), 2);
        assert_eq!(map.ids().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(map.get("b").map(|r| r.incoming_title.as_str()), Some("B2"));
        assert!(map.get("c").is_none());
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let mut map = ReportMap::new();
        map.insert("2001", report("Синий"));
        map.insert("1000", report("X"));
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.starts_with(r#"{"2001":{"incoming_title":"Синий""#), "{}", json);
        assert!(json.find("2001").unwrap() < json.find("1000").unwrap());
        assert_eq!(map.total_matches(), 0);
    }
}
