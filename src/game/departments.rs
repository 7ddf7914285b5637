//! Per-department entry collections built up during the document phase.

use serde::{Deserialize, Serialize};

use crate::game::state::{DepartmentEntry, EntryTag};
use crate::schema::Department;

/// Entries for one department, newest first. Only the engine appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDocument {
    pub department: Department,
    entries: Vec<DepartmentEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentStats {
    pub milestones: usize,
    pub updates: usize,
    pub risks: usize,
    pub total: usize,
}

impl DepartmentDocument {
    pub fn new(department: Department) -> Self {
        Self {
            department,
            entries: Vec::new(),
        }
    }

    /// Inserts keeping `timestamp` descending. Among equal timestamps the
    /// latest insert comes first.
    pub fn add(&mut self, entry: DepartmentEntry) {
        let position = self
            .entries
            .iter()
            .position(|existing| existing.timestamp <= entry.timestamp)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    pub fn entries(&self) -> &[DepartmentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_mut(&mut self, entry_id: &str) -> Option<&mut DepartmentEntry> {
        self.entries.iter_mut().find(|entry| entry.id == entry_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> DepartmentStats {
        let mut stats = DepartmentStats {
            total: self.entries.len(),
            ..DepartmentStats::default()
        };
        for entry in &self.entries {
            match entry.tag {
                EntryTag::Milestone => stats.milestones += 1,
                EntryTag::Update => stats.updates += 1,
                EntryTag::Risk => stats.risks += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn entry(id: &str, minutes: i64, tag: EntryTag) -> DepartmentEntry {
        DepartmentEntry {
            id: id.to_string(),
            title: id.to_string(),
            content: String::new(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
            tag,
            department: Department::Product,
            template: None,
        }
    }

    #[test]
    fn keeps_newest_first_regardless_of_insert_order() {
        let mut doc = DepartmentDocument::new(Department::Product);
        doc.add(entry("b", 5, EntryTag::Update));
        doc.add(entry("a", 1, EntryTag::Update));
        doc.add(entry("c", 9, EntryTag::Update));
        doc.add(entry("c2", 9, EntryTag::Risk));

        let ids: Vec<&str> = doc.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c", "b", "a"]);
    }

    #[test]
    fn stats_count_by_tag() {
        let mut doc = DepartmentDocument::new(Department::Product);
        assert_eq!(doc.stats(), DepartmentStats::default());
        doc.add(entry("m", 1, EntryTag::Milestone));
        doc.add(entry("r1", 2, EntryTag::Risk));
        doc.add(entry("r2", 3, EntryTag::Risk));
        assert_eq!(
            doc.stats(),
            DepartmentStats {
                milestones: 1,
                updates: 0,
                risks: 2,
                total: 3,
            }
        );
    }
}
