//! Record grouping
//!
//! Gathers PV names (record names and their aliases) into families keyed by
//! stem. Grouping runs in two phases over the name-sorted record map:
//!
//! 1. Seed one group per stem from record names. The first name seen for a
//!    stem becomes the group's main record.
//! 2. Route every record name and every alias into the groups it is related
//!    to. Later assignments overwrite earlier ones.

use crate::names::{Suffix, related_suffix, split_suffix, stem_of};
use dbcheck_parser::{Db, Record};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

/// Records of one file keyed by PV name
pub type RecordMap<'a> = BTreeMap<&'a str, &'a Record>;

/// Build the name-sorted record map. For duplicate names the record declared
/// last wins.
pub fn record_map(db: &Db) -> RecordMap<'_> {
    db.iter().map(|r| (r.name.as_str(), r)).collect()
}

/// A family of PV names sharing a stem. Empty strings mark absent members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordGroup {
    pub stem: String,

    /// The record name that seeded the group
    pub main: String,

    /// Readback, the bare stem
    pub rb: String,

    /// Setpoint
    pub sp: String,

    /// Setpoint readback
    pub sp_rbv: String,
}

impl RecordGroup {
    /// Start a group from its seeding record name
    pub fn seed(main: &str) -> Self {
        let mut group = Self {
            main: main.to_string(),
            ..Default::default()
        };
        match split_suffix(main) {
            Some((stem, suffix)) => {
                group.stem = stem.to_string();
                group.assign(suffix, main);
            }
            None => {
                group.stem = main.to_string();
                group.rb = main.to_string();
            }
        }
        group
    }

    /// The RB, SP and SP_RBV members, in that order
    pub fn slots(&self) -> [&str; 3] {
        [&self.rb, &self.sp, &self.sp_rbv]
    }

    /// Whether the group was seeded by a setpoint name
    pub fn main_is_setpoint(&self) -> bool {
        matches!(split_suffix(&self.main), Some((_, Suffix::Setpoint)))
    }

    pub fn main_is_setpoint_readback(&self) -> bool {
        matches!(split_suffix(&self.main), Some((_, Suffix::SetpointReadback)))
    }

    fn assign(&mut self, suffix: Suffix, name: &str) {
        match suffix {
            Suffix::Setpoint => self.sp = name.to_string(),
            Suffix::SetpointReadback => self.sp_rbv = name.to_string(),
        }
    }

    /// Place `name` in this group if it is the stem itself or carries a
    /// suffix relative to the stem
    fn route(&mut self, name: &str) {
        if let Some(suffix) = related_suffix(name, &self.stem) {
            trace!(stem = %self.stem, name, ?suffix, "Routed into group");
            self.assign(suffix, name);
        } else if name == self.stem {
            trace!(stem = %self.stem, name, "Routed as readback");
            self.rb = name.to_string();
        }
    }
}

/// Group every PV name of `records` by stem
pub fn group_records(records: &RecordMap<'_>) -> BTreeMap<String, RecordGroup> {
    let mut groups: BTreeMap<String, RecordGroup> = BTreeMap::new();

    // Phase 1: seed
    for name in records.keys() {
        let stem = stem_of(name);
        if !groups.contains_key(stem) {
            trace!(stem, main = *name, "Seeded group");
            groups.insert(stem.to_string(), RecordGroup::seed(name));
        }
    }

    // Phase 2: route names and aliases
    for (name, record) in records {
        if let Some(group) = groups.get_mut(stem_of(name)) {
            for alias in &record.aliases {
                group.route(alias);
            }
        }

        for group in groups.values_mut() {
            if group.main != *name {
                group.route(name);
            }
        }
    }

    groups
}

/// Group the records of a parsed file
pub fn group_db(db: &Db) -> BTreeMap<String, RecordGroup> {
    group_records(&record_map(db))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(records: Vec<Record>) -> Db {
        Db::new(records)
    }

    fn ai(name: &str) -> Record {
        Record::new("ai", name)
    }

    #[test]
    fn test_group_full_family() {
        let db = db(vec![ai("TEMP"), ai("TEMP:SP"), ai("TEMP:SP:RBV")]);
        let groups = group_db(&db);

        assert_eq!(groups.len(), 1);
        let group = &groups["TEMP"];
        assert_eq!(group.main, "TEMP");
        assert_eq!(group.rb, "TEMP");
        assert_eq!(group.sp, "TEMP:SP");
        assert_eq!(group.sp_rbv, "TEMP:SP:RBV");
    }

    #[test]
    fn test_group_unrelated_names_stay_apart() {
        let db = db(vec![
            ai("TEMP"),
            ai("TEMP:SP"),
            ai("NOTTEMP"),
            ai("NOTTEMP:SP:RBV"),
        ]);
        let groups = group_db(&db);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["TEMP"].sp, "TEMP:SP");
        assert_eq!(groups["TEMP"].sp_rbv, "");
        assert_eq!(groups["NOTTEMP"].sp, "");
        assert_eq!(groups["NOTTEMP"].sp_rbv, "NOTTEMP:SP:RBV");
    }

    #[test]
    fn test_group_lone_setpoint_readback() {
        let db = db(vec![ai("NOTTEMP:SP:RBV")]);
        let groups = group_db(&db);

        assert_eq!(groups.len(), 1);
        let group = &groups["NOTTEMP"];
        assert_eq!(group.main, "NOTTEMP:SP:RBV");
        assert_eq!(group.rb, "");
        assert_eq!(group.sp, "");
        assert_eq!(group.sp_rbv, "NOTTEMP:SP:RBV");
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let db = db(vec![
            ai("TEMP"),
            ai("TEMP:SP").with_aliases(["TEMP_SETPOINT"]),
            ai("TEMP:SP:RBV"),
            ai("NOTTEMP:SP:RBV"),
            ai("PRESSURE:SP").with_aliases(["PRESSURE"]),
        ]);
        let records = record_map(&db);

        let first = group_records(&records);
        let second = group_records(&records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_group_seeded_by_setpoint() {
        let db = db(vec![ai("VALVE:SP")]);
        let groups = group_db(&db);

        let group = &groups["VALVE"];
        assert_eq!(group.main, "VALVE:SP");
        assert_eq!(group.sp, "VALVE:SP");
        assert_eq!(group.rb, "");
        assert!(group.main_is_setpoint());
        assert!(!group.main_is_setpoint_readback());
    }

    #[test]
    fn test_group_routes_aliases_of_owner() {
        let db = db(vec![
            ai("PRESSURE:SP").with_aliases(["PRESSURE", "PRESSURE:SP:RBV"]),
        ]);
        let groups = group_db(&db);

        let group = &groups["PRESSURE"];
        assert_eq!(group.main, "PRESSURE:SP");
        assert_eq!(group.rb, "PRESSURE");
        assert_eq!(group.sp, "PRESSURE:SP");
        assert_eq!(group.sp_rbv, "PRESSURE:SP:RBV");
    }

    #[test]
    fn test_group_ignores_foreign_aliases() {
        let db = db(vec![ai("A"), ai("B").with_aliases(["A:SP"])]);
        let groups = group_db(&db);

        assert_eq!(groups["A"].sp, "");
        assert_eq!(groups["B"].sp, "");
    }

    #[test]
    fn test_group_synonym_suffixes() {
        let db = db(vec![ai("FLOW"), ai("FLOW_SETPOINT"), ai("FLOW:SETP_READBACK")]);
        let groups = group_db(&db);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups["FLOW"].sp, "FLOW_SETPOINT");
        assert_eq!(groups["FLOW"].sp_rbv, "FLOW:SETP_READBACK");
    }

    #[test]
    fn test_record_map_last_duplicate_wins() {
        let db = db(vec![
            Record::new("ai", "DUP"),
            Record::new("ao", "DUP"),
        ]);
        let map = record_map(&db);
        assert_eq!(map.len(), 1);
        assert_eq!(map["DUP"].record_type, "ao");
    }

    #[test]
    fn test_group_slots() {
        let group = RecordGroup::seed("X:SP:RBV");
        assert_eq!(group.stem, "X");
        assert_eq!(group.slots(), ["", "", "X:SP:RBV"]);
    }
}
