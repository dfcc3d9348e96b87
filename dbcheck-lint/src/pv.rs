//! Semantic rules over the records of one file
//!
//! Each rule is a plain function from a parsed file to failure messages.
//! Rules are split into warning and error sets; a file passes when the error
//! rules produce nothing.

use crate::report::CheckReport;
use crate::units::is_allowed_unit;
use dbcheck_parser::{Db, Record};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::debug;

/// A single semantic rule
pub type PvRule = fn(&Db) -> Vec<String>;

/// Longest DESC accepted once macros are removed
pub const MAX_DESC_LEN: usize = 40;

/// Record types that must carry units when marked INTEREST
const UNIT_RECORD_TYPES: &[&str] = &["longin", "longout", "ai", "ao"];

/// Info tags that pick how a record's logging period is configured
const LOG_PERIOD_TAGS: &[&str] = &["log_period_seconds", "log_period_pv"];

static DESC_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\([^)]*\)").expect("valid DESC macro pattern"));

pub const WARNING_RULES: &[PvRule] = &[duplicate_pv_names];

pub const ERROR_RULES: &[PvRule] = &[
    missing_interest_descriptions,
    invalid_units,
    long_descriptions,
    calc_without_readonly_asg,
    missing_interest_units,
    duplicate_fields,
    inconsistent_log_tags,
];

fn interest_records(db: &Db) -> impl Iterator<Item = &Record> {
    db.iter().filter(|r| r.is_interest() && !r.is_disable())
}

/// PV names declared more than once, in order of first declaration
pub fn duplicate_pv_names(db: &Db) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut failures = Vec::new();

    for record in db {
        let name = record.name.as_str();
        if !seen.insert(name) && reported.insert(name) {
            failures.push(format!("Multiple instances of {name}"));
        }
    }

    failures
}

/// Records setting the same field more than once
pub fn duplicate_fields(db: &Db) -> Vec<String> {
    db.iter()
        .filter_map(|record| {
            let mut seen = HashSet::new();
            let duplicates: BTreeSet<&str> = record
                .fields
                .iter()
                .map(|f| f.name.as_str())
                .filter(|name| !seen.insert(*name))
                .collect();

            (!duplicates.is_empty()).then(|| {
                let names: Vec<&str> = duplicates.into_iter().collect();
                format!(
                    "Multiple instances of fields {} on {}",
                    names.join(","),
                    record.name
                )
            })
        })
        .collect()
}

pub fn missing_interest_descriptions(db: &Db) -> Vec<String> {
    interest_records(db)
        .filter(|r| !r.has_field("DESC"))
        .map(|r| format!("Missing description on {}", r.name))
        .collect()
}

pub fn missing_interest_units(db: &Db) -> Vec<String> {
    interest_records(db)
        .filter(|r| UNIT_RECORD_TYPES.contains(&r.record_type.as_str()))
        .filter(|r| r.field_value("EGU").is_none_or(|egu| egu.trim().is_empty()))
        .map(|r| format!("Missing units on {}", r.name))
        .collect()
}

/// INTEREST calc records must be access-restricted
pub fn calc_without_readonly_asg(db: &Db) -> Vec<String> {
    db.iter()
        .filter(|r| r.record_type == "calc" && r.is_interest())
        .filter(|r| r.field_value("ASG") != Some("READONLY"))
        .map(|r| format!("Missing ASG on {}", r.name))
        .collect()
}

pub fn long_descriptions(db: &Db) -> Vec<String> {
    db.iter()
        .filter(|r| {
            r.field_value("DESC").is_some_and(|desc| {
                DESC_MACRO.replace_all(desc, "").chars().count() > MAX_DESC_LEN
            })
        })
        .map(|r| format!("Description too long on {}", r.name))
        .collect()
}

/// Every non-blank EGU must be a recognised unit
pub fn invalid_units(db: &Db) -> Vec<String> {
    db.iter()
        .filter_map(|r| {
            let unit = r.field_value("EGU")?;
            (!unit.trim().is_empty() && !is_allowed_unit(unit))
                .then(|| format!("Invalid unit '{unit}' on {}", r.name))
        })
        .collect()
}

/// Logging info tags must be unique across the file, and the logging period
/// may be set only once
pub fn inconsistent_log_tags(db: &Db) -> Vec<String> {
    let mut failures = Vec::new();
    let mut tags = HashSet::new();
    let mut period_set = false;

    for record in db {
        for info in &record.infos {
            let tag = info.name.to_lowercase();
            let tag = tag.trim_matches('"');
            if !tag.starts_with("log") {
                continue;
            }

            if !tags.insert(tag.to_string()) {
                failures.push(format!(
                    "Invalid logging config: {} repeats the log info tag {tag}",
                    record.name
                ));
            }

            if LOG_PERIOD_TAGS.contains(&tag) {
                if period_set {
                    failures.push(format!(
                        "Invalid logging config: {} alters the logging period type",
                        record.name
                    ));
                }
                period_set = true;
            }
        }
    }

    failures
}

fn run_rules(db: &Db, rules: &[PvRule]) -> Vec<String> {
    rules.iter().flat_map(|rule| rule(db)).collect()
}

/// Run every semantic rule over a parsed file
pub fn run_pv_checks(db: &Db) -> CheckReport {
    let report = CheckReport {
        warnings: run_rules(db, WARNING_RULES),
        errors: run_rules(db, ERROR_RULES),
    };
    debug!(
        source = %db,
        warnings = report.warnings.len(),
        errors = report.errors.len(),
        "PV checks finished"
    );
    report
}
