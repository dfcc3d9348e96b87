//! Dbcheck Lint - naming and semantic rules for EPICS DB files
//!
//! Works on the records produced by `dbcheck-parser`:
//!
//! - [`grouper`] gathers PV names into SP / RB / SP:RBV families
//! - [`syntax`] checks names against the naming conventions
//! - [`pv`] checks record contents (descriptions, units, logging tags, ...)
//!
//! # Example
//!
//! ```rust
//! use dbcheck_core::CheckConfig;
//! use dbcheck_lint::check_db;
//! use dbcheck_parser::parse;
//!
//! let db = parse(r#"record(ai, "$(P):TEMP") { field(EGU, "K") }"#).unwrap();
//! let report = check_db(&db, &CheckConfig::default());
//! assert!(report.is_clean());
//! ```

pub mod grouper;
pub mod names;
pub mod pv;
pub mod report;
pub mod syntax;
pub mod units;

pub use grouper::{RecordGroup, group_db, group_records, record_map};
pub use pv::run_pv_checks;
pub use report::{CheckReport, Severity, build_failure_message};
pub use syntax::run_syntax_checks;
pub use units::is_allowed_unit;

use dbcheck_core::CheckConfig;
use dbcheck_parser::Db;

/// Run the passes enabled in `config` and merge their findings, naming
/// findings first
pub fn check_db(db: &Db, config: &CheckConfig) -> CheckReport {
    let mut report = CheckReport::new();
    if config.syntax {
        report.merge(run_syntax_checks(db, config.strict));
    }
    if config.pv {
        report.merge(run_pv_checks(db));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbcheck_parser::parse;

    const SOURCE: &str = r#"
        record(ai, "$(P):temp") {
            info(INTEREST, "HIGH")
        }
    "#;

    #[test]
    fn test_check_db_runs_enabled_passes() {
        let db = parse(SOURCE).unwrap();

        let report = check_db(&db, &CheckConfig::default());
        assert_eq!(report.warnings, vec!["CASING ERROR: $(P):temp should be upper-case"]);
        assert_eq!(
            report.errors,
            vec!["Missing description on $(P):temp", "Missing units on $(P):temp"]
        );

        let config = CheckConfig {
            pv: false,
            ..Default::default()
        };
        let report = check_db(&db, &config);
        assert!(report.errors.is_empty());

        let config = CheckConfig {
            syntax: false,
            strict: true,
            ..Default::default()
        };
        let report = check_db(&db, &config);
        assert!(report.warnings.is_empty());
        assert_eq!(report.errors.len(), 2);
    }
}
