//! Naming-convention checks
//!
//! Runs over the groups built by the grouper and reports on casing, illegal
//! characters, macro/colon consistency and the SP / SP:RBV family rules.

use crate::grouper::{RecordGroup, RecordMap, group_records, record_map};
use crate::names::strip_macro;
use crate::report::{CheckReport, Severity};
use dbcheck_parser::Db;
use std::fmt;
use tracing::debug;

/// Kind of naming problem; determines the message prefix and severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Casing,
    Character,
    Format,
    Parameter,
    Unspecified,
}

impl Category {
    /// Casing problems are warnings unless strict; everything else is an error
    pub fn severity(self, strict: bool) -> Severity {
        match self {
            Category::Casing if !strict => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Casing => "CASING",
            Category::Character => "CHARACTER",
            Category::Format => "FORMAT",
            Category::Parameter => "PARAMETER",
            Category::Unspecified => "UNSPECIFIED",
        };
        write!(f, "{label} ERROR")
    }
}

/// Applies the naming rules to one file
pub struct SyntaxChecker<'a> {
    db: &'a Db,
    records: RecordMap<'a>,
    strict: bool,
    report: CheckReport,
}

impl<'a> SyntaxChecker<'a> {
    pub fn new(db: &'a Db, strict: bool) -> Self {
        Self {
            db,
            records: record_map(db),
            strict,
            report: CheckReport::new(),
        }
    }

    /// Run every naming rule and return the findings
    pub fn check(mut self) -> CheckReport {
        self.check_macro_colons();

        let groups = group_records(&self.records);
        for group in groups.values() {
            self.check_case(group);
            self.check_chars(group);
            self.check_candidates(group);
        }

        debug!(
            source = %self.db,
            groups = groups.len(),
            warnings = self.report.warnings.len(),
            errors = self.report.errors.len(),
            "Syntax checks finished"
        );
        self.report
    }

    fn flag(&mut self, category: Category, message: impl fmt::Display) {
        self.report
            .push(category.severity(self.strict), format!("{category}: {message}"));
    }

    /// The first record name in the file decides whether a macro prefix is
    /// followed by a colon; every other name must agree once its macro is
    /// stripped. Names without a macro are compared as they are.
    fn check_macro_colons(&mut self) {
        let db = self.db;
        let Some(first) = db.records.first() else {
            return;
        };
        let colon_after_macro = strip_macro(&first.name, false).starts_with(':');

        for record in db.iter() {
            let has_colon = strip_macro(&record.name, false).starts_with(':');
            if colon_after_macro && !has_colon {
                self.flag(
                    Category::Format,
                    format_args!("{} should have a colon after the macro", record.name),
                );
            } else if !colon_after_macro && has_colon {
                self.flag(
                    Category::Format,
                    format_args!("{} should not have a colon after the macro", record.name),
                );
            }
        }
    }

    fn check_case(&mut self, group: &RecordGroup) {
        for name in group.slots() {
            if name.chars().any(char::is_lowercase) {
                self.flag(
                    Category::Casing,
                    format_args!("{name} should be upper-case"),
                );
            }
        }
    }

    fn check_chars(&mut self, group: &RecordGroup) {
        for name in group.slots() {
            let stripped = strip_macro(name, true);
            if stripped
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            {
                self.flag(
                    Category::Character,
                    format_args!("{stripped} contains illegal characters"),
                );
            }
        }
    }

    fn check_candidates(&mut self, group: &RecordGroup) {
        if group.main_is_setpoint() {
            self.check_push_button(group);
        } else if group.main_is_setpoint_readback() {
            self.flag(
                Category::Format,
                format_args!("cannot have a SP:RBV on its own ({})", group.sp_rbv),
            );
        } else {
            self.check_readback_family(group);
        }
    }

    /// A group seeded by a setpoint is only valid when its readback is an
    /// alias of the setpoint record or of the SP:RBV record.
    fn check_push_button(&mut self, group: &RecordGroup) {
        if group.rb.is_empty() {
            self.flag(
                Category::Format,
                format_args!("{} does not have a correctly named readback alias", group.sp),
            );
            return;
        }

        let aliased = [group.main.as_str(), group.sp_rbv.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
            .filter_map(|name| self.records.get(name))
            .any(|record| record.aliases.iter().any(|alias| *alias == group.rb));

        if !aliased {
            self.flag(
                Category::Unspecified,
                format_args!("{} is not correct, please see the rules", group.sp),
            );
        }
    }

    fn check_readback_family(&mut self, group: &RecordGroup) {
        match (group.sp.is_empty(), group.sp_rbv.is_empty()) {
            (true, true) => {}
            (true, false) => self.flag(
                Category::Parameter,
                format_args!("{} does not have a :SP", group.stem),
            ),
            (false, true) => self.flag(
                Category::Parameter,
                format_args!("{} has a :SP but not a :SP:RBV", group.stem),
            ),
            (false, false) => {
                if !group.sp.ends_with(":SP") {
                    self.flag(
                        Category::Format,
                        format_args!("{} does not have a correctly formatted :SP", group.stem),
                    );
                }
                if !group.sp_rbv.ends_with(":SP:RBV") {
                    self.flag(
                        Category::Format,
                        format_args!(
                            "{} does not have a correctly formatted :SP:RBV",
                            group.stem
                        ),
                    );
                }
            }
        }
    }
}

/// Run the naming rules over a parsed file
pub fn run_syntax_checks(db: &Db, strict: bool) -> CheckReport {
    SyntaxChecker::new(db, strict).check()
}
