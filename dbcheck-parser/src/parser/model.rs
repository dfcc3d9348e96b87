//! Document model for parsed DB files
//!
//! Records own their fields, infos and aliases. Aliases are plain names on the
//! owning record, never references to other records.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static SIM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".SIM(:.|$)").expect("valid SIM pattern"));

/// All records parsed from one file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Db {
    /// Path or label of the file the records came from
    pub source: String,

    /// Records in declaration order
    pub records: Vec<Record>,
}

impl Db {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            source: String::new(),
            records,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Attach `alias` to the first record known as `parent`, by PV name or an
    /// existing alias. Returns false if no such record was parsed.
    pub fn attach_alias(&mut self, parent: &str, alias: impl Into<String>) -> bool {
        match self.records.iter_mut().find(|r| r.answers_to(parent)) {
            Some(record) => {
                record.aliases.push(alias.into());
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl<'a> IntoIterator for &'a Db {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A declared process variable
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    /// Record type, e.g. `ai`
    #[serde(rename = "type")]
    pub record_type: String,

    /// PV name, macros left unexpanded
    pub name: String,

    /// Fields in declaration order, duplicates kept
    pub fields: Vec<Field>,

    pub infos: Vec<Field>,

    /// Other PV names resolving to this record
    pub aliases: Vec<String>,
}

impl Record {
    pub fn new(record_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_infos(mut self, infos: Vec<Field>) -> Self {
        self.infos = infos;
        self
    }

    pub fn with_aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the PV name has a `SIM` segment
    pub fn is_sim(&self) -> bool {
        SIM_PATTERN.is_match(&self.name)
    }

    pub fn is_disable(&self) -> bool {
        self.name.contains("DISABLE")
    }

    pub fn is_interest(&self) -> bool {
        self.infos.iter().any(|info| info.name == "INTEREST")
    }

    /// True if `name` is this record's PV name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Values of every info entry called `name`
    pub fn info_values(&self, name: &str) -> Vec<&str> {
        self.infos
            .iter()
            .filter(|i| i.name == name)
            .map(|i| i.value.as_str())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A `field(...)` or `info(...)` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,

    /// The entry directly followed a macro inside the record body
    pub has_macro: bool,
}

impl Field {
    pub fn new(name: impl AsRef<str>, value: impl Into<String>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            value: value.into(),
            has_macro: false,
        }
    }

    pub fn with_macro(mut self, has_macro: bool) -> Self {
        self.has_macro = has_macro;
        self
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}
