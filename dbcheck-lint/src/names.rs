//! PV name conventions
//!
//! A parameter is published as a family of PVs sharing a stem:
//! `STEM` (readback), `STEM:SP` (setpoint) and `STEM:SP:RBV` (setpoint
//! readback). The synonym tables below are the spellings recognised when
//! grouping; only `:SP` and `:SP:RBV` are accepted by the format rules.

/// A word that may appear in a name suffix
pub trait SuffixWord: Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;
}

/// Spellings of "setpoint"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointWord {
    Sp,
    Setpoint,
    Setp,
    Sep,
    Setpt,
}

impl SuffixWord for SetpointWord {
    const ALL: &'static [Self] = &[
        SetpointWord::Sp,
        SetpointWord::Setpoint,
        SetpointWord::Setp,
        SetpointWord::Sep,
        SetpointWord::Setpt,
    ];

    fn as_str(self) -> &'static str {
        match self {
            SetpointWord::Sp => "SP",
            SetpointWord::Setpoint => "SETPOINT",
            SetpointWord::Setp => "SETP",
            SetpointWord::Sep => "SEP",
            SetpointWord::Setpt => "SETPT",
        }
    }
}

/// Spellings of "readback"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadbackWord {
    Rbv,
    Rb,
    Readback,
    Read,
}

impl SuffixWord for ReadbackWord {
    const ALL: &'static [Self] = &[
        ReadbackWord::Rbv,
        ReadbackWord::Rb,
        ReadbackWord::Readback,
        ReadbackWord::Read,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ReadbackWord::Rbv => "RBV",
            ReadbackWord::Rb => "RB",
            ReadbackWord::Readback => "READBACK",
            ReadbackWord::Read => "READ",
        }
    }
}

/// Which member of a family a suffixed name is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    /// `STEM[_:]SPWORD`
    Setpoint,
    /// `STEM[_:]SPWORD[_:]RBWORD`
    SetpointReadback,
}

pub fn is_separator(c: char) -> bool {
    c == '_' || c == ':'
}

/// Strip `[_:]WORD` from the end of `name`. The remaining stem may be empty.
fn strip_word<W: SuffixWord>(name: &str) -> Option<(&str, W)> {
    W::ALL.iter().find_map(|&word| {
        name.strip_suffix(word.as_str())
            .and_then(|rest| rest.strip_suffix(is_separator))
            .map(|stem| (stem, word))
    })
}

/// Split a name into its stem and suffix kind, if it carries a recognised
/// setpoint or setpoint-readback suffix. Stems are never empty.
pub fn split_suffix(name: &str) -> Option<(&str, Suffix)> {
    let setpoint_readback = strip_word::<ReadbackWord>(name)
        .and_then(|(rest, _)| strip_word::<SetpointWord>(rest))
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(stem, _)| (stem, Suffix::SetpointReadback));

    setpoint_readback.or_else(|| {
        strip_word::<SetpointWord>(name)
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(stem, _)| (stem, Suffix::Setpoint))
    })
}

/// The stem a name belongs to: itself unless it carries a recognised suffix
pub fn stem_of(name: &str) -> &str {
    split_suffix(name).map_or(name, |(stem, _)| stem)
}

/// Suffix kind of `candidate` relative to exactly `stem`
pub fn related_suffix(candidate: &str, stem: &str) -> Option<Suffix> {
    split_suffix(candidate)
        .filter(|(s, _)| *s == stem)
        .map(|(_, suffix)| suffix)
}

/// Drop everything up to the end of the last macro in a PV name.
///
/// `$(P):TEMP` becomes `TEMP`, or `:TEMP` when `remove_colon` is false.
/// Names without a `$` are returned unchanged.
pub fn strip_macro(name: &str, remove_colon: bool) -> &str {
    if !name.contains('$') {
        return name;
    }

    let start = name.rfind([')', '}']).map_or(0, |i| i + 1);
    let rest = &name[start..];
    if remove_colon {
        rest.strip_prefix(':').unwrap_or(rest)
    } else {
        rest
    }
}
