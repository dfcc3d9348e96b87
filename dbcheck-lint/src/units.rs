//! Engineering unit validation
//!
//! A unit string is a product/quotient of atoms, each either a known unit or
//! a single SI prefix followed by a prefixable unit. Macros are expanded to
//! their default (or to `m`) before checking.

use regex::Regex;
use std::sync::LazyLock;

/// Units that accept an SI prefix
const PREFIXABLE_UNITS: &[&str] = &[
    "A", "angstrom", "au", "bar", "B", "bit", "byte", "C", "count", "degree", "eV", "frame", "g",
    "G", "hour", "Hz", "H", "inch", "interrupt", "K", "L", "m", "min", "minute", "ohm",
    "Oersted", "%", "photon", "pixel", "radian", "s", "torr", "step", "T", "V", "Pa", "deg",
    "stp", "W", "N", "F", "event",
];

const UNIT_PREFIXES: &[char] = &['T', 'G', 'M', 'k', 'm', 'u', 'n', 'p', 'f'];

const NON_PREFIXABLE_UNITS: &[&str] = &["cm", "cdeg", "rpm", "rps", "psig"];

/// Accepted verbatim, bypassing atom parsing
const STANDALONE_UNITS: &[&str] = &["cdeg/ss", "uA hour"];

static MACRO_WITH_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$[({][^=)}]*=([^)}]*)[)}]").expect("valid macro default pattern")
});

static MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[({][^)}]*[)}]").expect("valid macro pattern"));

/// Replace `$(NAME=default)` with `default` and any other macro with `m`
pub fn expand_macros(raw: &str) -> String {
    let with_defaults = MACRO_WITH_DEFAULT.replace_all(raw, "$1");
    MACRO.replace_all(&with_defaults, "m").into_owned()
}

fn is_known_unit(atom: &str) -> bool {
    NON_PREFIXABLE_UNITS.contains(&atom)
        || PREFIXABLE_UNITS.contains(&atom)
        || is_prefixed_unit(atom)
}

fn is_prefixed_unit(atom: &str) -> bool {
    PREFIXABLE_UNITS.iter().any(|base| {
        atom.strip_suffix(*base).is_some_and(|prefix| {
            let mut chars = prefix.chars();
            matches!((chars.next(), chars.next()), (Some(p), None) if UNIT_PREFIXES.contains(&p))
        })
    })
}

fn is_valid_exponent(exponent: &str) -> bool {
    !exponent.is_empty() && exponent.chars().all(|c| c.is_ascii_digit())
}

/// Whether `raw` is an acceptable EGU value
pub fn is_allowed_unit(raw: &str) -> bool {
    if STANDALONE_UNITS.contains(&raw) {
        return true;
    }

    let compact: String = expand_macros(raw).chars().filter(|c| *c != ' ').collect();
    let compact = compact.replace("(1/", "(");
    let compact = compact.strip_prefix("1/").unwrap_or(&compact);

    let atoms: Vec<&str> = compact
        .split(['/', '(', ')'])
        .filter(|atom| !atom.is_empty())
        .collect();
    let Some(last) = atoms.len().checked_sub(1) else {
        return false;
    };

    atoms.iter().enumerate().all(|(i, atom)| match atom.split_once('^') {
        Some((base, exponent)) => i == last && is_valid_exponent(exponent) && is_known_unit(base),
        None => is_known_unit(atom),
    })
}
