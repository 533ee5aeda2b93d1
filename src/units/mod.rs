//! Unit registry: canonical parsing of unit strings and conversion factors.
//!
//! Unit strings in recordings are short SI-style labels ("mV", "pA", "s",
//! "kHz"). We resolve each label into an optional power-of-ten prefix plus a
//! base symbol, which is enough for the two things the engine needs:
//!
//! - compatibility checks ("ms" and "s" share a base, "V" and "s" do not)
//! - explicit conversion factors between compatible units
//!
//! Anything we cannot parse resolves to itself with no prefix. Units are
//! metadata first: extraction carries them through untouched, and nothing in
//! the engine converts implicitly.
//!
//! Parsing rules, in order:
//! 1. a label that *is* a known base symbol is that base, unprefixed
//!    (so "m" is metres, not a dangling milli-)
//! 2. a known single-character prefix followed by a known base splits into
//!    prefix + base ("mV", "kHz", "µA")
//! 3. everything else is an opaque base ("index", "a.u.", "")

use serde::{Deserialize, Serialize};

/// SI prefixes we accept, as (symbol, power of ten).
///
/// "u" is accepted as an ASCII alias for "µ" because exported files disagree.
const PREFIXES: &[(&str, i32)] = &[
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("m", -3),
    ("µ", -6),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
];

/// Base symbols that may carry a prefix.
const BASES: &[&str] = &[
    "s", "V", "A", "Hz", "Ω", "ohm", "S", "F", "m", "g", "mol", "L",
];

/// A resolved unit: original label, base symbol, and power-of-ten scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Label as it appeared in the source data.
    pub label: String,
    /// Base symbol ("V", "s", ... or the whole label when unrecognized).
    pub base: String,
    /// Power of ten relative to the base ("mV" -> -3, "s" -> 0).
    pub scale: i32,
}

impl Unit {
    /// Units sharing a base can be converted into one another.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.base == other.base
    }
}

/// Resolves unit labels and computes conversion factors.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry;

impl UnitRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a label into a [`Unit`]. Never fails; unknown labels become
    /// opaque unprefixed bases.
    pub fn resolve(&self, label: &str) -> Unit {
        let trimmed = label.trim();

        // A bare base symbol wins over a prefix interpretation.
        if BASES.contains(&trimmed) {
            return Unit {
                label: label.to_string(),
                base: trimmed.to_string(),
                scale: 0,
            };
        }

        for &(prefix, scale) in PREFIXES {
            if let Some(rest) = trimmed.strip_prefix(prefix) {
                if BASES.contains(&rest) {
                    return Unit {
                        label: label.to_string(),
                        base: rest.to_string(),
                        scale,
                    };
                }
            }
        }

        Unit {
            label: label.to_string(),
            base: trimmed.to_string(),
            scale: 0,
        }
    }

    /// Multiplicative factor converting values in `from` to values in `to`.
    ///
    /// Returns `None` when the bases differ; callers decide whether that is
    /// an error (the slice/fit layers treat it as one).
    pub fn conversion_factor(&self, from: &str, to: &str) -> Option<f64> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        if !from.is_compatible(&to) {
            return None;
        }
        Some(10f64.powi(from.scale - to.scale))
    }

    /// Whether two labels resolve to the same base.
    pub fn compatible(&self, a: &str, b: &str) -> bool {
        self.resolve(a).is_compatible(&self.resolve(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_prefixed_labels() {
        let reg = UnitRegistry::new();
        let mv = reg.resolve("mV");
        assert_eq!(mv.base, "V");
        assert_eq!(mv.scale, -3);

        let pa = reg.resolve("pA");
        assert_eq!(pa.base, "A");
        assert_eq!(pa.scale, -12);

        let khz = reg.resolve("kHz");
        assert_eq!(khz.base, "Hz");
        assert_eq!(khz.scale, 3);
    }

    #[test]
    fn bare_base_beats_prefix_reading() {
        let reg = UnitRegistry::new();
        // "m" must be metres, not an incomplete milli-.
        let m = reg.resolve("m");
        assert_eq!(m.base, "m");
        assert_eq!(m.scale, 0);
        // "mm" is milli-metres.
        let mm = reg.resolve("mm");
        assert_eq!(mm.base, "m");
        assert_eq!(mm.scale, -3);
    }

    #[test]
    fn unknown_labels_pass_through() {
        let reg = UnitRegistry::new();
        let idx = reg.resolve("index");
        assert_eq!(idx.base, "index");
        assert_eq!(idx.scale, 0);

        let empty = reg.resolve("");
        assert_eq!(empty.base, "");
    }

    #[test]
    fn conversion_factors() {
        let reg = UnitRegistry::new();
        let f = reg.conversion_factor("mV", "V").unwrap();
        assert!((f - 1e-3).abs() < 1e-18, "mV -> V should be 1e-3, got {f}");

        let f = reg.conversion_factor("s", "ms").unwrap();
        assert!((f - 1e3).abs() < 1e-9, "s -> ms should be 1e3, got {f}");

        assert!(reg.conversion_factor("V", "s").is_none());
    }

    #[test]
    fn compatibility() {
        let reg = UnitRegistry::new();
        assert!(reg.compatible("ms", "s"));
        assert!(reg.compatible("pA", "nA"));
        assert!(!reg.compatible("V", "A"));
        // Unknown labels are only compatible with themselves.
        assert!(reg.compatible("index", "index"));
        assert!(!reg.compatible("index", "s"));
    }

    #[test]
    fn micro_aliases_agree() {
        let reg = UnitRegistry::new();
        let f = reg.conversion_factor("uA", "µA").unwrap();
        assert!((f - 1.0).abs() < 1e-18);
    }
}
