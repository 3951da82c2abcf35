//! # Breakpoint Classification
//!
//! Maps a width onto a named size class. Each breakpoint is a minimum
//! width; the matching label is the one with the greatest threshold that
//! does not exceed the width.
//!
//! ```text
//! { SM: 0, MD: 640, LG: 1024 }
//!   width 320  → "SM"
//!   width 800  → "MD"
//!   width 2000 → "LG"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Table of label → minimum-width thresholds.
///
/// Labels keep their insertion order (document order when parsed from
/// JSON). Two labels sharing a threshold resolve to the one added first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakpoints {
    thresholds: IndexMap<String, f64>,
}

impl Breakpoints {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint. An existing label keeps its position and takes the
    /// new threshold.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, min_width: f64) -> Self {
        self.thresholds.insert(label.into(), min_width);
        self
    }

    /// Number of breakpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Threshold for a label.
    #[must_use]
    pub fn threshold(&self, label: &str) -> Option<f64> {
        self.thresholds.get(label).copied()
    }

    /// Iterate over `(label, threshold)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.thresholds.iter().map(|(label, min)| (label.as_str(), *min))
    }

    /// Label for `width`, or an empty string when nothing matches.
    #[must_use]
    pub fn classify(&self, width: f64) -> String {
        classify(self, width).to_owned()
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for Breakpoints {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        Self {
            thresholds: iter
                .into_iter()
                .map(|(label, min)| (label.into(), min))
                .collect(),
        }
    }
}

/// Find the label whose threshold is the greatest one not exceeding `width`.
#[must_use]
pub fn classify(table: &Breakpoints, width: f64) -> &str {
    let mut label = "";
    let mut max = -1.0_f64;

    for (name, threshold) in table.iter() {
        if width >= threshold && threshold > max {
            label = name;
            max = threshold;
        }
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0_t1() -> Breakpoints {
        Breakpoints::new().with("T0", 0.0).with("T1", 100.0)
    }

    #[test]
    fn test_classify_with_default_breakpoint() {
        let table = t0_t1();
        assert_eq!(classify(&table, 0.0), "T0");
        assert_eq!(classify(&table, 99.0), "T0");
        assert_eq!(classify(&table, 100.0), "T1");
        assert_eq!(classify(&table, 199.0), "T1");
    }

    #[test]
    fn test_classify_below_every_threshold_is_empty() {
        let table = Breakpoints::new().with("T1", 100.0);
        assert_eq!(classify(&table, 0.0), "");
        assert_eq!(classify(&table, 99.0), "");
        assert_eq!(classify(&table, 100.0), "T1");
    }

    #[test]
    fn test_classify_empty_table() {
        assert_eq!(classify(&Breakpoints::new(), 500.0), "");
    }

    #[test]
    fn test_unsorted_input_order_does_not_matter() {
        let table: Breakpoints = vec![("LG", 1024.0), ("SM", 0.0), ("MD", 640.0)]
            .into_iter()
            .collect();
        assert_eq!(table.classify(800.0), "MD");
        assert_eq!(table.classify(1024.0), "LG");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_duplicate_thresholds_resolve_to_first_inserted() {
        let table = Breakpoints::new().with("b", 50.0).with("a", 50.0);
        assert_eq!(classify(&table, 60.0), "b");

        let table = Breakpoints::new().with("a", 50.0).with("b", 50.0);
        assert_eq!(classify(&table, 60.0), "a");
    }

    #[test]
    fn test_replacing_threshold_keeps_position() {
        let table = Breakpoints::new()
            .with("wide", 10.0)
            .with("narrow", 10.0)
            .with("wide", 10.0);
        assert_eq!(table.len(), 2);
        assert_eq!(classify(&table, 20.0), "wide");
    }

    #[test]
    fn test_json_shape_is_plain_object() {
        let table: Breakpoints =
            serde_json::from_str(r#"{"XS":0,"SM":320}"#).expect("table should parse");
        assert_eq!(table.threshold("SM"), Some(320.0));
        let json = serde_json::to_string(&table).expect("serialization should work");
        assert_eq!(json, r#"{"XS":0.0,"SM":320.0}"#);
    }

    #[test]
    fn test_json_ties_follow_document_order() {
        let table: Breakpoints =
            serde_json::from_str(r#"{"zeta":0,"alpha":0}"#).expect("table should parse");
        assert_eq!(classify(&table, 5.0), "zeta");
    }

    proptest! {
        #[test]
        fn classified_threshold_is_greatest_not_exceeding_width(
            thresholds in proptest::collection::btree_map("[a-z]{1,4}", 0u32..2000, 0..8),
            width in 0u32..2500,
        ) {
            let table: Breakpoints = thresholds
                .iter()
                .map(|(label, min)| (label.clone(), f64::from(*min)))
                .collect();
            let width = f64::from(width);
            let label = classify(&table, width);
            let best = table.iter().map(|(_, t)| t).filter(|t| *t <= width).fold(None, |acc: Option<f64>, t| {
                Some(acc.map_or(t, |a| a.max(t)))
            });

            match best {
                None => prop_assert_eq!(label, ""),
                Some(best) => prop_assert_eq!(table.threshold(label), Some(best)),
            }
        }
    }
}
