//! # Closed-World Field Comparison
//!
//! A schema node's `required` list is also its exhaustive allow-list: a
//! document level is accepted only when its field set equals that list
//! exactly. [`compare_fields`] computes both differences; [`FieldDiff::check`]
//! turns them into a single verdict where missing fields take precedence over
//! unregistered ones.

use std::collections::BTreeSet;

/// Both set differences between the required and the present fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDiff {
    /// `required − document`.
    pub missing: BTreeSet<String>,
    /// `document − required`.
    pub extra: BTreeSet<String>,
}

/// Why a field set was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    /// Required fields absent from the document.
    Missing(BTreeSet<String>),
    /// Document fields the schema does not list.
    Unregistered(BTreeSet<String>),
}

impl FieldDiff {
    /// True when the two sets are equal.
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// Collapse the diff into a verdict. `Missing` wins when both are set.
    pub fn check(self) -> Result<(), FieldViolation> {
        if !self.missing.is_empty() {
            return Err(FieldViolation::Missing(self.missing));
        }
        if !self.extra.is_empty() {
            return Err(FieldViolation::Unregistered(self.extra));
        }
        Ok(())
    }
}

/// Compare the required field names with the names present in a document.
pub fn compare_fields<'a, R, D>(required: R, document: D) -> FieldDiff
where
    R: IntoIterator<Item = &'a str>,
    D: IntoIterator<Item = &'a str>,
{
    let required: BTreeSet<&str> = required.into_iter().collect();
    let document: BTreeSet<&str> = document.into_iter().collect();

    FieldDiff {
        missing: required
            .difference(&document)
            .map(|s| s.to_string())
            .collect(),
        extra: document
            .difference(&required)
            .map(|s| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn equal_sets_pass() {
        let diff = compare_fields(["a", "b"], ["b", "a"]);
        assert!(diff.is_exact());
        assert_eq!(diff.check(), Ok(()));
    }

    #[test]
    fn reports_missing_fields() {
        let required = ["eid", "documentNumber", "name", "age", "address"];
        let present = ["eid", "documentNumber", "name", "address"];
        let diff = compare_fields(required, present);
        assert_eq!(diff.missing, set(&["age"]));
        assert!(diff.extra.is_empty());
        assert_eq!(diff.check(), Err(FieldViolation::Missing(set(&["age"]))));
    }

    #[test]
    fn reports_unregistered_fields() {
        let diff = compare_fields(["a"], ["a", "documentType"]);
        assert_eq!(
            diff.check(),
            Err(FieldViolation::Unregistered(set(&["documentType"])))
        );
    }

    #[test]
    fn missing_takes_precedence_over_unregistered() {
        let diff = compare_fields(["a", "b"], ["a", "c"]);
        assert_eq!(diff.extra, set(&["c"]));
        assert_eq!(diff.check(), Err(FieldViolation::Missing(set(&["b"]))));
    }

    proptest! {
        #[test]
        fn exact_iff_sets_equal(
            required in proptest::collection::btree_set("[a-e]", 0..5),
            present in proptest::collection::btree_set("[a-e]", 0..5),
        ) {
            let diff = compare_fields(
                required.iter().map(String::as_str),
                present.iter().map(String::as_str),
            );
            prop_assert_eq!(diff.is_exact(), required == present);
        }
    }
}
