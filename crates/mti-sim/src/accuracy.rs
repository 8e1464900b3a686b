//! Verdict accuracy against ground truth.

use mti_types::{Tag, VerificationSets};
use serde::Serialize;

/// Confusion counts for one run, with "present" as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccuracyReport {
    /// Present tags confirmed present.
    pub true_present: usize,
    /// Missing tags confirmed present (missed theft).
    pub false_present: usize,
    /// Missing tags confirmed missing.
    pub true_missing: usize,
    /// Present tags confirmed missing (false alarm).
    pub false_missing: usize,
    /// Tags with no verdict at all.
    pub unverified: usize,
}

impl AccuracyReport {
    pub fn evaluate(tags: &[Tag], sets: &VerificationSets) -> Self {
        let mut report = Self::default();
        for tag in tags {
            let said_present = sets.present().contains(&tag.epc);
            let said_missing = sets.missing().contains(&tag.epc);
            match (tag.present, said_present, said_missing) {
                (true, true, _) => report.true_present += 1,
                (true, false, true) => report.false_missing += 1,
                (false, true, _) => report.false_present += 1,
                (false, false, true) => report.true_missing += 1,
                (_, false, false) => report.unverified += 1,
            }
        }
        report
    }

    /// Fraction of present tags confirmed present (1 when none are present).
    pub fn recall(&self) -> f64 {
        ratio(self.true_present, self.true_present + self.false_missing)
    }

    /// Fraction of present verdicts that were correct (1 when none were given).
    pub fn precision(&self) -> f64 {
        ratio(self.true_present, self.true_present + self.false_present)
    }

    /// Returns true if every tag received the correct verdict.
    pub fn is_exact(&self) -> bool {
        self.false_present == 0 && self.false_missing == 0 && self.unverified == 0
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 1.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mti_types::Epc;

    #[test]
    fn counts_every_cell() {
        let tags = [
            Tag::present(Epc::new(1)),
            Tag::present(Epc::new(2)),
            Tag::missing(Epc::new(3)),
            Tag::missing(Epc::new(4)),
            Tag::present(Epc::new(5)),
        ];
        let mut sets = VerificationSets::new();
        sets.confirm_present(Epc::new(1));
        sets.confirm_missing(Epc::new(2));
        sets.confirm_present(Epc::new(3));
        sets.confirm_missing(Epc::new(4));

        let report = AccuracyReport::evaluate(&tags, &sets);
        assert_eq!(
            report,
            AccuracyReport {
                true_present: 1,
                false_present: 1,
                true_missing: 1,
                false_missing: 1,
                unverified: 1,
            }
        );
        assert_eq!(report.recall(), 0.5);
        assert_eq!(report.precision(), 0.5);
        assert!(!report.is_exact());
    }

    #[test]
    fn empty_population_is_exact() {
        let report = AccuracyReport::evaluate(&[], &VerificationSets::new());
        assert!(report.is_exact());
        assert_eq!(report.recall(), 1.0);
    }
}
