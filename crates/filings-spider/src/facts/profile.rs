use super::dataset::ShareCount;
use super::extract::{Extractor, FieldLabels, Layout};
use std::fmt;

pub const PAID_UP_CAPITAL_LABELS: &[&str] = &["PaidUpValueOfEquityShareCapital"];

pub const FACE_VALUE_LABELS: &[&str] = &["FaceValueOfEquityShareCapital"];

pub const PROFIT_LABELS: &[&str] = &[
    "ProfitLossForThePeriod",
    "ProfitLossForPeriod",
    "ProfitLossFromOrdinaryActivitiesAfterTax",
    "ProfitOrLossAttributableToOwnersOfParent",
    "Profit (Loss) for the period",
];

pub const EPS_LABELS: &[&str] = &[
    "BasicEarningsPerShareAfterExtraordinaryItems",
    "BasicEarningsLossPerShareFromContinuingAndDiscontinuedOperations",
    "BasicEarningsPerShareBeforeExtraordinaryItems",
    "BasicEarningsLossPerShareFromContinuingOperations",
    "DilutedEarningsPerShareAfterExtraordinaryItems",
    "BasicEarningsPerShare",
    "Basic earnings per share",
    "Earnings Per Share",
];

/// Which pair of facts the extract stage pulls from each spreadsheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractionProfile {
    /// Paid-up equity capital and face value per share.
    #[default]
    ShareCapital,
    /// Profit for the period and basic earnings per share.
    Earnings,
}

impl ExtractionProfile {
    pub fn extractor(self) -> Extractor {
        match self {
            ExtractionProfile::ShareCapital => Extractor {
                primary: FieldLabels::new(PAID_UP_CAPITAL_LABELS),
                secondary: FieldLabels::new(FACE_VALUE_LABELS),
                layout: Layout::FreeScan,
                share_count: ShareCount::Signed,
            },
            ExtractionProfile::Earnings => Extractor {
                primary: FieldLabels::new(PROFIT_LABELS),
                secondary: FieldLabels::new(EPS_LABELS),
                layout: Layout::Auto,
                share_count: ShareCount::Absolute,
            },
        }
    }
}

impl fmt::Display for ExtractionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionProfile::ShareCapital => f.write_str("share-capital"),
            ExtractionProfile::Earnings => f.write_str("earnings"),
        }
    }
}
