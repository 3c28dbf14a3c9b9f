//! Quality measures, grouped by the target family they score.
//!
//! Every measure is a pure function of a small statistics tuple computed
//! from a subgroup's members, plus constants derived from the whole table.

pub mod correlation;
pub mod multi_label;
pub mod nominal;
pub mod numeric;

pub use correlation::{
    BivariateAccumulator, CorrelationKind, CorrelationMeasure, RegressionKind, RegressionMeasure,
};
pub use multi_label::{MultiLabelKind, MultiLabelMeasure};
pub use nominal::{NominalKind, NominalMeasure};
pub use numeric::{NumericKind, NumericMeasure, NumericStatistics};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::target::TargetType;

/// Group of measures that apply to one kind of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureFamily {
    Nominal,
    Numeric,
    Correlation,
    Regression,
    MultiLabel,
}

impl MeasureFamily {
    /// The family scoring a target type, if that target type can be scored.
    pub fn for_target(target_type: TargetType) -> Option<Self> {
        match target_type {
            TargetType::SingleNominal => Some(Self::Nominal),
            TargetType::SingleNumeric | TargetType::SingleOrdinal => Some(Self::Numeric),
            TargetType::DoubleCorrelation => Some(Self::Correlation),
            TargetType::DoubleRegression => Some(Self::Regression),
            TargetType::MultiLabel => Some(Self::MultiLabel),
            TargetType::MultiBinaryClassification => None,
        }
    }

    pub fn default_measure(&self) -> QualityMeasureKind {
        match self {
            Self::Nominal => QualityMeasureKind::WrAcc,
            Self::Numeric => QualityMeasureKind::ZScore,
            Self::Correlation => QualityMeasureKind::CorrelationR,
            Self::Regression => QualityMeasureKind::SlopeDifference,
            Self::MultiLabel => QualityMeasureKind::Weed,
        }
    }

    /// All measures of this family.
    pub fn measures(&self) -> Vec<QualityMeasureKind> {
        QualityMeasureKind::ALL
            .into_iter()
            .filter(|m| m.family() == *self)
            .collect()
    }
}

/// The measures of one family, as a closed enum a measure can match on
/// exhaustively.
pub trait FamilyKind:
    Copy + Into<QualityMeasureKind> + TryFrom<QualityMeasureKind, Error = QualityMeasureKind>
{
    const FAMILY: MeasureFamily;
    const DEFAULT: Self;

    /// Narrow `kind` to this family.
    ///
    /// A measure of another family is replaced by the family default, with a
    /// warning.
    fn resolve(kind: QualityMeasureKind) -> Self {
        Self::try_from(kind).unwrap_or_else(|other| {
            let fallback = Self::DEFAULT;
            warn!(
                "Quality measure '{}' is not a {:?} measure, using '{}'",
                other.name(),
                Self::FAMILY,
                Into::<QualityMeasureKind>::into(fallback).name()
            );
            fallback
        })
    }
}

/// Declare the enum of one measure family, mirroring the matching
/// [`QualityMeasureKind`] variants.
macro_rules! family_kind {
    ($(#[$meta:meta])* $name:ident: $family:ident, default $default:ident, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl From<$name> for $crate::quality::QualityMeasureKind {
            fn from(kind: $name) -> Self {
                match kind {
                    $($name::$variant => Self::$variant),+
                }
            }
        }

        impl TryFrom<$crate::quality::QualityMeasureKind> for $name {
            type Error = $crate::quality::QualityMeasureKind;

            fn try_from(
                kind: $crate::quality::QualityMeasureKind,
            ) -> ::std::result::Result<Self, Self::Error> {
                match kind {
                    $($crate::quality::QualityMeasureKind::$variant => Ok(Self::$variant),)+
                    other => Err(other),
                }
            }
        }

        impl $crate::quality::FamilyKind for $name {
            const FAMILY: $crate::quality::MeasureFamily = $crate::quality::MeasureFamily::$family;
            const DEFAULT: Self = Self::$default;
        }
    };
}
pub(crate) use family_kind;

/// Every supported quality measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityMeasureKind {
    // Nominal
    #[default]
    WrAcc,
    Accuracy,
    Purity,
    Correlation,
    ChiSquared,
    InformationGain,
    Binomial,
    Jaccard,
    Coverage,
    Specificity,
    Sensitivity,
    Lift,
    // Numeric
    Average,
    InverseAverage,
    ZScore,
    InverseZScore,
    AbsZScore,
    TTest,
    InverseTTest,
    AbsTTest,
    MedianMad,
    // Correlation
    CorrelationR,
    InverseR,
    AbsR,
    CorrelationDistance,
    // Regression
    SlopeDifference,
    InterceptDifference,
    // Multi-label
    Weed,
    EditDistance,
}

impl QualityMeasureKind {
    pub const ALL: [QualityMeasureKind; 29] = [
        Self::WrAcc,
        Self::Accuracy,
        Self::Purity,
        Self::Correlation,
        Self::ChiSquared,
        Self::InformationGain,
        Self::Binomial,
        Self::Jaccard,
        Self::Coverage,
        Self::Specificity,
        Self::Sensitivity,
        Self::Lift,
        Self::Average,
        Self::InverseAverage,
        Self::ZScore,
        Self::InverseZScore,
        Self::AbsZScore,
        Self::TTest,
        Self::InverseTTest,
        Self::AbsTTest,
        Self::MedianMad,
        Self::CorrelationR,
        Self::InverseR,
        Self::AbsR,
        Self::CorrelationDistance,
        Self::SlopeDifference,
        Self::InterceptDifference,
        Self::Weed,
        Self::EditDistance,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WrAcc => "WRAcc",
            Self::Accuracy => "Accuracy",
            Self::Purity => "Purity",
            Self::Correlation => "Correlation",
            Self::ChiSquared => "Chi-squared",
            Self::InformationGain => "Information gain",
            Self::Binomial => "Binomial test",
            Self::Jaccard => "Jaccard",
            Self::Coverage => "Coverage",
            Self::Specificity => "Specificity",
            Self::Sensitivity => "Sensitivity",
            Self::Lift => "Lift",
            Self::Average => "Average",
            Self::InverseAverage => "Inverse average",
            Self::ZScore => "Z-score",
            Self::InverseZScore => "Inverse Z-score",
            Self::AbsZScore => "Abs Z-score",
            Self::TTest => "t-test",
            Self::InverseTTest => "Inverse t-test",
            Self::AbsTTest => "Abs t-test",
            Self::MedianMad => "Median MAD",
            Self::CorrelationR => "r",
            Self::InverseR => "Inverse r",
            Self::AbsR => "Abs r",
            Self::CorrelationDistance => "Correlation distance",
            Self::SlopeDifference => "Slope difference",
            Self::InterceptDifference => "Intercept difference",
            Self::Weed => "WEED",
            Self::EditDistance => "Edit distance",
        }
    }

    pub fn family(&self) -> MeasureFamily {
        match self {
            Self::WrAcc
            | Self::Accuracy
            | Self::Purity
            | Self::Correlation
            | Self::ChiSquared
            | Self::InformationGain
            | Self::Binomial
            | Self::Jaccard
            | Self::Coverage
            | Self::Specificity
            | Self::Sensitivity
            | Self::Lift => MeasureFamily::Nominal,
            Self::Average
            | Self::InverseAverage
            | Self::ZScore
            | Self::InverseZScore
            | Self::AbsZScore
            | Self::TTest
            | Self::InverseTTest
            | Self::AbsTTest
            | Self::MedianMad => MeasureFamily::Numeric,
            Self::CorrelationR | Self::InverseR | Self::AbsR | Self::CorrelationDistance => {
                MeasureFamily::Correlation
            }
            Self::SlopeDifference | Self::InterceptDifference => MeasureFamily::Regression,
            Self::Weed | Self::EditDistance => MeasureFamily::MultiLabel,
        }
    }

    /// Look a measure up by display name or identifier, ignoring case.
    ///
    /// Unknown names resolve to WRAcc and log a warning.
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or_else(|| {
            warn!("'{}' is not a known quality measure, using WRAcc", name);
            Self::WrAcc
        })
    }

    /// Look a measure up by name and make sure it fits the target type.
    ///
    /// Falls back to the default of the target's family with a warning.
    pub fn resolve(name: &str, target_type: TargetType) -> Self {
        let Some(family) = MeasureFamily::for_target(target_type) else {
            return Self::from_name(name);
        };

        match Self::lookup(name) {
            Some(measure) if measure.family() == family => measure,
            _ => {
                let fallback = family.default_measure();
                warn!(
                    "'{}' is not a quality measure for {} targets, using {}",
                    name,
                    target_type,
                    fallback.name()
                );
                fallback
            }
        }
    }

    fn lookup(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::ALL.into_iter().find(|m| {
            normalize(m.name()) == wanted || normalize(&format!("{:?}", m)) == wanted
        })
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for QualityMeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary entropy in bits. Zero at the extremes.
pub(crate) fn entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}

/// Quotient that is zero when the denominator is.
#[inline]
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_name_accepts_display_and_identifier() {
        assert_eq!(QualityMeasureKind::from_name("wracc"), QualityMeasureKind::WrAcc);
        assert_eq!(QualityMeasureKind::from_name("Chi-squared"), QualityMeasureKind::ChiSquared);
        assert_eq!(QualityMeasureKind::from_name("abs_z_score"), QualityMeasureKind::AbsZScore);
        assert_eq!(QualityMeasureKind::from_name("WEED"), QualityMeasureKind::Weed);
    }

    #[test]
    fn test_from_name_unknown_falls_back() {
        assert_eq!(QualityMeasureKind::from_name("gini"), QualityMeasureKind::WrAcc);
    }

    #[test]
    fn test_resolve_against_target_family() {
        assert_eq!(
            QualityMeasureKind::resolve("t-test", TargetType::SingleOrdinal),
            QualityMeasureKind::TTest
        );
        assert_eq!(
            QualityMeasureKind::resolve("Lift", TargetType::DoubleCorrelation),
            QualityMeasureKind::CorrelationR
        );
        assert_eq!(
            QualityMeasureKind::resolve("nonsense", TargetType::MultiLabel),
            QualityMeasureKind::Weed
        );
    }

    #[test]
    fn test_every_family_has_its_default() {
        for family in [
            MeasureFamily::Nominal,
            MeasureFamily::Numeric,
            MeasureFamily::Correlation,
            MeasureFamily::Regression,
            MeasureFamily::MultiLabel,
        ] {
            assert!(family.measures().contains(&family.default_measure()));
        }
        assert_eq!(MeasureFamily::Nominal.measures().len(), 12);
        assert_eq!(MeasureFamily::for_target(TargetType::MultiBinaryClassification), None);
    }

    fn family_of<K: FamilyKind>(kind: QualityMeasureKind) -> Option<MeasureFamily> {
        K::try_from(kind).ok().map(|narrowed| {
            assert_eq!(Into::<QualityMeasureKind>::into(narrowed), kind);
            K::FAMILY
        })
    }

    #[test]
    fn test_family_enums_partition_all_measures() {
        for kind in QualityMeasureKind::ALL {
            let families: Vec<MeasureFamily> = [
                family_of::<NominalKind>(kind),
                family_of::<NumericKind>(kind),
                family_of::<CorrelationKind>(kind),
                family_of::<RegressionKind>(kind),
                family_of::<MultiLabelKind>(kind),
            ]
            .into_iter()
            .flatten()
            .collect();
            assert_eq!(families, vec![kind.family()], "{:?}", kind);
        }
        assert_eq!(
            QualityMeasureKind::from(NominalKind::DEFAULT),
            MeasureFamily::Nominal.default_measure()
        );
        assert_eq!(
            QualityMeasureKind::from(NumericKind::DEFAULT),
            MeasureFamily::Numeric.default_measure()
        );
        assert_eq!(
            QualityMeasureKind::from(CorrelationKind::DEFAULT),
            MeasureFamily::Correlation.default_measure()
        );
        assert_eq!(
            QualityMeasureKind::from(RegressionKind::DEFAULT),
            MeasureFamily::Regression.default_measure()
        );
        assert_eq!(
            QualityMeasureKind::from(MultiLabelKind::DEFAULT),
            MeasureFamily::MultiLabel.default_measure()
        );
    }

    #[test]
    fn test_foreign_measure_resolves_to_family_default() {
        assert_eq!(
            NominalKind::resolve(QualityMeasureKind::Average),
            NominalKind::WrAcc
        );
        assert_eq!(
            NumericKind::resolve(QualityMeasureKind::Lift),
            NumericKind::ZScore
        );
        assert_eq!(
            MultiLabelKind::resolve(QualityMeasureKind::EditDistance),
            MultiLabelKind::EditDistance
        );
    }

    #[test]
    fn test_entropy() {
        assert_eq!(entropy(0.0), 0.0);
        assert_eq!(entropy(1.0), 0.0);
        assert!((entropy(0.5) - 1.0).abs() < 1e-12);
    }
}
