//! Settings for a reduction run: which algorithm, about which frequencies, and
//! to which order.
//!
//! The types here deserialize from any `serde` format, so a reduction can be
//! described in a configuration file as
//!
//! ```text
//! algorithm   = "dual_rational_arnoldi"
//! frequencies = ["0", "0.5+2j", 10.0]
//! order       = [4, 2, 2]
//! ```
//!
//! [`RomSettings::validate`] checks such a description before any matrix work is
//! done. A single-point algorithm given no frequency reduces about infinity.

use crate::algorithms::InterpolationPoint;
use crate::error::{RomError, RomErrorKind};
use faer::{c64, traits::ComplexField};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use std::str::FromStr;

/// The reduction algorithms that can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Galerkin projection onto one Krylov space. Also accepted as `arnoldi`.
    #[serde(alias = "arnoldi")]
    OneSidedArnoldi,
    /// Oblique projection onto input- and output-side Krylov spaces.
    TwoSidedArnoldi,
    /// Two-sided projection about several points (SISO only).
    DualRationalArnoldi,
    /// Real-valued bases from complex-conjugate point pairs. Recognized but not
    /// available; selecting it is a configuration error.
    RealRationalArnoldi,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::OneSidedArnoldi,
        Algorithm::TwoSidedArnoldi,
        Algorithm::DualRationalArnoldi,
        Algorithm::RealRationalArnoldi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::OneSidedArnoldi => "one_sided_arnoldi",
            Algorithm::TwoSidedArnoldi => "two_sided_arnoldi",
            Algorithm::DualRationalArnoldi => "dual_rational_arnoldi",
            Algorithm::RealRationalArnoldi => "real_rational_arnoldi",
        }
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(self, Algorithm::RealRationalArnoldi)
    }

    /// Whether the algorithm interpolates about several points at once.
    pub fn is_multi_point(&self) -> bool {
        matches!(
            self,
            Algorithm::DualRationalArnoldi | Algorithm::RealRationalArnoldi
        )
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = RomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "arnoldi" {
            return Ok(Algorithm::OneSidedArnoldi);
        }
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| RomErrorKind::UnknownAlgorithm(s.to_string()).into())
    }
}

/// An interpolation frequency as written in a configuration: either infinity or
/// a finite complex number.
///
/// Parses from `inf`/`infinity`, real literals (`0.5`, `-1e-2`), and complex
/// literals with a `j` or `i` suffix (`2j`, `0.3+2j`, `1-j`). Deserializes from
/// such a string or from a plain number, and serializes as a string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "String")]
pub enum Frequency {
    Infinity,
    Finite { re: f64, im: f64 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Number(f64),
    Text(String),
}

impl Frequency {
    pub fn real(re: f64) -> Self {
        Frequency::Finite { re, im: 0.0 }
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Frequency::Finite { re, im }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Frequency::Infinity)
    }

    /// Converts to an interpolation point over the scalar type `T`.
    pub fn to_point<T: FrequencyScalar>(&self) -> Result<InterpolationPoint<T>, RomError> {
        T::interpolation_point(self)
    }
}

fn parse_component(s: &str, original: &str) -> Result<f64, RomError> {
    let value = match s {
        "" | "+" => 1.0,
        "-" => -1.0,
        _ => s
            .parse::<f64>()
            .map_err(|_| RomError::from(RomErrorKind::InvalidFrequency(original.to_string())))?,
    };
    if !value.is_finite() {
        return Err(RomErrorKind::InvalidFrequency(original.to_string()).into());
    }
    Ok(value)
}

impl FromStr for Frequency {
    type Err = RomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let lower = text.to_ascii_lowercase();
        if lower == "inf" || lower == "infinity" {
            return Ok(Frequency::Infinity);
        }
        if lower.is_empty() {
            return Err(RomErrorKind::InvalidFrequency(s.to_string()).into());
        }

        let Some(body) = lower.strip_suffix(['j', 'i']) else {
            return Ok(Frequency::real(parse_component(&lower, s)?));
        };
        // The sign that separates the real and imaginary parts is the last one
        // that is neither leading nor part of an exponent.
        let bytes = body.as_bytes();
        let split = (1..bytes.len())
            .rev()
            .find(|&k| matches!(bytes[k], b'+' | b'-') && !matches!(bytes[k - 1], b'e'));
        match split {
            Some(k) => Ok(Frequency::complex(
                parse_component(&body[..k], s)?,
                parse_component(&body[k..], s)?,
            )),
            None => Ok(Frequency::complex(0.0, parse_component(body, s)?)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Frequency::Infinity => write!(f, "inf"),
            Frequency::Finite { re, im } if im == 0.0 => write!(f, "{re}"),
            Frequency::Finite { re, im } if re == 0.0 => write!(f, "{im}j"),
            Frequency::Finite { re, im } => write!(f, "{re}{im:+}j"),
        }
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed: Result<Self, RomError> = match FrequencyRepr::deserialize(deserializer)? {
            FrequencyRepr::Number(x) if x == f64::INFINITY => Ok(Frequency::Infinity),
            FrequencyRepr::Number(x) if x.is_finite() => Ok(Frequency::real(x)),
            FrequencyRepr::Number(x) => Err(RomErrorKind::InvalidFrequency(x.to_string()).into()),
            FrequencyRepr::Text(s) => s.parse(),
        };
        parsed.map_err(de::Error::custom)
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.to_string()
    }
}

/// Scalar types whose systems can be reduced about a configured [`Frequency`].
pub trait FrequencyScalar: ComplexField + PartialEq + Send + Sync {
    fn interpolation_point(frequency: &Frequency) -> Result<InterpolationPoint<Self>, RomError>;
}

impl FrequencyScalar for f64 {
    /// Real systems only accept real frequencies; lift the system with
    /// [`StateSpace::to_complex`](crate::system::StateSpace::to_complex) first.
    fn interpolation_point(frequency: &Frequency) -> Result<InterpolationPoint<Self>, RomError> {
        match *frequency {
            Frequency::Infinity => Ok(InterpolationPoint::Infinity),
            Frequency::Finite { re, im } if im == 0.0 => Ok(InterpolationPoint::Finite(re)),
            Frequency::Finite { re, im } => {
                Err(RomErrorKind::ComplexFrequencyOnRealSystem { re, im }.into())
            }
        }
    }
}

impl FrequencyScalar for c64 {
    fn interpolation_point(frequency: &Frequency) -> Result<InterpolationPoint<Self>, RomError> {
        Ok(match *frequency {
            Frequency::Infinity => InterpolationPoint::Infinity,
            Frequency::Finite { re, im } => InterpolationPoint::Finite(c64::new(re, im)),
        })
    }
}

/// The order of a reduction: one value for every point, or one per point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Order {
    Uniform(usize),
    PerPoint(Vec<usize>),
}

impl Order {
    /// The order for a single-point algorithm.
    pub fn single(&self) -> Result<usize, RomError> {
        let r = match self {
            Order::Uniform(r) => *r,
            Order::PerPoint(orders) if orders.len() == 1 => orders[0],
            Order::PerPoint(orders) => {
                return Err(RomErrorKind::OrderCountMismatch {
                    points: 1,
                    orders: orders.len(),
                }
                .into());
            }
        };
        if r == 0 {
            return Err(RomErrorKind::ZeroOrder.into());
        }
        Ok(r)
    }

    /// One order per point, broadcasting a uniform order.
    pub fn per_point(&self, points: usize) -> Result<Vec<usize>, RomError> {
        let orders = match self {
            Order::Uniform(r) => vec![*r; points],
            Order::PerPoint(orders) if orders.len() == points => orders.clone(),
            Order::PerPoint(orders) => {
                return Err(RomErrorKind::OrderCountMismatch {
                    points,
                    orders: orders.len(),
                }
                .into());
            }
        };
        if orders.contains(&0) {
            return Err(RomErrorKind::ZeroOrder.into());
        }
        Ok(orders)
    }
}

impl From<usize> for Order {
    fn from(r: usize) -> Self {
        Order::Uniform(r)
    }
}

impl From<Vec<usize>> for Order {
    fn from(orders: Vec<usize>) -> Self {
        Order::PerPoint(orders)
    }
}

/// A complete description of one reduction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomSettings {
    pub algorithm: Algorithm,
    #[serde(default)]
    pub frequencies: Vec<Frequency>,
    pub order: Order,
    /// Build the per-point blocks of a multi-point reduction in parallel.
    #[serde(default)]
    pub parallel: bool,
}

impl RomSettings {
    pub fn new(algorithm: Algorithm, order: impl Into<Order>) -> Self {
        Self {
            algorithm,
            frequencies: Vec::new(),
            order: order.into(),
            parallel: false,
        }
    }

    pub fn with_frequencies(mut self, frequencies: impl IntoIterator<Item = Frequency>) -> Self {
        self.frequencies = frequencies.into_iter().collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The interpolation frequencies the run will use: the configured ones, or
    /// infinity when a single-point algorithm was given none.
    pub fn resolved_frequencies(&self) -> Vec<Frequency> {
        if self.frequencies.is_empty() && !self.algorithm.is_multi_point() {
            vec![Frequency::Infinity]
        } else {
            self.frequencies.clone()
        }
    }

    /// The order for each resolved frequency.
    pub fn resolved_orders(&self) -> Result<Vec<usize>, RomError> {
        if self.algorithm.is_multi_point() {
            self.order.per_point(self.frequencies.len())
        } else {
            Ok(vec![self.order.single()?])
        }
    }

    /// Checks everything that can be checked without the system matrices.
    pub fn validate(&self) -> Result<(), RomError> {
        let algorithm = self.algorithm;
        if !algorithm.is_implemented() {
            return Err(RomErrorKind::AlgorithmNotImplemented(algorithm.name()).into());
        }
        let given = self.frequencies.len();
        if algorithm.is_multi_point() {
            if given < 2 {
                return Err(RomErrorKind::TooFewInterpolationPoints {
                    algorithm: algorithm.name(),
                    required: 2,
                    given,
                }
                .into());
            }
            for (index, frequency) in self.frequencies.iter().enumerate() {
                if frequency.is_infinite() {
                    return Err(RomErrorKind::InfiniteInterpolationPoint {
                        algorithm: algorithm.name(),
                    }
                    .into());
                }
                if self.frequencies[..index].contains(frequency) {
                    return Err(RomErrorKind::DuplicateInterpolationPoint { index }.into());
                }
            }
        } else if given > 1 {
            return Err(RomErrorKind::TooManyInterpolationPoints {
                algorithm: algorithm.name(),
                given,
            }
            .into());
        }
        self.resolved_orders().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::{IntoDeserializer, value::Error as ValueError};

    fn deserializer_for<'a, V: IntoDeserializer<'a, ValueError>>(value: V) -> V::Deserializer {
        value.into_deserializer()
    }

    #[test]
    fn test_algorithm_names() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
            assert_eq!(algorithm.to_string(), algorithm.name());
        }
        assert_eq!(
            "arnoldi".parse::<Algorithm>().unwrap(),
            Algorithm::OneSidedArnoldi
        );
        assert_eq!(
            " Two_Sided_Arnoldi ".parse::<Algorithm>().unwrap(),
            Algorithm::TwoSidedArnoldi
        );
        let err = "lanczos".parse::<Algorithm>().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Unknown reduction algorithm 'lanczos'.");
    }

    #[test]
    fn test_algorithm_deserialize_alias() {
        let alias = Algorithm::deserialize(deserializer_for("arnoldi")).unwrap();
        assert_eq!(alias, Algorithm::OneSidedArnoldi);
        let dual = Algorithm::deserialize(deserializer_for("dual_rational_arnoldi")).unwrap();
        assert_eq!(dual, Algorithm::DualRationalArnoldi);
    }

    #[test]
    fn test_frequency_parsing() {
        let cases = [
            ("inf", Frequency::Infinity),
            ("Infinity", Frequency::Infinity),
            ("0", Frequency::real(0.0)),
            ("-1e-2", Frequency::real(-0.01)),
            ("2j", Frequency::complex(0.0, 2.0)),
            ("-j", Frequency::complex(0.0, -1.0)),
            ("0.3+2j", Frequency::complex(0.3, 2.0)),
            ("1.5e-1 - 4i", Frequency::complex(0.15, -4.0)),
            ("-2e+1+1e-3j", Frequency::complex(-20.0, 0.001)),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<Frequency>().unwrap(), expected, "parsing {text}");
        }
        for bad in ["", "abc", "1+2", "nan", "-inf", "1+xj"] {
            assert!(bad.parse::<Frequency>().unwrap_err().is_configuration(), "{bad}");
        }
    }

    #[test]
    fn test_frequency_display_round_trips() {
        for f in [
            Frequency::Infinity,
            Frequency::real(-0.5),
            Frequency::complex(0.0, 3.0),
            Frequency::complex(0.25, -2.0),
        ] {
            assert_eq!(f.to_string().parse::<Frequency>().unwrap(), f);
        }
    }

    #[test]
    fn test_frequency_deserialize_number_or_text() {
        let from_number = Frequency::deserialize(deserializer_for(2.5f64)).unwrap();
        assert_eq!(from_number, Frequency::real(2.5));
        let from_text = Frequency::deserialize(deserializer_for("0.3+2j")).unwrap();
        assert_eq!(from_text, Frequency::complex(0.3, 2.0));
        assert!(Frequency::deserialize(deserializer_for("bogus")).is_err());
    }

    #[test]
    fn test_frequency_scalar_conversion() {
        assert_eq!(
            Frequency::real(1.0).to_point::<f64>().unwrap(),
            InterpolationPoint::Finite(1.0)
        );
        assert_eq!(
            Frequency::Infinity.to_point::<f64>().unwrap(),
            InterpolationPoint::Infinity
        );
        assert!(
            Frequency::complex(0.0, 1.0)
                .to_point::<f64>()
                .unwrap_err()
                .is_configuration()
        );
        assert_eq!(
            Frequency::complex(0.0, 1.0).to_point::<c64>().unwrap(),
            InterpolationPoint::Finite(c64::new(0.0, 1.0))
        );
    }

    #[test]
    fn test_order_resolution() {
        assert_eq!(Order::from(3).single().unwrap(), 3);
        assert_eq!(Order::from(3).per_point(2).unwrap(), vec![3, 3]);
        assert_eq!(Order::from(vec![2, 4]).per_point(2).unwrap(), vec![2, 4]);
        assert!(Order::from(vec![2, 4]).per_point(3).unwrap_err().is_configuration());
        assert!(Order::from(0).single().unwrap_err().is_configuration());
        assert!(Order::from(vec![1, 0]).per_point(2).unwrap_err().is_configuration());
    }

    #[test]
    fn test_settings_validation() {
        let settings = RomSettings::new(Algorithm::OneSidedArnoldi, 4);
        settings.validate().unwrap();
        assert_eq!(settings.resolved_frequencies(), vec![Frequency::Infinity]);

        let too_many = RomSettings::new(Algorithm::TwoSidedArnoldi, 4)
            .with_frequencies([Frequency::real(0.0), Frequency::real(1.0)]);
        assert!(too_many.validate().unwrap_err().is_configuration());

        let one_point = RomSettings::new(Algorithm::DualRationalArnoldi, 2)
            .with_frequencies([Frequency::real(0.0)]);
        assert_eq!(
            one_point.validate().unwrap_err(),
            RomError::from(RomErrorKind::TooFewInterpolationPoints {
                algorithm: "dual_rational_arnoldi",
                required: 2,
                given: 1,
            })
        );

        let repeated = RomSettings::new(Algorithm::DualRationalArnoldi, 2)
            .with_frequencies([Frequency::real(1.0), Frequency::real(1.0)]);
        assert!(repeated.validate().unwrap_err().is_configuration());

        let multi = RomSettings::new(Algorithm::DualRationalArnoldi, vec![3, 1])
            .with_frequencies([Frequency::real(0.0), Frequency::complex(0.0, 5.0)])
            .with_parallel(true);
        multi.validate().unwrap();
        assert_eq!(multi.resolved_orders().unwrap(), vec![3, 1]);

        let unavailable = RomSettings::new(Algorithm::RealRationalArnoldi, 2)
            .with_frequencies([Frequency::real(0.0), Frequency::real(1.0)]);
        assert_eq!(
            unavailable.validate().unwrap_err().to_string(),
            "Reduction algorithm 'real_rational_arnoldi' is not implemented."
        );
    }
}
