use std::{fmt, str::FromStr};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::errors::PreferenceError;


/// Closed set of attributes a user can weight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Distance,
    Rating,
    Price,
    PowerOutlet,
    HalalCertified,
    Wifi,
    Aircon,
}

impl Factor {

    pub const ALL: [Factor; 7] = [
        Factor::Distance,
        Factor::Rating,
        Factor::Price,
        Factor::PowerOutlet,
        Factor::HalalCertified,
        Factor::Wifi,
        Factor::Aircon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Distance => "distance",
            Factor::Rating => "rating",
            Factor::Price => "price",
            Factor::PowerOutlet => "power_outlet",
            Factor::HalalCertified => "halal_certified",
            Factor::Wifi => "wifi",
            Factor::Aircon => "aircon",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Factor {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Factor::ALL.into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| PreferenceError::UnknownFactor(s.to_string()))
    }
}


/// Normalized importance weights, always summing to 1.0
#[derive(Clone, Debug, PartialEq)]
pub struct PreferenceVector {
    weights: [f64; 7],
}

/// Distance-dominant default used when the caller supplies nothing
/// distance 0.40, rating 0.20, price 0.20, each amenity 0.05
const DEFAULT_WEIGHTS: [f64; 7] = [0.40, 0.20, 0.20, 0.05, 0.05, 0.05, 0.05];

impl Default for PreferenceVector {
    fn default() -> Self {
        Self { weights: DEFAULT_WEIGHTS }
    }
}

impl PreferenceVector {

    /// Raw non-negative weights, absent factors get 0
    /// An all-zero input falls back to the default weighting
    pub fn from_weights<I>(weights: I) -> Result<Self, PreferenceError>
    where
        I: IntoIterator<Item = (Factor, f64)>,
    {
        let mut raw = [0.0; 7];
        for (factor, weight) in weights {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(PreferenceError::InvalidWeight { factor: factor.to_string(), weight });
            }
            raw[factor.index()] = weight;
        }
        Ok(Self::normalized(raw))
    }

    /// Same as `from_weights` with factor names parsed at the boundary
    pub fn from_named<I, K>(weights: I) -> Result<Self, PreferenceError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let parsed = weights.into_iter()
            .map(|(name, weight)| Ok((name.as_ref().parse::<Factor>()?, weight)))
            .collect::<Result<Vec<_>, PreferenceError>>()?;
        Self::from_weights(parsed)
    }

    /// Ranks where 1 is most important
    /// Each rank becomes `max_rank - rank + 1` before normalizing, ranks below 1 are ignored
    pub fn from_ranks<I>(ranks: I) -> Self
    where
        I: IntoIterator<Item = (Factor, i64)>,
    {
        let valid: Vec<(Factor, i64)> = ranks.into_iter().filter(|&(_, r)| r > 0).collect();
        let Some(max_rank) = valid.iter().map(|&(_, r)| r).max() else {
            return Self::default();
        };

        let mut raw = [0.0; 7];
        for (factor, rank) in valid {
            raw[factor.index()] = (max_rank - rank + 1) as f64;
        }
        Self::normalized(raw)
    }

    /// All weight on a single factor
    pub fn only(factor: Factor) -> Self {
        let mut weights = [0.0; 7];
        weights[factor.index()] = 1.0;
        Self { weights }
    }

    pub fn weight(&self, factor: Factor) -> f64 {
        self.weights[factor.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        Factor::ALL.into_iter().map(|f| (f, self.weights[f.index()]))
    }

    fn normalized(raw: [f64; 7]) -> Self {
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return Self::default();
        }
        Self { weights: raw.map(|w| w / total) }
    }
}

impl Serialize for PreferenceVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Factor::ALL.len()))?;
        for (factor, weight) in self.iter() {
            map.serialize_entry(factor.as_str(), &weight)?;
        }
        map.end()
    }
}
