use serde::Serialize;

use crate::collections::FxIndexMap;
use crate::eatery::{EateryAttributes, MAX_RATING};
use crate::preferences::{Factor, PreferenceVector};


/// One eatery taking part in a query
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    pub id: &'a str,
    pub attributes: &'a EateryAttributes,
    /// Distance from the query start in meters
    pub distance: f64,
}

/// Desirability of one candidate
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EateryScore {
    /// Weighted sum in [0, 1]
    pub score: f64,
    pub distance: f64,
}


/// Score every candidate against the others
/// Distance and price are normalized over the candidate set, so the same
/// eatery can score differently in a different query
pub fn score_candidates<'a>(candidates: &[Candidate<'a>], preferences: &PreferenceVector) -> FxIndexMap<&'a str, EateryScore> {
    let Some(first) = candidates.first() else {
        return FxIndexMap::default();
    };

    let d_max = candidates.iter().map(|c| c.distance).fold(0.0, f64::max);
    let (price_min, price_max) = candidates.iter().fold(
        (first.attributes.price, first.attributes.price),
        |(lo, hi), c| (lo.min(c.attributes.price), hi.max(c.attributes.price)),
    );

    candidates.iter().map(|c| {
        let attrs = c.attributes;
        let distance = if d_max > 0.0 { 1.0 - c.distance / d_max } else { 1.0 };
        let rating = (attrs.rating / MAX_RATING).clamp(0.0, 1.0);
        let price = if price_max > price_min {
            1.0 - f64::from(attrs.price - price_min) / f64::from(price_max - price_min)
        } else {
            1.0
        };

        let components = [
            (Factor::Distance, distance),
            (Factor::Rating, rating),
            (Factor::Price, price),
            (Factor::PowerOutlet, amenity(attrs.power_outlet)),
            (Factor::HalalCertified, amenity(attrs.halal_certified)),
            (Factor::Wifi, amenity(attrs.wifi)),
            (Factor::Aircon, amenity(attrs.aircon)),
        ];
        let score: f64 = components.iter().map(|&(f, v)| preferences.weight(f) * v).sum();

        (c.id, EateryScore { score: score.clamp(0.0, 1.0), distance: c.distance })
    }).collect()
}

fn amenity(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}
