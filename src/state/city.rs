//! Cities: exclusively owned, transferable shares of a country's holdings.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::country::CountryId;
use super::resource::ResourceInventory;

/// Stable identifier of a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub u32);

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A city and its share of the owner's population and resources.
///
/// Summed over all cities of a country, `population` and each resource
/// equal that country's aggregate stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub owner: CountryId,
    pub population: u64,
    #[serde(default)]
    pub resources: ResourceInventory,
    /// Opaque map geometry, carried through untouched for the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
}

impl City {
    pub fn new(id: CityId, name: impl Into<String>, owner: CountryId) -> Self {
        City {
            id,
            name: name.into(),
            owner,
            population: 0,
            resources: ResourceInventory::empty(),
            geometry: None,
        }
    }
}

/// Splits `total` into parts proportional to `weights` using the
/// largest-remainder method. The parts always sum to `total`.
///
/// When every weight is zero the split is even, with the remainder going
/// to the earliest entries. Ties on remainder go to the earlier index.
pub fn apportion(total: u64, weights: &[u64]) -> Vec<u64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let weight_sum: u128 = weights.iter().map(|&w| w as u128).sum();
    if weight_sum == 0 {
        let base = total / n as u64;
        let extra = (total % n as u64) as usize;
        return (0..n).map(|i| base + u64::from(i < extra)).collect();
    }

    let mut parts = Vec::with_capacity(n);
    let mut remainders = Vec::with_capacity(n);
    let mut assigned: u128 = 0;
    for (i, &w) in weights.iter().enumerate() {
        let scaled = total as u128 * w as u128;
        let quota = scaled / weight_sum;
        parts.push(quota as u64);
        remainders.push((scaled % weight_sum, i));
        assigned += quota;
    }

    let mut leftover = (total as u128 - assigned) as usize;
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in &remainders {
        if leftover == 0 {
            break;
        }
        parts[i] += 1;
        leftover -= 1;
    }
    parts
}
