use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographical point as sent to NASA POWER.
///
/// Unlike many geo crates, the longitude comes first: this is the order the
/// point is keyed in the series cache (`"{longitude}:{latitude}"`).
///
/// # Examples
///
/// ```
/// use power_outlook::Coordinate;
///
/// let amsterdam = Coordinate::new(4.9041, 52.3676);
/// assert_eq!(amsterdam.longitude, 4.9041);
/// assert_eq!(amsterdam.latitude, 52.3676);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lon {}, lat {})", self.longitude, self.latitude)
    }
}

/// How a [`Coordinate`] is turned into a series cache key.
///
/// With [`CoordinatePolicy::Verbatim`] two requests whose floats differ only
/// by noise (`52.1` vs `52.100000001`) land in different cache entries.
/// [`CoordinatePolicy::FixedPrecision`] rounds both components first so such
/// requests share one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatePolicy {
    #[default]
    Verbatim,
    /// Round to this many decimal places before formatting.
    FixedPrecision(u8),
}

/// The key a coordinate's series are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl CoordinatePolicy {
    pub fn cache_key(&self, coordinate: &Coordinate) -> CacheKey {
        match *self {
            CoordinatePolicy::Verbatim => {
                CacheKey(format!("{}:{}", coordinate.longitude, coordinate.latitude))
            }
            CoordinatePolicy::FixedPrecision(decimals) => {
                let decimals = usize::from(decimals);
                // `+ 0.0` folds a rounded `-0.0` into `0.0`.
                let lon = round_to(coordinate.longitude, decimals) + 0.0;
                let lat = round_to(coordinate.latitude, decimals) + 0.0;
                CacheKey(format!("{:.*}:{:.*}", decimals, lon, decimals, lat))
            }
        }
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
