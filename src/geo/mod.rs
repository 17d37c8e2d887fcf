//! Static region lookup
//!
//! Maps a region code or name to its bounding box. The query path turns a box
//! into a centre-plus-radius geocode; the stream listener uses the box itself.

use serde::Serialize;
use std::fmt;

use crate::utils::error::QueryError;

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub const fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    /// Parse `lon_min,lat_min,lon_max,lat_max`
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;

        match parts.as_slice() {
            [lon_min, lat_min, lon_max, lat_max]
                if lon_min < lon_max
                    && lat_min < lat_max
                    && (-180.0..=180.0).contains(lon_min)
                    && (-180.0..=180.0).contains(lon_max)
                    && (-90.0..=90.0).contains(lat_min)
                    && (-90.0..=90.0).contains(lat_max) =>
            {
                Some(Self::new(*lon_min, *lat_min, *lon_max, *lat_max))
            }
            _ => None,
        }
    }

    /// Centre point as `(lat, lon)`
    pub fn centre(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// Search geocode `lat,lon,{radius}km` around the centre
    pub fn geocode(&self, radius_km: u32) -> String {
        let (lat, lon) = self.centre();
        format!("{lat:.4},{lon:.4},{radius_km}km")
    }

    /// Value for the streaming API `locations` parameter
    pub fn locations_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

/// A named region from the lookup table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
    pub bbox: BoundingBox,
}

const REGIONS: &[Region] = &[
    region("AR", "Argentina", -73.4154357571, -55.25, -53.628348965, -21.8323104794),
    region("AU", "Australia", 113.338953078, -43.6345972634, 153.569469029, -10.6681857235),
    region("BR", "Brazil", -73.9872354804, -33.7683777809, -34.7299934555, 5.24448639569),
    region("CA", "Canada", -140.99778, 41.6751050889, -52.6480987209, 83.23324),
    region("CN", "China", 73.6753792663, 18.197700914, 135.026311477, 53.4588044297),
    region("DE", "Germany", 5.98865807458, 47.3024876979, 15.0169958839, 54.983104153),
    region("ES", "Spain", -9.39288367353, 35.946850084, 3.03948408368, 43.7483377142),
    region("FR", "France", -4.79555, 42.33264, 8.23006, 51.08899),
    region("GB", "United Kingdom", -7.57216793459, 49.959999905, 1.68153079591, 58.6350001085),
    region("IE", "Ireland", -9.97708574059, 51.6693012559, -6.03298539878, 55.1316222195),
    region("IN", "India", 68.1766451354, 7.96553477623, 97.4025614766, 35.4940095078),
    region("IT", "Italy", 6.7499552751, 36.619987291, 18.4802470232, 47.1153931748),
    region("JP", "Japan", 129.408463169, 31.0295791692, 145.543137242, 45.5514834662),
    region("MX", "Mexico", -117.12776, 14.5388286402, -86.811982388, 32.72083),
    region("NG", "Nigeria", 2.69170169436, 4.24059418377, 14.5771777686, 13.8659239771),
    region("NL", "Netherlands", 3.31497114423, 50.803721015, 7.09205325687, 53.5104033474),
    region("NZ", "New Zealand", 166.509144322, -46.641235447, 178.517093541, -34.4506617165),
    region("PK", "Pakistan", 60.8742484882, 23.6919650335, 77.8374507995, 37.1330309108),
    region("RU", "Russia", 19.6389, 41.151416124, 180.0, 81.2504),
    region("SE", "Sweden", 11.0273686052, 55.3617373725, 23.9033785336, 69.1062472602),
    region("US", "United States", -171.791110603, 18.91619, -66.96466, 71.3577635769),
    region("ZA", "South Africa", 16.3449768409, -34.8191663551, 32.830120477, -22.0913127581),
];

const fn region(
    code: &'static str,
    name: &'static str,
    lon_min: f64,
    lat_min: f64,
    lon_max: f64,
    lat_max: f64,
) -> Region {
    Region {
        code,
        name,
        bbox: BoundingBox::new(lon_min, lat_min, lon_max, lat_max),
    }
}

/// All known regions, sorted by code
pub fn regions() -> &'static [Region] {
    REGIONS
}

/// Look up a region by code or name, ignoring case; `_` matches a space
pub fn find_region(query: &str) -> Option<&'static Region> {
    let wanted = query.trim().replace('_', " ");
    REGIONS.iter().find(|r| {
        r.code.eq_ignore_ascii_case(&wanted) || r.name.eq_ignore_ascii_case(&wanted)
    })
}

/// Where a query should look for posts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocationSpec {
    /// No geographic filter
    #[default]
    World,
    Region(&'static Region),
}

impl LocationSpec {
    /// Parse a form value: `world` (or blank) or a region code/name
    pub fn parse(value: &str) -> Result<Self, QueryError> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("world") {
            return Ok(Self::World);
        }

        find_region(value)
            .map(Self::Region)
            .ok_or_else(|| QueryError::UnknownLocation(value.to_string()))
    }

    /// Geocode for the search API, `None` for the whole world
    pub fn geocode(&self, radius_km: u32) -> Option<String> {
        match self {
            Self::World => None,
            Self::Region(region) => Some(region.bbox.geocode(radius_km)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::World => "World",
            Self::Region(region) => region.name,
        }
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl fmt::Display for LocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
