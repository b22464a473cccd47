//! Per-domain tool-result records. Inserted into `RunState` dictionaries
//! by `option_ref`, read-only thereafter.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::provenance::Provenance;
use super::tri::Tri;

/// `chrono` only implements `Deserialize` for `DateTime<Utc/Local/FixedOffset>`,
/// not for the generic `DateTime<Tz>` from `chrono_tz`. This (de)serializes
/// the instant alongside the IANA zone name so the named zone round-trips.
mod tz_datetime {
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Wire {
        instant: DateTime<Utc>,
        zone: Tz,
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error> {
        Wire {
            instant: value.with_timezone(&Utc),
            zone: value.timezone(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Tz>, D::Error> {
        let wire = Wire::deserialize(deserializer)?;
        Ok(wire.zone.from_utc_datetime(&wire.instant.naive_utc()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightResult {
    pub option_ref: String,
    pub origin: String,
    pub destination: String,
    #[serde(with = "tz_datetime")]
    pub depart: DateTime<Tz>,
    #[serde(with = "tz_datetime")]
    pub arrive: DateTime<Tz>,
    pub price_cents: i64,
    pub overnight: bool,
    pub carrier: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodgingResult {
    pub option_ref: String,
    pub name: String,
    pub price_per_night_cents: i64,
    pub geo: Option<(f64, f64)>,
    pub provenance: Provenance,
}

/// Zone-aware open/close window pairs indexed by weekday (0=Monday..6=Sunday);
/// supports split hours via multiple entries per weekday.
pub type OpeningHours = HashMap<u8, Vec<(NaiveTime, NaiveTime)>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionResult {
    pub option_ref: String,
    pub name: String,
    /// One of `"museum"`, `"park"`, `"temple"`, `"monument"`, `"church"`,
    /// `"palace"`, `"tour"`, `"neighborhood"`, or `"other"`. Drives the
    /// museum-specific feasibility buffer in the verifier suite.
    pub venue_type: String,
    pub opening_hours: OpeningHours,
    pub indoor: Tri,
    pub kid_friendly: Tri,
    pub themes: Vec<String>,
    pub geo: Option<(f64, f64)>,
    pub provenance: Provenance,
}

impl AttractionResult {
    /// Whether `[start, end]` on the given weekday fits fully inside some
    /// opening window. A missing weekday key or an empty list means
    /// closed.
    pub fn is_open_during(&self, weekday: u8, start: NaiveTime, end: NaiveTime) -> bool {
        self.opening_hours
            .get(&weekday)
            .map(|windows| windows.iter().any(|(open, close)| *open <= start && end <= *close))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitLegResult {
    pub option_ref: String,
    pub mode: String,
    pub duration_seconds: i64,
    pub price_cents: i64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDayResult {
    pub date: NaiveDate,
    pub precip_prob: f64,
    pub wind_kmh: f64,
    pub provenance: Provenance,
}

impl WeatherDayResult {
    /// A day is "bad weather" if precipitation probability is at least
    /// 60% or wind speed is at least 30 km/h.
    pub fn is_bad(&self) -> bool {
        self.precip_prob >= 0.60 || self.wind_kmh >= 30.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRateResult {
    pub pair: String,
    pub rate: f64,
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProvenanceSource;
    use chrono::Utc;

    fn provenance() -> Provenance {
        Provenance {
            source: ProvenanceSource::Fixture,
            ref_id: None,
            source_url: None,
            fetched_at: Utc::now(),
            cache_hit: Tri::No,
            digest_sha256: None,
        }
    }

    #[test]
    fn is_bad_weather_thresholds() {
        let mild = WeatherDayResult {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            precip_prob: 0.1,
            wind_kmh: 10.0,
            provenance: provenance(),
        };
        assert!(!mild.is_bad());

        let rainy = WeatherDayResult {
            precip_prob: 0.80,
            ..mild.clone()
        };
        assert!(rainy.is_bad());

        let windy = WeatherDayResult {
            wind_kmh: 31.0,
            ..mild
        };
        assert!(windy.is_bad());
    }

    #[test]
    fn split_hours_accept_and_reject_correctly() {
        let mut opening_hours = OpeningHours::new();
        opening_hours.insert(
            5, // Saturday
            vec![
                (
                    NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                ),
                (
                    NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                ),
            ],
        );
        let attraction = AttractionResult {
            option_ref: "louvre".to_string(),
            name: "Museum".to_string(),
            venue_type: "museum".to_string(),
            opening_hours,
            indoor: Tri::Yes,
            kid_friendly: Tri::Unknown,
            themes: vec![],
            geo: None,
            provenance: provenance(),
        };

        assert!(attraction.is_open_during(
            5,
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        ));
        assert!(!attraction.is_open_during(
            5,
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
        ));
        assert!(!attraction.is_open_during(
            6,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        ));
    }
}
