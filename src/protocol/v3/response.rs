//! GPSD Protocol v3 report types and classification
//!
//! GPSD identifies each streamed JSON object through its `class` field.
//! This module types the classes a watching client consumes (TPV, SKY, ATT)
//! and passes every other class through verbatim as
//! [`Report::Unrecognized`].
//!
//! GPSD marks unknown values by omitting the field rather than sending a
//! sentinel, so every field that can be absent on the wire is an `Option`
//! here. `None` means "the receiver did not report this", which downstream
//! consumers must not conflate with a zero value.
//!
//! All timestamps use the ISO 8601 format and are represented as `DateTime<Utc>`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{Result, error::GpsdWatchError};

use super::types::*;

/// Time-Position-Velocity (TPV) report
///
/// The TPV message is the core GPS fix report, containing time, position,
/// and velocity data along with the daemon's error estimates.
///
/// Reference: [json_tpv_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L34)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tpv {
    /// Device path that provided this data
    pub device: Option<String>,
    /// GPS fix mode
    pub mode: FixMode,
    /// GPS time of fix
    pub time: Option<DateTime<Utc>>,
    /// Latitude in degrees (positive = North)
    pub lat: Option<f64>,
    /// Longitude in degrees (positive = East)
    pub lon: Option<f64>,
    /// Altitude in meters
    pub alt: Option<f64>,
    /// True track (course over ground) in degrees
    pub track: Option<f64>,
    /// Speed over ground in meters/second
    pub speed: Option<f64>,
    /// Climb/sink rate in meters per second
    pub climb: Option<f64>,
    /// Estimated timestamp error in seconds
    pub ept: Option<f64>,
    /// Longitude error estimate in meters
    pub epx: Option<f64>,
    /// Latitude error estimate in meters
    pub epy: Option<f64>,
    /// Estimated vertical error in meters
    pub epv: Option<f64>,
    /// Estimated speed error in meters/second
    pub eps: Option<f64>,
    /// Estimated climb error in meters/second
    pub epc: Option<f64>,
}

/// Satellite Sky View (SKY) report
///
/// Reports the satellites visible to the receiver, including signal
/// strength, elevation, azimuth, and usage status.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sky {
    /// Device path that provided this data
    pub device: Option<String>,
    /// GPS time of this sky view
    pub time: Option<DateTime<Utc>>,
    /// Dilution of precision values, flattened from the record's top
    /// level; check the individual fields for absence
    #[serde(flatten)]
    pub dop: Dop,
    /// Number of satellites visible
    #[serde(rename = "nSat")]
    pub n_sat: Option<i32>,
    /// Number of satellites used in the navigation solution
    #[serde(rename = "uSat")]
    pub u_sat: Option<i32>,
    /// List of visible satellites with their properties
    ///
    /// GPSD omits the array entirely when no satellite data is available.
    #[serde(default)]
    pub satellites: Vec<Satellite>,
}

/// Attitude (ATT) report
///
/// Orientation data from an inertial navigation system, when the
/// receiver provides one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Att {
    /// Device path that provided this data
    pub device: Option<String>,
    /// Time of this attitude sample
    pub time: Option<DateTime<Utc>>,
    /// Heading in degrees from true north
    pub heading: Option<f64>,
    /// Pitch in degrees
    pub pitch: Option<f64>,
    /// Roll in degrees
    pub roll: Option<f64>,
}

/// The report classes cached by the client's latest-value slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportClass {
    Tpv,
    Sky,
    Att,
}

/// A classified GPSD report
///
/// Classes outside the typed set are preserved, not dropped: the class
/// name and the raw record text ride along in
/// [`Unrecognized`](Report::Unrecognized) so a consumer can still inspect
/// VERSION, DEVICES, PPS and friends.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Time-Position-Velocity report
    Tpv(Tpv),
    /// Satellite sky view report
    Sky(Sky),
    /// Attitude/orientation report
    Att(Att),
    /// Any other report class, passed through verbatim
    Unrecognized { class: String, raw: String },
}

impl Report {
    /// Decodes one newline-framed record into a classified report
    ///
    /// Malformed JSON yields [`GpsdWatchError::SerdeError`]; valid JSON
    /// without a `class` field yields [`GpsdWatchError::MissingClass`].
    /// Either way the record is dropped by the caller and the stream
    /// continues; decode failures are never connection-fatal.
    pub fn decode(line: &[u8]) -> Result<Report> {
        #[derive(Deserialize)]
        struct ClassTag {
            class: Option<String>,
        }

        let tag: ClassTag =
            serde_json::from_slice(line).map_err(GpsdWatchError::SerdeError)?;
        let Some(class) = tag.class else {
            return Err(GpsdWatchError::MissingClass);
        };

        let report = match class.as_str() {
            "TPV" => {
                Report::Tpv(serde_json::from_slice(line).map_err(GpsdWatchError::SerdeError)?)
            }
            "SKY" => {
                Report::Sky(serde_json::from_slice(line).map_err(GpsdWatchError::SerdeError)?)
            }
            "ATT" => {
                Report::Att(serde_json::from_slice(line).map_err(GpsdWatchError::SerdeError)?)
            }
            _ => Report::Unrecognized {
                class,
                raw: String::from_utf8_lossy(line).into_owned(),
            },
        };

        Ok(report)
    }

    /// The latest-value slot this report belongs to, if any
    pub fn class(&self) -> Option<ReportClass> {
        match self {
            Report::Tpv(_) => Some(ReportClass::Tpv),
            Report::Sky(_) => Some(ReportClass::Sky),
            Report::Att(_) => Some(ReportClass::Att),
            Report::Unrecognized { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tpv_sparse_fields() {
        let line = br#"{"class":"TPV","mode":3,"lat":47.6,"lon":-122.3}"#;
        let Report::Tpv(tpv) = Report::decode(line).unwrap() else {
            panic!("expected TPV");
        };

        assert_eq!(tpv.mode, FixMode::Fix3D);
        assert_eq!(tpv.lat, Some(47.6));
        assert_eq!(tpv.lon, Some(-122.3));
        // Absent fields stay absent, never zero.
        assert_eq!(tpv.alt, None);
        assert_eq!(tpv.speed, None);
        assert_eq!(tpv.time, None);
        assert_eq!(tpv.device, None);
    }

    #[test]
    fn test_decode_tpv_full_fix() {
        let line = br#"{"class":"TPV","device":"/dev/ttyUSB0","mode":3,
            "time":"2023-01-01T12:00:00.000Z","ept":0.005,"lat":48.117,
            "lon":11.517,"alt":545.4,"epx":15.319,"epy":17.054,"epv":124.484,
            "track":10.3797,"speed":0.091,"climb":10.7,"eps":34.11,"epc":248.97}"#;
        let Report::Tpv(tpv) = Report::decode(line).unwrap() else {
            panic!("expected TPV");
        };

        assert_eq!(tpv.device.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(tpv.alt, Some(545.4));
        assert_eq!(tpv.climb, Some(10.7));
        assert_eq!(tpv.epx, Some(15.319));
        assert_eq!(tpv.epc, Some(248.97));
        assert_eq!(
            tpv.time.unwrap().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2023-01-01T12:00:00.000Z"
        );
    }

    #[test]
    fn test_decode_sky_satellites() {
        let line = br#"{"class":"SKY","nSat":2,"uSat":1,"hdop":1.2,"satellites":[
            {"PRN":12,"el":45.0,"az":180.0,"ss":38.0,"used":true},
            {"PRN":25,"used":false}]}"#;
        let Report::Sky(sky) = Report::decode(line).unwrap() else {
            panic!("expected SKY");
        };

        assert_eq!(sky.n_sat, Some(2));
        assert_eq!(sky.u_sat, Some(1));
        assert_eq!(sky.dop.h, Some(1.2));
        assert_eq!(sky.dop.p, None);
        assert_eq!(sky.satellites.len(), 2);
        assert_eq!(sky.satellites[0].prn, 12);
        assert!(sky.satellites[0].used);
        assert_eq!(sky.satellites[1].elevation, None);
        assert!(!sky.satellites[1].used);
    }

    #[test]
    fn test_decode_sky_without_satellite_list() {
        let Report::Sky(sky) = Report::decode(br#"{"class":"SKY"}"#).unwrap() else {
            panic!("expected SKY");
        };
        assert!(sky.satellites.is_empty());
        assert_eq!(sky.n_sat, None);
        // No DOP fields on the wire decodes as the all-absent default.
        assert_eq!(sky.dop, Dop::default());
    }

    #[test]
    fn test_decode_att() {
        let line = br#"{"class":"ATT","device":"/dev/imu0","heading":271.5,"pitch":-1.2}"#;
        let Report::Att(att) = Report::decode(line).unwrap() else {
            panic!("expected ATT");
        };

        assert_eq!(att.heading, Some(271.5));
        assert_eq!(att.pitch, Some(-1.2));
        assert_eq!(att.roll, None);
    }

    #[test]
    fn test_decode_unrecognized_class_passes_through() {
        let line = br#"{"class":"PPS","device":"/dev/pps0"}"#;
        let report = Report::decode(line).unwrap();

        let Report::Unrecognized { class, raw } = &report else {
            panic!("expected unrecognized report");
        };
        assert_eq!(class, "PPS");
        assert_eq!(raw.as_bytes(), line);
        assert_eq!(report.class(), None);
    }

    #[test]
    fn test_decode_malformed_json() {
        assert!(matches!(
            Report::decode(b"not json"),
            Err(GpsdWatchError::SerdeError(_))
        ));
    }

    #[test]
    fn test_decode_missing_class() {
        assert!(matches!(
            Report::decode(br#"{"mode":3}"#),
            Err(GpsdWatchError::MissingClass)
        ));
    }
}
