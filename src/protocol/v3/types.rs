use serde::{Deserialize, Serialize};
use serde_repr::Deserialize_repr;
use serde_with::skip_serializing_none;

/// GPS fix mode as reported in the TPV `mode` field
///
/// * [gps_fix_t.mode](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L181)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum FixMode {
    NotSeen = 0,
    NoFix = 1,
    Fix2D = 2,
    Fix3D = 3,
}

impl FixMode {
    /// Whether this mode carries at least a 2D position
    pub fn has_fix(&self) -> bool {
        matches!(self, FixMode::Fix2D | FixMode::Fix3D)
    }
}

/// One satellite entry of a SKY report
///
/// - [json_attrs_satellites](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L295)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Satellite {
    /// Pseudo-random noise id of the satellite
    #[serde(rename = "PRN")]
    pub prn: i16,
    /// Azimuth in degrees from true north
    #[serde(rename = "az")]
    pub azimuth: Option<f64>,
    /// Elevation in degrees above the horizon
    #[serde(rename = "el")]
    pub elevation: Option<f64>,
    /// Signal-to-noise ratio in dBHz
    pub ss: Option<f64>,
    /// Whether this satellite is used in the current solution
    pub used: bool,
}

/// Dilution-of-precision values of a SKY report
///
/// Each field is `None` when the daemon omitted it; a record with no DOP
/// data at all yields the all-`None` default.
///
/// * [dop_t](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L2557)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dop {
    #[serde(rename = "xdop")]
    pub x: Option<f64>,
    #[serde(rename = "ydop")]
    pub y: Option<f64>,
    #[serde(rename = "pdop")]
    pub p: Option<f64>,
    #[serde(rename = "hdop")]
    pub h: Option<f64>,
    #[serde(rename = "vdop")]
    pub v: Option<f64>,
    #[serde(rename = "tdop")]
    pub t: Option<f64>,
    #[serde(rename = "gdop")]
    pub g: Option<f64>,
}

/// # Watch Policy
/// - [json_watch_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/shared_json.c#L95)
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub device: Option<String>,
    pub enable: Option<bool>,
    pub json: Option<bool>,
}

impl Watch {
    /// Watch policy enabling the JSON report stream on this connection
    pub fn enable_json() -> Self {
        Watch {
            device: None,
            enable: Some(true),
            json: Some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proto_v3_types_fix_mode() {
        let mode: FixMode = serde_json::from_str("3").unwrap();
        assert_eq!(mode, FixMode::Fix3D);
        assert!(mode.has_fix());
        assert!(!FixMode::NoFix.has_fix());

        assert!(serde_json::from_str::<FixMode>("7").is_err());
    }

    #[test]
    fn test_proto_v3_types_watch_serializes_sparse() {
        let serialized = serde_json::to_string(&Watch::enable_json()).unwrap();
        assert_eq!(serialized, r#"{"enable":true,"json":true}"#);
    }
}
