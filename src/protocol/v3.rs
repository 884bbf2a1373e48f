//! GPSD JSON Protocol Version 3 implementation
//!
//! This module implements the subset of version 3 of the GPSD JSON protocol
//! needed by a watching client: enabling watch mode and consuming the
//! resulting report stream. Responses are JSON objects carrying a `class`
//! field; commands start with `?` and end with `;`.
//!
//! Report classes outside the TPV/SKY/ATT set this crate types explicitly
//! (VERSION, DEVICES, PPS, ...) are passed through as
//! [`Report::Unrecognized`] rather than rejected.
//!
//! # References
//!
//! Based on the GPSD project protocol specification:
//! - [GPSD Protocol Documentation](https://gpsd.io/gpsd_json.html)

/// Request message types and command encoding
pub mod request;
/// Response report types and classification
pub mod response;
/// Common data types used in protocol messages
pub mod types;

pub use response::{Att, Report, ReportClass, Sky, Tpv};
pub use types::{FixMode, Satellite, Watch};

/// Type alias for version 3 request messages
pub type RequestMessage = request::Message;
