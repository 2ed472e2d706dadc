//! Compact schema-bound binary framing for multi-channel telemetry.
//!
//! # Crate Structure
//!
//! - [`codec`]: Schema, Frame, Series and the binary frame codec
//! - [`schema`]: Loading schemas from JSON definition files

/// Re-export codec types.
pub mod codec {
    pub use telemframe_codec::*;
}

/// Re-export schema loading types.
pub mod schema {
    pub use telemframe_schema::*;
}
