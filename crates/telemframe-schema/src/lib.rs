//! Load telemframe schemas from JSON definition files.
//!
//! A definition lists channels in wire order:
//!
//! ```json
//! {"name": "engine", "channels": [{"key": 1, "data_type": "float32"}]}
//! ```
//!
//! Both ends of a stream load the same definition, so the binary codec never
//! has to carry channel keys or types.

pub mod catalog;
pub mod config;
pub mod definition;
pub mod error;
pub mod loader;

pub use catalog::SchemaCatalog;
pub use config::LoaderConfig;
pub use definition::{ChannelDefinition, SchemaDefinition};
pub use error::{Result, SchemaError};
pub use loader::SchemaLoader;
