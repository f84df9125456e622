//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, or the JSON map layout)
//!     → loader.rs (parse, deserialize, name unnamed mappings)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → live.rs (MappingTable snapshot + UdpSwitch flag)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the mapping table
//!     → next event sees the new mappings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod live;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use live::{MappingTable, UdpSwitch};
pub use loader::{load_config, ConfigError};
pub use schema::BridgeConfig;
pub use schema::BrokerConfig;
pub use schema::LoggingConfig;
pub use schema::Mapping;
pub use schema::ObservabilityConfig;
pub use schema::SpeedUnits;
pub use schema::UdpTarget;
