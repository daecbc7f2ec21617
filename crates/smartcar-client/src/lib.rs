//! Smartcar API client library.
//!
//! Wraps the Smartcar vehicle-telematics REST API: OAuth2 authorization
//! via Connect, vehicle data and control endpoints, batched multi-resource
//! fetches, webhook verification, and account management operations.
//!
//! # Example
//!
//! ```rust,no_run
//! use smartcar_client::Vehicle;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let vehicle = Vehicle::new("access-token", "vehicle-id")?;
//!
//!     // Single resource fetch; `meta` carries the sc-* response headers.
//!     let odometer = vehicle.odometer().await?;
//!     println!("distance: {:?}", odometer.get("distance"));
//!
//!     // One round trip for several resources. Entries fail independently:
//!     // a sub-error raises when that entry is read, not before.
//!     let batch = vehicle.batch(&["/odometer", "/location"]).await?;
//!     let odometer = batch.get("odometer")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The [`testing`] module runs an in-process mock of the API:
//!
//! ```rust,ignore
//! use smartcar_client::testing::{MockSmartcarServer, Stub};
//!
//! let server = MockSmartcarServer::start().await?;
//! server.stub(Stub::new("GET", "/v2.0/vehicles/veh_1/odometer")
//!     .body(serde_json::json!({"distance": 378.2})));
//! ```

pub mod auth;
mod batch;
mod client;
pub mod config;
mod error;
mod management;
mod registry;
pub mod testing;
mod webhooks;

pub use auth::{AuthClient, AuthClientOptions, AuthUrlOptions, ConnectMode, SingleSelect, TokenSet};
pub use batch::BatchResult;
pub use client::{Paging, UnitSystem, Vehicle, VehicleOptions};
pub use error::{Result, SmartcarError};
pub use management::{
    delete_connections, get_compatibility, get_connections, get_user, get_vehicles, ApiOptions,
    CompatibilityOptions, ConnectionFilter, CursorPaging,
};
pub use registry::{lookup, path_to_name, ResourceSpec, Verb, RESOURCES};
pub use webhooks::{hash_challenge, verify_payload};

// Re-export core types for convenience
pub use smartcar_core::{
    Headers, Record, ResponseMeta, SmartcarApiError, StructuredValue, SDK_ERROR_TYPE,
};
