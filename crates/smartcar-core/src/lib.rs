//! Core response model for the Smartcar API.
//!
//! This crate is the pure data layer shared by the HTTP client: recursive
//! normalization of response JSON into [`StructuredValue`] trees, response
//! metadata drawn from `sc-*` headers, field aliasing, and classification
//! of error responses into [`SmartcarApiError`]. Nothing here performs I/O,
//! and everything is safe to call concurrently.

mod alias;
mod error;
mod headers;
mod meta;
mod response;
mod value;

pub use alias::{apply_aliases, AliasTable};
pub use error::{classify, SmartcarApiError, SDK_ERROR_TYPE};
pub use headers::Headers;
pub use meta::{
    build_meta, ResponseMeta, DATA_AGE_HEADER, FETCHED_AT_HEADER, REQUEST_ID_HEADER,
    UNIT_SYSTEM_HEADER,
};
pub use response::build_response;
pub use value::{normalize, Record, StructuredValue};
