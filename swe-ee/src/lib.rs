//! Earth Engine client pieces for surface water extent series.
//!
//! The computation sent to the service is described by [`water_area::WaterAreaQuery`]
//! and serialized as an [`expression::Expression`] graph. Nothing in the
//! graph runs locally. With the `api` feature the crate also provides
//! credential handling and a [`session::Session`] that submits the graph in
//! one `value:compute` request.

pub mod error;
pub mod expression;
pub mod water_area;

#[cfg(feature = "api")]
pub mod auth;
#[cfg(feature = "api")]
pub mod credentials;
#[cfg(feature = "api")]
pub mod session;

pub use error::{EeError, Result};
