//! Core types for surface water extent series.
//!
//! These types carry no knowledge of the remote service. A [`region::Region`]
//! and a [`date_range::DateRange`] go in, a [`observation::TimeSeries`] of
//! [`observation::MonthlyObservation`] comes back out.

pub mod date_range;
pub mod error;
pub mod observation;
pub mod region;

pub use date_range::DateRange;
pub use error::{DataError, Result};
pub use observation::{MonthlyObservation, TimeSeries};
pub use region::Region;
