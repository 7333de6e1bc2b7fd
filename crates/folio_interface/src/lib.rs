//! Capability traits for the Folio narrative engine.
//!
//! Generation and revision are written once against these traits:
//! [`ProviderAdapter`] over every text-generation backend and
//! [`DecisionSource`] over every way of choosing revisions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod decision;
mod traits;

pub use decision::DecisionSource;
pub use traits::ProviderAdapter;
