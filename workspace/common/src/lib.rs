//! Domain types shared between the service clients and the HTTP backend.
//! These structs carry data across crate boundaries (extracted candidates,
//! marketplace listings) without either side depending on the other.

mod candidate;
mod listing;

pub use candidate::CardCandidate;
pub use listing::PriceListing;

/// Currency everything is normalized into.
pub const BASE_CURRENCY: &str = "SGD";
