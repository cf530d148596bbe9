//! Domain data model shared between the count engine and its front-ends.
//!
//! The remote data service owns every record described here; the engine
//! treats them as externally authoritative except for the single
//! first-scan barcode attachment on [`Item`].

mod ids;
mod model;

pub use ids::CountId;
pub use ids::IdError;
pub use ids::ItemId;
pub use model::CountLine;
pub use model::Item;
