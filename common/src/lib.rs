pub mod identity;
pub mod limits;
pub mod payload;

pub use identity::{AmbientSources, FixedIdentifier, IdentifierProvider, NOT_FOUND};
pub use limits::DeliveryLimits;
pub use payload::{FeedbackPayload, PayloadError, PixelPayload};
