pub mod blob;
pub mod event;
pub mod listing;
pub mod tag;
pub mod upload;

pub use blob::{BinaryObject, ContentHash};
pub use event::{Event, EventId, EventSignature, PublicKey, UnsignedEvent};
pub use listing::{Listing, ListingDraft};
pub use tag::{Price, Tag};
pub use upload::{BlobDescriptor, UploadResult};
