//! Arena-addressed data model: objects, extents and stripes.
//!
//! Every back-reference between these types is an integer handle from
//! [`ids`], never a shared pointer — the source's cyclic extent↔stripe and
//! extent↔object back-pointers are replaced by arena lookups (see
//! `SPEC_FULL.md` §9).

pub mod extent;
pub mod ids;
pub mod object;
pub mod stripe;

pub use extent::{Extent, ExtentShard};
pub use ids::{ExtentId, IdAllocator, ObjectId, StripeId};
pub use object::{Object, Shard};
pub use stripe::Stripe;
