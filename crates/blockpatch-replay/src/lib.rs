//! Reference consumer for block patches.
//!
//! A remote party holding only the old flat snapshot and a patch set can
//! rebuild the new snapshot with [`apply_patch`]. Transports that batch
//! inserts can group them with [`coalesce_inserts`].
//!
//! # Key Types
//!
//! - [`PatchReplayer`] -- Parent-pointer tree that applies a patch set in phases
//! - [`InsertChain`] -- A run of consecutive inserted siblings sharing one anchor pair

pub mod chain;
pub mod error;
pub mod replay;

pub use chain::{coalesce_inserts, InsertChain};
pub use error::{ReplayError, ReplayResult};
pub use replay::{apply_patch, PatchReplayer};
