//! Household sync.
//!
//! A household shares one document, named by its [`HouseholdCode`]. The
//! [`SyncCoordinator`] pushes, pulls and subscribes through a
//! [`DocumentStore`]; the [`PushScheduler`] debounces local changes into
//! pushes and ignores remote ones.
//!
//! [`HouseholdCode`]: crate::household::HouseholdCode

mod coordinator;
mod error;
mod firestore;
mod scheduler;
mod store;

pub use coordinator::{Subscription, SyncCoordinator};
pub use error::SyncError;
pub use firestore::{
    decode_fields, decode_value, encode_fields, encode_value, FirestoreStore,
    DEFAULT_BASE_URL as FIRESTORE_BASE_URL, DEFAULT_POLL_INTERVAL,
};
pub use scheduler::{Origin, PushScheduler, StateChange, DEFAULT_QUIET_PERIOD};
pub use store::{DocumentSnapshot, DocumentStore, MemoryDocumentStore};
