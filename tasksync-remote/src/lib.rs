//! Remote side of tasksync.
//!
//! Provides:
//! - The [`RemoteStore`] contract the sync engine consumes
//! - [`FirestoreClient`], a Firestore REST v1 implementation of it
//! - Connectivity probes deciding which path an engine operation takes

pub mod config;
pub mod error;
pub mod firestore;
pub mod probe;
pub mod store;

pub use config::RemoteConfig;
pub use error::{RemoteError, RemoteResult};
pub use firestore::FirestoreClient;
pub use probe::{ConnectivityProbe, HttpProbe, ManualProbe};
pub use store::RemoteStore;
