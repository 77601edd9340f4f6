//! SQLite-backed durability for the deconfliction engine (§10.4).
//!
//! The in-memory trajectory store is the fast path for every read and for
//! the atomic accept/reject decision itself; a successful commit is
//! mirrored here immediately afterward so a restart can rehydrate the same
//! state, without holding the store's write lock across a disk write.

pub mod conflicts;
pub mod db;
pub mod drones;
pub mod missions;
pub mod trajectories;

pub use db::{init_database, Database};
