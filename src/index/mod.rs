//! Index structures.
//!
//! - [`btree`] - disk-resident B+tree over `i32` keys

pub mod btree;
