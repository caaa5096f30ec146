//! Storage layer - page stores and page formats.
//!
//! This module handles persistent storage:
//! - [`PageStore`] - The page store interface
//! - [`DiskManager`] - File-backed page store
//! - [`InMemoryPageStore`] - RAM-backed page store
//! - [`page`] - Page types and layouts

mod disk_manager;
mod memory;
pub mod page;
mod page_store;

pub use disk_manager::DiskManager;
pub use memory::InMemoryPageStore;
pub use page_store::PageStore;
