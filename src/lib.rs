//! Playdex catalog read layer.
//!
//! Serves a multi-language game catalog (categories, tags, games) to many
//! concurrent readers while the data is edited rarely. The crate is built
//! around a layered, tag-invalidated cache:
//!
//! - **Reference cache**: full, locale-resolved snapshots of the bounded
//!   reference datasets (categories, tags, languages), fetched once per TTL
//!   window.
//! - **Derivations**: pure in-memory maps, partitions and rankings computed
//!   from an already-cached snapshot, never from storage.
//! - **Query cache**: paginated, filtered game listings and search results,
//!   one entry per full parameter tuple, decorated with reference data.
//! - **Invalidation**: coarse named tags busted by write paths after a
//!   successful mutation.
//!
//! Storage is consumed behind the repository traits in
//! [`application::repos`]; a Postgres adapter lives in [`infra::db`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::Catalog;
