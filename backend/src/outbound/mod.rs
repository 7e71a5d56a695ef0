//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a single in-process store implementing every port, used by
//!   tests and the admin tool's `--in-memory` mode
//!
//! Adapters translate between domain types and storage representations. They
//! contain no business logic.

pub mod memory;
pub mod persistence;
