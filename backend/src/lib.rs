//! Recipe service core.
//!
//! The crate is laid out as a hexagon: [`domain`] holds the recipe aggregate,
//! its ports and services; [`outbound`] provides entity store adapters;
//! [`settings`] loads runtime configuration.

pub mod domain;
pub mod outbound;
pub mod settings;
