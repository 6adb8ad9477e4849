//! Built-in provider catalogs.
//!
//! Each catalog exposes a `register` function that the application calls
//! explicitly while building its [`ResourceTypeRegistry`](crate::ResourceTypeRegistry).

pub mod aws;
