//! # fsweb: surface-fitting command line client
//!
//! Reads a captured point cloud from an `.xyz` file, picks a seed point
//! along a ray, sends one fit request and prints the fitted primitive.
//!
//! Search parameters persist in a small TOML file between runs; every
//! other setting comes from the main config file.

pub mod config;
pub mod report;
