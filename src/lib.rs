#![recursion_limit = "256"]

// Layered as in the module headers:
//   cli → application → domain / data / ml / infra
pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
