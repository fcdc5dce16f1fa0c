//! Loading, alignment and derivation of incubator testbed logs.

pub mod config;
pub mod data;
pub mod service;
