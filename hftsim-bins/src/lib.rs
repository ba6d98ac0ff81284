//! Shared plumbing for the hftsim binaries

pub mod common;
