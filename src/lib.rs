//! mutmerge: codon-aware merging of gofasta mutation calls and DMS score annotation.

pub mod error;

pub mod cli;
pub mod config;
pub mod convert;
pub mod dedup;
pub mod dms;
pub mod genetic_code;
pub mod input;
pub mod mutation;
pub mod query;
pub mod record;
pub mod resolver;
