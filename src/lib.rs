//! PrediCare Library
//!
//! Energy targets, meal nutrition, walking calories and record keeping for
//! prediabetes care during menopause.

pub mod build_info;
pub mod config;
pub mod db;
pub mod energy;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
