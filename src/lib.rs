pub mod authoring;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod persistence;
pub mod registry;
