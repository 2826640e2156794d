//! Command implementations for the atom-updater CLI

pub mod update;
