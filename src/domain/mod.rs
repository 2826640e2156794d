//! Domain models for atom-updater
//!
//! This module contains pure domain objects: the classification of an
//! application path and the host platform conventions it is judged by.
//! These types carry no filesystem state and are recomputed on every call.

pub mod app_type;
pub mod platform;

pub use app_type::ApplicationType;
pub use platform::{BUNDLE_SUFFIX, Platform};
