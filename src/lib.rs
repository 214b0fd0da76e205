//! Canonical and historical URL slugs for application objects, grouped by
//! named parts with per-part casing rules and optional per-language
//! variants. Assignment versions history instead of deleting it: a demoted
//! slug stays around in the Outdated state so old URLs can keep
//! redirecting.

pub mod case;
pub mod config;
pub mod constants;
pub mod logging;
pub mod registry;
pub mod store;
pub mod validation;

pub use case::{normalize, CaseRule};
pub use registry::{PartCache, SlugRegistry};
pub use store::operations::parts::Part;
pub use store::operations::slugs::{Slug, SlugState};
pub use store::{Store, StoreError};
