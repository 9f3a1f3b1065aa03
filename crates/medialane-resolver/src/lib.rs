//! Medialane path resolution
//!
//! Turns a possibly-incomplete or legacy-formatted media reference into the
//! retrieval path the platform serves it from. Resolution is a pure string
//! transformation: no network or storage I/O, and for a fixed environment the
//! same input always yields the same output.
//!
//! # Canonical proxy form
//!
//! `{proxy_prefix}/{BUCKET}/{dir}/{rest}`, e.g.
//! `/api/object-storage/CALENDAR/calendar/media-123.png`. Anything already in
//! this form is returned unchanged.

pub mod detect;
pub mod object_storage;
pub mod resolver;
pub mod routing;

pub use detect::{detect_category, CategoryRule, Detection, Pattern, CATEGORY_RULES};
pub use object_storage::{ObjectStorageUrl, ProxyPath};
pub use resolver::{PathResolver, Resolution, ResolutionKind};
pub use routing::{route, CategoryRoute, Routing, DEFAULT_PLACEHOLDER};
