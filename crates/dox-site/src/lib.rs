//! Site layer for dox.
//!
//! Turns the flat document set from `dox-content` into a navigation tree,
//! caches parsed content behind an injected [`ContentCache`] service, and
//! exposes the read API through the [`DocLibrary`] facade.

mod cache;
mod library;
mod nav;

pub use cache::ContentCache;
pub use library::DocLibrary;
pub use nav::{NavItem, NavLink, PrevNext, build_navigation, flatten_navigation, prev_next};
