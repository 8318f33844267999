//! Finder-pattern based region location
//!
//! The heuristic stage uses this when no engine could read a symbol:
//! - Finder pattern detection (the three square markers)
//! - Triple grouping into a padded code region

/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Best-triple grouping into a [`Rect`](crate::models::Rect)
pub mod locator;

pub use locator::FinderRegionLocator;
