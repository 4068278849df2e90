//! # proph
//!
//! Course administration for a Phabricator instance: enrol students, create
//! their project groups, allocate groups to markers and upload submitted
//! diffs as revisions.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Random, balanced allocation of groups to markers
pub mod allocation;
/// Conduit API client
pub mod conduit;
/// Settings read from the environment
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Discovery of submitted diff files
pub mod diffs;
/// Remote operations the workflows depend on
pub mod directory;
/// Error types
pub mod error;
/// Project naming rules
pub mod names;
/// For all parsers used
pub mod parsers;
/// Per-item outcomes and terminal rendering
pub mod report;
/// Roster and marker CSV loading
pub mod roster;
/// The enroll, create-groups and load-diffs workflows
pub mod workflow;
