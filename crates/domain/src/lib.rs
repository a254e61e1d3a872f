//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod activity;
mod audit_filter;
mod grant;
mod scope;
mod sink;

pub use activity::ActivityRecord;
pub use audit_filter::{ActivityWindow, principal_filter};
pub use grant::{Grant, GrantInput, GrantReference, GrantState};
pub use scope::{ResourceScope, ScopeKind};
pub use sink::SinkDescriptor;
