// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces of the external collaborators the access core depends on.
mod grant_store;
mod membership;

pub use grant_store::GrantStore;
pub use membership::GroupMembership;
