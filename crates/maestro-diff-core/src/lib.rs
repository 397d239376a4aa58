// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Value types shared by the Maestro diff panel.
//!
//! - [`IdentityKey`]: whose changes are being viewed (orchestrator or session)
//! - [`ChangeSetSnapshot`]: an immutable fetched change set
//! - [`SelectionTree`]: folder/file hierarchy with tri-state checkboxes

pub mod identity;
pub mod model;
pub mod selection;

pub use identity::IdentityKey;
pub use model::{
	BranchContext, BranchInfo, ChangeSet, ChangeSetSnapshot, ChangeType, ChangedFile, Epoch,
};
pub use selection::{CheckState, PathSelection, SelectionCount, SelectionNode, SelectionTree};
