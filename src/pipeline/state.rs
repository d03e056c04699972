//! pipeline::state
//!
//! Pipeline lifecycle states and publish outcomes.
//!
//! # Transitions
//!
//! ```text
//! Idle --load--> Loaded --apply--> Editing --publish--> Publishing
//!                  ^                                        |
//!                  +------------- published ----------------+
//!                                                           |
//!                          Conflicted <--- conflict --------+
//!                          Failed     <--- terminal error --+
//! ```
//!
//! `Conflicted` and `Failed` accept no edits; `reload` (or a fresh `load`)
//! starts a new lifecycle. A cancelled publish returns to `Editing`.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::types::{ErrorKind, RevisionMarker};
use crate::store::CommitInfo;

/// Where a pipeline is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// Nothing loaded.
    Idle,
    /// A dataset is loaded and matches the remote.
    Loaded,
    /// A dataset is loaded with unpublished edits.
    Editing,
    /// A push is in flight.
    Publishing,
    /// The remote moved past the marker this pipeline holds.
    Conflicted {
        expected: Option<RevisionMarker>,
        message: String,
    },
    /// A terminal error ended the lifecycle.
    Failed { kind: ErrorKind, message: String },
}

impl PipelineState {
    /// Short state name.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loaded => "loaded",
            PipelineState::Editing => "editing",
            PipelineState::Publishing => "publishing",
            PipelineState::Conflicted { .. } => "conflicted",
            PipelineState::Failed { .. } => "failed",
        }
    }

    /// Whether edits may be applied.
    pub fn accepts_edits(&self) -> bool {
        matches!(self, PipelineState::Loaded | PipelineState::Editing)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Conflicted { message, .. } => write!(f, "conflicted: {}", message),
            PipelineState::Failed { kind, message } => write!(f, "failed ({}): {}", kind, message),
            other => f.write_str(other.name()),
        }
    }
}

/// Outcome of a publish.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishResult {
    /// The remote now holds the working copy.
    Published(PublishReceipt),
    /// No edits since load or the last publish; nothing was sent.
    NothingToPublish,
    /// Cancelled before any push was issued; edits are retained.
    Cancelled,
    /// The remote moved; reload before publishing again.
    Conflicted {
        expected: Option<RevisionMarker>,
        message: String,
    },
    /// The publish failed for a reason other than a conflict.
    Failed { kind: ErrorKind, message: String },
}

impl PublishResult {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishResult::Published(_))
    }
}

/// Details of a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    /// Marker of the published revision
    pub marker: RevisionMarker,
    /// Commit that recorded the write, when the store reports one
    pub commit: Option<CommitInfo>,
    /// When the pipeline observed the publish
    pub published_at: DateTime<Utc>,
    /// The push outcome was unknown and confirmed by re-reading the remote
    pub reconciled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loaded_and_editing_accept_edits() {
        assert!(PipelineState::Loaded.accepts_edits());
        assert!(PipelineState::Editing.accepts_edits());
        assert!(!PipelineState::Idle.accepts_edits());
        assert!(!PipelineState::Publishing.accepts_edits());
        assert!(!PipelineState::Conflicted {
            expected: None,
            message: "x".into()
        }
        .accepts_edits());
    }

    #[test]
    fn display() {
        assert_eq!(PipelineState::Editing.to_string(), "editing");
        assert_eq!(
            PipelineState::Failed {
                kind: ErrorKind::Auth,
                message: "bad token".into()
            }
            .to_string(),
            "failed (auth): bad token"
        );
    }
}
