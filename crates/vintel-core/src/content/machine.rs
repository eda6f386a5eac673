//! Per-module content state machine.
//!
//! ```text
//! notGenerated --generate--> generating --(success)--> generated
//! generating   --(failure)--> notGenerated
//! generated    --delete-->    notGenerated
//! ```
//!
//! `view` and `download` are read-only and only allowed on generated content.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::model::{ContentModuleType, ContentStatus};
use crate::error::{Result, VintelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentAction {
    Generate,
    View,
    Download,
    Delete,
}

/// Statuses an accepted action moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status before the action; restored on failure.
    pub prior: ContentStatus,
    /// Status shown while the request is in flight.
    pub optimistic: ContentStatus,
    /// Status committed when the backend confirms.
    pub committed: ContentStatus,
}

impl Transition {
    /// Status after the request finished.
    pub fn settle(&self, succeeded: bool) -> ContentStatus {
        if succeeded { self.committed } else { self.prior }
    }
}

impl ContentAction {
    /// Checks that `self` is permitted from `from` and returns the statuses
    /// it will move through.
    pub fn plan(self, module: ContentModuleType, from: ContentStatus) -> Result<Transition> {
        use ContentStatus::*;

        let (optimistic, committed) = match (self, from) {
            (Self::Generate, NotGenerated) => (Generating, Generated),
            (Self::Delete, Generated) => (NotGenerated, NotGenerated),
            (Self::View | Self::Download, Generated) => (Generated, Generated),
            _ => {
                return Err(VintelError::InvalidTransition {
                    module: module.display_name().to_string(),
                    from: from.to_string(),
                    action: self.to_string(),
                });
            }
        };

        Ok(Transition {
            prior: from,
            optimistic,
            committed,
        })
    }

    /// Verb used in notifications ("Failed to generate FAQ Pages").
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::View => "load",
            Self::Download => "download",
            Self::Delete => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContentStatus::*;

    const FAQ: ContentModuleType = ContentModuleType::Faq;

    #[test]
    fn test_generate_cycle() {
        let t = ContentAction::Generate.plan(FAQ, NotGenerated).unwrap();
        assert_eq!(t.optimistic, Generating);
        assert_eq!(t.settle(true), Generated);
        assert_eq!(t.settle(false), NotGenerated);
    }

    #[test]
    fn test_delete_reverts_to_generated_on_failure() {
        let t = ContentAction::Delete.plan(FAQ, Generated).unwrap();
        assert_eq!(t.optimistic, NotGenerated);
        assert_eq!(t.settle(true), NotGenerated);
        assert_eq!(t.settle(false), Generated);
    }

    #[test]
    fn test_rejected_transitions() {
        let cases = [
            (ContentAction::Generate, Generating),
            (ContentAction::Generate, Generated),
            (ContentAction::Delete, NotGenerated),
            (ContentAction::Delete, Generating),
            (ContentAction::View, NotGenerated),
            (ContentAction::Download, Generating),
        ];
        for (action, from) in cases {
            let err = action.plan(FAQ, from).unwrap_err();
            assert!(
                matches!(err, VintelError::InvalidTransition { .. }),
                "{} from {} should be rejected",
                action,
                from
            );
        }
    }

    #[test]
    fn test_read_only_actions_keep_status() {
        for action in [ContentAction::View, ContentAction::Download] {
            let t = action.plan(FAQ, Generated).unwrap();
            assert_eq!(t.optimistic, Generated);
            assert_eq!(t.settle(false), Generated);
        }
    }
}
