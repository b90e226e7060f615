// Path: crates/types/src/app/governance.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Type URL suffixes that identify a software-upgrade message.
const SOFTWARE_UPGRADE_KINDS: &[&str] = &["SoftwareUpgradeProposal", "MsgSoftwareUpgrade"];

/// The lifecycle status of a governance proposal, as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Unspecified,
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
    Failed,
    /// A status string this version does not know about, preserved verbatim.
    Other(String),
}

impl ProposalStatus {
    /// Maps the chain's wire representation (`PROPOSAL_STATUS_*`).
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "PROPOSAL_STATUS_UNSPECIFIED" => Self::Unspecified,
            "PROPOSAL_STATUS_DEPOSIT_PERIOD" => Self::DepositPeriod,
            "PROPOSAL_STATUS_VOTING_PERIOD" => Self::VotingPeriod,
            "PROPOSAL_STATUS_PASSED" => Self::Passed,
            "PROPOSAL_STATUS_REJECTED" => Self::Rejected,
            "PROPOSAL_STATUS_FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::DepositPeriod | Self::VotingPeriod)
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => f.write_str("PROPOSAL_STATUS_UNSPECIFIED"),
            Self::DepositPeriod => f.write_str("PROPOSAL_STATUS_DEPOSIT_PERIOD"),
            Self::VotingPeriod => f.write_str("PROPOSAL_STATUS_VOTING_PERIOD"),
            Self::Passed => f.write_str("PROPOSAL_STATUS_PASSED"),
            Self::Rejected => f.write_str("PROPOSAL_STATUS_REJECTED"),
            Self::Failed => f.write_str("PROPOSAL_STATUS_FAILED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// The `plan` carried by a software-upgrade message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePlanMessage {
    pub height: u64,
    pub name: String,
    pub info: String,
}

/// One message of a proposal, with legacy content wrappers already unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMessage {
    /// The message (or legacy content) type URL.
    pub type_url: String,
    /// The legacy content title, if any.
    pub title: Option<String>,
    pub plan: Option<UpgradePlanMessage>,
}

impl ProposalMessage {
    pub fn is_software_upgrade(&self) -> bool {
        SOFTWARE_UPGRADE_KINDS
            .iter()
            .any(|kind| self.type_url.ends_with(kind))
    }
}

/// A governance proposal. Re-fetched in full on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: String,
    pub title: Option<String>,
    pub status: ProposalStatus,
    pub submit_time: OffsetDateTime,
    pub messages: Vec<ProposalMessage>,
}

/// The unit the liveness monitor waits on, derived from a passed proposal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UpgradePlan {
    pub target_height: u64,
    pub version_title: String,
}

impl Proposal {
    /// Returns the first software-upgrade message that carries a plan.
    pub fn upgrade_message(&self) -> Option<(&ProposalMessage, &UpgradePlanMessage)> {
        self.messages
            .iter()
            .filter(|m| m.is_software_upgrade())
            .find_map(|m| m.plan.as_ref().map(|p| (m, p)))
    }

    /// Derives the upgrade plan. The version title prefers the message title,
    /// then the proposal title, then the plan name.
    pub fn upgrade_plan(&self) -> Option<UpgradePlan> {
        let (message, plan) = self.upgrade_message()?;
        let version_title = message
            .title
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| plan.name.clone());
        Some(UpgradePlan {
            target_height: plan.height,
            version_title,
        })
    }

    /// True if the proposal's version title or plan name equals `title`.
    pub fn matches_title(&self, title: &str) -> bool {
        if let Some(plan) = self.upgrade_plan() {
            if plan.version_title == title {
                return true;
            }
        }
        self.upgrade_message()
            .map(|(_, plan)| plan.name == title)
            .unwrap_or(false)
    }

    pub fn is_older_than(&self, now: OffsetDateTime, max_age: time::Duration) -> bool {
        now - self.submit_time > max_age
    }

    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

/// A governance vote choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    #[default]
    Yes,
    No,
    Abstain,
    NoWithVeto,
}

impl VoteOption {
    /// The argument the node CLI expects.
    pub fn as_cli_arg(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Abstain => "abstain",
            Self::NoWithVeto => "no_with_veto",
        }
    }
}

impl FromStr for VoteOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "abstain" => Ok(Self::Abstain),
            "no_with_veto" | "nowithveto" => Ok(Self::NoWithVeto),
            other => Err(format!("unknown vote option '{}'", other)),
        }
    }
}

/// Parses a proposal `submit_time`. Fractional seconds are dropped before parsing.
pub fn parse_submit_time(raw: &str) -> Result<OffsetDateTime, String> {
    let trimmed = raw.trim();
    let normalized = match trimmed.split_once('.') {
        Some((head, tail)) => {
            let offset = tail.trim_start_matches(|c: char| c.is_ascii_digit());
            format!("{}{}", head, offset)
        }
        None => trimmed.to_string(),
    };
    OffsetDateTime::parse(&normalized, &Rfc3339)
        .map_err(|e| format!("invalid submit_time '{}': {}", raw, e))
}
