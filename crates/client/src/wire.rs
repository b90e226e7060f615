// Path: crates/client/src/wire.rs

//! JSON shapes returned by the node, and their conversion into the domain model.
//!
//! Each `parse_*` function takes the URL only to attribute errors.

use forklift_types::app::{
    parse_submit_time, ChainStatus, Proposal, ProposalMessage, ProposalStatus, UpgradePlanMessage,
};
use forklift_types::error::RpcError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts heights encoded either as JSON numbers or as decimal strings.
fn de_u64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn value_as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn malformed(url: &str, reason: impl ToString) -> RpcError {
    RpcError::MalformedResponse {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

// --- /status ---

#[derive(Deserialize)]
struct StatusEnvelope {
    result: StatusResult,
}

#[derive(Deserialize)]
struct StatusResult {
    #[serde(default)]
    node_info: Option<NodeInfo>,
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct NodeInfo {
    #[serde(default)]
    version: String,
}

#[derive(Deserialize)]
struct SyncInfo {
    #[serde(deserialize_with = "de_u64_lenient")]
    latest_block_height: u64,
    #[serde(default)]
    catching_up: bool,
}

pub fn parse_status(url: &str, body: &str) -> Result<ChainStatus, RpcError> {
    let env: StatusEnvelope = serde_json::from_str(body).map_err(|e| malformed(url, e))?;
    Ok(ChainStatus {
        latest_block_height: env.result.sync_info.latest_block_height,
        catching_up: env.result.sync_info.catching_up,
        node_version: env
            .result
            .node_info
            .map(|n| n.version)
            .unwrap_or_default(),
    })
}

// --- /abci_info ---

#[derive(Deserialize)]
struct AbciEnvelope {
    result: AbciResult,
}

#[derive(Deserialize)]
struct AbciResult {
    response: AbciResponse,
}

#[derive(Deserialize)]
struct AbciResponse {
    version: String,
}

pub fn parse_abci_version(url: &str, body: &str) -> Result<String, RpcError> {
    let env: AbciEnvelope = serde_json::from_str(body).map_err(|e| malformed(url, e))?;
    Ok(env.result.response.version)
}

// --- governance ---

#[derive(Deserialize)]
struct ProposalEnvelope {
    proposal: Value,
}

#[derive(Deserialize)]
struct ProposalListEnvelope {
    #[serde(default)]
    proposals: Vec<Value>,
}

/// Converts one message object. Legacy `MsgExecLegacyContent` wrappers are
/// unwrapped so the inner content's type and plan are used.
fn convert_message(msg: &Value) -> ProposalMessage {
    let inner = match msg.get("content") {
        Some(content) if content.is_object() => content,
        _ => msg,
    };
    let type_url = inner
        .get("@type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let title = inner
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let plan = inner.get("plan").filter(|p| p.is_object()).and_then(|p| {
        Some(UpgradePlanMessage {
            height: p.get("height").and_then(value_as_u64)?,
            name: p
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            info: p
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    });
    ProposalMessage {
        type_url,
        title,
        plan,
    }
}

fn convert_proposal(url: &str, raw: &Value) -> Result<Proposal, RpcError> {
    let id = raw
        .get("id")
        .or_else(|| raw.get("proposal_id"))
        .and_then(value_as_string)
        .ok_or_else(|| malformed(url, "proposal without id"))?;
    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(ProposalStatus::from_wire)
        .ok_or_else(|| malformed(url, format!("proposal {} without status", id)))?;
    let submit_time = raw
        .get("submit_time")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(url, format!("proposal {} without submit_time", id)))
        .and_then(|s| parse_submit_time(s).map_err(|e| malformed(url, e)))?;
    let title = raw
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    // gov v1 carries `messages`; gov v1beta1 carries a single `content`.
    let messages = match (raw.get("messages"), raw.get("content")) {
        (Some(Value::Array(msgs)), _) => msgs.iter().map(convert_message).collect(),
        (_, Some(content)) if content.is_object() => vec![convert_message(raw)],
        _ => Vec::new(),
    };

    Ok(Proposal {
        id,
        title,
        status,
        submit_time,
        messages,
    })
}

pub fn parse_proposal(url: &str, body: &str) -> Result<Proposal, RpcError> {
    let env: ProposalEnvelope = serde_json::from_str(body).map_err(|e| malformed(url, e))?;
    convert_proposal(url, &env.proposal)
}

/// Returns proposal ids sorted newest first (numeric descending; non-numeric ids last).
pub fn parse_proposal_ids(url: &str, body: &str) -> Result<Vec<String>, RpcError> {
    let env: ProposalListEnvelope = serde_json::from_str(body).map_err(|e| malformed(url, e))?;
    let mut ids = env
        .proposals
        .iter()
        .map(|p| {
            p.get("id")
                .or_else(|| p.get("proposal_id"))
                .and_then(value_as_string)
                .ok_or_else(|| malformed(url, "proposal without id"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    ids.sort_by(|a, b| {
        let key = |s: &str| s.parse::<u64>().ok();
        key(b).cmp(&key(a))
    });
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://node";

    #[test]
    fn test_parse_status_string_height() {
        let body = r#"{"jsonrpc":"2.0","id":-1,"result":{
            "node_info":{"version":"0.37.4","network":"athens_101-1"},
            "sync_info":{"latest_block_height":"1234","catching_up":false}}}"#;
        let s = parse_status(URL, body).unwrap();
        assert_eq!(s.latest_block_height, 1234);
        assert!(!s.catching_up);
        assert_eq!(s.node_version, "0.37.4");
    }

    #[test]
    fn test_parse_status_rejects_bad_height() {
        let body = r#"{"result":{"sync_info":{"latest_block_height":"abc"}}}"#;
        assert!(matches!(
            parse_status(URL, body),
            Err(RpcError::MalformedResponse { .. })
        ));
        assert!(parse_status(URL, r#"{"error":"nope"}"#).is_err());
    }

    #[test]
    fn test_parse_abci_version() {
        let body = r#"{"result":{"response":{"data":"zetacore","version":"v12.1.0","last_block_height":"9"}}}"#;
        assert_eq!(parse_abci_version(URL, body).unwrap(), "v12.1.0");
        assert!(parse_abci_version(URL, r#"{"result":{"response":{}}}"#).is_err());
    }

    #[test]
    fn test_parse_legacy_content_proposal() {
        let body = r#"{"proposal":{
            "id":"7",
            "status":"PROPOSAL_STATUS_PASSED",
            "submit_time":"2024-05-01T10:00:00.987654321Z",
            "messages":[{
                "@type":"/cosmos.gov.v1.MsgExecLegacyContent",
                "content":{
                    "@type":"/cosmos.upgrade.v1beta1.SoftwareUpgradeProposal",
                    "title":"v12.0.0",
                    "plan":{"name":"v12.0.0","height":"5000","info":""}
                },
                "authority":"zeta10d07y265gmmuvt4z0w9aw880jnsr700jvxasvr"
            }]}}"#;
        let p = parse_proposal(URL, body).unwrap();
        assert_eq!(p.id, "7");
        assert!(p.status.is_passed());
        let plan = p.upgrade_plan().unwrap();
        assert_eq!(plan.target_height, 5000);
        assert_eq!(plan.version_title, "v12.0.0");
    }

    #[test]
    fn test_parse_msg_software_upgrade() {
        let body = r#"{"proposal":{
            "id":"8","title":"Upgrade to v13",
            "status":"PROPOSAL_STATUS_VOTING_PERIOD",
            "submit_time":"2024-05-02T10:00:00Z",
            "messages":[{
                "@type":"/cosmos.upgrade.v1beta1.MsgSoftwareUpgrade",
                "plan":{"name":"v13","height":6000,"info":"{}"}
            }]}}"#;
        let p = parse_proposal(URL, body).unwrap();
        assert!(p.status.is_pending());
        let plan = p.upgrade_plan().unwrap();
        assert_eq!(plan.target_height, 6000);
        assert_eq!(plan.version_title, "Upgrade to v13");
        assert!(p.matches_title("v13"));
    }

    #[test]
    fn test_parse_v1beta1_proposal() {
        let body = r#"{"proposal":{
            "proposal_id":"3",
            "status":"PROPOSAL_STATUS_PASSED",
            "submit_time":"2024-05-02T10:00:00Z",
            "content":{
                "@type":"/cosmos.upgrade.v1beta1.SoftwareUpgradeProposal",
                "title":"v9",
                "plan":{"name":"v9","height":"900"}
            }}}"#;
        let p = parse_proposal(URL, body).unwrap();
        assert_eq!(p.id, "3");
        assert_eq!(p.upgrade_plan().unwrap().target_height, 900);
    }

    #[test]
    fn test_parse_proposal_missing_submit_time() {
        let body = r#"{"proposal":{"id":"1","status":"PROPOSAL_STATUS_PASSED"}}"#;
        assert!(matches!(
            parse_proposal(URL, body),
            Err(RpcError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_proposal_ids_newest_first() {
        let body = r#"{"proposals":[{"id":"2"},{"id":"10"},{"id":"9"}],"pagination":{"total":"3"}}"#;
        assert_eq!(parse_proposal_ids(URL, body).unwrap(), vec!["10", "9", "2"]);
        assert!(parse_proposal_ids(URL, r#"{"proposals":[]}"#)
            .unwrap()
            .is_empty());
    }
}
