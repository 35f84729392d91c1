use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RECORD_SET_KIND: &str = "dns#resourceRecordSet";
pub const CHANGE_KIND: &str = "dns#change";
pub const A_RECORD: &str = "A";

/// One record set as Cloud DNS returns it.
///
/// Fields not modelled here (`signatureRrdatas`, `routingPolicy`, ...) are
/// kept in `extra` so a listed record set can be sent back unchanged as a
/// deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecordSet {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rrdatas: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceRecordSet {
    pub fn a_record(name: &str, ip_addr: &str, ttl: u32) -> Self {
        Self {
            kind: RECORD_SET_KIND.to_string(),
            name: name.to_string(),
            record_type: A_RECORD.to_string(),
            ttl: Some(ttl),
            rrdatas: vec![ip_addr.to_string()],
            extra: Map::new(),
        }
    }

    /// Exact, case-sensitive match on the fully-qualified name.
    pub fn is_a_record_named(&self, name: &str) -> bool {
        self.name == name && self.record_type == A_RECORD
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecordSetsListResponse {
    #[serde(default)]
    pub rrsets: Vec<ResourceRecordSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ResourceRecordSetsListResponse {
    /// Token for the following page, if the listing continues.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// An atomic set of additions and deletions applied to one managed zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<ResourceRecordSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<ResourceRecordSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

impl Change {
    pub fn new(additions: Vec<ResourceRecordSet>, deletions: Vec<ResourceRecordSet>) -> Self {
        Self {
            kind: CHANGE_KIND.to_string(),
            additions,
            deletions,
            id: None,
            status: None,
            start_time: None,
        }
    }
}
