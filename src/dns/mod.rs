mod clouddns;
mod provider;
mod types;

pub use clouddns::CloudDnsClient;
pub use provider::{ApiError, DnsApi};
pub use types::{
    Change, ResourceRecordSet, ResourceRecordSetsListResponse, A_RECORD, CHANGE_KIND,
    RECORD_SET_KIND,
};
