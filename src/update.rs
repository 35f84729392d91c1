use futures::stream::{self, Stream, TryStreamExt};
use reqwest::Client;
use tracing::{debug, info};

use crate::auth::{self, CredentialsEnv, CLOUD_DNS_SCOPE};
use crate::config::Settings;
use crate::dns::{ApiError, Change, CloudDnsClient, DnsApi, ResourceRecordSet};
use crate::error::UpdateError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Authenticates, then replaces the A record described by `settings`.
pub async fn run(settings: &Settings, env: &CredentialsEnv) -> Result<Change, UpdateError> {
    let http = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| UpdateError::Client(e.into()))?;

    let tokens = auth::find_default_credentials(&http, env, CLOUD_DNS_SCOPE)
        .await
        .map_err(UpdateError::Credentials)?;

    // Surface token problems as credential errors rather than listing errors.
    tokens
        .access_token()
        .await
        .map_err(UpdateError::Credentials)?;

    let client = CloudDnsClient::new(http, &settings.api_endpoint, tokens)
        .map_err(UpdateError::Client)?;

    update_record(&client, settings).await
}

/// Looks up the current record, then submits one delete-old/add-new change.
pub async fn update_record(api: &dyn DnsApi, settings: &Settings) -> Result<Change, UpdateError> {
    let existing = find_record_set(
        api,
        &settings.project,
        &settings.managed_zone,
        &settings.record_name,
    )
    .await
    .map_err(UpdateError::List)?;

    match &existing {
        Some(record) => info!(
            name = %record.name,
            rrdatas = ?record.rrdatas,
            ttl = ?record.ttl,
            "Replacing existing record set"
        ),
        None => info!(name = %settings.record_name, "No existing record set, creating"),
    }

    let change = compose_change(existing, settings);

    let accepted = api
        .create_change(&settings.project, &settings.managed_zone, &change)
        .await
        .map_err(UpdateError::Change)?;

    debug!(
        id = ?accepted.id,
        status = ?accepted.status,
        "Change accepted"
    );

    Ok(change)
}

/// Every page of record sets in the zone, fetched lazily one at a time.
pub fn record_set_pages<'a>(
    api: &'a dyn DnsApi,
    project: &'a str,
    managed_zone: &'a str,
) -> impl Stream<Item = Result<Vec<ResourceRecordSet>, ApiError>> + 'a {
    // `None` once the last page has been returned.
    let first_page: Option<Option<String>> = Some(None);

    stream::try_unfold(first_page, move |cursor| async move {
        let Some(page_token) = cursor else {
            return Ok::<_, ApiError>(None);
        };

        let page = api
            .list_record_sets(project, managed_zone, page_token.as_deref())
            .await?;
        let next = page.next_page().map(|token| Some(token.to_string()));

        Ok(Some((page.rrsets, next)))
    })
}

/// First A record set named exactly `record_name`. All pages are read.
pub async fn find_record_set(
    api: &dyn DnsApi,
    project: &str,
    managed_zone: &str,
    record_name: &str,
) -> Result<Option<ResourceRecordSet>, ApiError> {
    record_set_pages(api, project, managed_zone)
        .try_fold(None, |found: Option<ResourceRecordSet>, rrsets| async move {
            Ok(found.or_else(|| {
                rrsets
                    .into_iter()
                    .find(|rrset| rrset.is_a_record_named(record_name))
            }))
        })
        .await
}

/// Deletes `existing` verbatim (if any) and adds the new A record.
pub fn compose_change(existing: Option<ResourceRecordSet>, settings: &Settings) -> Change {
    let addition =
        ResourceRecordSet::a_record(&settings.record_name, &settings.ip_addr, settings.ttl);

    Change::new(vec![addition], existing.into_iter().collect())
}
