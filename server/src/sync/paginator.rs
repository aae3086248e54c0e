//! Drains the paginated directory listing into a normalized record set.

use crate::directory::RemoteDirectory;
use rolodex_engine::{error::Result, normalize, ContactRecord, Error, Timestamp};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Fetch every page of the directory, normalizing records as they arrive.
///
/// Any page failure aborts the whole fetch with `RemoteUnavailable`, and so
/// does a page token seen twice. Partial sets are never returned.
pub async fn fetch_all(
    directory: &dyn RemoteDirectory,
    cancel: &CancellationToken,
    timestamp: Timestamp,
) -> Result<Vec<ContactRecord>> {
    let mut records = Vec::new();
    let mut page_token: Option<String> = None;
    let mut seen_tokens = HashSet::new();
    let mut pages = 0usize;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(pages, "Directory fetch cancelled");
            return Err(Error::Cancelled);
        }

        let page = directory.list(page_token.as_deref()).await.map_err(|e| {
            tracing::warn!(page = pages + 1, error = %e, "Directory page fetch failed");
            Error::RemoteUnavailable(e.to_string())
        })?;
        pages += 1;

        tracing::debug!(
            page = pages,
            records = page.records.len(),
            "Fetched directory page"
        );
        records.extend(
            page.records
                .iter()
                .map(|raw| normalize::from_remote(raw, timestamp)),
        );

        match page.next_page_token.filter(|token| !token.is_empty()) {
            None => break,
            Some(token) => {
                if !seen_tokens.insert(token.clone()) {
                    return Err(Error::RemoteUnavailable(format!(
                        "page token {token} repeated after {pages} pages"
                    )));
                }
                page_token = Some(token);
            }
        }
    }

    tracing::debug!(pages, records = records.len(), "Directory fetch complete");
    Ok(records)
}
