//! Paginated retrieval of a zone's record sets

use crate::error::{Error, Result};
use crate::model::{PaginationCursor, RecordSet, RecordSetPage, ZoneId};
use crate::traits::ZoneProvider;
use tracing::debug;

/// Fetch every page of a zone's record sets, in request order
///
/// Fails with [`Error::FetchFailed`] carrying the 1-based index of the page
/// whose request or parse failed; no partial result is returned.
pub async fn fetch_record_set_pages(
    provider: &dyn ZoneProvider,
    zone_id: &ZoneId,
) -> Result<Vec<RecordSetPage>> {
    fetch_record_set_pages_with(provider, zone_id, |_, _| {}).await
}

/// Like [`fetch_record_set_pages`], calling `on_page` after each page
pub async fn fetch_record_set_pages_with<F>(
    provider: &dyn ZoneProvider,
    zone_id: &ZoneId,
    mut on_page: F,
) -> Result<Vec<RecordSetPage>>
where
    F: FnMut(usize, &RecordSetPage),
{
    let mut pages = Vec::new();
    let mut cursor: Option<PaginationCursor> = None;

    loop {
        let page_no = pages.len() + 1;
        let page = fetch_page(provider, zone_id, cursor.as_ref())
            .await
            .map_err(|e| Error::fetch_failed(page_no, e))?;

        debug!(
            "Fetched page {} of {}: {} entries, truncated={}",
            page_no,
            zone_id,
            page.entries.len(),
            page.is_truncated
        );
        on_page(page_no, &page);

        let next = page.next.clone();
        pages.push(page);

        match next {
            Some(next) => {
                // A cursor that does not move would loop forever
                if cursor.as_ref() == Some(&next) {
                    return Err(Error::fetch_failed(
                        page_no,
                        Error::malformed(format!(
                            "pagination cursor did not advance past {} {}",
                            next.name, next.record_type
                        )),
                    ));
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    Ok(pages)
}

async fn fetch_page(
    provider: &dyn ZoneProvider,
    zone_id: &ZoneId,
    cursor: Option<&PaginationCursor>,
) -> Result<RecordSetPage> {
    let body = provider.list_record_sets(zone_id, cursor).await?;
    RecordSetPage::from_xml(&body)
}

/// Concatenate the entries of all pages, in page order
///
/// Entries are not deduplicated.
pub fn merge_pages(pages: Vec<RecordSetPage>) -> RecordSet {
    pages.into_iter().flat_map(|page| page.entries).collect()
}
