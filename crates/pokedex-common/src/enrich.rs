//! Page enrichment: turns a page of `{ name, url }` summaries into detail records.
//!
//! Detail lookups run with a bounded number in flight. Results are written back by input
//! index, so the output order never depends on completion order. Per-item failures either
//! degrade to an `{ id, name }` record or abort the page, depending on `ignore_errors`.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::catalog::CatalogService;
use crate::error::CommonError;
use crate::model::{DegradedRecord, NamedResource, Page, PokemonEntry};

pub const DEFAULT_LIMIT: u32 = 50;
pub const DEFAULT_OFFSET: u32 = 0;
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Maximum detail requests in flight. Zero is treated as one.
    pub concurrency: usize,
    /// Substitute a degraded record for a failed item instead of failing the page.
    pub ignore_errors: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            ignore_errors: true,
        }
    }
}

/// Extract the numeric id from the last non-empty path segment of a summary URL.
///
/// `https://pokeapi.co/api/v2/pokemon/42/` yields `42`.
pub fn parse_reference_id(url: &str) -> Result<u32, CommonError> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u32>().ok())
        .ok_or_else(|| CommonError::MalformedReference {
            url: url.to_string(),
        })
}

/// Resolve one summary into its detail record.
///
/// With `ignore_errors`, any failure (including a URL without an id) yields a
/// [`DegradedRecord`] and this never returns `Err`.
pub async fn fetch_entry<C: CatalogService>(
    catalog: &C,
    summary: &NamedResource,
    ignore_errors: bool,
) -> Result<PokemonEntry, CommonError> {
    let id = match parse_reference_id(&summary.url) {
        Ok(id) => id,
        Err(e) if ignore_errors => {
            warn!(name = %summary.name, error = %e, "unusable summary reference, degrading");
            return Ok(PokemonEntry::Degraded(DegradedRecord {
                id: None,
                name: summary.name.clone(),
            }));
        }
        Err(e) => return Err(e),
    };

    match catalog.get_detail_by_id(id).await {
        Ok(detail) => Ok(PokemonEntry::Detail(detail)),
        Err(source) if ignore_errors => {
            warn!(id, name = %summary.name, error = %source, "detail fetch failed, degrading");
            Ok(PokemonEntry::Degraded(DegradedRecord {
                id: Some(id),
                name: summary.name.clone(),
            }))
        }
        Err(source) => Err(CommonError::DetailFetch { id, source }),
    }
}

/// Fetch details for every summary with at most `options.concurrency` lookups in flight.
///
/// The returned vector has the same length and order as `summaries`. Admission and
/// completion are both driven from this one future, so the capacity check and the removal
/// of a finished lookup never interleave. In strict mode the first failure is returned as
/// soon as it is observed; lookups still in flight are dropped and nothing further is
/// admitted.
pub async fn fetch_details<C: CatalogService>(
    catalog: &C,
    summaries: &[NamedResource],
    options: &EnrichOptions,
) -> Result<Vec<PokemonEntry>, CommonError> {
    if summaries.is_empty() {
        return Ok(Vec::new());
    }

    let limit = options.concurrency.max(1);
    let ignore_errors = options.ignore_errors;
    let mut slots: Vec<Option<PokemonEntry>> = summaries.iter().map(|_| None).collect();
    let mut in_flight = FuturesUnordered::new();

    debug!(items = summaries.len(), concurrency = limit, "fetching details");

    for (index, summary) in summaries.iter().enumerate() {
        in_flight.push(async move { (index, fetch_entry(catalog, summary, ignore_errors).await) });
        // Pool is full: wait for one lookup to settle before admitting the next.
        while in_flight.len() >= limit {
            if let Some((done, entry)) = in_flight.next().await {
                slots[done] = Some(entry?);
            }
        }
    }

    while let Some((done, entry)) = in_flight.next().await {
        slots[done] = Some(entry?);
    }

    let results: Vec<PokemonEntry> = slots.into_iter().flatten().collect();
    debug_assert_eq!(results.len(), summaries.len());
    Ok(results)
}

/// Fetch one page of summaries and enrich it into detail records.
///
/// `count`, `next` and `previous` are carried over from the summary page. A failure to
/// fetch the summary page itself is always returned, regardless of `ignore_errors`.
pub async fn get_enriched_page<C: CatalogService>(
    catalog: &C,
    limit: u32,
    offset: u32,
    options: &EnrichOptions,
) -> Result<Page<PokemonEntry>, CommonError> {
    let page = catalog
        .list_summaries(limit, offset)
        .await
        .map_err(|source| CommonError::SummaryPageFetch {
            limit,
            offset,
            source,
        })?;

    let results = fetch_details(catalog, &page.results, options).await?;
    let degraded = results.iter().filter(|e| e.is_degraded()).count();
    info!(
        limit,
        offset,
        count = page.count,
        returned = results.len(),
        degraded,
        "enriched page assembled"
    );

    Ok(Page {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results,
    })
}
