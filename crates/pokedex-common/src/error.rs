use crate::catalog::CatalogClientError;

/// Failures of the page enrichment pipeline.
///
/// `MalformedReference` and `DetailFetch` are per-item: they are folded into degraded
/// records when errors are tolerated. `SummaryPageFetch` always aborts the page.
#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("summary url has no trailing numeric id: {url}")]
    MalformedReference { url: String },

    #[error("detail fetch failed for id {id}: {source}")]
    DetailFetch {
        id: u32,
        #[source]
        source: CatalogClientError,
    },

    #[error("summary page fetch failed (limit={limit}, offset={offset}): {source}")]
    SummaryPageFetch {
        limit: u32,
        offset: u32,
        #[source]
        source: CatalogClientError,
    },
}
