//! Catalog aggregation: discover every model, then fetch field schemas.
//!
//! Discovery pages through `ir.model` strictly in sequence and is all or
//! nothing. Enrichment runs `fields_get` for a chunk of models at a time,
//! awaiting the whole chunk before starting the next, so at most
//! `chunk_size` schema fetches are in flight. A failed fetch leaves its
//! model bare and is recorded in [`Catalog::failures`].

use std::fmt;

use futures::future::join_all;
use odoo_proto::Domain;
use tracing::{debug, info, warn};

use crate::error::CallError;
use crate::models::ModelDescriptor;
use crate::object::{fields_get, search_read, SearchReadOptions};
use crate::session::Session;
use crate::transport::Transport;

/// Model holding the catalog of models.
pub const CATALOG_MODEL: &str = "ir.model";

/// Records requested per discovery page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Schema fetches issued together.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// Discovery gives up after this many pages without an empty one.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

const CATALOG_FIELDS: [&str; 3] = ["id", "model", "name"];
const CATALOG_ORDER: &str = "model asc";

/// What to do with models whose schema could not be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BareModelPolicy {
    /// Return them without a field map.
    #[default]
    Keep,
    /// Leave them out of the result.
    Drop,
}

/// Tuning of a catalog fetch.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Records per discovery page. Zero is treated as one.
    pub page_size: u32,

    /// Concurrent schema fetches. Zero is treated as one.
    pub chunk_size: usize,

    /// Upper bound on discovery pages, the empty one included.
    pub max_pages: usize,

    /// Filter applied to `ir.model`.
    pub domain: Domain,

    pub bare_models: BareModelPolicy,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            domain: Domain::new(),
            bare_models: BareModelPolicy::Keep,
        }
    }
}

impl CatalogOptions {
    /// Default options: every model, kept even when bare.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the discovery page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set how many schema fetches run together.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the discovery page cap.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Restrict discovery to models matching `domain`.
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    /// Choose what happens to bare models.
    pub fn with_bare_models(mut self, policy: BareModelPolicy) -> Self {
        self.bare_models = policy;
        self
    }
}

/// A schema fetch that failed during enrichment.
#[derive(Debug)]
pub struct ModelFailure {
    pub model: String,
    pub error: CallError,
}

/// Result of a catalog fetch.
#[derive(Debug)]
pub struct Catalog {
    /// Descriptors in discovery order, filtered by the bare-model policy.
    pub models: Vec<ModelDescriptor>,

    /// Models whose schema fetch failed, in discovery order.
    pub failures: Vec<ModelFailure>,

    /// Models found by discovery.
    pub discovered: usize,

    /// Discovery pages requested, the final empty one included.
    pub pages: usize,
}

impl Catalog {
    /// Counts of what happened.
    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            discovered: self.discovered,
            enriched: self.discovered - self.failures.len(),
            bare: self.failures.len(),
            pages: self.pages,
        }
    }

    /// Take the descriptors.
    pub fn into_models(self) -> Vec<ModelDescriptor> {
        self.models
    }
}

/// Counts reported by [`Catalog::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub discovered: usize,
    pub enriched: usize,
    pub bare: usize,
    pub pages: usize,
}

impl fmt::Display for CatalogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} models discovered in {} pages, {} with fields, {} bare",
            self.discovered, self.pages, self.enriched, self.bare
        )
    }
}

/// Discover and enrich the whole catalog.
pub async fn fetch_catalog<T>(
    transport: &T,
    session: &Session,
    options: &CatalogOptions,
) -> Result<Catalog, CallError>
where
    T: Transport + ?Sized,
{
    let (models, pages) = discover(transport, session, options).await?;
    let discovered = models.len();

    let (models, failures) = enrich(transport, session, models, options.chunk_size).await;

    let models = match options.bare_models {
        BareModelPolicy::Keep => models,
        BareModelPolicy::Drop => models.into_iter().filter(ModelDescriptor::is_enriched).collect(),
    };

    let catalog = Catalog {
        models,
        failures,
        discovered,
        pages,
    };
    info!(
        discovered = catalog.discovered,
        bare = catalog.failures.len(),
        returned = catalog.models.len(),
        "catalog complete"
    );
    Ok(catalog)
}

/// Page through the catalog model until an empty page.
///
/// Returns the descriptors, ordered by machine name, and the number of
/// pages requested.
pub async fn discover<T>(
    transport: &T,
    session: &Session,
    options: &CatalogOptions,
) -> Result<(Vec<ModelDescriptor>, usize), CallError>
where
    T: Transport + ?Sized,
{
    let page_size = options.page_size.max(1);
    let max_pages = options.max_pages.max(1);
    let limit_exceeded = |pages| CallError::PageLimitExceeded {
        model: CATALOG_MODEL.to_string(),
        pages,
    };

    let mut models: Vec<ModelDescriptor> = Vec::new();
    let mut offset: u32 = 0;
    let mut pages = 0;

    loop {
        if pages == max_pages {
            return Err(limit_exceeded(pages));
        }

        let page_options = SearchReadOptions::new()
            .with_offset(offset)
            .with_limit(page_size)
            .with_order(CATALOG_ORDER);
        let page: Vec<ModelDescriptor> = search_read(
            transport,
            session,
            CATALOG_MODEL,
            &options.domain,
            &CATALOG_FIELDS,
            &page_options,
        )
        .await?;
        pages += 1;

        if page.is_empty() {
            break;
        }

        debug!(page = pages, offset, records = page.len(), "catalog page");
        models.extend(page);
        offset = offset
            .checked_add(page_size)
            .ok_or_else(|| limit_exceeded(pages))?;
    }

    info!(models = models.len(), pages, "discovered models");
    Ok((models, pages))
}

/// Fetch field maps chunk by chunk. Never fails as a whole.
pub async fn enrich<T>(
    transport: &T,
    session: &Session,
    models: Vec<ModelDescriptor>,
    chunk_size: usize,
) -> (Vec<ModelDescriptor>, Vec<ModelFailure>)
where
    T: Transport + ?Sized,
{
    let chunk_size = chunk_size.max(1);
    let total = models.len();
    let mut enriched = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut remaining = models.into_iter();

    loop {
        let chunk: Vec<ModelDescriptor> = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }

        let results = join_all(
            chunk
                .iter()
                .map(|descriptor| fields_get(transport, session, &descriptor.model)),
        )
        .await;

        for (mut descriptor, result) in chunk.into_iter().zip(results) {
            match result {
                Ok(fields) => descriptor.fields = Some(fields),
                Err(error) => {
                    if error.is_access_denied() {
                        debug!(model = %descriptor.model, %error, "no access to model schema");
                    } else {
                        warn!(model = %descriptor.model, %error, "failed to fetch model schema");
                    }
                    failures.push(ModelFailure {
                        model: descriptor.model.clone(),
                        error,
                    });
                }
            }
            enriched.push(descriptor);
        }

        debug!(done = enriched.len(), total, "enriched chunk");
    }

    (enriched, failures)
}
