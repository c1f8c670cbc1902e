//! Batch preloading of variants for many sources.

use crate::{DerivationEngine, VariantHandle};
use std::collections::HashMap;
use uuid::Uuid;
use verso_core::{Blob, Descriptor, Variant};
use verso_error::VersoResult;

/// Fetches the variants of many sources for one descriptor in one query.
///
/// Nothing is derived here. Hits seed handles so they resolve without a
/// round-trip; misses resolve through the engine as usual.
#[derive(Debug, Clone)]
pub struct BatchPreloader {
    engine: DerivationEngine,
}

impl BatchPreloader {
    /// Preload through `engine`'s variant index.
    pub fn new(engine: DerivationEngine) -> Self {
        Self { engine }
    }

    /// Look up the variant of every source in `sources` for `descriptor`.
    #[tracing::instrument(skip_all, fields(sources = sources.len(), digest = %descriptor.digest().short()))]
    pub async fn preload(
        &self,
        sources: &[Blob],
        descriptor: Descriptor,
    ) -> VersoResult<PreloadedVariants> {
        let ids: Vec<Uuid> = sources.iter().map(|s| s.id).collect();
        let hits = self
            .engine
            .store()
            .find_all_by_sources_and_digest(&ids, descriptor.digest())
            .await?;

        tracing::debug!(
            hits = hits.len(),
            misses = sources.len().saturating_sub(hits.len()),
            "Preloaded variants"
        );
        Ok(PreloadedVariants {
            engine: self.engine.clone(),
            descriptor,
            sources: sources.to_vec(),
            hits,
        })
    }
}

/// Result of a batch preload.
#[derive(Debug, Clone)]
pub struct PreloadedVariants {
    engine: DerivationEngine,
    descriptor: Descriptor,
    sources: Vec<Blob>,
    hits: HashMap<Uuid, Variant>,
}

impl PreloadedVariants {
    /// The shared descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The preloaded variant of `source_id`, if the index had one.
    pub fn get(&self, source_id: Uuid) -> Option<&Variant> {
        self.hits.get(&source_id)
    }

    /// Number of sources that already had a variant.
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Sources without a variant yet.
    pub fn misses(&self) -> impl Iterator<Item = &Blob> {
        self.sources
            .iter()
            .filter(|source| !self.hits.contains_key(&source.id))
    }

    /// A handle for `source`, already resolved when it was a hit.
    pub fn handle(&self, source: &Blob) -> VariantHandle {
        match self.hits.get(&source.id) {
            Some(variant) => VariantHandle::preloaded(
                self.engine.clone(),
                source.clone(),
                self.descriptor.clone(),
                variant.clone(),
            ),
            None => self.engine.variant(source, self.descriptor.clone()),
        }
    }

    /// Handles for every preloaded source, in input order.
    pub fn handles(&self) -> Vec<VariantHandle> {
        self.sources.iter().map(|source| self.handle(source)).collect()
    }
}
