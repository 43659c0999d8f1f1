use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use nabemap_common::file_config::{FileConfig, PropertyKeys};
use nabemap_common::{Neighborhood, ResolverResult, DEFAULT_RADIUS_KM};

use crate::adjacency::{find_adjacent, AdjacentMatch};
use crate::containment::find_containing;
use crate::set::NeighborhoodSet;
use crate::source::{DatasetSource, FileSource};

const MAX_CACHED_ADJACENCIES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AdjacencyKey {
    code: String,
    radius_bits: u64,
}

/// A containment result plus, when found, its adjacency set.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub neighborhood: Option<Arc<Neighborhood>>,
    pub adjacent: Arc<Vec<AdjacentMatch>>,
}

/// Process-wide entry point to the neighborhood data.
///
/// The dataset is loaded at most once: concurrent first callers wait on the
/// same load, and the snapshot is read-only afterwards. A failed load is not
/// remembered, so the next caller tries again.
pub struct NeighborhoodResolver {
    source: Arc<dyn DatasetSource>,
    keys: PropertyKeys,
    default_radius_km: f64,
    cache_enabled: bool,
    set: OnceCell<Arc<NeighborhoodSet>>,
    adjacency_cache: ArcSwap<HashMap<AdjacencyKey, Arc<Vec<AdjacentMatch>>>>,
}

impl NeighborhoodResolver {
    pub fn new(source: impl DatasetSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            keys: PropertyKeys::default(),
            default_radius_km: DEFAULT_RADIUS_KM,
            cache_enabled: true,
            set: OnceCell::new(),
            adjacency_cache: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Resolver reading the file named in `[dataset]`, with `[adjacency]` settings applied.
    pub fn from_config(config: &FileConfig) -> Self {
        Self::new(FileSource::new(&config.dataset.path))
            .with_keys(config.dataset.keys.clone())
            .with_default_radius_km(config.adjacency.radius_km)
            .with_cache(config.adjacency.cache)
    }

    pub fn with_keys(mut self, keys: PropertyKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_default_radius_km(mut self, radius_km: f64) -> Self {
        self.default_radius_km = radius_km;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    /// The dataset snapshot, loading it on first use.
    pub async fn neighborhoods(&self) -> ResolverResult<Arc<NeighborhoodSet>> {
        self.set
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    async fn load(&self) -> ResolverResult<Arc<NeighborhoodSet>> {
        let start = std::time::Instant::now();
        let source = self.source.describe();

        let result = match self.source.fetch().await {
            Ok(text) => NeighborhoodSet::from_geojson(&text, &self.keys),
            Err(e) => Err(e),
        };

        match result {
            Ok(set) => {
                info!(
                    count = set.len(),
                    source = source.as_str(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Loaded neighborhoods"
                );
                Ok(Arc::new(set))
            }
            Err(e) => {
                error!(source = source.as_str(), error = %e, "Failed to load neighborhoods");
                Err(e.into())
            }
        }
    }

    pub async fn find_containing(&self, lng: f64, lat: f64) -> ResolverResult<Option<Arc<Neighborhood>>> {
        let set = self.neighborhoods().await?;
        find_containing(&set, lng, lat)
    }

    /// Adjacency for `subject`, using the default radius when `radius_km` is None.
    ///
    /// Results for the dataset's own neighborhoods are memoized by code and
    /// radius; the snapshot never changes, so entries never go stale.
    pub async fn find_adjacent(
        &self,
        subject: Option<&Neighborhood>,
        radius_km: Option<f64>,
    ) -> ResolverResult<Arc<Vec<AdjacentMatch>>> {
        let set = self.neighborhoods().await?;
        let radius_km = radius_km.unwrap_or(self.default_radius_km);

        let key = match subject {
            Some(hood) if self.cache_enabled && radius_km.is_finite() && set.owns(hood) => {
                Some(AdjacencyKey {
                    code: hood.code.clone(),
                    radius_bits: radius_km.to_bits(),
                })
            }
            _ => None,
        };

        if let Some(key) = &key {
            if let Some(hit) = self.adjacency_cache.load().get(key) {
                debug!(code = key.code.as_str(), radius_km, "Adjacency cache hit");
                return Ok(Arc::clone(hit));
            }
        }

        let matches = Arc::new(find_adjacent(&set, subject, radius_km)?);

        if let Some(key) = key {
            self.remember(key, Arc::clone(&matches));
        }
        Ok(matches)
    }

    /// Containment followed by adjacency of whatever was found.
    pub async fn resolve(&self, lng: f64, lat: f64, radius_km: Option<f64>) -> ResolverResult<Resolution> {
        let neighborhood = self.find_containing(lng, lat).await?;
        let adjacent = match &neighborhood {
            Some(hood) => self.find_adjacent(Some(hood.as_ref()), radius_km).await?,
            None => Arc::new(Vec::new()),
        };
        Ok(Resolution {
            neighborhood,
            adjacent,
        })
    }

    pub fn cached_adjacency_count(&self) -> usize {
        self.adjacency_cache.load().len()
    }

    fn remember(&self, key: AdjacencyKey, matches: Arc<Vec<AdjacentMatch>>) {
        // The cap is checked against the map being replaced, so racing
        // inserts cannot overshoot it.
        self.adjacency_cache.rcu(|current| {
            if current.len() >= MAX_CACHED_ADJACENCIES && !current.contains_key(&key) {
                debug!(code = key.code.as_str(), "Adjacency cache full, not caching");
                return Arc::clone(current);
            }
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), Arc::clone(&matches));
            Arc::new(next)
        });
    }
}
