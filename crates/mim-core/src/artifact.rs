//! GeoPackage artifact verification
//!
//! Finds the first layer carrying geometry and checks the identifier
//! invariants on a bounded sample of its records. This is synchronous work;
//! callers on an async runtime offload it to a blocking worker.

use crate::model::GeospatialCheckResult;
use mim_gpkg::{ContainerReader, GeoPackageReader};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Records inspected from the qualifying layer
pub const RECORD_SAMPLE_LIMIT: usize = 50;

/// Checks uploaded containers for geometry and identifier invariants
#[derive(Clone)]
pub struct ArtifactVerifier {
    reader: Arc<dyn ContainerReader>,
}

impl Default for ArtifactVerifier {
    fn default() -> Self {
        Self::new(Arc::new(GeoPackageReader::new()))
    }
}

impl ArtifactVerifier {
    pub fn new(reader: Arc<dyn ContainerReader>) -> Self {
        Self { reader }
    }

    /// Inspect `payload`; malformed input is reported through `message`
    pub fn verify(&self, payload: &[u8]) -> GeospatialCheckResult {
        debug!(
            "Inspecting {} payload ({} bytes)",
            self.reader.format_name(),
            payload.len()
        );

        let container = match self.reader.open(payload) {
            Ok(container) => container,
            Err(e) => {
                warn!("Could not open container: {}", e);
                return GeospatialCheckResult::failed(format!("Error listing layers: {}", e));
            }
        };

        let layers = match container.layers() {
            Ok(layers) => layers,
            Err(e) => {
                warn!("Could not list layers: {}", e);
                return GeospatialCheckResult::failed(format!("Error listing layers: {}", e));
            }
        };

        for layer in &layers {
            let mut records = match container.read_layer(layer) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Error processing layer {}: {}", layer.name, e);
                    continue;
                }
            };

            if !records.has_geometry() {
                debug!("Layer {} has no geometry, skipping", layer.name);
                continue;
            }

            records.truncate(RECORD_SAMPLE_LIMIT);
            let ids = records.identifiers();
            let unique = identifiers_unique(&ids);
            let persistent = identifiers_persistent(&ids);

            info!(
                "Layer {} contains geospatial data (unique: {}, persistent: {})",
                layer.name, unique, persistent
            );
            return GeospatialCheckResult::found(&layer.name, unique, persistent);
        }

        info!("No geospatial data in {} layers", layers.len());
        GeospatialCheckResult::not_found()
    }
}

/// All identifiers distinct
pub fn identifiers_unique(ids: &[i64]) -> bool {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().all(|id| seen.insert(*id))
}

/// Identifiers never decrease in encounter order
pub fn identifiers_persistent(ids: &[i64]) -> bool {
    ids.windows(2).all(|pair| pair[0] <= pair[1])
}
