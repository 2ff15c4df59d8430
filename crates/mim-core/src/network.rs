//! Web service compliance probing
//!
//! A URL is checked for a WFS 2.0.0 capabilities document first, then for an
//! OGC API Features landing page with a `/conformance` resource. The first
//! check that passes wins. Transport failures end the probe immediately with
//! an `error` outcome; a reachable service that passes nothing is
//! non-compliant.

use crate::context::RequestContext;
use crate::http::{HttpProbe, ProbeResponse, TransportError};
use crate::model::{ComplianceException, ComplianceResult, ProbeOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Marker looked for in a GetCapabilities response body
pub const WFS_CAPABILITIES_MARKER: &str = "WFS_Capabilities";

pub const WFS_COMPLIANT: &str = "The service is a valid MIM-7 OGC WFS 2.0.0 service";
pub const OGC_API_FEATURES_COMPLIANT: &str =
    "The service is a valid MIM-7 OGC API Features service";
pub const NOT_A_STANDARDS_INTERFACE: &str =
    "not a valid MIM-7 standards-based web service interface";

const CAPABILITIES_QUERY: &[(&str, &str)] = &[
    ("SERVICE", "WFS"),
    ("REQUEST", "GetCapabilities"),
    ("VERSION", "2.0.0"),
];

/// Probes service URLs for WFS / OGC API Features compliance
#[derive(Clone)]
pub struct ServiceVerifier {
    probe: Arc<dyn HttpProbe>,
}

impl ServiceVerifier {
    pub fn new(probe: Arc<dyn HttpProbe>) -> Self {
        Self { probe }
    }

    /// Run the ordered checks against `url`
    #[tracing::instrument(name = "verify_service", skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn verify(&self, url: &str, ctx: &RequestContext) -> ProbeOutcome {
        match self.run_checks(url).await {
            Ok(outcome) => {
                info!("Service check finished: {}", outcome.status());
                outcome
            }
            Err(e) => {
                warn!("Service could not be contacted: {}", e);
                ProbeOutcome::Unreachable(ComplianceResult::unreachable(
                    url,
                    format!("The service could not be contacted: {}", e),
                ))
            }
        }
    }

    async fn run_checks(&self, url: &str) -> Result<ProbeOutcome, TransportError> {
        let base = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let capabilities = self.get(capabilities_url(&base).as_str()).await?;
        if capabilities.is_ok() && capabilities.body.contains(WFS_CAPABILITIES_MARKER) {
            return Ok(ProbeOutcome::Compliant(ComplianceResult::compliant(
                url,
                WFS_COMPLIANT,
            )));
        }

        let root = self.get(url).await?;
        if !root.is_ok() {
            return Ok(ProbeOutcome::NonCompliant(ComplianceException::new(
                url,
                NOT_A_STANDARDS_INTERFACE,
            )));
        }

        let conformance = self.get(conformance_url(&base).as_str()).await?;
        if conformance.is_ok() {
            return Ok(ProbeOutcome::Compliant(ComplianceResult::compliant(
                url,
                OGC_API_FEATURES_COMPLIANT,
            )));
        }

        // Landing page answered but nothing corroborates an OGC API profile.
        Ok(ProbeOutcome::NonCompliant(ComplianceException::new(
            url,
            format!(
                "{} (conformance declaration returned HTTP {})",
                NOT_A_STANDARDS_INTERFACE, conformance.status
            ),
        )))
    }

    async fn get(&self, url: &str) -> Result<ProbeResponse, TransportError> {
        let response = self.probe.get(url).await?;
        debug!("GET {} -> {}", url, response.status);
        Ok(response)
    }
}

/// `url` with the WFS GetCapabilities parameters appended to its query
pub fn capabilities_url(base: &Url) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().extend_pairs(CAPABILITIES_QUERY);
    url
}

/// `url` with `/conformance` appended to its path, query preserved
pub fn conformance_url(base: &Url) -> Url {
    let mut url = base.clone();
    let path = format!("{}/conformance", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url
}
