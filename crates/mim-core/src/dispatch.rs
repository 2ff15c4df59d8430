//! Routes verification requests to the matching verifier

use crate::artifact::ArtifactVerifier;
use crate::context::RequestContext;
use crate::http::{HttpProbe, ProbeConfig, ReqwestProbe};
use crate::model::{ComplianceResult, GeospatialCheckResult, ProbeOutcome};
use crate::network::ServiceVerifier;
use crate::CoreResult;
use std::sync::Arc;
use tracing::{error, Instrument};

/// What to verify
#[derive(Debug, Clone)]
pub enum VerificationRequest {
    ServiceUrl(String),
    Artifact(Vec<u8>),
}

/// Uniform verdict handed back to the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Service(ComplianceResult),
    Artifact(GeospatialCheckResult),
}

/// Stateless front door over both verifiers
#[derive(Clone)]
pub struct Dispatcher {
    service: ServiceVerifier,
    artifact: Arc<ArtifactVerifier>,
}

impl Dispatcher {
    pub fn new(service: ServiceVerifier, artifact: ArtifactVerifier) -> Self {
        Self {
            service,
            artifact: Arc::new(artifact),
        }
    }

    /// Reqwest-backed probe and SQLite-backed GeoPackage reader
    pub fn with_config(config: &ProbeConfig) -> CoreResult<Self> {
        let probe: Arc<dyn HttpProbe> = Arc::new(ReqwestProbe::new(config)?);
        Ok(Self::new(
            ServiceVerifier::new(probe),
            ArtifactVerifier::default(),
        ))
    }

    pub async fn dispatch(&self, request: VerificationRequest, ctx: &RequestContext) -> Verdict {
        match request {
            VerificationRequest::ServiceUrl(url) => {
                Verdict::Service(self.verify_service(&url, ctx).await.into_compliance_result())
            }
            VerificationRequest::Artifact(payload) => {
                Verdict::Artifact(self.verify_artifact(payload, ctx).await)
            }
        }
    }

    /// Probe a service URL, keeping the three-way outcome
    pub async fn verify_service(&self, url: &str, ctx: &RequestContext) -> ProbeOutcome {
        self.service.verify(url, ctx).await
    }

    /// Inspect a container on the blocking pool so request handling keeps going
    pub async fn verify_artifact(
        &self,
        payload: Vec<u8>,
        ctx: &RequestContext,
    ) -> GeospatialCheckResult {
        let verifier = Arc::clone(&self.artifact);
        let span = tracing::info_span!("verify_artifact", request_id = %ctx.request_id);
        let worker_span = span.clone();

        let joined = tokio::task::spawn_blocking(move || {
            worker_span.in_scope(|| verifier.verify(&payload))
        })
        .instrument(span)
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => {
                error!(request_id = %ctx.request_id, "Artifact worker failed: {}", e);
                GeospatialCheckResult::failed(format!("Artifact verification failed: {}", e))
            }
        }
    }
}
