//! MIM-7 Compliance Verification Engine
//!
//! This crate decides whether a web service URL or an uploaded GeoPackage
//! conforms to a recognised interoperability profile, and reports the
//! outcome as `compliant`, `non-compliant` or `error`.

pub mod artifact;
pub mod context;
pub mod dispatch;
pub mod http;
pub mod model;
pub mod network;

pub use artifact::ArtifactVerifier;
pub use context::RequestContext;
pub use dispatch::{Dispatcher, VerificationRequest, Verdict};
pub use http::{HttpProbe, ProbeConfig, ProbeResponse, ReqwestProbe, TransportError};
pub use model::{
    ComplianceException, ComplianceResult, ComplianceStatus, GeospatialCheckResult, ProbeOutcome,
};
pub use network::ServiceVerifier;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
