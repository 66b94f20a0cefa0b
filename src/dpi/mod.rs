//! Deep packet inspection pipeline.
//!
//! Owns the normalizer and detector, applies the configured enforcement
//! policy, and emits one structured audit record per inspected request.

pub mod detector;
pub mod normalizer;
pub mod signatures;

use std::sync::Arc;

use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::dpi::detector::{Detector, SignatureMatch};
use crate::dpi::signatures::SignatureSet;

/// What a detection hit does to the forwarding decision.
///
/// This is process-wide configuration, not a compiled-in constant: both
/// behaviors have been run in production and stay selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EnforcementPolicy {
    /// Hits are logged as alerts; every request is forwarded.
    #[default]
    AlertOnly,
    /// A hit in any category drops the request.
    BlockOnHit,
}

/// Per-request detection outcome, produced fresh per request.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub path_traversal: bool,
    pub sql_injection: bool,
    /// Every (signature, field) pair that fired, for forensic traceability.
    pub matches: Vec<SignatureMatch>,
}

impl DetectionResult {
    pub fn hit(&self) -> bool {
        self.path_traversal || self.sql_injection
    }
}

/// Outcome of inspecting one request.
#[derive(Debug, Clone)]
pub struct ForwardDecision {
    /// True: relay the request. False: terminate it without forwarding.
    pub forward: bool,
    pub detection: DetectionResult,
}

/// Inspection orchestrator: normalizer + detector + enforcement policy.
#[derive(Debug, Clone)]
pub struct Dpi {
    detector: Detector,
    policy: EnforcementPolicy,
}

impl Dpi {
    pub fn new(signatures: Arc<SignatureSet>, policy: EnforcementPolicy) -> Self {
        Self { detector: Detector::new(signatures), policy }
    }

    pub fn policy(&self) -> EnforcementPolicy {
        self.policy
    }

    /// Inspect one request and decide whether it may be forwarded.
    ///
    /// `body` is the caller's buffered copy of the request body; it is
    /// only read here, never consumed, so the caller can still forward the
    /// identical bytes afterwards.
    pub fn investigate(&self, parts: &Parts, body: &[u8]) -> ForwardDecision {
        let normalized = normalizer::normalize(parts, body);
        let fields = normalized.fields();

        let mut matches = self.detector.detect_path_traversal(fields);
        let path_traversal = !matches.is_empty();

        let sql_matches = self.detector.detect_sql_injection(fields);
        let sql_injection = !sql_matches.is_empty();
        matches.extend(sql_matches);

        for m in &matches {
            tracing::warn!(
                target: "audit",
                category = %m.category,
                signature = %m.signature,
                field = %m.field,
                "signature match"
            );
        }

        let detection = DetectionResult { path_traversal, sql_injection, matches };
        let forward = match self.policy {
            EnforcementPolicy::AlertOnly => true,
            EnforcementPolicy::BlockOnHit => !detection.hit(),
        };

        // One audit record per request; matches serialized so the record
        // is self-contained for downstream log consumers.
        tracing::info!(
            target: "audit",
            forward,
            path_traversal = detection.path_traversal,
            sql_injection = detection.sql_injection,
            matches = %serde_json::to_string(&detection.matches).unwrap_or_default(),
            url = %normalized.url(),
            "request inspected"
        );

        ForwardDecision { forward, detection }
    }
}
