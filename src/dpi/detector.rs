//! Signature matching over normalized request fields.
//!
//! # Responsibilities
//! - Scan every field against every signature of a class
//! - Collect all matches (not just the first) for forensic logging
//! - Path traversal: substring containment of a literal pattern
//! - SQL injection: unanchored regex search

use std::fmt;
use std::sync::Arc;

use crate::dpi::signatures::SignatureSet;

/// Signature class that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureCategory {
    PathTraversal,
    SqlInjection,
}

impl fmt::Display for SignatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureCategory::PathTraversal => write!(f, "path_traversal"),
            SignatureCategory::SqlInjection => write!(f, "sql_injection"),
        }
    }
}

/// A single signature hit: which signature fired against which field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SignatureMatch {
    pub category: SignatureCategory,
    /// The literal pattern or regex source that fired.
    pub signature: String,
    /// The normalized field content that matched.
    pub field: String,
}

/// Evaluates normalized field sets against the shared signature set.
#[derive(Debug, Clone)]
pub struct Detector {
    signatures: Arc<SignatureSet>,
}

impl Detector {
    pub fn new(signatures: Arc<SignatureSet>) -> Self {
        Self { signatures }
    }

    /// Scan all fields for path-traversal literals.
    ///
    /// Fields are already lower-cased by the normalizer, so containment is
    /// case-insensitive by construction. Returns every (signature, field)
    /// pair that matched; an empty result means no hit.
    pub fn detect_path_traversal(&self, fields: &[String]) -> Vec<SignatureMatch> {
        let mut matches = Vec::new();
        for field in fields {
            for pattern in self.signatures.path_traversal() {
                if field.contains(pattern.as_str()) {
                    matches.push(SignatureMatch {
                        category: SignatureCategory::PathTraversal,
                        signature: pattern.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        matches
    }

    /// Scan all fields for SQL-injection patterns (unanchored search).
    pub fn detect_sql_injection(&self, fields: &[String]) -> Vec<SignatureMatch> {
        let mut matches = Vec::new();
        for field in fields {
            for regex in self.signatures.sql_injection() {
                if regex.is_match(field) {
                    matches.push(SignatureMatch {
                        category: SignatureCategory::SqlInjection,
                        signature: regex.as_str().to_string(),
                        field: field.clone(),
                    });
                }
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> Detector {
        Detector::new(SignatureSet::builtin().unwrap())
    }

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_field_set_is_deterministically_clean() {
        let d = detector();
        assert!(d.detect_path_traversal(&[]).is_empty());
        assert!(d.detect_sql_injection(&[]).is_empty());
    }

    #[test]
    fn traversal_literal_is_found_anywhere_in_a_field() {
        let d = detector();
        let hits = d.detect_path_traversal(&fields(&["/files/../../etc/passwd", "text/html"]));
        assert!(!hits.is_empty());
        assert_eq!(hits[0].signature, "../");
        assert_eq!(hits[0].field, "/files/../../etc/passwd");
    }

    #[test]
    fn tautology_injection_is_found_in_body_field() {
        let d = detector();
        let hits = d.detect_sql_injection(&fields(&["/login", "id=5' or 1=1--"]));
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|m| m.category == SignatureCategory::SqlInjection));
        assert!(hits.iter().all(|m| m.field == "id=5' or 1=1--"));
    }

    #[test]
    fn union_select_injection_is_found() {
        let d = detector();
        let hits =
            d.detect_sql_injection(&fields(&["' union select name, pass from users--"]));
        assert!(!hits.is_empty());
    }

    #[test]
    fn clean_fields_produce_no_matches() {
        let d = detector();
        let clean = fields(&["/index.html", "", "text/html", "gzip, deflate", "session=abc123"]);
        assert!(d.detect_path_traversal(&clean).is_empty());
        assert!(d.detect_sql_injection(&clean).is_empty());
    }

    #[test]
    fn detection_is_monotonic_in_fields() {
        let d = detector();
        let mut set = fields(&["/index.html", ""]);
        assert!(d.detect_path_traversal(&set).is_empty());

        set.push("../secret".to_string());
        assert!(!d.detect_path_traversal(&set).is_empty());

        set.pop();
        assert!(d.detect_path_traversal(&set).is_empty());
    }

    #[test]
    fn all_matches_are_reported_not_just_the_first() {
        let d = detector();
        let hits = d.detect_path_traversal(&fields(&["../a", "../b"]));
        assert_eq!(hits.len(), 2);
    }
}
