//! Attack signature definitions.
//!
//! Two signature classes are supported: literal substrings for path
//! traversal and regular expressions for SQL injection. All signatures are
//! written in lower case because the normalizer lower-cases every field
//! before matching.

use std::sync::Arc;

/// Literal substrings indicating path traversal.
const PATH_TRAVERSAL_PATTERNS: &[&str] = &["../"];

/// Regular expressions indicating SQL injection.
///
/// Matching is an unanchored search over each normalized field. The rules
/// cover boolean tautologies, UNION-based extraction, and piggy-backed
/// statements (stacked INSERT/UPDATE/DELETE/DDL).
const SQL_INJECTION_PATTERNS: &[&str] = &[
    r"('|[0-9]+)(\s)+(--|;)",
    r"'\s*or\s+.+\s*=\s*.+\s*(--|;)",
    r"[0-9]+\s*or\s+.+\s*=\s*.+",
    r#"'\s*union(\s+all)?\s+select[ a-z0-9'"\*,_\(\)\-]+from[ a-z0-9\-_\(\)\-]+(--|;)"#,
    r#"[0-9]+\s+union(\s+all)?\s+select[ a-z0-9'"\*,_\(\)\-]+from[ a-z0-9\-_\(\)\-]+"#,
    r#";\s*select[ a-z0-9'"\*,_\(\)\-]+from[ a-z0-9\-_\(\)\-]+(--|;)"#,
    r#";\s*insert\s+into\s+[ a-z0-9\-_\(\)\-].*\s+values\s*\(([ a-z0-9'"\*,_\(\)\-]+\s*,\s*)*[ a-z0-9'"\*_\(\)\-]+\)\s*(--|;)"#,
    r#";\s*insert\s+into\s+[ a-z0-9\-_\(\)\-].*\s+select[ a-z0-9'"\*,_\(\)\-]+from[ a-z0-9\-_\(\)\-]+(--|;)"#,
    r";\s*update\s+[ a-z0-9\-_\(\)\-]+\s+set(\s+[a-z0-9\-_]+\s+=\s*.+\s*,)*\s+[a-z0-9\-_\-]+\s*=\s*.+\s*(--|;)",
    r";\s*delete\s+from\s+[ a-z0-9\-_\(\)\-]+\s*.*(--|;)",
    r";\s*drop\s+(table|view|index)\s+[ a-z0-9\-_\(\)\-]+(--|;)",
    r";\s*truncate\s+table\s+[ a-z0-9\-_\(\)\-]+(--|;)",
    r";\s*alter\s+table\s+[ a-z0-9\-_\(\)\-]+(\s)+(add|drop\s+column|alter\s+column|modify|rename\s+column)(\s)+.+(--|;)",
    r";\s*create\s+table\s+[ a-z0-9\-_\(\)\-]+\s*\((\s*[a-z0-9\-_]+\s+[ a-z0-9_\(\)\-]+\s*,)*\s*[a-z0-9\-_]+\s+[ a-z0-9_\(\)\-]+\)\s*(--|;)",
    r#";\s*create\s+table\s+[ a-z0-9\-_\(\)]+\s*as\s+select[ a-z0-9'"\*,_\(\)\-]+from[ a-z0-9\-_\(\)]+.*(--|;)"#,
    r#";\s*create\s+(recursive|temporary)?\s*view\s+[ a-z0-9\-_\(\)]+.*\s+as\s+select[ a-z0-9'"\*,_\(\)\-]+from[ a-z0-9\-_\(\)]+.*(--|;)"#,
    r";\s*create(\s+unique)?\s+index\s+[ a-z0-9\-_\(\)]+\s+on.*(--|;)",
];

/// Immutable, compiled signature set.
///
/// Built once at process start and shared read-only across all concurrent
/// inspections. A pattern that fails to compile aborts startup; signatures
/// are never compiled at request time.
#[derive(Debug)]
pub struct SignatureSet {
    path_traversal: Vec<String>,
    sql_injection: Vec<regex::Regex>,
}

impl SignatureSet {
    /// Compile the built-in signature set.
    pub fn builtin() -> Result<Arc<Self>, regex::Error> {
        Self::compile(
            PATH_TRAVERSAL_PATTERNS.iter().map(|p| p.to_string()),
            SQL_INJECTION_PATTERNS.iter().copied(),
        )
    }

    /// Compile an arbitrary signature set.
    ///
    /// Exists so tests (and future deployments) can run the detector against
    /// alternate rules without touching the built-in list.
    pub fn compile<'a>(
        path_traversal: impl IntoIterator<Item = String>,
        sql_injection: impl IntoIterator<Item = &'a str>,
    ) -> Result<Arc<Self>, regex::Error> {
        let sql_injection = sql_injection
            .into_iter()
            .map(regex::Regex::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Arc::new(Self {
            path_traversal: path_traversal.into_iter().collect(),
            sql_injection,
        }))
    }

    /// Path-traversal literal substrings.
    pub fn path_traversal(&self) -> &[String] {
        &self.path_traversal
    }

    /// Compiled SQL-injection patterns.
    pub fn sql_injection(&self) -> &[regex::Regex] {
        &self.sql_injection
    }
}
