use crate::request::HandlerRequest;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::warn;

/// Maximum capture groups before the capture list spills to the heap.
pub const MAX_INLINE_CAPTURES: usize = 4;

/// Stack-allocated capture storage for the match hot path. Entries are
/// `None` for optional groups that did not participate in the match.
pub type CaptureVec = SmallVec<[Option<String>; MAX_INLINE_CAPTURES]>;

/// Outcome of testing one route against one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The route does not apply to this request.
    Miss,
    /// The route applies; no capture groups were produced.
    Plain,
    /// The route applies with the capture groups of the winning regex.
    Captured(CaptureVec),
}

impl MatchResult {
    #[must_use]
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchResult::Miss)
    }
}

/// A pattern as supplied at registration time.
///
/// Plain strings register exact (lowercased) path matches; a compiled
/// [`Regex`] registers a capture-producing pattern. [`PatternSpec::regex`]
/// defers compilation to registration, where a malformed source is logged
/// and discarded instead of failing the build of the route.
#[derive(Debug, Clone)]
pub enum PatternSpec {
    /// Exact path equality (compared lowercased)
    Exact(String),
    /// Pre-compiled regular expression
    Compiled(Regex),
    /// Regular expression source, compiled at registration
    Raw(String),
}

impl PatternSpec {
    /// A regex pattern from source text, validated when registered.
    pub fn regex(source: impl Into<String>) -> Self {
        PatternSpec::Raw(source.into())
    }
}

impl From<&str> for PatternSpec {
    fn from(path: &str) -> Self {
        PatternSpec::Exact(path.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(path: String) -> Self {
        PatternSpec::Exact(path)
    }
}

impl From<Regex> for PatternSpec {
    fn from(re: Regex) -> Self {
        PatternSpec::Compiled(re)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Pattern {
    Exact(String),
    Regex(Regex),
}

/// Ordered per-verb pattern table for one route.
///
/// Registration order is preserved exactly: later patterns are evaluated
/// after earlier ones and a later matching regex overwrites the captures of
/// an earlier one (last match wins). An exact-string match marks the route
/// matched but never downgrades captures a regex already produced.
#[derive(Debug, Clone, Default)]
pub(crate) struct MatchTable {
    verbs: HashMap<Method, Vec<Pattern>>,
}

impl MatchTable {
    pub(crate) fn push(&mut self, method: Method, spec: PatternSpec) {
        if let Some(pattern) = compile(spec) {
            self.verbs.entry(method).or_default().push(pattern);
        }
    }

    pub(crate) fn push_all(&mut self, spec: PatternSpec) {
        let Some(pattern) = compile(spec) else {
            return;
        };
        // HEAD is resolved to GET at lookup, so six verbs cover the table
        let verbs = [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ];
        for verb in verbs {
            self.verbs.entry(verb).or_default().push(pattern.clone());
        }
    }

    pub(crate) fn pattern_count(&self) -> usize {
        self.verbs.values().map(Vec::len).sum()
    }

    pub(crate) fn lookup(&self, method: &Method, lower_path: &str) -> MatchResult {
        // HEAD requests aren't allowed a body, but match like GET
        let method = if *method == Method::HEAD {
            &Method::GET
        } else {
            method
        };

        let Some(patterns) = self.verbs.get(method) else {
            return MatchResult::Miss;
        };

        let mut result = MatchResult::Miss;
        for pattern in patterns {
            match pattern {
                Pattern::Regex(re) => {
                    if let Some(caps) = re.captures(lower_path) {
                        let groups: CaptureVec = caps
                            .iter()
                            .skip(1)
                            .map(|m| m.map(|m| m.as_str().to_string()))
                            .collect();
                        result = MatchResult::Captured(groups);
                    }
                }
                Pattern::Exact(path) => {
                    if path == lower_path && !matches!(result, MatchResult::Captured(_)) {
                        result = MatchResult::Plain;
                    }
                }
            }
        }
        result
    }
}

fn compile(spec: PatternSpec) -> Option<Pattern> {
    match spec {
        PatternSpec::Exact(path) => Some(Pattern::Exact(path.to_lowercase())),
        PatternSpec::Compiled(re) => Some(Pattern::Regex(re)),
        PatternSpec::Raw(source) => match Regex::new(&source) {
            Ok(re) => Some(Pattern::Regex(re)),
            Err(err) => {
                warn!(pattern = %source, error = %err, "malformed route pattern discarded");
                None
            }
        },
    }
}

/// Match a request against a route's table, producing the lowercased path
/// comparison the table expects.
pub(crate) fn match_request(table: &MatchTable, request: &HandlerRequest) -> MatchResult {
    let lower_path = request.path.to_lowercase();
    table.lookup(&request.method, &lower_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(path: &str) -> HandlerRequest {
        HandlerRequest::new(Method::GET, path)
    }

    #[test]
    fn test_exact_match_is_case_folded() {
        let mut table = MatchTable::default();
        table.push(Method::GET, "/Pets".into());
        assert_eq!(match_request(&table, &get("/PETS")), MatchResult::Plain);
        assert_eq!(match_request(&table, &get("/dogs")), MatchResult::Miss);
    }

    #[test]
    fn test_head_matches_get_patterns() {
        let mut table = MatchTable::default();
        table.push(Method::GET, "/pets".into());
        let req = HandlerRequest::new(Method::HEAD, "/pets");
        assert_eq!(match_request(&table, &req), MatchResult::Plain);
    }

    #[test]
    fn test_last_matching_regex_wins() {
        let mut table = MatchTable::default();
        table.push(Method::GET, PatternSpec::regex(r"^/a$"));
        table.push(Method::GET, PatternSpec::regex(r"^/(.+)$"));
        match match_request(&table, &get("/a")) {
            MatchResult::Captured(caps) => {
                assert_eq!(caps.len(), 1);
                assert_eq!(caps[0].as_deref(), Some("a"));
            }
            other => panic!("expected captures, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_after_regex_keeps_captures() {
        let mut table = MatchTable::default();
        table.push(Method::GET, PatternSpec::regex(r"^/(.+)$"));
        table.push(Method::GET, "/a".into());
        assert!(matches!(
            match_request(&table, &get("/a")),
            MatchResult::Captured(_)
        ));
    }

    #[test]
    fn test_malformed_regex_is_discarded() {
        let mut table = MatchTable::default();
        table.push(Method::GET, PatternSpec::regex("("));
        table.push(Method::GET, "/ok".into());
        assert_eq!(table.pattern_count(), 1);
        assert_eq!(match_request(&table, &get("/ok")), MatchResult::Plain);
    }

    #[test]
    fn test_all_verbs_share_one_pattern() {
        let mut table = MatchTable::default();
        table.push_all("/any".into());
        for verb in [Method::GET, Method::POST, Method::DELETE] {
            let req = HandlerRequest::new(verb, "/any");
            assert_eq!(match_request(&table, &req), MatchResult::Plain);
        }
    }
}
