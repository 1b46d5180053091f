//! Match engine behavior: pattern tables, catch-all, custom matchers.

use cascade_router::{MatchResult, PatternSpec, Route};
use http::Method;
use regex::Regex;

mod common;
use common::request;
use tracing_util::TestTracing;

#[test]
fn test_catch_all_matches_everything() {
    let _tracing = TestTracing::init();
    let route = Route::catch_all();
    for (method, path) in [
        (Method::GET, "/"),
        (Method::POST, "/anything/at/all"),
        (Method::DELETE, "/x?y=z"),
    ] {
        assert_eq!(route.matches(&request(method, path)), MatchResult::Plain);
    }
}

#[test]
fn test_exact_pattern_is_verb_scoped() {
    let route = Route::new().get("/pets");
    assert!(route.matches(&request(Method::GET, "/pets")).is_match());
    assert_eq!(
        route.matches(&request(Method::POST, "/pets")),
        MatchResult::Miss
    );
}

#[test]
fn test_match_is_case_insensitive_both_ways() {
    let route = Route::new().get("/Pets");
    assert!(route.matches(&request(Method::GET, "/PETS")).is_match());
}

#[test]
fn test_head_is_treated_as_get() {
    let route = Route::new().get("/pets");
    assert!(route.matches(&request(Method::HEAD, "/pets")).is_match());
    // but a HEAD pattern table entry is not implied for other verbs
    assert_eq!(
        route.matches(&request(Method::OPTIONS, "/pets")),
        MatchResult::Miss
    );
}

#[test]
fn test_regex_captures_are_delivered() {
    let route = Route::new().get(PatternSpec::regex(r"^/pets/(\d+)/toys/(\d+)$"));
    match route.matches(&request(Method::GET, "/pets/12/toys/7")) {
        MatchResult::Captured(caps) => {
            assert_eq!(caps[0].as_deref(), Some("12"));
            assert_eq!(caps[1].as_deref(), Some("7"));
        }
        other => panic!("expected captures, got {other:?}"),
    }
}

#[test]
fn test_last_matching_regex_wins() {
    // both patterns match "/a"; the second one's capture is the one kept
    let route = Route::new()
        .get(PatternSpec::regex(r"^/a$"))
        .get(PatternSpec::regex(r"^/(.+)$"));
    match route.matches(&request(Method::GET, "/a")) {
        MatchResult::Captured(caps) => assert_eq!(caps[0].as_deref(), Some("a")),
        other => panic!("expected captures, got {other:?}"),
    }
}

#[test]
fn test_later_exact_match_keeps_earlier_captures() {
    let route = Route::new()
        .get(PatternSpec::regex(r"^/(.+)$"))
        .get("/a");
    assert!(matches!(
        route.matches(&request(Method::GET, "/a")),
        MatchResult::Captured(_)
    ));
}

#[test]
fn test_optional_group_is_none() {
    let route = Route::new().get(PatternSpec::regex(r"^/files(/(.+))?$"));
    match route.matches(&request(Method::GET, "/files")) {
        MatchResult::Captured(caps) => {
            assert_eq!(caps[0], None);
            assert_eq!(caps[1], None);
        }
        other => panic!("expected captures, got {other:?}"),
    }
}

#[test]
fn test_precompiled_regex_registers() {
    let re = Regex::new(r"^/v(\d+)$").unwrap();
    let route = Route::new().put(re);
    assert!(route.matches(&request(Method::PUT, "/v2")).is_match());
}

#[test]
fn test_malformed_regex_is_rejected_not_stored() {
    let _tracing = TestTracing::init();
    let route = Route::new()
        .get(PatternSpec::regex("(unclosed"))
        .get("/ok");
    assert_eq!(route.pattern_count(), 1);
    assert!(route.matches(&request(Method::GET, "/ok")).is_match());
}

#[test]
fn test_all_registers_every_verb() {
    let route = Route::new().all("/any");
    for method in [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ] {
        assert!(route.matches(&request(method, "/any")).is_match());
    }
}

#[test]
fn test_custom_matcher_replaces_table() {
    let route = Route::new()
        .get("/never")
        .matcher(|req| {
            if req.get_header("x-tenant").is_some() {
                MatchResult::Plain
            } else {
                MatchResult::Miss
            }
        });

    // the table pattern no longer matters
    assert_eq!(
        route.matches(&request(Method::GET, "/never")),
        MatchResult::Miss
    );

    let mut req = cascade_router::HandlerRequest::new(Method::GET, "/whatever");
    req.headers.insert("x-tenant".to_string(), "acme".to_string());
    assert_eq!(route.matches(&req), MatchResult::Plain);
}

#[test]
fn test_custom_matcher_can_produce_captures() {
    let route = Route::new().matcher(|req| {
        let mut caps = cascade_router::CaptureVec::new();
        caps.push(Some(req.path.trim_start_matches('/').to_string()));
        MatchResult::Captured(caps)
    });
    match route.matches(&request(Method::GET, "/abc")) {
        MatchResult::Captured(caps) => assert_eq!(caps[0].as_deref(), Some("abc")),
        other => panic!("expected captures, got {other:?}"),
    }
}
