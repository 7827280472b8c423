//! Tor Browser Bundle detection heuristics.
//!
//! The Tor Browser ships a deliberately uniform `User-Agent` string so that
//! users blend into one anonymity set. That uniformity is what we match on
//! here: a plain Firefox shape with one of the two Gecko tokens Tor Browser
//! releases have used historically.
//!
//! The verdict is advisory only. Any client can send this exact header, and
//! a stock Firefox legitimately produces matching strings, so the result
//! must never gate access or stand in for authentication.

use once_cell::sync::Lazy;
use regex::Regex;

/// User-agent shapes produced by Tor Browser releases.
///
/// Two Gecko tokens are accepted: the frozen `20100101` build id and the
/// `<major>.0` form used by earlier release trains. A release that switches
/// to a third format will be reported as not-Tor until the pattern is
/// updated.
static TBB_USER_AGENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Mozilla/5\.0 \([^)]*\) Gecko/(\d+\.0|20100101) Firefox/\d+\.0$")
        .expect("user-agent pattern is valid")
});

/// Returns true when the given `User-Agent` string looks like Tor Browser.
pub fn likely_tbb(ua: &str) -> bool {
    TBB_USER_AGENTS.is_match(ua)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
