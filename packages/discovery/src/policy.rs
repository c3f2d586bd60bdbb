//! Early-access visibility rules.
//!
//! A new listing's owner and contact details are hidden from requesters
//! without an entitlement for the first 24 hours. The decision is a chain of
//! plain functions evaluated in order; the first rule with an opinion wins.

use chrono::{DateTime, Duration as TimeDelta, Utc};

use crate::types::{Listing, RequesterContext};

/// How long a fresh listing stays restricted.
pub const EARLY_ACCESS_WINDOW: TimeDelta = TimeDelta::hours(24);

/// `Some(restricted)` to decide, `None` to defer to the next rule.
type RuleFn = fn(&Listing, &RequesterContext, DateTime<Utc>) -> Option<bool>;

struct Rule {
    name: &'static str,
    check: RuleFn,
}

const RULES: &[Rule] = &[
    Rule {
        name: "no_creation_time",
        check: |listing, _, _| listing.created_at.is_none().then_some(false),
    },
    Rule {
        name: "pro_member",
        check: |_, requester, _| requester.is_pro.then_some(false),
    },
    Rule {
        name: "active_pass",
        check: |_, requester, now| requester.has_active_pass(now).then_some(false),
    },
    Rule {
        name: "owner",
        check: |listing, requester, _| requester.owns(listing).then_some(false),
    },
    Rule {
        name: "early_access_window",
        check: |listing, _, now| {
            let created_at = listing.created_at?;
            (now - created_at < EARLY_ACCESS_WINDOW).then_some(true)
        },
    },
];

const FALLBACK_RULE: &str = "default";

/// Outcome of evaluating the rules for one listing and requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityDecision {
    pub restricted: bool,
    /// Name of the rule that decided, for logs
    pub rule: &'static str,
}

/// Evaluate the early-access rules.
pub fn decide(listing: &Listing, requester: &RequesterContext, now: DateTime<Utc>) -> VisibilityDecision {
    RULES
        .iter()
        .find_map(|rule| {
            (rule.check)(listing, requester, now).map(|restricted| VisibilityDecision {
                restricted,
                rule: rule.name,
            })
        })
        .unwrap_or(VisibilityDecision {
            restricted: false,
            rule: FALLBACK_RULE,
        })
}

pub fn is_restricted(listing: &Listing, requester: &RequesterContext, now: DateTime<Utc>) -> bool {
    decide(listing, requester, now).restricted
}
