//! Deterministic fuzzy matching of free-text location queries.
//!
//! A candidate location matches a query when the first of these tiers
//! succeeds (all comparisons are case-insensitive):
//!
//! 1. exact equality
//! 2. substring containment in either direction
//! 3. token overlap: the query is split on whitespace and commas, tokens of
//!    two characters or fewer are discarded, and at least 70% (rounded up)
//!    of the remaining query tokens must each contain, or be contained by,
//!    some token of the candidate
//!
//! A query with no token longer than two characters needs zero overlapping
//! tokens, so it matches every non-empty candidate on the third tier.

use crime_spotter_incident_models::Incident;

/// Shortest query token that takes part in token matching.
const MIN_TOKEN_CHARS: usize = 3;

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

/// A lowercased query, tokenized once and reused across candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    lower: String,
    tokens: Vec<String>,
}

impl LocationQuery {
    /// Prepares `query` for matching. Surrounding whitespace is ignored.
    #[must_use]
    pub fn new(query: &str) -> Self {
        let lower = query.trim().to_lowercase();
        let tokens = tokens(&lower)
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .map(ToString::to_string)
            .collect();
        Self { lower, tokens }
    }

    /// Tokens considered by the overlap tier.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Query tokens that must overlap for the third tier to match.
    #[must_use]
    pub fn required_tokens(&self) -> usize {
        (self.tokens.len() * 7).div_ceil(10)
    }

    /// Whether `candidate` matches this query.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if self.lower.is_empty() || candidate.is_empty() {
            return false;
        }

        if candidate == self.lower {
            return true;
        }

        if candidate.contains(&self.lower) || self.lower.contains(&candidate) {
            return true;
        }

        let candidate_tokens: Vec<&str> = tokens(&candidate).collect();
        let overlapping = self
            .tokens
            .iter()
            .filter(|query_token| {
                candidate_tokens.iter().any(|candidate_token| {
                    candidate_token.contains(query_token.as_str())
                        || query_token.contains(candidate_token)
                })
            })
            .count();

        overlapping >= self.required_tokens()
    }

    /// Incidents whose location matches, in feed order.
    pub fn filter<'a>(&'a self, incidents: &'a [Incident]) -> impl Iterator<Item = &'a Incident> {
        incidents
            .iter()
            .filter(move |incident| self.matches(&incident.location))
    }
}

/// One-off convenience for [`LocationQuery::matches`].
#[must_use]
pub fn location_matches(candidate: &str, query: &str) -> bool {
    LocationQuery::new(query).matches(candidate)
}
