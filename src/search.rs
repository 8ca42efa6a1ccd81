use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::models::HoldCriteria;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Mail direction relative to the user's domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    Internal,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Sent, Direction::Received, Direction::Internal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
            Direction::Internal => "internal",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown direction '{}' (sent, received, internal)", s))
    }
}

/// Advanced search filters, serialized with the key names the audit log records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub from: String,
    pub to: String,
    pub date_start: String,
    pub date_end: String,
    pub has_attachments: bool,
    pub is_spam: bool,
    #[serde(serialize_with = "direction_or_empty")]
    pub direction: Option<Direction>,
    pub attachment_keyword: String,
}

/// An unset direction is logged as an empty string
fn direction_or_empty<S>(direction: &Option<Direction>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(direction.map(|d| d.as_str()).unwrap_or(""))
}

impl SearchFilters {
    /// True when any filter would narrow the search
    pub fn is_active(&self) -> bool {
        !self.from.is_empty()
            || !self.to.is_empty()
            || !self.date_start.is_empty()
            || !self.date_end.is_empty()
            || self.has_attachments
            || self.is_spam
            || self.direction.is_some()
            || !self.attachment_keyword.is_empty()
    }
}

/// Everything `GET /api/v1/messages` accepts
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub org_id: i64,
    pub query: String,
    pub user_domain: Option<String>,
    pub filters: SearchFilters,
    pub limit: usize,
    pub offset: usize,
}

impl SearchRequest {
    pub fn new(org_id: i64, query: impl Into<String>) -> Self {
        Self {
            org_id,
            query: query.into(),
            user_domain: None,
            filters: SearchFilters::default(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }

    pub fn with_user_domain(mut self, user_domain: Option<String>) -> Self {
        self.user_domain = user_domain;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_page(mut self, pager: &Pager) -> Self {
        self.limit = pager.limit;
        self.offset = pager.offset();
        self
    }

    /// Query parameters in the order the dashboard sends them; empty filters are omitted
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("org_id", self.org_id.to_string()), ("q", self.query.clone())];

        if let Some(domain) = self.user_domain.as_ref().filter(|d| !d.is_empty()) {
            pairs.push(("user_domain", domain.clone()));
        }

        let f = &self.filters;
        let text_filters = [
            ("from_addr", &f.from),
            ("to_addr", &f.to),
            ("date_start", &f.date_start),
            ("date_end", &f.date_end),
        ];
        for (key, value) in text_filters {
            if !value.is_empty() {
                pairs.push((key, value.clone()));
            }
        }
        if f.has_attachments {
            pairs.push(("has_attachments", "true".to_string()));
        }
        if f.is_spam {
            pairs.push(("is_spam", "true".to_string()));
        }
        if let Some(direction) = f.direction {
            pairs.push(("direction", direction.as_str().to_string()));
        }
        if !f.attachment_keyword.is_empty() {
            pairs.push(("attachment_keyword", f.attachment_keyword.clone()));
        }

        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }

    /// Only searches that actually narrow something are written to the audit log
    pub fn is_auditable(&self) -> bool {
        !self.query.is_empty() || self.filters.is_active()
    }

    pub fn audit_details(&self, result_count: usize, page: usize) -> Value {
        json!({
            "query": self.query,
            "filters": self.filters,
            "resultCount": result_count,
            "page": page,
        })
    }
}

/// 1-based pagination cursor over search results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub limit: usize,
    pub total: u64,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(limit: usize) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total: 0,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self) -> usize {
        let pages = (self.total as usize).div_ceil(self.limit);
        pages.max(1)
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Advance one page; returns false at the last page
    pub fn next(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// "21-40 of 93"
    pub fn range_label(&self, shown: usize) -> String {
        if shown == 0 {
            return format!("0 of {}", self.total);
        }
        let start = self.offset() + 1;
        format!("{}-{} of {}", start, self.offset() + shown, self.total)
    }
}

/// Split `"Jane Doe" <jane@corp.com>` into display name and address
pub fn parse_address(full: &str) -> (String, String) {
    let full = full.trim();
    if full.is_empty() {
        return (String::new(), String::new());
    }
    if full.ends_with('>') {
        if let Some(open) = full.rfind('<') {
            let name = full[..open].trim().trim_matches('"').trim();
            let email = full[open + 1..full.len() - 1].trim();
            return (name.to_string(), email.to_string());
        }
    }
    (String::new(), full.to_string())
}

/// Build hold criteria from the create-hold form; blank fields are left out
pub fn hold_criteria(from: &str, to: &str, subject: &str) -> HoldCriteria {
    let mut criteria = HoldCriteria::new();
    for (key, value) in [("from", from), ("to", to), ("subject", subject)] {
        let value = value.trim();
        if !value.is_empty() {
            criteria.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    criteria
}

/// Comma-separated input to a clean list
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}
