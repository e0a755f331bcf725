//! Page state derived from the URL query string.
//!
//! The query string is the only state store: every render re-derives a
//! [`PageState`] from it, and every user action produces a new query string
//! through the pure functions below.

use url::form_urlencoded;

use crate::query::QueryKey;
use crate::types::Gender;

/// Users per page. The API is always asked for this many.
pub const PAGE_LIMIT: u32 = 10;

pub const PAGE_PARAM: &str = "page";
pub const SEARCH_PARAM: &str = "search";
pub const GENDER_PARAM: &str = "gender";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub page: u32,
    pub search: String,
    pub gender: Option<Gender>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
            gender: None,
        }
    }
}

impl PageState {
    /// Derive state from a query string. Anything unparsable falls back to its default.
    pub fn from_query(query: &str) -> Self {
        let page = param(query, PAGE_PARAM)
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let search = param(query, SEARCH_PARAM).unwrap_or_default();
        let gender = param(query, GENDER_PARAM).and_then(|g| g.parse().ok());

        Self {
            page,
            search,
            gender,
        }
    }

    pub fn limit(&self) -> u32 {
        PAGE_LIMIT
    }

    /// Cache key for this state. Only the debounced search participates.
    pub fn query_key(&self, debounced_search: &str) -> QueryKey {
        QueryKey {
            page: self.page,
            search: debounced_search.to_string(),
            gender: self.gender,
        }
    }
}

/// First value of `key` in `query`, decoded.
pub fn param(query: &str, key: &str) -> Option<String> {
    pairs(query)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

/// Set `key` to `value`, replacing the first occurrence in place and dropping
/// duplicates. Changing anything other than the page sends the user back to page 1.
pub fn set_param(query: &str, key: &str, value: &str) -> String {
    let mut pairs = pairs(query);
    upsert(&mut pairs, key, value);
    if key != PAGE_PARAM {
        upsert(&mut pairs, PAGE_PARAM, "1");
    }
    serialize(&pairs)
}

/// Remove `key` entirely and reset to page 1.
pub fn clear_param(query: &str, key: &str) -> String {
    let mut pairs = pairs(query);
    pairs.retain(|(k, _)| k != key);
    if key != PAGE_PARAM {
        upsert(&mut pairs, PAGE_PARAM, "1");
    }
    serialize(&pairs)
}

/// Move to page `page`, leaving every other parameter untouched.
pub fn go_to_page(query: &str, page: u32) -> String {
    set_param(query, PAGE_PARAM, &page.to_string())
}

fn pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn upsert(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(first) => {
            pairs[first].1 = value.to_string();
            let mut index = 0;
            pairs.retain(|(k, _)| {
                let keep = k != key || index == first;
                index += 1;
                keep
            });
        }
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

fn serialize(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
