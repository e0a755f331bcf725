use std::time::Duration;

use crate::cli::ListArgs;
use crate::client::UsersClient;
use crate::error::Result;
use crate::output;
use crate::query::{QueryCache, Snapshot};
use crate::state::{self, PageState, GENDER_PARAM, SEARCH_PARAM};
use crate::view;

/// Apply command-line flags on top of a starting query string, the same way
/// the page applies user input: filters first (each resets the page), then the page.
pub fn query_from_args(args: &ListArgs) -> String {
    let mut query = args.query.clone().unwrap_or_default();

    if let Some(search) = &args.search {
        query = state::set_param(&query, SEARCH_PARAM, search);
    }
    if let Some(gender) = args.gender {
        query = state::set_param(&query, GENDER_PARAM, gender.as_str());
    }
    if let Some(page) = args.page {
        query = state::go_to_page(&query, page);
    }

    query
}

pub async fn run(client: UsersClient, args: ListArgs) -> Result<()> {
    let query = query_from_args(&args);
    let page = PageState::from_query(&query);
    tracing::debug!(%query, ?page, "rendering users page");

    // A one-shot render has no typing to debounce, so the raw search is the key.
    let key = page.query_key(&page.search);
    let mut cache = QueryCache::new(client, Duration::ZERO);
    cache.get(&key).await;

    if let Some(e) = cache.take_error() {
        return Err(e);
    }

    match cache.snapshot() {
        snapshot @ Snapshot::Ready { data, .. } => {
            output::print_item(data, |_| {
                view::render_page(&page, snapshot, output::use_color())
            });
        }
        Snapshot::Loading => output::print_message(view::LOADING_MESSAGE),
    }

    Ok(())
}
