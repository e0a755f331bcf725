//! Interactive users page.
//!
//! The session's query string plays the role of the page URL. Each input line
//! is turned into an [`Action`], which rewrites the query string; the page is
//! then re-derived from it and re-rendered. Search text only reaches the
//! request cache after the debounce delay has passed without further typing.

use std::time::Duration;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};

use crate::cli::{BrowseArgs, BROWSE_COMMANDS};
use crate::client::UsersClient;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{Result, UsersError};
use crate::output;
use crate::query::{QueryCache, Snapshot, UsersSource};
use crate::state::{self, PageState, GENDER_PARAM, SEARCH_PARAM};
use crate::types::Gender;
use crate::view::{self, Pager};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Search(String),
    Gender(Option<Gender>),
    Page(u32),
    Next,
    Prev,
    Refresh,
    Back,
    Open(String),
    ShowUrl,
    Help,
    Quit,
    Invalid(String),
}

/// Search text is kept as typed; only the separator after the command word is dropped.
pub fn parse_action(line: &str) -> Action {
    let line = line.trim_start().trim_end_matches(['\r', '\n']);
    if let Some(text) = line.strip_prefix('/') {
        return Action::Search(text.to_string());
    }

    let (command, raw) = match line.split_once(char::is_whitespace) {
        Some((command, raw)) => (command, raw),
        None => (line, ""),
    };
    let rest = raw.trim();

    match command.to_ascii_lowercase().as_str() {
        "s" | "search" => Action::Search(raw.to_string()),
        "g" | "gender" => match rest {
            "" | "any" | "all" => Action::Gender(None),
            value => match value.to_ascii_lowercase().parse() {
                Ok(gender) => Action::Gender(Some(gender)),
                Err(()) => Action::Invalid(format!("unknown gender '{value}'")),
            },
        },
        "p" | "page" => match rest.parse::<u32>() {
            Ok(page) if page >= 1 => Action::Page(page),
            _ => Action::Invalid(format!("'{rest}' is not a page number")),
        },
        "n" | "next" => Action::Next,
        "prev" | "previous" => Action::Prev,
        "r" | "refresh" => Action::Refresh,
        "back" => Action::Back,
        "open" => Action::Open(rest.to_string()),
        "url" => Action::ShowUrl,
        "h" | "help" | "?" => Action::Help,
        "q" | "quit" | "exit" => Action::Quit,
        "" => Action::Help,
        other => Action::Invalid(format!("unknown command '{other}' (try 'help')")),
    }
}

/// What the input loop should do after an action.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

pub struct Session<S> {
    query: String,
    history: Vec<String>,
    search: Debouncer<String>,
    cache: QueryCache<S>,
    color: bool,
}

impl<S: UsersSource> Session<S> {
    pub fn new(query: String, source: S, debounce: Duration, stale_after: Duration) -> Self {
        let initial_search = PageState::from_query(&query).search;
        Self {
            query,
            history: Vec::new(),
            search: Debouncer::new(initial_search, debounce),
            cache: QueryCache::new(source, stale_after),
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> PageState {
        PageState::from_query(&self.query)
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Load whatever the current URL and settled search point at.
    pub async fn load(&mut self) -> String {
        let key = self.page().query_key(self.search.settled());
        self.cache.get(&key).await;
        self.render()
    }

    /// Called when the debounce deadline passes. Returns a fresh render if
    /// the settled search text changed.
    pub async fn settle(&mut self, now: Instant) -> Option<String> {
        let search = self.search.poll(now)?;
        tracing::debug!(%search, "search settled");
        Some(self.load().await)
    }

    pub async fn handle(&mut self, action: Action, now: Instant) -> Flow {
        let next = match action {
            Action::Quit => return Flow::Quit,
            Action::Help => return Flow::Continue(BROWSE_COMMANDS.to_string()),
            Action::ShowUrl => return Flow::Continue(format!("?{}", self.query)),
            Action::Invalid(reason) => return Flow::Continue(reason),
            Action::Refresh => {
                let key = self.page().query_key(self.search.settled());
                self.cache.refetch(&key).await;
                return Flow::Continue(self.render());
            }
            Action::Back => match self.history.pop() {
                Some(previous) => {
                    self.set_query(previous, now);
                    return Flow::Continue(self.load().await);
                }
                None => return Flow::Continue("no earlier page".to_string()),
            },
            Action::Search(text) => state::set_param(&self.query, SEARCH_PARAM, &text),
            Action::Gender(Some(gender)) => {
                state::set_param(&self.query, GENDER_PARAM, gender.as_str())
            }
            Action::Gender(None) => state::clear_param(&self.query, GENDER_PARAM),
            Action::Page(page) => state::go_to_page(&self.query, page),
            Action::Next => match self.pager().and_then(|p| p.next()) {
                Some(page) => state::go_to_page(&self.query, page),
                None => return Flow::Continue("already on the last page".to_string()),
            },
            Action::Prev => match self.pager().and_then(|p| p.prev()) {
                Some(page) => state::go_to_page(&self.query, page),
                None => return Flow::Continue("already on the first page".to_string()),
            },
            Action::Open(query) => query.trim_start_matches('?').to_string(),
        };

        self.navigate(next, now);
        Flow::Continue(self.load().await)
    }

    /// Push a new URL onto the history and make it current.
    fn navigate(&mut self, query: String, now: Instant) {
        if query == self.query {
            return;
        }
        self.history.push(self.query.clone());
        self.set_query(query, now);
    }

    /// Replace the URL. A changed search value restarts the debounce.
    fn set_query(&mut self, query: String, now: Instant) {
        let search = PageState::from_query(&query).search;
        if search != self.page().search {
            self.search.push(search, now);
        }
        self.query = query;
        tracing::debug!(query = %self.query, "navigated");
    }

    fn pager(&self) -> Option<Pager> {
        match self.cache.snapshot() {
            Snapshot::Ready { data, .. } => {
                let page = self.page();
                Some(Pager::new(page.page, data.total, page.limit()))
            }
            Snapshot::Loading => None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = view::render_page(&self.page(), self.cache.snapshot(), self.color);
        if self.cache.last_error().is_some() {
            let notice = "Could not load users. Type 'refresh' to try again.";
            out.push('\n');
            out.push_str(&if self.color {
                notice.yellow().to_string()
            } else {
                notice.to_string()
            });
        }
        out
    }
}

/// The interactive page only renders tables; JSON belongs to `users list`.
pub fn ensure_text_output(json: bool) -> Result<()> {
    if json {
        return Err(UsersError::Unsupported(
            "JSON output is not available for 'browse'; use 'users list --json'".to_string(),
        ));
    }
    Ok(())
}

pub async fn run(client: UsersClient, config: &Config, args: BrowseArgs) -> Result<()> {
    ensure_text_output(output::is_json_output())?;

    let query = args.query.unwrap_or_default();
    let query = query.trim_start_matches('?').to_string();
    let mut session = Session::new(query, client, config.debounce(), config.stale_after())
        .with_color(output::use_color());

    println!("{}", session.load().await);
    output::print_message("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = session.debounce_deadline();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match session.handle(parse_action(&line), Instant::now()).await {
                    Flow::Quit => break,
                    Flow::Continue(text) => println!("{text}"),
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(text) = session.settle(Instant::now()).await {
                    println!("{text}");
                }
            }
        }
    }

    Ok(())
}
