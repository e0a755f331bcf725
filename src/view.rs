//! Text rendering of the users page: heading, filters, table and pager.

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::query::Snapshot;
use crate::state::PageState;
use crate::types::{User, UsersResponse};

pub const LOADING_MESSAGE: &str = "Loading users...";
pub const EMPTY_MESSAGE: &str = "No users found.";

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "UserName")]
    username: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Eye Color")]
    eye_color: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            gender: user.gender.to_string(),
            email: user.email.clone(),
            eye_color: user.eye_color.clone(),
        }
    }
}

impl UserRow {
    fn empty() -> Self {
        Self {
            username: EMPTY_MESSAGE.to_string(),
            gender: String::new(),
            email: String::new(),
            eye_color: String::new(),
        }
    }
}

/// Number of page links for `total` results at `limit` per page.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

/// Page-link strip state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: u32,
    pub total_pages: u32,
}

impl Pager {
    pub fn new(current: u32, total: u64, limit: u32) -> Self {
        Self {
            current,
            total_pages: total_pages(total, limit),
        }
    }

    pub fn links(&self) -> impl Iterator<Item = u32> {
        1..=self.total_pages
    }

    pub fn prev_enabled(&self) -> bool {
        self.current > 1
    }

    pub fn next_enabled(&self) -> bool {
        self.current < self.total_pages
    }

    pub fn prev(&self) -> Option<u32> {
        self.prev_enabled().then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.next_enabled().then(|| self.current + 1)
    }

    /// `‹ Prev  1  [2]  3  Next ›`; the current page is bracketed and
    /// disabled controls are dimmed when `color` is on.
    pub fn render(&self, color: bool) -> String {
        let control = |label: &str, enabled: bool| {
            if !color {
                label.to_string()
            } else if enabled {
                label.bold().to_string()
            } else {
                label.dimmed().to_string()
            }
        };

        let mut parts = vec![control("‹ Prev", self.prev_enabled())];
        for page in self.links() {
            if page == self.current {
                let label = format!("[{page}]");
                parts.push(if color {
                    label.black().on_white().to_string()
                } else {
                    label
                });
            } else {
                parts.push(page.to_string());
            }
        }
        parts.push(control("Next ›", self.next_enabled()));
        parts.join("  ")
    }
}

/// Render the users table, or a single "no users" row for an empty page.
pub fn users_table(users: &[User]) -> String {
    let rows: Vec<UserRow> = if users.is_empty() {
        vec![UserRow::empty()]
    } else {
        users.iter().map(UserRow::from).collect()
    };
    Table::new(rows).with(Style::rounded()).to_string()
}

fn filters_line(state: &PageState, fetched_at: DateTime<Utc>, color: bool) -> String {
    let search = if state.search.is_empty() {
        "-".to_string()
    } else {
        format!("\"{}\"", state.search)
    };
    let gender = state
        .gender
        .map(|g| g.to_string())
        .unwrap_or_else(|| "any".to_string());
    let updated = fetched_at.with_timezone(&Local).format("%H:%M:%S");
    let line = format!(
        "search: {search}  gender: {gender}  page: {}  updated {updated}",
        state.page
    );
    if color {
        line.bright_black().to_string()
    } else {
        line
    }
}

/// Render the whole page for the given URL state and cache snapshot.
pub fn render_page(state: &PageState, snapshot: Snapshot<'_>, color: bool) -> String {
    let (data, fetched_at): (&UsersResponse, _) = match snapshot {
        Snapshot::Loading => return LOADING_MESSAGE.to_string(),
        Snapshot::Ready {
            data, fetched_at, ..
        } => (data, fetched_at),
    };

    let heading = if color {
        "Users".bold().to_string()
    } else {
        "Users".to_string()
    };
    let pager = Pager::new(state.page, data.total, state.limit());

    let mut out = String::new();
    out.push_str(&heading);
    out.push('\n');
    out.push_str(&filters_line(state, fetched_at, color));
    out.push('\n');
    out.push_str(&users_table(&data.users));
    out.push('\n');
    out.push_str(&pager.render(color));

    if let Snapshot::Ready {
        stale_key: true, ..
    } = snapshot
    {
        out.push('\n');
        let note = "(showing previous results)";
        out.push_str(&if color {
            note.dimmed().to_string()
        } else {
            note.to_string()
        });
    }

    out
}
