use serde::{Deserialize, Serialize};

/// Id carried by records that are not bound to a live browser tab yet,
/// including closed-history entries surfaced as search candidates.
pub const UNBOUND_TAB_ID: i64 = -1;

const UNTITLED_DISPLAY: &str = "No title";

/// One browser tab's identity and display metadata.
///
/// `title` is stored raw and may be empty; the "No title" fallback is applied
/// only by [`TabRecord::display_title`]. `host` is the bare hostname, empty when
/// the tab has no navigable URL yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabRecord {
    pub id: i64,
    pub title: String,
    pub host: String,
    #[serde(skip)]
    pub render_index: usize,
}

impl TabRecord {
    pub fn new(id: i64, title: &str, host: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            host: host.to_string(),
            render_index: 0,
        }
    }

    pub fn unbound(title: &str, host: &str) -> Self {
        Self::new(UNBOUND_TAB_ID, title, host)
    }

    pub fn is_bound(&self) -> bool {
        self.id != UNBOUND_TAB_ID
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED_DISPLAY
        } else {
            &self.title
        }
    }
}

/// A page that was visited and later closed, kept across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTab {
    pub url: String,
    pub title: String,
    pub host: String,
    pub times_revisited: u32,
    pub times_opened_as_new_tab: u32,
    pub last_closed_epoch_secs: i64,
}

impl ClosedTab {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            host: host_from_url(url),
            times_revisited: 0,
            times_opened_as_new_tab: 0,
            last_closed_epoch_secs: 0,
        }
    }

    pub fn to_record(&self) -> TabRecord {
        TabRecord::unbound(&self.title, &self.host)
    }
}

/// Extracts the bare hostname from a URL.
///
/// Scheme, userinfo, port, path, query and fragment are dropped. Anything
/// without a `scheme://` prefix, such as `about:blank`, has no host and
/// yields an empty string.
pub fn host_from_url(url: &str) -> String {
    let Some(start) = url.find("://") else {
        return String::new();
    };
    let after_scheme = &url[start + 3..];
    let authority_end = after_scheme
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after_scheme.len());
    let authority = &after_scheme[..authority_end];
    let host_and_port = match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    };

    if let Some(bracketed) = host_and_port.strip_prefix('[') {
        return bracketed
            .split(']')
            .next()
            .unwrap_or_default()
            .to_string();
    }

    host_and_port
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string()
}
