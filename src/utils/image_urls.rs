use std::fmt;

/// Replaces a stale asset host (e.g. `localhost:5000`) with the one currently serving uploads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostRewrite {
    from: String,
    to: String,
}

impl HostRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parse the `from=to` form used by `PORTFOLIO_ASSET_HOST_REWRITE`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (from, to) = raw.split_once('=')?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return None;
        }
        Some(Self::new(from, to))
    }

    pub fn apply(&self, url: &str) -> String {
        if url.contains(&self.from) {
            url.replacen(&self.from, &self.to, 1)
        } else {
            url.to_string()
        }
    }
}

/// Normalize an image URL as received from the backend.
pub fn fix_image_url(url: &str, rewrite: Option<&HostRewrite>) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    match rewrite {
        Some(rewrite) => rewrite.apply(url),
        None => url.to_string(),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaceholderKind {
    Project,
    Certificate,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderKind::Project => write!(f, "project"),
            PlaceholderKind::Certificate => write!(f, "certificate"),
        }
    }
}

pub fn placeholder_image(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Certificate => "https://via.placeholder.com/400x300?text=Certificate",
        PlaceholderKind::Project => "https://via.placeholder.com/400x300?text=Project+Image",
    }
}
