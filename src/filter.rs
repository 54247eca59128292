//! Source filter panel state.
//!
//! Three independent per-source checkboxes plus a derived "all" box that is
//! checked exactly when the other three are. Filtering never reorders results.

use crate::models::{SearchResult, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFilter {
    opensearch: bool,
    mediawiki: bool,
    mock: bool,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::all_checked()
    }
}

impl SourceFilter {
    pub fn all_checked() -> Self {
        Self {
            opensearch: true,
            mediawiki: true,
            mock: true,
        }
    }

    pub fn none_checked() -> Self {
        Self {
            opensearch: false,
            mediawiki: false,
            mock: false,
        }
    }

    /// Builds a filter with only the given sources checked.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a Source>) -> Self {
        let mut filter = Self::none_checked();
        for source in sources {
            filter.set(source, true);
        }
        filter
    }

    /// State of the derived "all sources" checkbox.
    pub fn is_all(&self) -> bool {
        self.opensearch && self.mediawiki && self.mock
    }

    /// Toggling "all" forces every per-source checkbox to the same state.
    pub fn set_all(&mut self, checked: bool) {
        self.opensearch = checked;
        self.mediawiki = checked;
        self.mock = checked;
    }

    /// Sets one per-source checkbox. Returns `false` for sources the panel has
    /// no checkbox for.
    pub fn set(&mut self, source: &Source, checked: bool) -> bool {
        match source {
            Source::OpenSearch => self.opensearch = checked,
            Source::MediaWiki => self.mediawiki = checked,
            Source::Mock => self.mock = checked,
            Source::Unknown(_) => return false,
        }
        true
    }

    /// Whether results from `source` are shown. Sources without a checkbox are
    /// always shown.
    pub fn is_checked(&self, source: &Source) -> bool {
        match source {
            Source::OpenSearch => self.opensearch,
            Source::MediaWiki => self.mediawiki,
            Source::Mock => self.mock,
            Source::Unknown(_) => true,
        }
    }

    /// Checked sources in panel order, as sent with a search request.
    pub fn checked_sources(&self) -> Vec<Source> {
        Source::KNOWN
            .into_iter()
            .filter(|s| self.is_checked(s))
            .collect()
    }

    pub fn allows(&self, result: &SearchResult) -> bool {
        self.is_checked(&result.source)
    }

    pub fn apply<'a>(&self, results: &'a [SearchResult]) -> Vec<&'a SearchResult> {
        results.iter().filter(|r| self.allows(r)).collect()
    }
}
