//! # Bundle Registry
//!
//! The immutable post-startup snapshot of everything the loader, the redirect
//! builder and the indexer produced. Built once by [`Registry::build`] and
//! then only read, so it can be shared freely across concurrent request
//! handlers without locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::descriptor::index::IndexEntry;
use crate::descriptor::toc::Toc;
use crate::loader::{self, LoadResult};
use crate::redirect::SequenceRules;
use crate::search::{SearchHit, SearchIndex};

/// A keyword match from the federated topic lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMatch {
    pub bundle_key: String,
    pub href: String,
}

/// The frozen aggregate root. No entity behind it is mutated after startup.
pub struct Registry {
    dir: PathBuf,
    config: Config,
    /// `symbolic name -> archive stem`, where the two differ.
    bundles: HashMap<String, String>,
    /// Permanent (301) redirects.
    redirects: HashMap<String, String>,
    /// Temporary (302) redirects.
    aliases: HashMap<String, String>,
    /// Federated contents in load order.
    contents: Vec<(String, Toc)>,
    /// Federated keyword index in load order.
    keywords: Vec<IndexEntry>,
    sequence: SequenceRules,
    /// `None` when the index build failed; search degrades to empty results.
    search: Option<SearchIndex>,
}

impl Registry {
    /// Runs the whole startup phase against a collection directory and
    /// freezes the result. Never fails: individual bundle failures are
    /// skipped, and a failed index build only disables search.
    pub fn build(dir: impl Into<PathBuf>, config: Config) -> Registry {
        let dir = dir.into();
        let result = loader::load_collection(&dir);

        let search = match SearchIndex::build(&dir, &result.bundles) {
            Ok(index) => {
                info!(pages = index.doc_count(), "Search index ready");
                Some(index)
            }
            Err(e) => {
                warn!(error = %e, "Cannot create search index. Search will be unavailable.");
                None
            }
        };

        Self::from_parts(dir, config, result, search)
    }

    pub(crate) fn from_parts(
        dir: PathBuf,
        config: Config,
        result: LoadResult,
        search: Option<SearchIndex>,
    ) -> Registry {
        let mut contents = Vec::with_capacity(result.bundles.len());
        let mut keywords = Vec::new();
        for bundle in result.bundles {
            keywords.extend(bundle.index_entries);
            contents.push((bundle.key, bundle.toc));
        }
        info!(bundles = contents.len(), skipped = result.skipped.len(), "Registry frozen");
        Registry {
            dir,
            config,
            bundles: result.bundle_aliases,
            redirects: result.redirects,
            aliases: result.aliases,
            contents,
            keywords,
            sequence: result.sequence,
            search,
        }
    }

    /// The collection directory bundles are opened from at request time.
    pub fn bundle_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Federated tables of contents in load order.
    pub fn contents(&self) -> impl Iterator<Item = (&str, &Toc)> {
        self.contents.iter().map(|(key, toc)| (key.as_str(), toc))
    }

    /// The TOC loaded under `key`, if any.
    pub fn toc(&self, key: &str) -> Option<&Toc> {
        self.contents
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, toc)| toc)
    }

    pub fn bundle_count(&self) -> usize {
        self.contents.len()
    }

    /// Maps a symbolic bundle name to its archive stem; keys that are
    /// already archive stems map to themselves.
    pub fn archive_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.bundles.get(key).map(String::as_str).unwrap_or(key)
    }

    /// The permanent-redirect target registered for this path segment.
    pub fn redirect(&self, key: &str) -> Option<&str> {
        self.redirects.get(key).map(String::as_str)
    }

    /// The temporary-redirect target registered for this path segment.
    pub fn alias(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    /// Whether full-text search is available.
    pub fn search_available(&self) -> bool {
        self.search.is_some()
    }

    /// Free-text search across all bundles. An unavailable or empty index
    /// yields empty results, never an error.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        match &self.search {
            Some(index) => index.search(query, limit),
            None => Vec::new(),
        }
    }

    /// The first keyword entry matching `keyword` across all bundles in
    /// federation order, depth-first within each bundle's entries.
    pub fn find_topic(&self, keyword: &str) -> Option<TopicMatch> {
        find_in_entries(&self.keywords, keyword)
    }

    /// Display rank of a bundle key per the sequence rules.
    pub fn sequence_order(&self, key: &str) -> usize {
        self.sequence.order_of(key)
    }
}

fn find_in_entries(entries: &[IndexEntry], keyword: &str) -> Option<TopicMatch> {
    for entry in entries {
        if entry.keyword == keyword {
            if let Some(href) = &entry.target_href {
                return Some(TopicMatch {
                    bundle_key: entry.bundle_key.clone(),
                    href: href.clone(),
                });
            }
        }
        if let Some(found) = find_in_entries(&entry.children, keyword) {
            return Some(found);
        }
    }
    None
}
