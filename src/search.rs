//! # Full-Text Search
//!
//! Builds an in-RAM tantivy index over every loaded bundle's pages at startup
//! and answers free-text queries against it afterwards. The index is
//! write-once: it is committed at the end of the build and never touched
//! again, so concurrent readers need no locking.
//!
//! Indexing walks each bundle's TOC tree iteratively (an explicit stack of
//! sibling iterators, so arbitrarily deep trees cannot overflow the call
//! stack) in document order. The first DFS visit of a page wins: later TOC
//! references to the same fragment-stripped file are not re-indexed.

use std::collections::HashSet;
use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, TantivyDocument};
use tracing::{debug, info, warn};

use crate::bundle::BundleArchive;
use crate::descriptor::toc::TocEntry;
use crate::html;
use crate::loader::LoadedBundle;
use crate::DocshelfError;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// One search result: the page title and its federated href
/// (`bundle key + "/" + page href`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
}

/// The frozen full-text index over all loaded bundles.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    title: Field,
    href: Field,
    contents: Field,
}

impl SearchIndex {
    /// Indexes every bundle's pages and freezes the result.
    ///
    /// A bundle whose archive cannot be reopened is skipped with a warning;
    /// a structural index failure (writer or commit) aborts the build, which
    /// the caller degrades to "search unavailable".
    pub fn build(dir: &Path, bundles: &[LoadedBundle]) -> Result<SearchIndex, DocshelfError> {
        let mut schema_builder = Schema::builder();
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let href = schema_builder.add_text_field("href", STORED);
        let contents = schema_builder.add_text_field("contents", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let mut writer = index.writer(WRITER_HEAP_BYTES)?;

        for bundle in bundles {
            let mut archive = match BundleArchive::open(dir, &bundle.archive_key) {
                Ok(a) => a,
                Err(e) => {
                    warn!(bundle = %bundle.key, error = %e, "Cannot reopen archive for indexing");
                    continue;
                }
            };
            let pages = index_bundle(&mut writer, (title, href, contents), bundle, &mut archive)?;
            info!(bundle = %bundle.key, pages, "Indexed bundle content");
        }

        writer.commit()?;
        let reader = index.reader()?;
        Ok(SearchIndex { index, reader, title, href, contents })
    }

    /// Runs a free-text query and returns up to `limit` hits in relevance
    /// order. Query-syntax and retrieval problems degrade to empty results.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        let parser = QueryParser::for_index(&self.index, vec![self.contents, self.title]);
        let query = match parser.parse_query(query) {
            Ok(q) => q,
            Err(e) => {
                debug!(error = %e, "Unparseable search query");
                return Vec::new();
            }
        };

        let searcher = self.reader.searcher();
        let top_docs = match searcher.search(&query, &TopDocs::with_limit(limit)) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "Search failed");
                return Vec::new();
            }
        };

        let mut hits = Vec::with_capacity(top_docs.len());
        for (_score, addr) in top_docs {
            let Ok(stored) = searcher.doc::<TantivyDocument>(addr) else { continue };
            let title = stored
                .get_first(self.title)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let href = stored
                .get_first(self.href)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            hits.push(SearchHit { title, href });
        }
        hits
    }

    /// The number of indexed pages.
    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Walks one bundle's TOC and adds a document per unique page.
fn index_bundle(
    writer: &mut tantivy::IndexWriter,
    (title, href, contents): (Field, Field, Field),
    bundle: &LoadedBundle,
    archive: &mut BundleArchive,
) -> Result<usize, DocshelfError> {
    let mut indexed_files: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    let root = std::slice::from_ref(&bundle.toc.root);
    let mut stack: Vec<std::slice::Iter<'_, TocEntry>> = vec![root.iter()];
    while let Some(mut current) = stack.pop() {
        let Some(entry) = current.next() else { continue };
        stack.push(current);
        if !entry.children.is_empty() {
            stack.push(entry.children.iter());
        }

        let Some(entry_href) = entry.href.as_deref() else { continue };
        if entry_href.is_empty() {
            continue;
        }
        let file = match entry_href.find('#') {
            Some(hash) => &entry_href[..hash],
            None => entry_href,
        };
        if !indexed_files.insert(file.to_string()) {
            // already indexed via an earlier TOC reference
            continue;
        }

        let page = match archive.read_entry(file) {
            Ok(bytes) => bytes,
            Err(_) => {
                debug!(bundle = %bundle.key, file, "TOC references a missing page");
                continue;
            }
        };
        let text = html::extract_text(&String::from_utf8_lossy(&page));
        writer.add_document(doc!(
            title => entry.label.as_str(),
            href => format!("{}/{}", bundle.key, entry_href),
            contents => text,
        ))?;
        pages += 1;
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::toc::{self, Toc};
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::FileOptions;

    fn write_archive(dir: &Path, stem: &str, pages: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(format!("{}.jar", stem));
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in pages {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn bundle(key: &str, archive_key: &str, toc: Toc) -> LoadedBundle {
        LoadedBundle {
            key: key.to_string(),
            archive_key: archive_key.to_string(),
            toc,
            index_entries: Vec::new(),
        }
    }

    #[test]
    fn indexes_pages_and_finds_them() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "guide-1.0", &[
            ("intro.html", "<html><body>A gentle introduction to widgets.</body></html>"),
            ("faq.html", "<html><body>Frequently asked questions about sprockets.</body></html>"),
        ]);
        let toc = toc::parse(
            r#"<toc label="Guide">
                <topic label="Intro" href="intro.html"/>
                <topic label="FAQ" href="faq.html"/>
            </toc>"#,
        )
        .unwrap();
        let bundles = vec![bundle("guide", "guide-1.0", toc)];

        let index = SearchIndex::build(dir.path(), &bundles).unwrap();
        assert_eq!(index.doc_count(), 2);

        let hits = index.search("sprockets", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "FAQ");
        assert_eq!(hits[0].href, "guide/faq.html");
    }

    #[test]
    fn duplicate_toc_references_index_once() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "guide-1.0", &[(
            "faq.html",
            "<html><body>answers about sprockets</body></html>",
        )]);
        // faq.html appears twice, once via a fragment reference.
        let toc = toc::parse(
            r#"<toc label="Guide">
                <topic label="FAQ" href="faq.html"/>
                <topic label="Section Two" href="faq.html#section2"/>
            </toc>"#,
        )
        .unwrap();
        let bundles = vec![bundle("guide", "guide-1.0", toc)];

        let index = SearchIndex::build(dir.path(), &bundles).unwrap();
        assert_eq!(index.doc_count(), 1);

        // First DFS visit is authoritative for the stored document.
        let hits = index.search("sprockets", 10);
        assert_eq!(hits[0].title, "FAQ");
        assert_eq!(hits[0].href, "guide/faq.html");
    }

    #[test]
    fn deep_trees_and_missing_pages_are_handled() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "deep-1.0", &[(
            "leaf.html",
            "<html><body>buried treasure</body></html>",
        )]);
        // A 200-level chain of grouping nodes ending in one real page.
        let mut entry = TocEntry {
            label: "Leaf".into(),
            href: Some("leaf.html".into()),
            children: Vec::new(),
        };
        for i in 0..200 {
            entry = TocEntry {
                label: format!("Level {}", i),
                href: Some("missing.html".into()),
                children: vec![entry],
            };
        }
        let toc = Toc { root: TocEntry { label: "Deep".into(), href: None, children: vec![entry] } };
        let bundles = vec![bundle("deep", "deep-1.0", toc)];

        let index = SearchIndex::build(dir.path(), &bundles).unwrap();
        assert_eq!(index.doc_count(), 1);
        assert_eq!(index.search("treasure", 5)[0].href, "deep/leaf.html");
    }

    #[test]
    fn unopenable_archive_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let toc = toc::parse(r#"<toc label="G"><topic label="A" href="a.html"/></toc>"#).unwrap();
        let bundles = vec![bundle("ghost", "ghost-1.0", toc)];
        let index = SearchIndex::build(dir.path(), &bundles).unwrap();
        assert_eq!(index.doc_count(), 0);
        assert!(index.search("anything", 10).is_empty());
    }

    #[test]
    fn empty_and_garbage_queries_return_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = SearchIndex::build(dir.path(), &[]).unwrap();
        assert!(index.search("", 10).is_empty());
        assert!(index.search("   ", 10).is_empty());
        assert!(index.search("title:\"unbalanced", 10).is_empty());
        assert!(index.search("anything", 0).is_empty());
    }
}
