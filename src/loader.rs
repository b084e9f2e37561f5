//! # Bundle Loader
//!
//! Runs once at startup: scans the collection directory for bundle archives
//! and the well-known configuration siblings, loads each bundle's descriptors,
//! and reports what was loaded and what was skipped. One bad bundle never
//! aborts the batch; every skip carries its reason.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::bundle::{BundleArchive, ARCHIVE_EXTENSIONS};
use crate::descriptor::index::{self, IndexEntry};
use crate::descriptor::plugin;
use crate::descriptor::toc::{self, Toc};
use crate::redirect::{parse_redirects, SequenceRules};
use crate::DocshelfError;

/// Extension point naming a bundle's table-of-contents file.
pub const TOC_EXTENSION_POINT: &str = "org.eclipse.help.toc";
/// Extension point naming a bundle's keyword-index file.
pub const INDEX_EXTENSION_POINT: &str = "org.eclipse.help.index";

/// Well-known sibling files in the collection directory.
pub const PERMANENT_REDIRECTS_FILE: &str = "permanent-redirect.properties";
pub const TEMPORARY_REDIRECTS_FILE: &str = "temporary-redirect.properties";
pub const SEQUENCE_FILE: &str = "sequence.lst";

/// The archive entry holding the plugin descriptor.
const PLUGIN_DESCRIPTOR: &str = "plugin.xml";
/// The archive entry holding the bundle manifest.
const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// One successfully loaded documentation bundle.
#[derive(Debug)]
pub struct LoadedBundle {
    /// The bundle's resolution key: the manifest's symbolic name when
    /// present, else the archive file-stem.
    pub key: String,
    /// Always the archive file-stem; needed to reopen the right archive.
    pub archive_key: String,
    pub toc: Toc,
    pub index_entries: Vec<IndexEntry>,
}

/// Everything the startup scan produced.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Bundles in federation (load) order.
    pub bundles: Vec<LoadedBundle>,
    /// `symbolic name -> archive stem`, recorded only where the two differ.
    pub bundle_aliases: HashMap<String, String>,
    /// Permanent (301) redirect table.
    pub redirects: HashMap<String, String>,
    /// Temporary (302) alias table.
    pub aliases: HashMap<String, String>,
    pub sequence: SequenceRules,
    /// `(archive stem, reason)` for every skipped archive.
    pub skipped: Vec<(String, String)>,
}

/// Scans `dir` and loads every recognizable bundle and configuration source.
///
/// Never fails: an unreadable collection directory is logged and yields an
/// empty result, so the service can still start in a degraded state.
pub fn load_collection(dir: &Path) -> LoadResult {
    let mut result = LoadResult::default();

    let mut archives: Vec<PathBuf> = Vec::new();
    let walker = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Cannot enumerate bundle collection");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ARCHIVE_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)) {
            archives.push(path);
        } else {
            load_config_sibling(&path, &mut result);
        }
    }

    for path in archives {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        info!(archive = %path.display(), "Parsing bundle");
        match load_bundle(&path, &stem) {
            Ok(bundle) => {
                if bundle.key != bundle.archive_key {
                    result
                        .bundle_aliases
                        .insert(bundle.key.clone(), bundle.archive_key.clone());
                }
                info!(archive = %path.display(), key = %bundle.key, "Bundle loaded");
                result.bundles.push(bundle);
            }
            Err(reason) => {
                warn!(archive = %path.display(), %reason, "Skipping bundle");
                result.skipped.push((stem, reason.to_string()));
            }
        }
    }

    result
}

fn load_config_sibling(path: &Path, result: &mut LoadResult) {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name != PERMANENT_REDIRECTS_FILE && name != TEMPORARY_REDIRECTS_FILE && name != SEQUENCE_FILE
    {
        return;
    }
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Cannot read configuration source");
            return;
        }
    };
    match name {
        PERMANENT_REDIRECTS_FILE => {
            result.redirects = parse_redirects(&text);
            for (src, dst) in &result.redirects {
                info!(from = %src, to = %dst, "Adding HTTP/301 (permanent) redirect");
            }
        }
        TEMPORARY_REDIRECTS_FILE => {
            result.aliases = parse_redirects(&text);
            for (src, dst) in &result.aliases {
                info!(from = %src, to = %dst, "Adding HTTP/302 (temporary) redirect");
            }
        }
        SEQUENCE_FILE => {
            result.sequence = SequenceRules::parse(&text);
            info!(rules = result.sequence.len(), "Loaded display sequence");
        }
        _ => unreachable!(),
    }
}

/// Loads a single bundle archive, or explains why it must be skipped.
fn load_bundle(path: &Path, stem: &str) -> Result<LoadedBundle, DocshelfError> {
    let mut archive = BundleArchive::open_path(path)?;

    let key = match read_symbolic_name(&mut archive) {
        Some(symbolic) => symbolic,
        None => stem.to_string(),
    };

    if !archive.has_entry(PLUGIN_DESCRIPTOR) {
        return Err(DocshelfError::MalformedDescriptor(format!(
            "does not contain a {} file",
            PLUGIN_DESCRIPTOR
        )));
    }
    let plugin_xml = archive.read_entry_str(PLUGIN_DESCRIPTOR)?;
    let plugin = plugin::parse(&plugin_xml)?;
    for extension in plugin.extensions() {
        debug!(archive = %path.display(), point = %extension.point, "Declared extension point");
    }

    let toc_file = plugin
        .extension(TOC_EXTENSION_POINT)
        .and_then(|e| e.file("toc"))
        .ok_or_else(|| {
            DocshelfError::MalformedDescriptor(format!(
                "does not declare a '{}' extension",
                TOC_EXTENSION_POINT
            ))
        })?
        .to_string();
    let toc_xml = archive.read_entry_str(&toc_file)?;
    let toc = toc::parse(&toc_xml)?;

    // The keyword index is optional, and a bad one only drops keywords.
    let mut index_entries = Vec::new();
    if let Some(index_file) = plugin
        .extension(INDEX_EXTENSION_POINT)
        .and_then(|e| e.file("index"))
        .map(str::to_string)
    {
        match archive
            .read_entry_str(&index_file)
            .and_then(|xml| index::parse(&key, &xml))
        {
            Ok(entries) => index_entries = entries,
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "Dropping keyword index");
            }
        }
    }

    Ok(LoadedBundle { key, archive_key: stem.to_string(), toc, index_entries })
}

/// The manifest's `Bundle-SymbolicName`, with any `;parameters` stripped.
fn read_symbolic_name(archive: &mut BundleArchive) -> Option<String> {
    let manifest = archive.read_entry_str(MANIFEST_ENTRY).ok()?;
    for line in manifest.lines() {
        if let Some(rest) = line.strip_prefix("Bundle-SymbolicName:") {
            let mut value = rest.trim();
            if let Some(semi) = value.find(';') {
                value = value[..semi].trim();
            }
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use zip::write::FileOptions;

    struct BundleSpec<'a> {
        stem: &'a str,
        symbolic_name: Option<&'a str>,
        toc_xml: Option<&'a str>,
        index_xml: Option<&'a str>,
        pages: &'a [(&'a str, &'a str)],
    }

    fn write_bundle(dir: &Path, spec: &BundleSpec<'_>) {
        let file = File::create(dir.join(format!("{}.jar", spec.stem))).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let opts = FileOptions::default();
        if let Some(name) = spec.symbolic_name {
            writer.start_file(MANIFEST_ENTRY, opts).unwrap();
            write!(writer, "Manifest-Version: 1.0\nBundle-SymbolicName: {}\n", name).unwrap();
        }
        if let Some(toc) = spec.toc_xml {
            let mut plugin = String::from("<plugin><extension point=\"org.eclipse.help.toc\"><toc file=\"toc.xml\"/></extension>");
            if spec.index_xml.is_some() {
                plugin.push_str("<extension point=\"org.eclipse.help.index\"><index file=\"index.xml\"/></extension>");
            }
            plugin.push_str("</plugin>");
            writer.start_file("plugin.xml", opts).unwrap();
            writer.write_all(plugin.as_bytes()).unwrap();
            writer.start_file("toc.xml", opts).unwrap();
            writer.write_all(toc.as_bytes()).unwrap();
        }
        if let Some(index) = spec.index_xml {
            writer.start_file("index.xml", opts).unwrap();
            writer.write_all(index.as_bytes()).unwrap();
        }
        for (name, body) in spec.pages {
            writer.start_file(*name, opts).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    const GUIDE_TOC: &str = r#"<toc label="Guide"><topic label="Intro" href="intro.html"/></toc>"#;

    #[test]
    fn loads_bundles_with_symbolic_aliases() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), &BundleSpec {
            stem: "guide-1.0",
            symbolic_name: Some("com.example.guide;singleton:=true"),
            toc_xml: Some(GUIDE_TOC),
            index_xml: None,
            pages: &[("intro.html", "<html><body>intro</body></html>")],
        });

        let result = load_collection(dir.path());
        assert_eq!(result.bundles.len(), 1);
        let bundle = &result.bundles[0];
        assert_eq!(bundle.key, "com.example.guide");
        assert_eq!(bundle.archive_key, "guide-1.0");
        assert_eq!(
            result.bundle_aliases.get("com.example.guide").map(String::as_str),
            Some("guide-1.0")
        );
    }

    #[test]
    fn bad_bundles_are_skipped_with_reasons() {
        let dir = tempfile::tempdir().unwrap();
        // No plugin.xml at all.
        write_bundle(dir.path(), &BundleSpec {
            stem: "bare",
            symbolic_name: None,
            toc_xml: None,
            index_xml: None,
            pages: &[("readme.txt", "no descriptors here")],
        });
        // Malformed TOC.
        write_bundle(dir.path(), &BundleSpec {
            stem: "broken",
            symbolic_name: None,
            toc_xml: Some("<nottoc/>"),
            index_xml: None,
            pages: &[],
        });
        // A good one alongside, proving batch isolation.
        write_bundle(dir.path(), &BundleSpec {
            stem: "guide-1.0",
            symbolic_name: None,
            toc_xml: Some(GUIDE_TOC),
            index_xml: None,
            pages: &[],
        });
        // Not an archive at all.
        std::fs::write(dir.path().join("junk.jar"), b"not a zip").unwrap();

        let result = load_collection(dir.path());
        assert_eq!(result.bundles.len(), 1);
        assert_eq!(result.bundles[0].key, "guide-1.0");
        assert_eq!(result.skipped.len(), 3);
        let skipped: Vec<&str> = result.skipped.iter().map(|(k, _)| k.as_str()).collect();
        assert!(skipped.contains(&"bare"));
        assert!(skipped.contains(&"broken"));
        assert!(skipped.contains(&"junk"));
    }

    #[test]
    fn bad_keyword_index_only_drops_keywords() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), &BundleSpec {
            stem: "guide-1.0",
            symbolic_name: None,
            toc_xml: Some(GUIDE_TOC),
            index_xml: Some("<wrongroot/>"),
            pages: &[],
        });

        let result = load_collection(dir.path());
        assert_eq!(result.bundles.len(), 1);
        assert!(result.bundles[0].index_entries.is_empty());
    }

    #[test]
    fn config_siblings_are_recognized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PERMANENT_REDIRECTS_FILE), "/old/=/new/\n").unwrap();
        std::fs::write(dir.path().join(TEMPORARY_REDIRECTS_FILE), "beta=guide\n").unwrap();
        std::fs::write(dir.path().join(SEQUENCE_FILE), "^guide.*\n").unwrap();

        let result = load_collection(dir.path());
        assert_eq!(result.redirects.get("old").map(String::as_str), Some("new"));
        assert_eq!(result.aliases.get("beta").map(String::as_str), Some("guide"));
        assert_eq!(result.sequence.order_of("guide-1.0"), 0);
    }

    #[test]
    fn missing_collection_yields_empty_result() {
        let result = load_collection(Path::new("/nonexistent/bundles"));
        assert!(result.bundles.is_empty());
        assert!(result.redirects.is_empty());
    }
}
