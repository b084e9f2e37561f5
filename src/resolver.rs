//! # Path Resolver
//!
//! Maps an incoming logical path to a redirect instruction, a resolved
//! archive entry, or not-found, against the frozen [`Registry`].
//!
//! The walk tries every `/`-delimited prefix of the path as a candidate
//! bundle key, shortest first, and checks redirects on each candidate rather
//! than only the first, so one rule registered on an early segment can
//! short-circuit a whole family of deep links. Precedence within a
//! candidate: permanent redirect, then temporary redirect, then bundle-alias
//! substitution plus archive-entry lookup. Archive failures mean "this
//! candidate failed" and the walk continues.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::bundle::{self, BundleArchive};
use crate::redirect::trim_slashes;
use crate::registry::Registry;

/// Marker some bundles use for links relative to the mount root.
pub const PLUGINS_ROOT: &str = "/PLUGINS_ROOT/";

/// Strips everything up to and including a `PLUGINS_ROOT` marker, keeping the
/// trailing slash so the remainder is still an absolute logical path.
pub fn strip_plugins_root(path: &str) -> &str {
    match path.find(PLUGINS_ROOT) {
        Some(pos) => &path[pos + PLUGINS_ROOT.len() - 1..],
        None => path,
    }
}

/// The resolution output contract consumed by the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Resolution {
    /// 301 semantics.
    MovedPermanently { location: String },
    /// 302 semantics.
    MovedTemporarily { location: String },
    /// The path names an entry in a loaded bundle's archive.
    Ok {
        archive_key: String,
        file_name: String,
        /// Content-type hint derived from the file extension.
        content_type: String,
        last_modified: Option<NaiveDateTime>,
    },
    NotFound,
}

/// Resolves `path` (mount-prefix marker already stripped; see
/// [`strip_plugins_root`]) against the registry.
pub fn resolve(registry: &Registry, path: &str) -> Resolution {
    for (index, _) in path.match_indices('/') {
        if index == 0 {
            // there is no bundle with an empty name
            continue;
        }
        let key = trim_leading_slash(&path[..index]);
        if key.is_empty() {
            continue;
        }

        if let Some(target) = registry.redirect(key) {
            return Resolution::MovedPermanently {
                location: format!("/{}{}", trim_slashes(target), &path[index..]),
            };
        }
        if let Some(target) = registry.alias(key) {
            return Resolution::MovedTemporarily {
                location: format!("/{}{}", trim_slashes(target), &path[index..]),
            };
        }

        let archive_key = registry.archive_key(key);
        let end_of_file_name = path[index..].find('#').map(|p| index + p).unwrap_or(path.len());
        let file_name = &path[index + 1..end_of_file_name];
        if file_name.is_empty() {
            continue;
        }

        // Open per candidate and drop on every exit path; failures just move
        // the walk to the next candidate.
        let Ok(mut archive) = BundleArchive::open(registry.bundle_dir(), archive_key) else {
            continue;
        };
        let Ok(info) = archive.entry_info(file_name) else {
            continue;
        };
        return Resolution::Ok {
            archive_key: archive_key.to_string(),
            file_name: file_name.to_string(),
            content_type: bundle::mime_type(file_name).to_string(),
            last_modified: info.last_modified,
        };
    }
    Resolution::NotFound
}

/// Last-modified time of the entry a path resolves to, if it resolves at all.
/// Redirects report nothing; the boundary answers them without a body.
pub fn last_modified(registry: &Registry, path: &str) -> Option<NaiveDateTime> {
    match resolve(registry, path) {
        Resolution::Ok { last_modified, .. } => last_modified,
        _ => None,
    }
}

fn trim_leading_slash(segment: &str) -> &str {
    segment.strip_prefix('/').unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_mount_marker() {
        assert_eq!(
            strip_plugins_root("/docs/PLUGINS_ROOT/guide/intro.html"),
            "/guide/intro.html"
        );
        assert_eq!(strip_plugins_root("/guide/intro.html"), "/guide/intro.html");
    }

    #[test]
    fn resolution_serializes_with_status_tags() {
        let json = serde_json::to_value(Resolution::MovedPermanently {
            location: "/guide/intro.html".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "moved-permanently");
        assert_eq!(json["location"], "/guide/intro.html");

        let json = serde_json::to_value(Resolution::NotFound).unwrap();
        assert_eq!(json["status"], "not-found");
    }
}
