//! Query/source pairing inside a leaf test directory.
//!
//! A test directory holds one or more program sources plus query files.
//! When the directory has a single source, every query runs against it;
//! otherwise each query is matched to the source whose name is derived
//! from its own by suffix substitution.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Maps a query file suffix to the suffix of its source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixSubstitution {
    pub query: String,
    pub source: String,
}

impl SuffixSubstitution {
    fn new(query: &str, source: &str) -> Self {
        Self {
            query: query.to_string(),
            source: source.to_string(),
        }
    }
}

/// File naming conventions of a fixture tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingRules {
    /// A file ending in one of these is a source candidate.
    pub source_suffixes: Vec<String>,

    /// A file ending in one of these is a query candidate.
    pub query_suffixes: Vec<String>,

    /// Generic text files are query candidates unless they carry a source suffix.
    pub text_suffix: String,

    /// Sources whose file name contains this marker are auxiliary and excluded.
    /// Empty disables the exclusion.
    pub excluded_marker: String,

    /// Tried in order when a directory holds more than one source.
    pub substitutions: Vec<SuffixSubstitution>,
}

impl Default for PairingRules {
    fn default() -> Self {
        Self {
            source_suffixes: vec![".simple".to_string(), "_source.txt".to_string()],
            query_suffixes: vec!["_queries.txt".to_string(), ".query".to_string()],
            text_suffix: ".txt".to_string(),
            excluded_marker: "numbered".to_string(),
            substitutions: vec![
                SuffixSubstitution::new("_queries.txt", "_source.txt"),
                SuffixSubstitution::new(".query", ".simple"),
            ],
        }
    }
}

impl PairingRules {
    fn has_source_suffix(&self, name: &str) -> bool {
        self.source_suffixes
            .iter()
            .any(|s| !s.is_empty() && name.ends_with(s.as_str()))
    }

    /// Whether `name` is a source candidate.
    pub fn is_source(&self, name: &str) -> bool {
        let excluded =
            !self.excluded_marker.is_empty() && name.contains(self.excluded_marker.as_str());
        self.has_source_suffix(name) && !excluded
    }

    /// Whether `name` is a query candidate.
    pub fn is_query(&self, name: &str) -> bool {
        let by_suffix = self
            .query_suffixes
            .iter()
            .any(|s| !s.is_empty() && name.ends_with(s.as_str()));
        let by_text = !self.text_suffix.is_empty()
            && name.ends_with(self.text_suffix.as_str())
            && !self.has_source_suffix(name);
        by_suffix || by_text
    }

    /// Source file name expected for a query file, by the first matching substitution.
    pub fn derived_source(&self, query: &str) -> Option<String> {
        self.substitutions.iter().find_map(|sub| {
            query
                .strip_suffix(sub.query.as_str())
                .map(|stem| format!("{}{}", stem, sub.source))
        })
    }
}

/// One (source, query) combination submitted to the autotester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPair {
    pub source: PathBuf,
    pub query: PathBuf,
}

/// Outcome of pairing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Source candidates, sorted by name.
    pub sources: Vec<PathBuf>,
    /// Resolved pairs, in query name order.
    pub pairs: Vec<TestPair>,
    /// Query candidates no source could be found for.
    pub unpaired: Vec<PathBuf>,
}

impl Resolution {
    /// A directory without sources is not a test directory.
    pub fn is_test_directory(&self) -> bool {
        !self.sources.is_empty()
    }

    /// One message per query that will not be run.
    pub fn diagnostics(&self) -> Vec<String> {
        self.unpaired
            .iter()
            .map(|query| {
                format!(
                    "could not find source for '{}', skipping",
                    query.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
                )
            })
            .collect()
    }
}

/// Pair the files named `names` that live in `dir`.
///
/// Pure: nothing is read from disk. `names` is processed in the given order.
pub fn resolve_names(dir: &Path, names: &[String], rules: &PairingRules) -> Resolution {
    let sources: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| rules.is_source(n))
        .collect();

    let mut resolution = Resolution {
        sources: sources.iter().map(|n| dir.join(n)).collect(),
        ..Resolution::default()
    };
    if sources.is_empty() {
        return resolution;
    }

    for query in names.iter().filter(|n| rules.is_query(n)) {
        let source = match sources.as_slice() {
            [only] => Some(*only),
            _ => rules
                .derived_source(query)
                .and_then(|wanted| sources.iter().copied().find(|s| *s == wanted)),
        };

        match source {
            Some(source) => resolution.pairs.push(TestPair {
                source: dir.join(source),
                query: dir.join(query),
            }),
            None => resolution.unpaired.push(dir.join(query)),
        }
    }

    resolution
}

/// Regular files directly inside `dir`, sorted by name.
fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => debug!(?name, "ignoring file with non-UTF-8 name"),
        }
    }
    names.sort();
    Ok(names)
}

/// Pair every query file in `dir` with its source.
pub fn resolve(dir: &Path, rules: &PairingRules) -> io::Result<Resolution> {
    let names = file_names(dir)?;
    let resolution = resolve_names(dir, &names, rules);

    if !resolution.is_test_directory() {
        info!("no sources in '{}', skipping", dir.display());
        return Ok(resolution);
    }

    for message in resolution.diagnostics() {
        warn!(dir = %dir.display(), "{}", message);
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn resolve_in_t(list: &[&str]) -> Resolution {
        resolve_names(Path::new("t"), &names(list), &PairingRules::default())
    }

    #[test]
    fn test_source_candidates() {
        let rules = PairingRules::default();
        assert!(rules.is_source("prog.simple"));
        assert!(rules.is_source("calls_source.txt"));
        assert!(!rules.is_source("prog_numbered.simple"));
        assert!(!rules.is_source("calls_numbered_source.txt"));
        assert!(!rules.is_source("calls_queries.txt"));
    }

    #[test]
    fn test_query_candidates() {
        let rules = PairingRules::default();
        assert!(rules.is_query("calls_queries.txt"));
        assert!(rules.is_query("next.query"));
        assert!(rules.is_query("notes.txt"));
        assert!(!rules.is_query("calls_source.txt"));
        assert!(!rules.is_query("calls_numbered_source.txt"));
        assert!(!rules.is_query("prog.simple"));
        assert!(!rules.is_query("output-calls_queries.xml"));
    }

    #[test]
    fn test_derived_source() {
        let rules = PairingRules::default();
        assert_eq!(
            rules.derived_source("calls_queries.txt").as_deref(),
            Some("calls_source.txt")
        );
        assert_eq!(rules.derived_source("next.query").as_deref(), Some("next.simple"));
        assert_eq!(rules.derived_source("misc.txt"), None);
    }

    #[test]
    fn test_single_source_pairs_every_query() {
        let resolution = resolve_in_t(&[
            "a_queries.txt",
            "b.query",
            "c.txt",
            "prog.simple",
            "prog_numbered.simple",
        ]);
        assert_eq!(resolution.pairs.len(), 3);
        assert!(resolution
            .pairs
            .iter()
            .all(|p| p.source == Path::new("t/prog.simple")));
        assert_eq!(resolution.pairs[0].query, Path::new("t/a_queries.txt"));
        assert!(resolution.unpaired.is_empty());
    }

    #[test]
    fn test_multiple_sources_use_substitution() {
        let resolution = resolve_in_t(&[
            "calls_queries.txt",
            "calls_source.txt",
            "follows_queries.txt",
            "follows_source.txt",
            "next.query",
        ]);
        assert_eq!(
            resolution.pairs,
            vec![
                TestPair {
                    source: PathBuf::from("t/calls_source.txt"),
                    query: PathBuf::from("t/calls_queries.txt"),
                },
                TestPair {
                    source: PathBuf::from("t/follows_source.txt"),
                    query: PathBuf::from("t/follows_queries.txt"),
                },
            ]
        );
        // next.simple does not exist among the candidates.
        assert_eq!(resolution.unpaired, vec![PathBuf::from("t/next.query")]);
    }

    #[test]
    fn test_unmatched_query_is_left_unpaired() {
        let resolution = resolve_in_t(&["a.simple", "b.simple", "c_queries.txt", "notes.txt"]);
        assert!(resolution.pairs.is_empty());
        assert_eq!(
            resolution.unpaired,
            vec![PathBuf::from("t/c_queries.txt"), PathBuf::from("t/notes.txt")]
        );
    }

    #[test]
    fn test_unpaired_queries_are_reported() {
        let resolution = resolve_in_t(&["a.simple", "b.simple", "c_queries.txt", "notes.txt"]);
        assert_eq!(
            resolution.diagnostics(),
            vec![
                "could not find source for 'c_queries.txt', skipping".to_string(),
                "could not find source for 'notes.txt', skipping".to_string(),
            ]
        );

        let paired = resolve_in_t(&["prog.simple", "a.query"]);
        assert!(paired.diagnostics().is_empty());
    }

    #[test]
    fn test_derived_source_must_not_be_numbered() {
        let resolution = resolve_in_t(&["a.simple", "b_numbered.simple", "b.simple", "b_numbered.query"]);
        // b_numbered.query derives b_numbered.simple, which is excluded.
        assert!(resolution.pairs.is_empty());
        assert_eq!(resolution.unpaired.len(), 1);
    }

    #[test]
    fn test_no_sources_is_not_a_test_directory() {
        let resolution = resolve_in_t(&["README.txt", "x_queries.txt"]);
        assert!(!resolution.is_test_directory());
        assert!(resolution.pairs.is_empty());
        assert!(resolution.unpaired.is_empty());
    }

    #[test]
    fn test_resolve_reads_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.query", "a.query", "prog.simple"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let resolution = resolve(dir.path(), &PairingRules::default()).unwrap();
        let queries: Vec<_> = resolution
            .pairs
            .iter()
            .map(|p| p.query.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(queries, vec!["a.query", "z.query"]);
    }
}
