//! File selection: user exclude patterns and the deployment-file rules

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::sync::OnceLock;

/// Extensions that never belong on a web server (sources, project files, build leftovers)
pub const NON_DEPLOYMENT_EXTENSIONS: &[&str] = &[
    "cs", "vb", "csproj", "vbproj", "sln", "suo", "user", "pdb", "vspscc", "vssscc", "scc",
    "cache", "log", "tmp", "bak", "orig", "resx",
];

/// File names excluded regardless of extension
pub const NON_DEPLOYMENT_FILES: &[&str] = &[
    ".gitignore",
    ".gitattributes",
    ".hgignore",
    "packages.config",
    "Thumbs.db",
];

/// Directory names whose whole subtree is excluded
pub const NON_DEPLOYMENT_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".vs",
    "obj",
    "_ReSharper*",
    "packages",
    "node_modules",
];

fn case_insensitive_set(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        // Patterns are compile-time constants
        if let Ok(glob) = GlobBuilder::new(p).case_insensitive(true).build() {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

fn non_deployment_dirs() -> &'static GlobSet {
    static SET: OnceLock<GlobSet> = OnceLock::new();
    SET.get_or_init(|| case_insensitive_set(NON_DEPLOYMENT_DIRS))
}

fn non_deployment_files() -> &'static GlobSet {
    static SET: OnceLock<GlobSet> = OnceLock::new();
    SET.get_or_init(|| case_insensitive_set(NON_DEPLOYMENT_FILES))
}

fn file_name(rel_path: &str) -> &str {
    rel_path.rsplit('/').next().unwrap_or(rel_path)
}

/// True if a directory name is one of the excluded build/VCS directories
pub fn is_deployment_dir(name: &str) -> bool {
    !non_deployment_dirs().is_match(name)
}

/// True if a `/`-separated relative path names a file worth deploying
pub fn is_deployment_file(rel_path: &str) -> bool {
    let mut components: Vec<&str> = rel_path.split('/').filter(|c| !c.is_empty()).collect();
    let Some(name) = components.pop() else {
        return false;
    };
    if components.iter().any(|c| !is_deployment_dir(c)) {
        return false;
    }
    if non_deployment_files().is_match(name) {
        return false;
    }
    let lower = name.to_ascii_lowercase();
    match lower.rsplit_once('.') {
        // ".htaccess" has no stem, treat the whole name as the file name
        Some((stem, ext)) if !stem.is_empty() => !NON_DEPLOYMENT_EXTENSIONS.contains(&ext),
        _ => true,
    }
}

/// Split `"*.config, web.*"` style lists into single patterns
pub fn split_patterns<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// File filter options
#[derive(Debug, Clone)]
pub struct FileFilter {
    pub exclude_patterns: Vec<String>,
    pub deployment_only: bool,
    exclude: GlobSet,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            deployment_only: false,
            exclude: GlobSet::empty(),
        }
    }
}

impl FileFilter {
    pub fn new(exclude_patterns: Vec<String>, deployment_only: bool) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &exclude_patterns {
            let glob =
                Glob::new(pattern).with_context(|| format!("Invalid exclude pattern '{}'", pattern))?;
            builder.add(glob);
        }
        let exclude = builder.build().context("Failed to compile exclude patterns")?;
        Ok(Self {
            exclude_patterns,
            deployment_only,
            exclude,
        })
    }

    fn excluded_by_pattern(&self, rel_path: &str) -> bool {
        self.exclude.is_match(rel_path) || self.exclude.is_match(file_name(rel_path))
    }

    /// Check if a file should be uploaded
    pub fn should_include_file(&self, rel_path: &str) -> bool {
        if self.excluded_by_pattern(rel_path) {
            return false;
        }
        !self.deployment_only || is_deployment_file(rel_path)
    }

    /// Check if a directory should be mirrored and descended into
    pub fn should_include_dir(&self, rel_path: &str) -> bool {
        if self.excluded_by_pattern(rel_path) {
            return false;
        }
        !self.deployment_only || is_deployment_dir(file_name(rel_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_rules_drop_sources_and_vcs() {
        assert!(is_deployment_file("index.html"));
        assert!(is_deployment_file("bin/App.dll"));
        assert!(is_deployment_file("Web.config"));
        assert!(is_deployment_file(".htaccess"));
        assert!(!is_deployment_file("Controllers/HomeController.cs"));
        assert!(!is_deployment_file("Default.aspx.designer.cs"));
        assert!(!is_deployment_file("bin/App.PDB"));
        assert!(!is_deployment_file("Site.csproj"));
        assert!(!is_deployment_file("obj/Debug/App.dll"));
        assert!(!is_deployment_file(".git/config"));
        assert!(!is_deployment_file("_ReSharper.Site/cache.bin"));
        assert!(!is_deployment_file(".gitignore"));
        assert!(!is_deployment_file("packages.config"));
        assert!(!is_deployment_file("img/thumbs.db"));
    }

    #[test]
    fn deployment_dirs() {
        assert!(is_deployment_dir("bin"));
        assert!(is_deployment_dir("Content"));
        assert!(!is_deployment_dir("OBJ"));
        assert!(!is_deployment_dir(".svn"));
        assert!(!is_deployment_dir("node_modules"));
    }

    #[test]
    fn exclude_patterns_match_name_or_path() {
        let filter = FileFilter::new(split_patterns(&["*.config, logs/*", "temp"]), false).unwrap();
        assert!(!filter.should_include_file("Web.config"));
        assert!(!filter.should_include_file("sub/app.config"));
        assert!(!filter.should_include_file("logs/today.txt"));
        assert!(filter.should_include_file("index.html"));
        assert!(filter.should_include_file("Site.csproj"));
        assert!(filter.should_include_dir("logs"));
        assert!(!filter.should_include_dir("temp"));
        assert!(!filter.should_include_dir("site/temp"));
        assert!(filter.should_include_dir("obj"));
    }

    #[test]
    fn deployment_only_combines_with_patterns() {
        let filter = FileFilter::new(vec!["*.txt".into()], true).unwrap();
        assert!(!filter.should_include_file("readme.txt"));
        assert!(!filter.should_include_file("Program.cs"));
        assert!(filter.should_include_file("default.aspx"));
        assert!(!filter.should_include_dir("obj"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(FileFilter::new(vec!["[".into()], false).is_err());
    }

    #[test]
    fn split_patterns_trims_and_drops_empties() {
        let parts = split_patterns(&["a, b,,", " c "]);
        assert_eq!(parts, vec!["a", "b", "c"]);
    }
}
