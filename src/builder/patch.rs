//! Literal substitutions on upstream build files.
//!
//! Rules are applied in order and replace every occurrence of their pattern.
//! A rule whose pattern does not occur is a *miss*; what happens then is
//! decided by [`MissPolicy`]. All edits are computed in memory first and
//! written only once every rule has been evaluated, so an aborted patch step
//! leaves the sources untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::core::errors::RecipeError;
use crate::util::fs::{read_to_string, write_string};

/// What to look for.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring.
    Literal(String),
    /// Regular expression, for tokens that come in several spellings.
    Token(Regex),
}

impl Pattern {
    fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(s) => s,
            Pattern::Token(re) => re.as_str(),
        }
    }
}

/// A single substitution in one file.
#[derive(Debug, Clone)]
pub struct PatchRule {
    /// Path relative to the source root.
    pub file: PathBuf,
    pub pattern: Pattern,
    pub replacement: String,
}

impl PatchRule {
    pub fn replace(
        file: impl Into<PathBuf>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        PatchRule {
            file: file.into(),
            pattern: Pattern::Literal(from.into()),
            replacement: to.into(),
        }
    }

    /// Delete every occurrence of `text`.
    pub fn remove(file: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self::replace(file, text, "")
    }

    pub fn token(file: impl Into<PathBuf>, pattern: Regex, to: impl Into<String>) -> Self {
        PatchRule {
            file: file.into(),
            pattern: Pattern::Token(pattern),
            replacement: to.into(),
        }
    }

    /// Apply to `contents`. Returns `None` when the pattern is absent.
    fn apply_to(&self, contents: &str) -> Option<String> {
        match &self.pattern {
            Pattern::Literal(needle) => contents
                .contains(needle.as_str())
                .then(|| contents.replace(needle.as_str(), &self.replacement)),
            Pattern::Token(re) => re
                .is_match(contents)
                .then(|| re.replace_all(contents, self.replacement.as_str()).into_owned()),
        }
    }
}

impl Serialize for PatchRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            file: &'a Path,
            kind: &'static str,
            pattern: &'a str,
            replacement: &'a str,
        }

        Repr {
            file: &self.file,
            kind: match self.pattern {
                Pattern::Literal(_) => "literal",
                Pattern::Token(_) => "token",
            },
            pattern: self.pattern.as_str(),
            replacement: &self.replacement,
        }
        .serialize(serializer)
    }
}

/// Reaction to a rule whose pattern is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Accept silently.
    Ignore,
    /// Log a warning and continue.
    #[default]
    Warn,
    /// Abort with [`RecipeError::PatchMiss`].
    Error,
}

impl std::str::FromStr for MissPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(MissPolicy::Ignore),
            "warn" => Ok(MissPolicy::Warn),
            "error" => Ok(MissPolicy::Error),
            _ => Err(format!(
                "invalid miss policy '{}'; expected 'ignore', 'warn' or 'error'",
                s
            )),
        }
    }
}

/// A rule that found nothing to replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchMiss {
    pub file: PathBuf,
    pub pattern: String,
}

impl std::fmt::Display for PatchMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` not found in {}", self.pattern, self.file.display())
    }
}

/// Outcome of a patch step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchReport {
    /// Rules that matched.
    pub applied: usize,
    pub misses: Vec<PatchMiss>,
    /// Files rewritten on disk.
    pub files_changed: Vec<PathBuf>,
}

/// Evaluate `rules` against the files under `root` without writing.
fn simulate(root: &Path, rules: &[PatchRule]) -> Result<(BTreeMap<PathBuf, Edit>, PatchReport)> {
    let mut files: BTreeMap<PathBuf, Edit> = BTreeMap::new();
    let mut report = PatchReport::default();

    for rule in rules {
        if !files.contains_key(&rule.file) {
            let original = read_to_string(&root.join(&rule.file))?;
            files.insert(
                rule.file.clone(),
                Edit {
                    current: original.clone(),
                    original,
                },
            );
        }
        let edit = files
            .get_mut(&rule.file)
            .ok_or_else(|| anyhow::anyhow!("patch state lost for {}", rule.file.display()))?;

        match rule.apply_to(&edit.current) {
            Some(updated) => {
                edit.current = updated;
                report.applied += 1;
            }
            None => report.misses.push(PatchMiss {
                file: rule.file.clone(),
                pattern: rule.pattern.as_str().to_string(),
            }),
        }
    }

    Ok((files, report))
}

struct Edit {
    original: String,
    current: String,
}

/// Apply `rules` to the sources under `root`.
pub fn apply_rules(root: &Path, rules: &[PatchRule], policy: MissPolicy) -> Result<PatchReport> {
    let (files, mut report) = simulate(root, rules)?;

    for miss in &report.misses {
        match policy {
            MissPolicy::Ignore => {}
            MissPolicy::Warn => tracing::warn!(
                "patch target not found in {}: {:?}",
                miss.file.display(),
                miss.pattern
            ),
            MissPolicy::Error => {
                return Err(RecipeError::PatchMiss {
                    file: miss.file.clone(),
                    pattern: miss.pattern.clone(),
                }
                .into())
            }
        }
    }

    for (file, edit) in files {
        if edit.current != edit.original {
            write_string(&root.join(&file), &edit.current)?;
            report.files_changed.push(file);
        }
    }

    tracing::debug!(
        "applied {} patch rules, {} misses",
        report.applied,
        report.misses.len()
    );
    Ok(report)
}

/// Report every rule that would miss, without touching any file.
///
/// Used to detect upstream drift before a release bump.
pub fn check_rules(root: &Path, rules: &[PatchRule]) -> Result<Vec<PatchMiss>> {
    simulate(root, rules).map(|(_, report)| report.misses)
}
