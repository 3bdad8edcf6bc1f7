//! Learnings retrieval for agent context.
//!
//! A repository may keep notes from earlier tasks under `docs/learnings/*.md`.
//! Each note can carry YAML frontmatter with a `tags` list. Notes are scored
//! against the task description and caller tags; the best few are rendered
//! into one markdown block ready to prepend to an agent prompt.

use std::collections::HashSet;
use std::path::Path;

use af_domain::error::{Error, Result};
use af_domain::trace::TraceEvent;
use regex::Regex;
use serde::Deserialize;

pub const LEARNINGS_DIR: &str = "docs/learnings";
pub const MAX_LEARNINGS: usize = 5;
pub const HEADER: &str = "## Previous Learnings (from similar tasks)\n\n";
const SEPARATOR: &str = "\n\n---\n\n";

const TAG_MATCH: usize = 3;
const TAG_IN_TASK: usize = 2;
const WORD_IN_CONTENT: usize = 1;

/// One learnings note with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredLearning {
    pub file: String,
    pub content: String,
    pub score: usize,
}

#[derive(Debug, Default, Deserialize)]
struct LearningMeta {
    #[serde(default)]
    tags: Vec<String>,
}

struct Matchers {
    non_word: Regex,
    tag_line: Regex,
}

impl Matchers {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(|e| Error::Other(e.to_string()));
        Ok(Self {
            non_word: compile(r"[^A-Za-z0-9_]+")?,
            tag_line: compile(r"tags:\s*\[([^\]]*)\]")?,
        })
    }

    /// Lowercased words longer than three characters.
    fn task_words(&self, task: &str) -> HashSet<String> {
        let lower = task.to_lowercase();
        self.non_word
            .split(&lower)
            .filter(|w| w.len() > 3)
            .map(str::to_owned)
            .collect()
    }

    /// Lowercased frontmatter tags. Falls back to a plain `tags: [..]` scan
    /// when the frontmatter is not valid YAML.
    fn file_tags(&self, content: &str) -> Vec<String> {
        let Some(front) = frontmatter(content) else {
            return Vec::new();
        };
        let raw = match serde_yaml::from_str::<LearningMeta>(front) {
            Ok(meta) => meta.tags,
            Err(e) => {
                tracing::debug!(error = %e, "learnings frontmatter is not YAML, scanning tag line");
                self.tag_line
                    .captures(front)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().split(',').map(str::to_owned).collect())
                    .unwrap_or_default()
            }
        };
        raw.iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// The body of a leading `---` block, if the file opens with one.
fn frontmatter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---\n")?;
    let close = rest.find("\n---")?;
    Some(&rest[..close])
}

/// Score every note under `<repo>/docs/learnings`, best first.
///
/// Notes scoring zero are dropped. Ties keep file-name order.
pub fn score_learnings(repo_path: &Path, task: &str, tags: &[String]) -> Result<Vec<ScoredLearning>> {
    let dir = repo_path.join(LEARNINGS_DIR);
    let read_dir = match std::fs::read_dir(&dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut files: Vec<String> = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".md") && entry.path().is_file() {
            files.push(name);
        }
    }
    files.sort();

    let matchers = Matchers::new()?;
    let words = matchers.task_words(task);
    let wanted: HashSet<String> = tags.iter().map(|t| t.to_lowercase()).collect();

    let mut scored = Vec::new();
    for file in files {
        let content = match std::fs::read_to_string(dir.join(&file)) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "skipping unreadable learnings file");
                continue;
            }
        };

        let mut score = 0;
        for tag in matchers.file_tags(&content) {
            if wanted.contains(&tag) {
                score += TAG_MATCH;
            }
            if words.contains(&tag) {
                score += TAG_IN_TASK;
            }
        }
        let lower = content.to_lowercase();
        score += words.iter().filter(|w| lower.contains(w.as_str())).count() * WORD_IN_CONTENT;

        if score > 0 {
            scored.push(ScoredLearning { file, content, score });
        }
    }

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(scored)
}

/// Render the most relevant learnings as a markdown block.
///
/// Returns an empty string when the directory is missing or nothing matches.
pub fn load_relevant_learnings(repo_path: &Path, task: &str, tags: &[String]) -> Result<String> {
    let mut scored = score_learnings(repo_path, task, tags)?;
    let matched = scored.len();
    scored.truncate(MAX_LEARNINGS);

    TraceEvent::LearningsLoaded {
        repo: repo_path.display().to_string(),
        matched,
        selected: scored.iter().map(|s| s.file.clone()).collect(),
    }
    .emit();

    if scored.is_empty() {
        return Ok(String::new());
    }
    let sections: Vec<String> = scored
        .iter()
        .map(|s| format!("### {}\n{}", s.file, s.content))
        .collect();
    Ok(format!("{HEADER}{}", sections.join(SEPARATOR)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_words_skip_short_tokens() {
        let m = Matchers::new().unwrap();
        let words = m.task_words("Fix the OAuth token-refresh bug in api");
        let mut words: Vec<_> = words.into_iter().collect();
        words.sort();
        assert_eq!(words, vec!["oauth", "refresh", "token"]);
    }

    #[test]
    fn yaml_tags_are_lowercased() {
        let m = Matchers::new().unwrap();
        let md = "---\ntitle: x\ntags: [Auth, ' Tokens ']\n---\nbody";
        assert_eq!(m.file_tags(md), vec!["auth", "tokens"]);
    }

    #[test]
    fn broken_yaml_falls_back_to_tag_line() {
        let m = Matchers::new().unwrap();
        let md = "---\ntitle: \"unterminated\ntags: [db, migrations]\n---\nbody";
        assert_eq!(m.file_tags(md), vec!["db", "migrations"]);
    }

    #[test]
    fn no_frontmatter_means_no_tags() {
        let m = Matchers::new().unwrap();
        assert!(m.file_tags("# Title\ntags: [a]\n").is_empty());
        assert!(m.file_tags("---\ntags: [a]\nno closing fence").is_empty());
    }
}
