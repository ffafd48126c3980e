//! Rebuild the homepage `tools` array from the review pages.

use crate::backup::{write_with_backup, BackupName};
use crate::list_astro_files;
use crate::tier::ScoreTier;
use anyhow::{Context, Result};
use derive_builder::Builder;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{info, warn};

const TOP_N: usize = 10;
const MAX_VERDICT_CHARS: usize = 55;
const DESCRIPTION_SENTENCE_CHARS: std::ops::RangeInclusive<usize> = 30..=80;

/// Brand spellings that plain title-casing gets wrong.
const BRAND_FIXUPS: &[(&str, &str)] = &[
    ("Teleporthq", "TeleportHQ"),
    ("Godaddy", "GoDaddy"),
    ("Web Com", "web.com"),
    ("Ionos", "IONOS"),
];

static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"score:\s*['"]([\d.]+)['"]"#).expect("score regex"));
static VERDICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"verdict:\s*['"]([^'"]+)['"]"#).expect("verdict regex"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"description:\s*['"]([^'"]*)['"]"#).expect("description regex")
});
static TOOLS_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)const tools\s*=\s*\[.*?\];").expect("tools regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub name: String,
    pub score: f64,
    pub verdict: String,
    pub color: &'static str,
    pub slug: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// `backup` is `None` on a dry run.
    Updated { backup: Option<PathBuf> },
    Unchanged,
}

#[derive(Debug, Builder)]
#[builder(setter(into))]
pub struct HomepageUpdater {
    reviews_dir: PathBuf,
    homepage: PathBuf,
    backup_dir: PathBuf,
    #[builder(default)]
    dry_run: bool,
}

#[derive(Debug)]
pub struct HomepageReport {
    pub tools: Vec<ReviewEntry>,
    pub outcome: UpdateOutcome,
}

impl HomepageUpdater {
    pub fn run(&self) -> Result<HomepageReport> {
        let tools = self.collect_reviews()?;
        info!("extracted {} reviews", tools.len());

        let content = fs::read_to_string(&self.homepage)
            .with_context(|| format!("failed to read {}", self.homepage.display()))?;
        let updated = replace_tools_array(&content, &render_tools_array(&tools))
            .with_context(|| format!("cannot update {}", self.homepage.display()))?;

        let outcome = match updated {
            None => {
                info!("homepage tools array already up to date");
                UpdateOutcome::Unchanged
            }
            Some(_) if self.dry_run => UpdateOutcome::Updated { backup: None },
            Some(updated) => {
                let backup = write_with_backup(
                    &self.homepage,
                    &updated,
                    &self.backup_dir,
                    BackupName::Timestamped,
                )?;
                info!(backup = %backup.display(), "homepage updated with {} tools", tools.len());
                UpdateOutcome::Updated {
                    backup: Some(backup),
                }
            }
        };

        Ok(HomepageReport { tools, outcome })
    }

    /// Review entries sorted by score, best first. Ties keep file order.
    pub fn collect_reviews(&self) -> Result<Vec<ReviewEntry>> {
        let mut reviews = vec![];
        for path in list_astro_files(&self.reviews_dir)? {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if stem == "index" {
                continue;
            }

            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            match extract_review(&stem, &content) {
                Some(entry) => {
                    info!(
                        file = %entry.file,
                        name = %entry.name,
                        score = entry.score,
                        "extracted review"
                    );
                    reviews.push(entry);
                }
                None => warn!(file = %path.display(), "no score found, skipping"),
            }
        }

        reviews.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(reviews)
    }
}

pub fn extract_review(stem: &str, content: &str) -> Option<ReviewEntry> {
    let score = SCORE
        .captures(content)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|s| s.is_finite())?;
    let tier = ScoreTier::from_score(score);

    Some(ReviewEntry {
        name: tool_name(stem),
        score,
        verdict: extract_verdict(content).unwrap_or_else(|| tier.fallback_verdict().to_string()),
        color: tier.gradient(),
        slug: format!("/reviews/{stem}"),
        file: format!("{stem}.astro"),
    })
}

/// Display name derived from a review file stem, e.g. `godaddy-ai` -> `GoDaddy`.
pub fn tool_name(stem: &str) -> String {
    let words = stem
        .split('-')
        .enumerate()
        .filter(|(i, word)| *i == 0 || *word != "ai")
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ");

    let name = title_case(&words)
        .split(' ')
        .map(|word| if word == "Ai" { "AI" } else { word })
        .collect::<Vec<_>>()
        .join(" ");

    BRAND_FIXUPS
        .iter()
        .fold(name, |name, &(from, to)| name.replace(from, to))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut after_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}

fn extract_verdict(content: &str) -> Option<String> {
    let explicit = VERDICT.captures(content).map(|c| collapse(&c[1]));
    let from_description = DESCRIPTION
        .captures(content)
        .and_then(|c| first_sentence(&c[1]).map(collapse));

    [explicit, from_description]
        .into_iter()
        .flatten()
        .map(|v| {
            v.chars()
                .take(MAX_VERDICT_CHARS)
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .find(|v| !v.is_empty())
}

/// Text before the first `.` that ends a sentence, if it is a usable length.
fn first_sentence(text: &str) -> Option<&str> {
    let end = text
        .char_indices()
        .find(|&(i, c)| {
            c == '.'
                && text[i + 1..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
        .map(|(i, _)| i)?;
    let sentence = text[..end].trim();
    let len = sentence.chars().count();
    (DESCRIPTION_SENTENCE_CHARS.contains(&len) && !sentence.contains(['{', '}'])).then_some(sentence)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn render_tools_array(tools: &[ReviewEntry]) -> String {
    let mut lines = vec!["const tools = [".to_string()];
    lines.extend(tools.iter().map(|t| {
        format!(
            "\t{{ name: '{}', score: {}, verdict: '{}', color: '{}', slug: '{}' }},",
            js_escape(&t.name),
            format_score(t.score),
            js_escape(&t.verdict),
            t.color,
            js_escape(&t.slug),
        )
    }));
    lines.push("];".to_string());
    lines.join("\n")
}

/// Swap the first `const tools = [...]` block. `Ok(None)` when it is already identical.
pub fn replace_tools_array(content: &str, array: &str) -> Result<Option<String>> {
    let m = TOOLS_ARRAY
        .find(content)
        .ok_or_else(|| anyhow::anyhow!("no tools array found"))?;
    if m.as_str() == array {
        return Ok(None);
    }
    Ok(Some(format!(
        "{}{}{}",
        &content[..m.start()],
        array,
        &content[m.end()..]
    )))
}

/// Whole scores keep one decimal (`9.0`) so the cards line up.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        format!("{score}")
    }
}

fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

impl fmt::Display for HomepageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total reviews extracted: {}", self.tools.len())?;
        writeln!(f)?;
        writeln!(f, "Top {TOP_N} by score:")?;
        for (i, t) in self.tools.iter().take(TOP_N).enumerate() {
            writeln!(f, "  {:2}. {:25} | {}", i + 1, t.name, format_score(t.score))?;
        }
        if self.tools.len() > TOP_N {
            writeln!(f)?;
            writeln!(f, "Beyond the top {TOP_N}:")?;
            for t in &self.tools[TOP_N..] {
                writeln!(f, "  • {:25} | {}", t.name, format_score(t.score))?;
            }
        }
        writeln!(f)?;
        match &self.outcome {
            UpdateOutcome::Updated { backup: Some(b) } => writeln!(
                f,
                "Homepage updated with {} tools (backup: {})",
                self.tools.len(),
                b.display()
            ),
            UpdateOutcome::Updated { backup: None } => writeln!(
                f,
                "Dry run: homepage would be updated with {} tools",
                self.tools.len()
            ),
            UpdateOutcome::Unchanged => writeln!(f, "Homepage already up to date"),
        }
    }
}
