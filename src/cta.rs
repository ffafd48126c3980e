//! Inject the `ComparisonAffiliateCTAs` component into comparison pages.
//!
//! Pages are patched in place. Every modified file is first copied into the
//! backup directory, and a page that already references the component is
//! left alone, so running the patcher twice is a no-op.

use crate::backup::{write_with_backup, BackupName};
use crate::list_astro_files;
use anyhow::{Context, Result};
use derive_builder::Builder;
use regex::Regex;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use strum::Display;
use tracing::{info, warn};

pub const COMPONENT_NAME: &str = "ComparisonAffiliateCTAs";

const DEFAULT_IMPORT: &str =
    "import ComparisonAffiliateCTAs from '../../components/ComparisonAffiliateCTAs.astro';";

const USAGE_BLOCK: &str =
    "    <!-- Affiliate CTAs for both tools -->\n    <ComparisonAffiliateCTAs tools={tools} />\n\n";

static TOOLS_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)const tools\s*=\s*\[.*?\];").expect("tools regex"));
static RECOMMENDATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*Recommendation\s*-->").expect("recommendation regex"));
static NEXT_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*(?:FAQ|Related Comparisons|REAL|PLATFORM|DECISION)")
        .expect("section regex")
});
static FAQ_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*FAQ\s*(?:SECTION|PATTERN)").expect("faq regex"));
static LAYOUT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</Layout>").expect("layout regex"));
static FRONTMATTER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---[ \t]*\r?\n").expect("frontmatter regex"));
static FRONTMATTER_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---[ \t]*\r?$").expect("frontmatter regex"));
static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^import .+;[ \t]*\r?$").expect("import regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionPoint {
    #[strum(serialize = "after Recommendation")]
    AfterRecommendation,
    #[strum(serialize = "before FAQ")]
    BeforeFaq,
    #[strum(serialize = "before Layout close")]
    BeforeLayoutClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SkipReason {
    #[strum(serialize = "already has component")]
    AlreadyPresent,
    #[strum(serialize = "no tools array found")]
    NoToolsArray,
    #[strum(serialize = "no insertion point found")]
    NoInsertionPoint,
    #[strum(serialize = "no frontmatter found")]
    NoFrontmatter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched {
        insertion: InsertionPoint,
        content: String,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Updated(InsertionPoint),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Builder)]
#[builder(setter(into))]
pub struct CtaPatcher {
    comparisons_dir: PathBuf,
    backup_dir: PathBuf,
    #[builder(default = "DEFAULT_IMPORT.to_string()")]
    import_line: String,
    #[builder(default)]
    dry_run: bool,
}

#[derive(Debug)]
pub struct PatchReport {
    pub backup_dir: PathBuf,
    pub dry_run: bool,
    pub files: Vec<(PathBuf, FileStatus)>,
}

impl CtaPatcher {
    /// Patch every `.astro` page in the comparisons directory.
    pub fn run(&self) -> Result<PatchReport> {
        let files = list_astro_files(&self.comparisons_dir)?;
        info!(
            "found {} comparison files in {}",
            files.len(),
            self.comparisons_dir.display()
        );

        let files = files
            .into_iter()
            .map(|path| {
                let status = match self.patch_file(&path) {
                    Ok(status) => status,
                    Err(e) => FileStatus::Failed(format!("{e:#}")),
                };
                log_status(&path, &status);
                (path, status)
            })
            .collect();

        Ok(PatchReport {
            backup_dir: self.backup_dir.clone(),
            dry_run: self.dry_run,
            files,
        })
    }

    pub fn patch_file(&self, path: &Path) -> Result<FileStatus> {
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

        match self.patch_source(&content) {
            PatchOutcome::Skipped(reason) => Ok(FileStatus::Skipped(reason)),
            PatchOutcome::Patched { insertion, content } => {
                if !self.dry_run {
                    write_with_backup(path, &content, &self.backup_dir, BackupName::SameName)?;
                }
                Ok(FileStatus::Updated(insertion))
            }
        }
    }

    /// Compute the patched page without touching the filesystem.
    pub fn patch_source(&self, content: &str) -> PatchOutcome {
        if content.contains(COMPONENT_NAME) {
            return PatchOutcome::Skipped(SkipReason::AlreadyPresent);
        }
        if !TOOLS_ARRAY.is_match(content) {
            return PatchOutcome::Skipped(SkipReason::NoToolsArray);
        }
        let Some(frontmatter) = frontmatter(content) else {
            return PatchOutcome::Skipped(SkipReason::NoFrontmatter);
        };
        // markers inside the frontmatter are script, not markup
        let Some((insert_at, insertion)) = find_insertion_point(content, frontmatter.end) else {
            return PatchOutcome::Skipped(SkipReason::NoInsertionPoint);
        };

        let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let (import_at, import_text) = match IMPORT_LINE
            .find_iter(&content[frontmatter.clone()])
            .last()
        {
            Some(m) => (
                frontmatter.start + m.start() + m.as_str().trim_end().len(),
                format!("{eol}{}", self.import_line),
            ),
            None => (frontmatter.start, format!("{}{eol}", self.import_line)),
        };
        let usage = USAGE_BLOCK.replace('\n', eol);

        let mut patched = String::with_capacity(content.len() + import_text.len() + usage.len());
        patched.push_str(&content[..import_at]);
        patched.push_str(&import_text);
        patched.push_str(&content[import_at..insert_at]);
        patched.push_str(&usage);
        patched.push_str(&content[insert_at..]);

        PatchOutcome::Patched {
            insertion,
            content: patched,
        }
    }
}

impl PatchReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Updated(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped(_)))
    }

    pub fn errors(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    fn count(&self, f: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|(_, s)| f(s)).count()
    }
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files.is_empty() {
            return writeln!(f, "No comparison files found.");
        }
        writeln!(f, "Summary:")?;
        writeln!(f, "  Total:    {}", self.total())?;
        writeln!(f, "  Updated:  {}", self.updated())?;
        writeln!(f, "  Skipped:  {}", self.skipped())?;
        writeln!(f, "  Errors:   {}", self.errors())?;
        if self.dry_run {
            writeln!(f, "Dry run: no files were written.")
        } else if self.updated() > 0 {
            writeln!(f, "Backups saved to: {}", self.backup_dir.display())
        } else {
            writeln!(f, "No files were updated.")
        }
    }
}

fn log_status(path: &Path, status: &FileStatus) {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match status {
        FileStatus::Updated(insertion) => info!(%file, "added CTAs ({insertion})"),
        FileStatus::Skipped(reason) => info!(%file, "skipped: {reason}"),
        FileStatus::Failed(e) => warn!(%file, "error: {e}"),
    }
}

/// First insertion point at or after `from`.
fn find_insertion_point(content: &str, from: usize) -> Option<(usize, InsertionPoint)> {
    if let Some(rec) = RECOMMENDATION.find_at(content, from) {
        if let Some(next) = NEXT_SECTION.find_at(content, rec.end()) {
            return Some((
                line_start(content, next.start()),
                InsertionPoint::AfterRecommendation,
            ));
        }
    }

    if let Some(faq) = FAQ_SECTION.find_at(content, from) {
        return Some((line_start(content, faq.start()), InsertionPoint::BeforeFaq));
    }

    LAYOUT_CLOSE
        .find_at(content, from)
        .map(|m| (line_start(content, m.start()), InsertionPoint::BeforeLayoutClose))
}

/// Byte range between the opening and closing `---` fences.
fn frontmatter(content: &str) -> Option<Range<usize>> {
    let open = FRONTMATTER_OPEN.find(content)?;
    let close = FRONTMATTER_CLOSE.find_at(content, open.end())?;
    Some(open.end()..close.start())
}

fn line_start(content: &str, pos: usize) -> usize {
    content[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}
