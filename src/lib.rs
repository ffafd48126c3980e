pub mod backup;
pub mod cta;
pub mod evidence;
pub mod homepage;
pub mod tier;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `*.astro` files directly inside `dir`, sorted by path. A missing directory yields none.
pub fn list_astro_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = glob::Pattern::escape(&dir.to_string_lossy()) + "/*.astro";
    let mut files = glob::glob(&pattern)
        .with_context(|| format!("invalid glob pattern {pattern}"))?
        .collect::<Result<Vec<_>, _>>()?;
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_astro_files_should_sort_and_filter() {
        let files = list_astro_files(Path::new("fixtures/reviews")).unwrap();
        let names = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "10web-ai.astro",
                "draft-notes.astro",
                "framer-ai.astro",
                "godaddy-ai.astro",
                "index.astro",
                "teleporthq.astro",
                "web-com.astro",
            ]
        );
        assert!(list_astro_files(Path::new("fixtures/missing")).unwrap().is_empty());
    }
}
