//! SVG evidence graphics for every reviewed product.
//!
//! A TOML dataset describes products, their ratings, extra benchmark charts
//! and head-to-head comparisons. Each product becomes a score gauge, a
//! ratings bar chart, one bar chart per custom chart and one table per
//! comparison, written as standalone `.svg` files.

mod chart;

pub use chart::{BarChart, ComparisonTable, Gauge};

use crate::tier::ScoreTier;
use anyhow::{bail, ensure, Context, Result};
use askama::Template;
use derive_builder::Builder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use strum::Display;
use tracing::{debug, info, warn};

const DEFAULT_BRAND: &str = "AI Website Builders · independent hands-on testing";
const RESERVED_CHART_NAMES: &[&str] = &["score", "ratings"];

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub slug: String,
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub ratings: Vec<Bar>,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartSpec {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub unit: String,
    /// Defaults to the largest bar.
    pub max: Option<f64>,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comparison {
    pub competitor: String,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonRow {
    pub criterion: String,
    pub ours: String,
    pub theirs: String,
    #[serde(default)]
    pub winner: Winner,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Ours,
    Theirs,
    #[default]
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChartKind {
    Gauge,
    Bar,
    Table,
}

#[derive(Debug)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub file_name: String,
    pub svg: String,
}

#[derive(Debug, Builder)]
#[builder(setter(into))]
pub struct EvidenceGenerator {
    dataset: Dataset,
    output_dir: PathBuf,
}

fn default_brand() -> String {
    DEFAULT_BRAND.to_string()
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let dataset: Self = toml::from_str(&content)
            .with_context(|| format!("invalid dataset {}", path.display()))?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> Result<()> {
        let mut slugs = HashSet::new();
        let mut files = HashSet::new();
        for product in &self.products {
            product
                .validate()
                .with_context(|| format!("product `{}`", product.slug))?;
            ensure!(
                slugs.insert(product.slug.as_str()),
                "duplicate product slug `{}`",
                product.slug
            );
            // `a` + chart `b-score` and `a-b` both map to `a-b-score.svg`
            for file in product.file_names() {
                ensure!(
                    !files.contains(&file),
                    "product `{}`: output file {file} is already produced by another product",
                    product.slug
                );
                files.insert(file);
            }
        }
        Ok(())
    }
}

impl Product {
    fn validate(&self) -> Result<()> {
        ensure!(is_slug(&self.slug), "slug must be lowercase a-z, 0-9 and `-`");
        ensure!(!self.name.trim().is_empty(), "name is empty");
        ensure!(in_score_range(self.score), "score {} is outside 0-10", self.score);

        for bar in &self.ratings {
            ensure!(
                in_score_range(bar.value),
                "rating `{}` = {} is outside 0-10",
                bar.label,
                bar.value
            );
        }

        let mut names = HashSet::new();
        for chart in &self.charts {
            ensure!(is_slug(&chart.name), "chart name `{}` is not a slug", chart.name);
            if RESERVED_CHART_NAMES.contains(&chart.name.as_str()) || chart.name.starts_with("vs-")
            {
                bail!("chart name `{}` is reserved", chart.name);
            }
            ensure!(names.insert(chart.name.as_str()), "duplicate chart `{}`", chart.name);
            ensure!(!chart.bars.is_empty(), "chart `{}` has no bars", chart.name);
            for bar in &chart.bars {
                ensure!(
                    bar.value.is_finite() && bar.value >= 0.0,
                    "chart `{}`: `{}` must be a non-negative number",
                    chart.name,
                    bar.label
                );
            }
            if let Some(max) = chart.max {
                ensure!(max.is_finite() && max > 0.0, "chart `{}`: max must be > 0", chart.name);
            }
        }

        let mut competitors = HashSet::new();
        for comparison in &self.comparisons {
            let slug = slugify(&comparison.competitor);
            ensure!(!slug.is_empty(), "comparison without a competitor name");
            ensure!(competitors.insert(slug), "duplicate comparison with `{}`", comparison.competitor);
        }
        Ok(())
    }

    /// Output files, in the order [`render_product`] emits them.
    pub fn file_names(&self) -> Vec<String> {
        let slug = &self.slug;
        let mut names = vec![format!("{slug}-score.svg")];
        if !self.ratings.is_empty() {
            names.push(format!("{slug}-ratings.svg"));
        }
        names.extend(self.charts.iter().map(|c| format!("{slug}-{}.svg", c.name)));
        names.extend(
            self.comparisons
                .iter()
                .map(|c| format!("{slug}-vs-{}.svg", slugify(&c.competitor))),
        );
        names
    }

    fn caption(&self) -> &str {
        self.verdict
            .as_deref()
            .unwrap_or_else(|| ScoreTier::from_score(self.score).fallback_verdict())
    }
}

impl ChartSpec {
    fn scale(&self) -> f64 {
        self.max.unwrap_or_else(|| {
            let largest = self.bars.iter().map(|b| b.value).fold(0.0, f64::max);
            if largest > 0.0 {
                largest
            } else {
                1.0
            }
        })
    }
}

impl EvidenceGenerator {
    /// Render and write every chart; returns the written paths in dataset order.
    pub async fn generate(&self) -> Result<Vec<PathBuf>> {
        self.dataset.validate()?;
        if self.dataset.products.is_empty() {
            warn!("dataset has no products, nothing to generate");
            return Ok(vec![]);
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;

        let mut handles = vec![];
        for product in self.dataset.products.clone() {
            let brand = self.dataset.brand.clone();
            let dir = self.output_dir.clone();
            let handle = tokio::spawn(async move {
                let mut written = vec![];
                for chart in render_product(&product, &brand)? {
                    let path = dir.join(&chart.file_name);
                    tokio::fs::write(&path, chart.svg)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    debug!(kind = %chart.kind, file = %path.display(), "wrote chart");
                    written.push(path);
                }
                Ok::<_, anyhow::Error>(written)
            });
            handles.push(handle);
        }

        let mut written = vec![];
        for handle in handles {
            written.extend(handle.await??);
        }

        info!(
            "generated {} evidence images in {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }
}

/// All charts for one product, in a stable order.
pub fn render_product(product: &Product, brand: &str) -> Result<Vec<RenderedChart>> {
    let slug = &product.slug;
    let mut charts = vec![RenderedChart {
        kind: ChartKind::Gauge,
        file_name: format!("{slug}-score.svg"),
        svg: Gauge::new(
            &format!("{} overall score", product.name),
            product.score,
            product.caption(),
            brand,
        )
        .render()?,
    }];

    if !product.ratings.is_empty() {
        charts.push(RenderedChart {
            kind: ChartKind::Bar,
            file_name: format!("{slug}-ratings.svg"),
            svg: BarChart::new(
                &format!("{} ratings", product.name),
                "Scored out of 10 in hands-on testing",
                brand,
                &product.ratings,
                10.0,
                "",
            )
            .render()?,
        });
    }

    for chart in &product.charts {
        charts.push(RenderedChart {
            kind: ChartKind::Bar,
            file_name: format!("{slug}-{}.svg", chart.name),
            svg: BarChart::new(
                &chart.title,
                &product.name,
                brand,
                &chart.bars,
                chart.scale(),
                &chart.unit,
            )
            .render()?,
        });
    }

    for comparison in &product.comparisons {
        charts.push(RenderedChart {
            kind: ChartKind::Table,
            file_name: format!("{slug}-vs-{}.svg", slugify(&comparison.competitor)),
            svg: ComparisonTable::new(&product.name, comparison, brand).render()?,
        });
    }

    Ok(charts)
}

/// `"Hostinger AI"` -> `"hostinger-ai"`
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn in_score_range(v: f64) -> bool {
    (0.0..=10.0).contains(&v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::load(Path::new("fixtures/evidence.toml")).unwrap()
    }

    #[test]
    fn load_should_parse_fixture() {
        let dataset = dataset();
        assert_eq!(dataset.brand, "AI Website Builders test lab");
        assert_eq!(dataset.products.len(), 2);

        let tenweb = &dataset.products[0];
        assert_eq!(tenweb.slug, "10web");
        assert_eq!(tenweb.ratings.len(), 4);
        assert_eq!(tenweb.charts[0].max, Some(100.0));
        assert_eq!(tenweb.comparisons[0].rows[2].winner, Winner::Tie);
        assert_eq!(dataset.products[1].caption(), "Good for specific use cases");
    }

    #[test]
    fn render_product_should_name_files() {
        let dataset = dataset();
        let charts = render_product(&dataset.products[0], &dataset.brand).unwrap();
        let names = charts.iter().map(|c| c.file_name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "10web-score.svg",
                "10web-ratings.svg",
                "10web-pagespeed.svg",
                "10web-vs-wix.svg",
                "10web-vs-hostinger-ai.svg",
            ]
        );
        assert_eq!(dataset.products[0].file_names(), names);
        assert_eq!(charts[0].kind, ChartKind::Gauge);
        assert_eq!(charts[3].kind.to_string(), "table");
        assert!(charts[2].svg.contains("PageSpeed Insights"));
        assert!(charts[2].svg.contains(">92"));
    }

    #[test]
    fn chart_scale_should_default_to_largest_bar() {
        let chart = ChartSpec {
            name: "load".into(),
            title: "Load time".into(),
            unit: "s".into(),
            max: None,
            bars: vec![
                Bar {
                    label: "Mobile".into(),
                    value: 2.4,
                },
                Bar {
                    label: "Desktop".into(),
                    value: 1.2,
                },
            ],
        };
        assert_eq!(chart.scale(), 2.4);
    }

    #[test]
    fn validate_should_reject_bad_products() {
        let bad = |toml: &str| {
            let dataset: Dataset = toml::from_str(toml).unwrap();
            format!("{:#}", dataset.validate().unwrap_err())
        };

        assert!(bad("[[products]]\nslug = \"Wix\"\nname = \"Wix\"\nscore = 8.0").contains("slug"));
        assert!(bad("[[products]]\nslug = \"wix\"\nname = \"Wix\"\nscore = 11.0").contains("outside 0-10"));
        assert!(bad(
            "[[products]]\nslug = \"wix\"\nname = \"Wix\"\nscore = 8.0\n[[products]]\nslug = \"wix\"\nname = \"Wix 2\"\nscore = 7.0"
        )
        .contains("duplicate product slug"));
        assert!(bad(
            "[[products]]\nslug = \"wix\"\nname = \"Wix\"\nscore = 8.0\n[[products.charts]]\nname = \"ratings\"\ntitle = \"x\"\nbars = [{ label = \"a\", value = 1 }]"
        )
        .contains("reserved"));
        assert!(bad(
            "[[products]]\nslug = \"wix\"\nname = \"Wix\"\nscore = 8.0\n[[products.charts]]\nname = \"speed\"\ntitle = \"x\"\nmax = 0\nbars = [{ label = \"a\", value = 1 }]"
        )
        .contains("max must be > 0"));
    }

    #[test]
    fn validate_should_reject_colliding_files_across_products() {
        let dataset: Dataset = toml::from_str(
            "[[products]]\nslug = \"a\"\nname = \"A\"\nscore = 8.0\n[[products.charts]]\nname = \"b-score\"\ntitle = \"x\"\nbars = [{ label = \"a\", value = 1 }]\n[[products]]\nslug = \"a-b\"\nname = \"A B\"\nscore = 7.0",
        )
        .unwrap();
        let err = format!("{:#}", dataset.validate().unwrap_err());
        assert!(err.contains("a-b-score.svg"));
        assert!(err.contains("product `a-b`"));
    }

    #[test]
    fn slugify_should_collapse_separators() {
        assert_eq!(slugify("Hostinger AI"), "hostinger-ai");
        assert_eq!(slugify("  Web.com / Network Solutions "), "web-com-network-solutions");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn generate_should_write_all_charts() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("public/images/evidence");
        let generator = EvidenceGeneratorBuilder::default()
            .dataset(dataset())
            .output_dir(out.clone())
            .build()
            .unwrap();

        let written = generator.generate().await.unwrap();
        // 10web: gauge, ratings, pagespeed, 2 tables; durable: gauge, 1 table
        assert_eq!(written.len(), 7);
        assert_eq!(written[0], out.join("10web-score.svg"));
        assert_eq!(written[5], out.join("durable-score.svg"));

        let gauge = std::fs::read_to_string(out.join("durable-score.svg")).unwrap();
        assert!(gauge.contains("Durable overall score"));
        assert!(gauge.contains(ScoreTier::Good.hex()));

        // reruns overwrite in place
        assert_eq!(generator.generate().await.unwrap(), written);
    }

    #[tokio::test]
    async fn generate_should_skip_empty_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        let generator = EvidenceGeneratorBuilder::default()
            .dataset(Dataset {
                brand: default_brand(),
                products: vec![],
            })
            .output_dir(tmp.path().join("out"))
            .build()
            .unwrap();

        assert!(generator.generate().await.unwrap().is_empty());
        assert!(!tmp.path().join("out").exists());
    }
}
