use super::{Bar, Comparison, Winner};
use crate::tier::ScoreTier;
use askama::Template;
use std::f64::consts::PI;

const WIDTH: u32 = 800;
const TRACK_X: u32 = 260;
const TRACK_WIDTH: u32 = 440;
const VALUE_X: u32 = 760;
const BAR_HEIGHT: u32 = 24;
const BAR_TOP: u32 = 110;
const BAR_ROW: u32 = 56;

const GAUGE_WIDTH: u32 = 400;
const GAUGE_HEIGHT: u32 = 300;
const GAUGE_CX: f64 = 200.0;
const GAUGE_CY: f64 = 210.0;
const GAUGE_RADIUS: f64 = 150.0;

const TABLE_HEADER_Y: u32 = 80;
const TABLE_ROW: u32 = 44;
const TABLE_CELL: u32 = 220;
const OURS_X: u32 = 320;
const THEIRS_X: u32 = 540;
const STRIPES: [&str; 2] = ["#0f172a", "#111c33"];
const HIGHLIGHT: &str = "#14532d";

#[derive(Debug, Template)]
#[template(path = "bar_chart.svg.j2")]
pub struct BarChart {
    pub title: String,
    pub subtitle: String,
    pub footer: String,
    pub bars: Vec<BarView>,
    width: u32,
    height: u32,
    track_x: u32,
    track_width: u32,
    bar_height: u32,
    value_x: u32,
    footer_y: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarView {
    pub label: String,
    pub value: String,
    pub y: u32,
    pub text_y: u32,
    pub width: String,
    pub color: &'static str,
}

#[derive(Debug, Template)]
#[template(path = "gauge.svg.j2")]
pub struct Gauge {
    pub title: String,
    pub value_text: String,
    pub caption: String,
    pub footer: String,
    pub color: &'static str,
    pub track: String,
    /// Empty for a zero value.
    pub arc: String,
    width: u32,
    height: u32,
    center_x: u32,
    value_y: u32,
    caption_y: u32,
    footer_y: u32,
}

#[derive(Debug, Template)]
#[template(path = "comparison_table.svg.j2")]
pub struct ComparisonTable {
    pub ours: String,
    pub theirs: String,
    pub footer: String,
    pub rows: Vec<RowView>,
    width: u32,
    height: u32,
    header_y: u32,
    header_text_y: u32,
    table_width: u32,
    row_height: u32,
    ours_x: u32,
    theirs_x: u32,
    ours_text_x: u32,
    theirs_text_x: u32,
    cell_width: u32,
    highlight: &'static str,
    footer_y: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub criterion: String,
    pub ours: String,
    pub theirs: String,
    pub y: u32,
    pub text_y: u32,
    pub stripe: &'static str,
    pub ours_wins: bool,
    pub theirs_wins: bool,
}

impl BarChart {
    /// Horizontal bars scaled against `max`. Colors follow the score tiers of
    /// each bar's share of `max`.
    pub fn new(title: &str, subtitle: &str, footer: &str, bars: &[Bar], max: f64, unit: &str) -> Self {
        let bars = bars
            .iter()
            .zip(0u32..)
            .map(|(bar, i)| {
                let ratio = ratio(bar.value, max);
                let y = BAR_TOP + i * BAR_ROW;
                BarView {
                    label: bar.label.clone(),
                    value: format!("{}{unit}", bar.value),
                    y,
                    text_y: y + 18,
                    width: px(ratio * TRACK_WIDTH as f64),
                    color: ScoreTier::from_score(ratio * 10.0).hex(),
                }
            })
            .collect::<Vec<_>>();

        let height = BAR_TOP + bars.len() as u32 * BAR_ROW + 50;
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            footer: footer.to_string(),
            bars,
            width: WIDTH,
            height,
            track_x: TRACK_X,
            track_width: TRACK_WIDTH,
            bar_height: BAR_HEIGHT,
            value_x: VALUE_X,
            footer_y: height - 24,
        }
    }
}

impl Gauge {
    /// Semicircle gauge for a 0-10 score.
    pub fn new(title: &str, score: f64, caption: &str, footer: &str) -> Self {
        let ratio = ratio(score, 10.0);
        let left = GAUGE_CX - GAUGE_RADIUS;
        let right = GAUGE_CX + GAUGE_RADIUS;

        let arc = if ratio > 0.0 {
            let angle = PI * (1.0 - ratio);
            let x = GAUGE_CX + GAUGE_RADIUS * angle.cos();
            let y = GAUGE_CY - GAUGE_RADIUS * angle.sin();
            arc_path(left, x, y)
        } else {
            String::new()
        };

        Self {
            title: title.to_string(),
            value_text: format!("{score:.1}"),
            caption: caption.to_string(),
            footer: footer.to_string(),
            color: ScoreTier::from_score(score).hex(),
            track: arc_path(left, right, GAUGE_CY),
            arc,
            width: GAUGE_WIDTH,
            height: GAUGE_HEIGHT,
            center_x: GAUGE_CX as u32,
            value_y: 195,
            caption_y: 250,
            footer_y: 285,
        }
    }
}

impl ComparisonTable {
    pub fn new(ours: &str, comparison: &Comparison, footer: &str) -> Self {
        let first_row = TABLE_HEADER_Y + TABLE_ROW;
        let rows = comparison
            .rows
            .iter()
            .zip(0u32..)
            .map(|(row, i)| {
                let y = first_row + i * TABLE_ROW;
                RowView {
                    criterion: row.criterion.clone(),
                    ours: row.ours.clone(),
                    theirs: row.theirs.clone(),
                    y,
                    text_y: y + 28,
                    stripe: STRIPES[i as usize % 2],
                    ours_wins: row.winner == Winner::Ours,
                    theirs_wins: row.winner == Winner::Theirs,
                }
            })
            .collect::<Vec<_>>();

        let height = first_row + rows.len() as u32 * TABLE_ROW + 56;
        Self {
            ours: ours.to_string(),
            theirs: comparison.competitor.clone(),
            footer: footer.to_string(),
            rows,
            width: WIDTH,
            height,
            header_y: TABLE_HEADER_Y,
            header_text_y: TABLE_HEADER_Y + 28,
            table_width: WIDTH - 80,
            row_height: TABLE_ROW,
            ours_x: OURS_X,
            theirs_x: THEIRS_X,
            ours_text_x: OURS_X + 16,
            theirs_text_x: THEIRS_X + 16,
            cell_width: TABLE_CELL,
            highlight: HIGHLIGHT,
            footer_y: height - 22,
        }
    }
}

/// Share of `max` clamped to `0..=1`.
fn ratio(value: f64, max: f64) -> f64 {
    if !value.is_finite() || max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

fn arc_path(start_x: f64, end_x: f64, end_y: f64) -> String {
    format!(
        "M {} {} A {r} {r} 0 0 1 {} {}",
        px(start_x),
        px(GAUGE_CY),
        px(end_x),
        px(end_y),
        r = px(GAUGE_RADIUS),
    )
}

/// One decimal, without a trailing `.0`.
fn px(v: f64) -> String {
    let s = format!("{v:.1}");
    match s.strip_suffix(".0") {
        Some(whole) if whole == "-0" => "0".to_string(),
        Some(whole) => whole.to_string(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::ComparisonRow;

    fn bars() -> Vec<Bar> {
        vec![
            Bar {
                label: "Ease of use".into(),
                value: 9.2,
            },
            Bar {
                label: "Templates".into(),
                value: 5.0,
            },
            Bar {
                label: "Overflow".into(),
                value: 14.0,
            },
        ]
    }

    #[test]
    fn bar_geometry_should_scale_and_clamp() {
        let chart = BarChart::new("Ratings", "", "footer", &bars(), 10.0, "");
        assert_eq!(chart.bars[0].width, "404.8");
        assert_eq!(chart.bars[0].color, ScoreTier::Elite.hex());
        assert_eq!(chart.bars[1].width, "220");
        assert_eq!(chart.bars[1].color, ScoreTier::Weak.hex());
        // clamped geometry, real label
        assert_eq!(chart.bars[2].width, "440");
        assert_eq!(chart.bars[2].value, "14");
        assert_eq!(chart.bars[2].y, BAR_TOP + 2 * BAR_ROW);
        assert_eq!(chart.height, 110 + 3 * 56 + 50);
    }

    #[test]
    fn bar_chart_should_render_svg() {
        let chart = BarChart::new("Speed & uptime", "Lab tests", "Example Co", &bars(), 20.0, "s");
        let svg = chart.render().unwrap();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"bar\"").count(), 3);
        assert!(svg.contains("Speed &amp; uptime"));
        assert!(svg.contains(">9.2s</text>"));
        assert!(svg.contains("Lab tests"));
    }

    #[test]
    fn empty_subtitle_should_be_omitted() {
        let svg = BarChart::new("Ratings", "", "", &bars(), 10.0, "")
            .render()
            .unwrap();
        assert!(!svg.contains("y=\"80\""));
    }

    #[test]
    fn gauge_should_draw_partial_arc() {
        let gauge = Gauge::new("Overall score", 5.0, "Solid", "");
        insta::assert_snapshot!(gauge.arc, @"M 50 210 A 150 150 0 0 1 200 60");
        assert_eq!(gauge.track, "M 50 210 A 150 150 0 0 1 350 210");
        assert_eq!(gauge.value_text, "5.0");

        let full = Gauge::new("Overall score", 10.0, "", "");
        assert_eq!(full.arc, full.track);

        let svg = Gauge::new("Overall score", 0.0, "", "").render().unwrap();
        assert!(!svg.contains("class=\"value\""));
    }

    #[test]
    fn gauge_should_use_tier_color() {
        let svg = Gauge::new("Overall score", 8.7, "Fast & cheap", "")
            .render()
            .unwrap();
        assert!(svg.contains(ScoreTier::Excellent.hex()));
        assert!(svg.contains(">8.7</text>"));
        assert!(svg.contains("Fast &amp; cheap"));
    }

    #[test]
    fn comparison_table_should_highlight_winner() {
        let comparison = Comparison {
            competitor: "Wix".into(),
            rows: vec![
                ComparisonRow {
                    criterion: "Price".into(),
                    ours: "$10/mo".into(),
                    theirs: "$17/mo".into(),
                    winner: Winner::Ours,
                },
                ComparisonRow {
                    criterion: "Templates".into(),
                    ours: "120".into(),
                    theirs: "800+".into(),
                    winner: Winner::Theirs,
                },
                ComparisonRow {
                    criterion: "Support".into(),
                    ours: "24/7 chat".into(),
                    theirs: "24/7 chat".into(),
                    winner: Winner::Tie,
                },
            ],
        };
        let table = ComparisonTable::new("10Web", &comparison, "");
        assert!(table.rows[0].ours_wins && !table.rows[0].theirs_wins);
        assert!(table.rows[1].theirs_wins);
        assert!(!table.rows[2].ours_wins && !table.rows[2].theirs_wins);
        assert_eq!(table.rows[1].stripe, STRIPES[1]);

        let svg = table.render().unwrap();
        assert_eq!(svg.matches("class=\"winner\"").count(), 2);
        assert!(svg.contains("10Web vs Wix"));
        assert!(svg.contains("800+"));
    }

    #[test]
    fn px_should_trim() {
        assert_eq!(px(12.0), "12");
        assert_eq!(px(12.34), "12.3");
        assert_eq!(px(-0.01), "0");
    }
}
