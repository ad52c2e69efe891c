use chrono::{LocalResult, TimeZone, Utc};

use crate::api::BlockSummary;
use crate::price::PriceQuote;

/// One named line on a chart, points as (block number, value).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub points: Vec<(u64, f64)>,
}

/// Declarative chart description handed to the terminal renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub x_label: &'static str,
    pub series: Vec<Series>,
}

const BAR_WIDTH: usize = 40;

pub fn transactions_chart(blocks: &[BlockSummary]) -> ChartSpec {
    ChartSpec {
        title: "Transactions per Block",
        x_label: "number",
        series: vec![Series {
            name: "transactions",
            points: blocks
                .iter()
                .map(|b| (b.number, b.transaction_count as f64))
                .collect(),
        }],
    }
}

pub fn gas_chart(blocks: &[BlockSummary]) -> ChartSpec {
    ChartSpec {
        title: "Gas Usage and Limit per Block",
        x_label: "number",
        series: vec![
            Series {
                name: "gas_used",
                points: blocks.iter().map(|b| (b.number, b.gas_used as f64)).collect(),
            },
            Series {
                name: "gas_limit",
                points: blocks.iter().map(|b| (b.number, b.gas_limit as f64)).collect(),
            },
        ],
    }
}

/// Plain-text table of all summary fields, one row per block, fetched order.
pub fn render_table(blocks: &[BlockSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>10}  {:>19}  {:>12}  {:>6}  {:>12}  {:>12}\n",
        "number", "time (UTC)", "timestamp", "txs", "gas_used", "gas_limit"
    ));
    for b in blocks {
        out.push_str(&format!(
            "{:>10}  {:>19}  {:>12}  {:>6}  {:>12}  {:>12}\n",
            b.number,
            format_time(b.timestamp),
            b.timestamp,
            b.transaction_count,
            b.gas_used,
            b.gas_limit
        ));
    }
    out
}

/// Horizontal-bar rendering, one line per point, bars scaled to the
/// largest value across all series of the spec.
pub fn render_chart(spec: &ChartSpec) -> String {
    let max = spec
        .series
        .iter()
        .flat_map(|s| s.points.iter())
        .map(|&(_, y)| y)
        .fold(0.0_f64, f64::max);

    let mut out = format!("{}\n", spec.title);
    for series in &spec.series {
        out.push_str(&format!("  {} by {}\n", series.name, spec.x_label));
        for &(x, y) in &series.points {
            let filled = if max > 0.0 {
                ((y / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "  {:>10} |{:<width$}| {}\n",
                x,
                "#".repeat(filled),
                format_value(y),
                width = BAR_WIDTH
            ));
        }
    }
    out
}

/// Formatted currency metric, two decimals.
pub fn render_price(quote: &PriceQuote) -> String {
    format!("Current ETH Price ({}): ${:.2}", quote.pair, quote.usd)
}

/// Full refresh output: table, both charts, price metric.
pub fn render_refresh(blocks: &[BlockSummary], quote: &PriceQuote) -> String {
    let mut out = format!("Latest {} Blocks\n", blocks.len());
    out.push_str(&render_table(blocks));
    out.push('\n');
    out.push_str(&render_chart(&transactions_chart(blocks)));
    out.push('\n');
    out.push_str(&render_chart(&gas_chart(blocks)));
    out.push('\n');
    out.push_str(&render_price(quote));
    out.push('\n');
    out
}

fn format_time(unix: u64) -> String {
    match Utc.timestamp_opt(unix as i64, 0) {
        LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "-".into(),
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as u64)
    } else {
        format!("{v:.2}")
    }
}
