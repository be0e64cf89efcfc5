//! Drawing a [`Figure`] as an SVG chart in Plotly's default look.
//!
//! Supports `scatter`/`scattergl` (lines and markers) and `bar` traces
//! (vertical or horizontal; grouped, overlaid or stacked) on a single pair of
//! axes, plus `histogram` traces binned into bars. Axes holding non-numeric
//! strings are categorical. Other trace types are skipped with a warning.
//!
//! Text is kept apart from the shapes as [`Label`]s so that it can be emitted
//! either as SVG `<text>` or as HTML laid over the SVG.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::bins::histogram;
use super::{Axis, Datum, Figure, Trace, TraceKind};

/// Plotly's default qualitative colour sequence.
const COLORWAY: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];
const PAPER_BG: &str = "#ffffff";
const PLOT_BG: &str = "#E5ECF6";
const GRID: &str = "#ffffff";
const FONT_COLOR: &str = "#2a3f5f";
const FONT_FAMILY: &str = "'Open Sans', verdana, arial, sans-serif";

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 80.0;
const MARGIN_TOP: f64 = 100.0;
const MARGIN_BOTTOM: f64 = 80.0;

const TARGET_TICKS: f64 = 6.0;
const BAR_GAP: f64 = 0.2;
const AXIS_PAD: f64 = 0.05;
const LEGEND_ROW: f64 = 20.0;

static MARKUP_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex is valid"));
static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("markup tag regex is valid"));

pub(super) fn draw(figure: &Figure, width: u32, height: u32) -> Chart {
    let (w, h) = (width as f64, height as f64);
    let layout = &figure.layout;

    let mut raw = Vec::new();
    for (index, trace) in figure.data.iter().enumerate() {
        let Some(kind) = trace.trace_kind() else {
            warn!(
                "skipping unsupported trace type '{}'",
                trace.kind.as_deref().unwrap_or_default()
            );
            continue;
        };
        if !trace.is_drawn() {
            continue;
        }
        let (xs, ys, band) = match kind {
            TraceKind::Histogram => {
                let binned = histogram(trace);
                let counts: Vec<Datum> =
                    binned.counts.iter().map(|c| Datum::Number(*c)).collect();
                if trace.is_horizontal() {
                    (counts, binned.positions, binned.width)
                } else {
                    (binned.positions, counts, binned.width)
                }
            }
            _ => (trace.x_values(), trace.y_values(), None),
        };
        raw.push((index, trace, kind, xs, ys, band));
    }

    let x_categories = categories(&layout.xaxis, raw.iter().map(|r| &r.3));
    let y_categories = categories(&layout.yaxis, raw.iter().map(|r| &r.4));

    let series: Vec<Series> = raw
        .iter()
        .map(|(index, trace, kind, xs, ys, band)| Series {
            index: *index,
            trace: *trace,
            kind: *kind,
            band: *band,
            xs: xs.iter().map(|d| locate(x_categories.as_deref(), d)).collect(),
            ys: ys.iter().map(|d| locate(y_categories.as_deref(), d)).collect(),
        })
        .collect();

    let barmode = layout.barmode.as_deref().unwrap_or("group");
    let bars = layout_bars(&series, barmode, x_categories.is_some(), y_categories.is_some());

    let mut x_extent = Extent::default();
    let mut y_extent = Extent::default();
    for s in series.iter().filter(|s| s.kind == TraceKind::Scatter) {
        for (x, y) in s.points().flatten() {
            x_extent.point(x);
            y_extent.point(y);
        }
    }
    for bar in &bars {
        let (position, value) = if bar.horizontal {
            (&mut y_extent, &mut x_extent)
        } else {
            (&mut x_extent, &mut y_extent)
        };
        position.bar(bar.center - bar.half);
        position.bar(bar.center + bar.half);
        value.bar(bar.base);
        value.bar(bar.tip);
    }

    let x_scale = Scale::new(x_categories, &x_extent, layout.xaxis.fixed_range());
    let y_scale = Scale::new(y_categories, &y_extent, layout.yaxis.fixed_range());

    let legend: Vec<LegendEntry> = figure
        .data
        .iter()
        .enumerate()
        .filter(|(_, t)| t.in_legend())
        .filter_map(|(i, t)| {
            Some(LegendEntry {
                label: t.name.clone().unwrap_or_else(|| format!("trace {i}")),
                color: trace_color(t, i),
                kind: t.trace_kind()?,
                trace: t,
            })
        })
        .collect();
    let show_legend = !legend.is_empty() && layout.showlegend.unwrap_or(legend.len() > 1);
    let legend_width = legend
        .iter()
        .map(|e| plain_text(&e.label).chars().count())
        .max()
        .unwrap_or(0) as f64
        * 7.0
        + 40.0;

    let margin = &layout.margin;
    let mut margin_right = margin.r.unwrap_or(MARGIN_RIGHT);
    if show_legend {
        margin_right = margin_right.max(legend_width + 20.0);
    }
    let (left, right) = fit_margins(margin.l.unwrap_or(MARGIN_LEFT), margin_right, w);
    let (top, bottom) = fit_margins(
        margin.t.unwrap_or(MARGIN_TOP),
        margin.b.unwrap_or(MARGIN_BOTTOM),
        h,
    );
    let plot = PlotArea {
        left,
        right: w - right,
        top,
        bottom: h - bottom,
    };
    let x_map = Mapping::new(&x_scale, plot.left, plot.right);
    let y_map = Mapping::new(&y_scale, plot.bottom, plot.top);

    let mut svg = Svg::open(w, h);
    svg.rect(0.0, 0.0, w, h, PAPER_BG);
    svg.rect(plot.left, plot.top, plot.width(), plot.height(), PLOT_BG);

    // Grid
    let x_ticks = x_scale.ticks((plot.width() / 40.0).max(1.0) as usize);
    let y_ticks = y_scale.ticks((plot.height() / 20.0).max(1.0) as usize);
    for (v, _) in &x_ticks {
        let x = x_map.px(*v);
        svg.line(x, plot.top, x, plot.bottom, GRID, 1.0);
    }
    for (v, _) in &y_ticks {
        let y = y_map.px(*v);
        svg.line(plot.left, y, plot.right, y, GRID, 1.0);
    }
    if x_scale.has_zero_line() {
        let x = x_map.px(0.0);
        svg.line(x, plot.top, x, plot.bottom, GRID, 2.0);
    }
    if y_scale.has_zero_line() {
        let y = y_map.px(0.0);
        svg.line(plot.left, y, plot.right, y, GRID, 2.0);
    }

    // Traces
    svg.raw(&format!(
        r#"<defs><clipPath id="plot-area"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs><g clip-path="url(#plot-area)">"#,
        plot.left,
        plot.top,
        plot.width(),
        plot.height()
    ));
    for bar in &bars {
        let s = &series[bar.series];
        let color = s
            .trace
            .marker
            .color_at(bar.point)
            .map(str::to_string)
            .unwrap_or_else(|| trace_color(s.trace, s.index));
        let (x0, x1, y0, y1) = if bar.horizontal {
            (
                x_map.px(bar.base),
                x_map.px(bar.tip),
                y_map.px(bar.center - bar.half),
                y_map.px(bar.center + bar.half),
            )
        } else {
            (
                x_map.px(bar.center - bar.half),
                x_map.px(bar.center + bar.half),
                y_map.px(bar.base),
                y_map.px(bar.tip),
            )
        };
        svg.rect(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs(), &color);
    }
    for s in series.iter().filter(|s| s.kind == TraceKind::Scatter) {
        draw_scatter(&mut svg, s, &x_map, &y_map);
    }
    svg.raw("</g>");

    // Tick labels
    for (v, label) in &x_ticks {
        svg.text(x_map.px(*v), plot.bottom + 18.0, 12.0, Anchor::Middle, label);
    }
    for (v, label) in &y_ticks {
        svg.text(plot.left - 6.0, y_map.px(*v) + 4.0, 12.0, Anchor::End, label);
    }

    // Titles
    if let Some(text) = layout.xaxis.title.as_ref().and_then(|t| t.text()) {
        let y = (plot.bottom + 45.0).min(h - 4.0);
        svg.text((plot.left + plot.right) / 2.0, y, 14.0, Anchor::Middle, text);
    }
    if let Some(text) = layout.yaxis.title.as_ref().and_then(|t| t.text()) {
        let x = (plot.left - 55.0).max(14.0);
        let y = (plot.top + plot.bottom) / 2.0;
        svg.vertical_text(x, y, 14.0, text);
    }
    if let Some(text) = layout.title.as_ref().and_then(|t| t.text()) {
        svg.text(w * 0.05, (top / 2.0).max(17.0), 17.0, Anchor::Start, text);
    }

    if show_legend {
        draw_legend(&mut svg, &legend, plot.right + 20.0, plot.top + 10.0);
    }

    svg.finish()
}

/// A drawable trace with coordinates resolved to axis units.
struct Series<'a> {
    index: usize,
    trace: &'a Trace,
    kind: TraceKind,
    /// Fixed bar width along the position axis (histogram bin size).
    band: Option<f64>,
    xs: Vec<Option<f64>>,
    ys: Vec<Option<f64>>,
}

impl Series<'_> {
    /// Points paired by index; `None` where either coordinate is missing.
    fn points(&self) -> impl Iterator<Item = Option<(f64, f64)>> + '_ {
        self.xs
            .iter()
            .zip(&self.ys)
            .map(|(x, y)| Some(((*x)?, (*y)?)))
    }
}

/// One bar in axis units: `center`/`half` along the category axis,
/// `base`/`tip` along the value axis.
struct Bar {
    series: usize,
    point: usize,
    horizontal: bool,
    center: f64,
    half: f64,
    base: f64,
    tip: f64,
}

fn layout_bars(series: &[Series], barmode: &str, x_category: bool, y_category: bool) -> Vec<Bar> {
    let stacked = matches!(barmode, "stack" | "relative");
    let grouped = !stacked && barmode != "overlay";
    let mut bars = Vec::new();

    for horizontal in [false, true] {
        let group: Vec<usize> = series
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind.is_bar() && s.trace.is_horizontal() == horizontal)
            .map(|(i, _)| i)
            .collect();
        if group.is_empty() {
            continue;
        }

        let categorical = if horizontal { y_category } else { x_category };
        let fixed_band = group
            .iter()
            .filter_map(|&i| series[i].band)
            .fold(None, |acc: Option<f64>, b| Some(acc.map_or(b, |a| a.min(b))));
        let spacing = if categorical {
            1.0
        } else if let Some(band) = fixed_band {
            band
        } else {
            let mut positions: Vec<f64> = group
                .iter()
                .flat_map(|&i| series[i].points().flatten())
                .map(|(x, y)| if horizontal { y } else { x })
                .collect();
            min_spacing(&mut positions)
        };
        // Histogram bins touch.
        let gap = if group.iter().all(|&i| series[i].kind == TraceKind::Histogram) {
            0.0
        } else {
            BAR_GAP
        };
        let band = spacing * (1.0 - gap);
        let n = group.len() as f64;
        let mut stacks: HashMap<(u64, bool), f64> = HashMap::new();

        for (k, &i) in group.iter().enumerate() {
            let (half, offset) = if grouped {
                (band / n / 2.0, -band / 2.0 + (k as f64 + 0.5) * band / n)
            } else {
                (band / 2.0, 0.0)
            };
            for (point, xy) in series[i].points().enumerate() {
                let Some((x, y)) = xy else { continue };
                let (position, value) = if horizontal { (y, x) } else { (x, y) };
                let base = if stacked {
                    let top = stacks.entry((position.to_bits(), value >= 0.0)).or_insert(0.0);
                    let base = *top;
                    *top += value;
                    base
                } else {
                    0.0
                };
                bars.push(Bar {
                    series: i,
                    point,
                    horizontal,
                    center: position + offset,
                    half,
                    base,
                    tip: base + value,
                });
            }
        }
    }
    bars
}

/// Smallest gap between distinct positions, or 1 when there is none.
fn min_spacing(positions: &mut [f64]) -> f64 {
    positions.sort_by(f64::total_cmp);
    positions
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or(1.0)
}

fn draw_scatter(svg: &mut Svg, s: &Series, x_map: &Mapping, y_map: &Mapping) {
    let color = trace_color(s.trace, s.index);
    let pixels: Vec<Option<(f64, f64)>> = s
        .points()
        .map(|p| p.map(|(x, y)| (x_map.px(x), y_map.px(y))))
        .collect();

    if s.trace.shows_lines() {
        let width = s.trace.line.width.unwrap_or(2.0);
        let dash = s.trace.line.dash.as_deref().and_then(dash_array);
        let line_color = s.trace.line.color.clone().unwrap_or_else(|| color.clone());
        // Missing points break the line.
        for run in pixels.split(Option::is_none) {
            if run.len() < 2 {
                continue;
            }
            let d = run
                .iter()
                .flatten()
                .enumerate()
                .map(|(i, (x, y))| format!("{}{x:.2},{y:.2}", if i == 0 { "M" } else { "L" }))
                .collect::<Vec<_>>()
                .join(" ");
            svg.path(&d, &line_color, width, dash);
        }
    }

    if s.trace.shows_markers() {
        for (i, (x, y)) in pixels
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
        {
            let fill = s.trace.marker.color_at(i).unwrap_or(color.as_str());
            let radius = s.trace.marker.size_at(i).unwrap_or(6.0) / 2.0;
            svg.circle(x, y, radius, fill);
        }
    }
}

fn dash_array(dash: &str) -> Option<&'static str> {
    match dash {
        "dash" => Some("9,9"),
        "dot" => Some("3,3"),
        "dashdot" => Some("9,3,3,3"),
        "longdash" => Some("15,5"),
        "longdashdot" => Some("15,5,3,5"),
        _ => None,
    }
}

struct LegendEntry<'a> {
    label: String,
    color: String,
    kind: TraceKind,
    trace: &'a Trace,
}

fn draw_legend(svg: &mut Svg, entries: &[LegendEntry], x: f64, y: f64) {
    for (row, entry) in entries.iter().enumerate() {
        let cy = y + row as f64 * LEGEND_ROW;
        match entry.kind {
            TraceKind::Bar | TraceKind::Histogram => {
                svg.rect(x + 8.0, cy - 6.0, 14.0, 12.0, &entry.color)
            }
            TraceKind::Scatter => {
                if entry.trace.shows_lines() {
                    svg.path(
                        &format!("M{x:.2},{cy:.2} L{:.2},{cy:.2}", x + 30.0),
                        &entry.color,
                        2.0,
                        None,
                    );
                }
                if entry.trace.shows_markers() {
                    svg.circle(x + 15.0, cy, 3.0, &entry.color);
                }
            }
        }
        svg.text(x + 40.0, cy + 4.0, 12.0, Anchor::Start, &entry.label);
    }
}

fn trace_color(trace: &Trace, index: usize) -> String {
    let explicit = match trace.trace_kind() {
        Some(TraceKind::Scatter) => trace
            .line
            .color
            .as_deref()
            .or_else(|| single_color(trace)),
        _ => single_color(trace),
    };
    explicit
        .unwrap_or(COLORWAY[index % COLORWAY.len()])
        .to_string()
}

fn single_color(trace: &Trace) -> Option<&str> {
    trace.marker.color.as_ref().and_then(|c| c.as_str())
}

/// Category labels in order of first appearance, if the axis is categorical.
fn categories<'a>(
    axis: &Axis,
    columns: impl Iterator<Item = &'a Vec<Datum>> + Clone,
) -> Option<Vec<String>> {
    let textual = columns
        .clone()
        .flatten()
        .any(|d| matches!(d, Datum::Text(_)) && d.as_number().is_none());
    if !axis.is_category() && !textual {
        return None;
    }
    let mut labels: Vec<String> = Vec::new();
    for key in columns.flatten().filter_map(category_key) {
        if !labels.contains(&key) {
            labels.push(key);
        }
    }
    Some(labels)
}

fn category_key(d: &Datum) -> Option<String> {
    match d {
        Datum::Number(n) => Some(format_plain(*n)),
        Datum::Text(s) => Some(s.clone()),
        Datum::Missing => None,
    }
}

fn locate(categories: Option<&[String]>, d: &Datum) -> Option<f64> {
    match categories {
        Some(labels) => {
            let key = category_key(d)?;
            labels.iter().position(|l| *l == key).map(|i| i as f64)
        }
        None => d.as_number(),
    }
}

/// Data extents seen along one axis.
#[derive(Default)]
struct Extent {
    points: Option<(f64, f64)>,
    bars: Option<(f64, f64)>,
}

impl Extent {
    fn point(&mut self, v: f64) {
        widen(&mut self.points, v);
    }

    fn bar(&mut self, v: f64) {
        widen(&mut self.bars, v);
    }
}

fn widen(slot: &mut Option<(f64, f64)>, v: f64) {
    *slot = Some(match *slot {
        Some((lo, hi)) => (lo.min(v), hi.max(v)),
        None => (v, v),
    });
}

enum Scale {
    Linear { lo: f64, hi: f64 },
    Category { labels: Vec<String>, lo: f64, hi: f64 },
}

impl Scale {
    fn new(categories: Option<Vec<String>>, extent: &Extent, fixed: Option<(f64, f64)>) -> Self {
        match categories {
            Some(labels) => {
                let (lo, hi) = fixed.unwrap_or((-0.5, labels.len().max(1) as f64 - 0.5));
                Scale::Category { labels, lo, hi }
            }
            None => {
                let (lo, hi) = fixed.unwrap_or_else(|| auto_range(extent));
                Scale::Linear { lo, hi }
            }
        }
    }

    fn bounds(&self) -> (f64, f64) {
        match self {
            Scale::Linear { lo, hi } | Scale::Category { lo, hi, .. } => (*lo, *hi),
        }
    }

    fn has_zero_line(&self) -> bool {
        match self {
            Scale::Linear { lo, hi } => lo.min(*hi) < 0.0 && lo.max(*hi) > 0.0,
            Scale::Category { .. } => false,
        }
    }

    fn ticks(&self, max_labels: usize) -> Vec<(f64, String)> {
        match self {
            Scale::Linear { lo, hi } => {
                let (lo, hi) = (lo.min(*hi), lo.max(*hi));
                let step = nice_step(hi - lo);
                let first = (lo / step).ceil() as i64;
                let last = (hi / step).floor() as i64;
                (first..=last)
                    .map(|i| {
                        let v = i as f64 * step;
                        (v, tick_label(v, step))
                    })
                    .collect()
            }
            Scale::Category { labels, lo, hi } => {
                let every = labels.len().div_ceil(max_labels.max(1)).max(1);
                labels
                    .iter()
                    .enumerate()
                    .step_by(every)
                    .map(|(i, label)| (i as f64, label.clone()))
                    .filter(|(v, _)| *v >= lo.min(*hi) && *v <= lo.max(*hi))
                    .collect()
            }
        }
    }
}

fn auto_range(extent: &Extent) -> (f64, f64) {
    let (lo, hi) = match (extent.points, extent.bars) {
        (None, None) => return (0.0, 1.0),
        (Some(p), None) | (None, Some(p)) => p,
        (Some(p), Some(b)) => (p.0.min(b.0), p.1.max(b.1)),
    };
    if hi - lo <= 0.0 {
        return (lo - 1.0, hi + 1.0);
    }
    // Bars sit flush against the axis; markers get breathing room.
    let pad = (hi - lo) * AXIS_PAD;
    let bar_lo = extent.bars.map(|b| b.0);
    let bar_hi = extent.bars.map(|b| b.1);
    let lo = if bar_lo == Some(lo) { lo } else { lo - pad };
    let hi = if bar_hi == Some(hi) { hi } else { hi + pad };
    (lo, hi)
}

/// A 1, 2 or 5 x 10^k step giving roughly [`TARGET_TICKS`] ticks over `span`.
fn nice_step(span: f64) -> f64 {
    let raw = span / TARGET_TICKS;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let nice = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn tick_label(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    let value = if value.abs() < step * 1e-6 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

fn format_plain(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Shrink a pair of margins so they leave at least a fifth of `total` for the plot.
fn fit_margins(a: f64, b: f64, total: f64) -> (f64, f64) {
    let (a, b) = (a.max(0.0), b.max(0.0));
    let budget = total * 0.8;
    if a + b > budget && a + b > 0.0 {
        let k = budget / (a + b);
        (a * k, b * k)
    } else {
        (a, b)
    }
}

struct PlotArea {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl PlotArea {
    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Linear map from axis units to pixels.
struct Mapping {
    lo: f64,
    hi: f64,
    from: f64,
    to: f64,
}

impl Mapping {
    fn new(scale: &Scale, from: f64, to: f64) -> Self {
        let (lo, hi) = scale.bounds();
        Self { lo, hi, from, to }
    }

    fn px(&self, v: f64) -> f64 {
        self.from + (v - self.lo) / (self.hi - self.lo) * (self.to - self.from)
    }
}

/// Strip Plotly's inline text markup (`<b>`, `<br>`, ...).
fn plain_text(text: &str) -> String {
    let text = MARKUP_BREAK.replace_all(text, " ");
    MARKUP_TAG.replace_all(&text, "").into_owned()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

struct Svg {
    width: f64,
    height: f64,
    out: String,
    labels: Vec<Label>,
}

impl Svg {
    fn open(w: f64, h: f64) -> Self {
        Self {
            width: w,
            height: h,
            out: format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}">"#,
                escape(FONT_FAMILY)
            ),
            labels: Vec::new(),
        }
    }

    fn raw(&mut self, markup: &str) {
        self.out.push_str(markup);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.out.push_str(&format!(
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{}"/>"#,
            escape(fill)
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.out.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{}" stroke-width="{width}"/>"#,
            escape(stroke)
        ));
    }

    fn path(&mut self, d: &str, stroke: &str, width: f64, dash: Option<&str>) {
        let dash = dash
            .map(|d| format!(r#" stroke-dasharray="{d}""#))
            .unwrap_or_default();
        self.out.push_str(&format!(
            r#"<path d="{d}" fill="none" stroke="{}" stroke-width="{width}" stroke-linejoin="round"{dash}/>"#,
            escape(stroke)
        ));
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.out.push_str(&format!(
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{}"/>"#,
            escape(fill)
        ));
    }

    /// Queue a text run whose baseline starts, is centred or ends at `(x, y)`.
    fn text(&mut self, x: f64, y: f64, size: f64, anchor: Anchor, content: &str) {
        self.push_label(x, y, size, anchor, false, content);
    }

    /// Queue a text run rotated a quarter turn counter-clockwise, centred on `(x, y)`.
    fn vertical_text(&mut self, x: f64, y: f64, size: f64, content: &str) {
        self.push_label(x, y, size, Anchor::Middle, true, content);
    }

    fn push_label(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        anchor: Anchor,
        vertical: bool,
        content: &str,
    ) {
        let text = plain_text(content);
        if text.trim().is_empty() {
            return;
        }
        self.labels.push(Label {
            x,
            y,
            size,
            anchor,
            vertical,
            text,
        });
    }

    fn finish(self) -> Chart {
        Chart {
            width: self.width,
            height: self.height,
            shapes: self.out,
            labels: self.labels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Anchor {
    Start,
    Middle,
    End,
}

/// One run of chart text, markup already stripped.
#[derive(Debug, Clone)]
pub(super) struct Label {
    x: f64,
    y: f64,
    size: f64,
    anchor: Anchor,
    vertical: bool,
    text: String,
}

impl Label {
    fn svg(&self) -> String {
        let anchor = match self.anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let (x, y) = (self.x, self.y);
        let rotate = if self.vertical {
            format!(r#" transform="rotate(-90 {x:.2} {y:.2})""#)
        } else {
            String::new()
        };
        format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-size="{}" fill="{FONT_COLOR}" text-anchor="{anchor}"{rotate}>{}</text>"#,
            self.size,
            escape(&self.text)
        )
    }

    /// An absolutely positioned block whose text lands where [`Label::svg`] puts it.
    ///
    /// The block is `reach` wide so centred and right-aligned runs can be
    /// placed with `text-align` alone.
    fn html(&self, reach: f64) -> String {
        let (left, align) = match self.anchor {
            Anchor::Start => (self.x, "left"),
            Anchor::Middle => (self.x - reach / 2.0, "center"),
            Anchor::End => (self.x - reach, "right"),
        };
        // With line-height 1 the baseline sits about 0.8em below the top.
        let (top, rotate) = if self.vertical {
            (self.y - self.size / 2.0, " transform: rotate(-90deg);")
        } else {
            (self.y - self.size * 0.8, "")
        };
        format!(
            r#"<div style="position: absolute; left: {left:.2}px; top: {top:.2}px; width: {reach:.2}px; height: {size}px; font-size: {size}px; line-height: 1; white-space: nowrap; text-align: {align}; color: {FONT_COLOR};{rotate}">{}</div>"#,
            escape(&self.text),
            size = self.size,
        )
    }
}

/// A drawn figure: SVG shapes plus the text runs that go on top of them.
#[derive(Debug, Clone)]
pub(super) struct Chart {
    width: f64,
    height: f64,
    /// Opened `<svg>` element holding every shape, without its closing tag.
    shapes: String,
    labels: Vec<Label>,
}

impl Chart {
    /// A standalone SVG document with the text as `<text>` elements.
    pub(super) fn to_svg(&self) -> String {
        let mut out = self.shapes.clone();
        for label in &self.labels {
            out.push_str(&label.svg());
        }
        out.push_str("</svg>");
        out
    }

    /// An HTML fragment: the shapes as inline SVG with the text laid over it
    /// as positioned HTML blocks, which Blitz shapes and paints itself.
    pub(super) fn to_html(&self) -> String {
        let (w, h) = (self.width, self.height);
        let mut out = format!(
            r#"<div class="chart" style="position: relative; width: {w}px; height: {h}px; font-family: {FONT_FAMILY};">"#
        );
        out.push_str(&self.shapes);
        out.push_str("</svg>");
        for label in &self.labels {
            out.push_str(&label.html(w * 2.0));
        }
        out.push_str("</div>");
        out
    }
}
