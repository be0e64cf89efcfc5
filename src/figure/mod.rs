//! In-memory figure model reconstructed from Plotly chart documents.
//!
//! A chart document embeds its figure as the arguments of a
//! `Plotly.newPlot(target, data, layout, config)` call. [`Figure::from_html`]
//! recovers `data` and `layout` and deserializes the parts that matter for
//! drawing a static image; everything else in the JSON is ignored.

mod bins;
mod extract;
mod svg;

pub use bins::Bins;
pub use extract::has_figure_marker;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// A chart: a list of traces drawn over a shared layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Reconstruct a figure from the full text of a chart document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FigureNotFound`] if the document contains no
    /// `Plotly.newPlot` call, and [`Error::FigureParse`] if every call found
    /// carries malformed figure JSON.
    pub fn from_html(html: &str) -> Result<Self> {
        extract::figure_from_html(html)
    }

    /// Build a figure from already-parsed `data` and `layout` values.
    pub fn from_json(data: Value, layout: Value) -> Result<Self> {
        let data: Vec<Trace> = serde_json::from_value(data)
            .map_err(|e| Error::FigureParse(format!("data: {e}")))?;
        let layout: Layout = match layout {
            Value::Null => Layout::default(),
            other => serde_json::from_value(other)
                .map_err(|e| Error::FigureParse(format!("layout: {e}")))?,
        };
        Ok(Self { data, layout })
    }

    /// Draw the figure as a standalone SVG document.
    pub fn to_svg(&self, width: u32, height: u32) -> String {
        svg::draw(self, width, height).to_svg()
    }

    /// Draw the figure as an HTML fragment: shapes in an inline SVG, text
    /// in absolutely positioned blocks laid over it.
    pub fn to_html(&self, width: u32, height: u32) -> String {
        svg::draw(self, width, height).to_html()
    }

    /// Check that the figure has something to draw.
    ///
    /// A figure without traces is fine (it renders as empty axes), but one
    /// whose traces are all of unsupported types would export as a blank
    /// chart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFigure`] naming the trace types found.
    pub fn ensure_drawable(&self) -> Result<()> {
        if self.data.is_empty() || self.data.iter().any(|t| t.trace_kind().is_some()) {
            return Ok(());
        }
        let mut kinds: Vec<String> = self
            .data
            .iter()
            .filter_map(|t| t.kind.clone())
            .collect();
        kinds.sort();
        kinds.dedup();
        Err(Error::UnsupportedFigure { kinds })
    }
}

/// One trace of a figure (`scatter`, `bar`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Trace {
    /// Plotly trace type; `None` means `scatter`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub x: Option<Values>,
    pub y: Option<Values>,
    pub mode: Option<String>,
    pub orientation: Option<String>,
    pub marker: Marker,
    pub line: Line,
    pub showlegend: Option<bool>,
    /// `true`, `false` or `"legendonly"`.
    pub visible: Option<Value>,
    pub nbinsx: Option<f64>,
    pub nbinsy: Option<f64>,
    pub xbins: Bins,
    pub ybins: Bins,
}

/// Trace kinds that can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Scatter,
    Bar,
    Histogram,
}

impl TraceKind {
    /// Whether the trace is drawn as bars.
    pub fn is_bar(self) -> bool {
        matches!(self, TraceKind::Bar | TraceKind::Histogram)
    }
}

impl Trace {
    pub fn trace_kind(&self) -> Option<TraceKind> {
        match self.kind.as_deref() {
            None | Some("scatter") | Some("scattergl") => Some(TraceKind::Scatter),
            Some("bar") => Some(TraceKind::Bar),
            Some("histogram") => Some(TraceKind::Histogram),
            Some(_) => None,
        }
    }

    /// Whether the trace should be painted (hidden and legend-only traces are not).
    pub fn is_drawn(&self) -> bool {
        !matches!(self.visible, Some(Value::Bool(false)) | Some(Value::String(_)))
    }

    /// Whether the trace is listed in the legend.
    pub fn in_legend(&self) -> bool {
        self.showlegend != Some(false) && !matches!(self.visible, Some(Value::Bool(false)))
    }

    /// Horizontal bars; a histogram given only `y` samples bins along y.
    pub fn is_horizontal(&self) -> bool {
        match self.orientation.as_deref() {
            Some(o) => o == "h",
            None => {
                self.trace_kind() == Some(TraceKind::Histogram)
                    && self.x.is_none()
                    && self.y.is_some()
            }
        }
    }

    pub fn shows_lines(&self) -> bool {
        self.mode.as_deref().map_or(true, |m| m.contains("lines"))
    }

    pub fn shows_markers(&self) -> bool {
        self.mode.as_deref().map_or(true, |m| m.contains("markers"))
    }

    /// Values along x, defaulting to point indices when absent.
    pub fn x_values(&self) -> Vec<Datum> {
        Self::or_indices(self.x.as_ref(), self.y.as_ref())
    }

    /// Values along y, defaulting to point indices when absent.
    pub fn y_values(&self) -> Vec<Datum> {
        Self::or_indices(self.y.as_ref(), self.x.as_ref())
    }

    fn or_indices(values: Option<&Values>, other: Option<&Values>) -> Vec<Datum> {
        match (values, other) {
            (Some(v), _) => v.0.clone(),
            (None, Some(o)) => (0..o.0.len()).map(|i| Datum::Number(i as f64)).collect(),
            (None, None) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Marker {
    /// A single color or one color per point.
    pub color: Option<Value>,
    /// A single diameter or one diameter per point.
    pub size: Option<Value>,
}

impl Marker {
    pub fn color_at(&self, index: usize) -> Option<&str> {
        per_point(self.color.as_ref(), index).and_then(Value::as_str)
    }

    pub fn size_at(&self, index: usize) -> Option<f64> {
        per_point(self.size.as_ref(), index).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Line {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub dash: Option<String>,
}

fn per_point(value: Option<&Value>, index: usize) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.get(index),
        other => Some(other),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub title: Option<Title>,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub showlegend: Option<bool>,
    pub margin: Margin,
    /// `group` (default), `overlay`, `stack` or `relative`.
    pub barmode: Option<String>,
}

/// Titles are either a bare string or an object with a `text` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Title {
    Plain(String),
    Styled { text: Option<String> },
}

impl Title {
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            Title::Plain(text) => Some(text.as_str()),
            Title::Styled { text } => text.as_deref(),
        };
        text.filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Axis {
    pub title: Option<Title>,
    pub range: Option<Vec<Value>>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Axis {
    /// An explicit numeric `[min, max]` range, if the layout sets one.
    pub fn fixed_range(&self) -> Option<(f64, f64)> {
        match self.range.as_deref()? {
            [lo, hi] => {
                let (lo, hi) = (lo.as_f64()?, hi.as_f64()?);
                (lo.is_finite() && hi.is_finite() && lo != hi).then_some((lo, hi))
            }
            _ => None,
        }
    }

    pub fn is_category(&self) -> bool {
        self.kind.as_deref() == Some("category")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub l: Option<f64>,
    pub r: Option<f64>,
    pub t: Option<f64>,
    pub b: Option<f64>,
}

/// A single coordinate of a trace.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Number(f64),
    Text(String),
    Missing,
}

impl Datum {
    /// Numeric value, parsing numeric strings the way Plotly's axis
    /// auto-typing does. Non-finite numbers count as missing.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Datum::Number(n) => Some(*n),
            Datum::Text(s) => s.trim().parse::<f64>().ok(),
            Datum::Missing => None,
        };
        n.filter(|n| n.is_finite())
    }
}

/// An array of coordinates, decoded from either a plain JSON array or
/// Plotly's typed-array encoding (`{"dtype": "f8", "bdata": "..."}`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(pub Vec<Datum>);

impl Values {
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Array(items) => Ok(Values(items.iter().map(datum).collect())),
            Value::Object(map) => {
                let dtype = map.get("dtype").and_then(Value::as_str);
                let bdata = map.get("bdata").and_then(Value::as_str);
                match (dtype, bdata) {
                    (Some(dtype), Some(bdata)) => decode_typed_array(dtype, bdata).map(Values),
                    _ => Err("expected an array or a typed array".to_string()),
                }
            }
            Value::Null => Ok(Values::default()),
            other => Err(format!("expected an array of values, got {other}")),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Values::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn datum(value: &Value) -> Datum {
    match value {
        Value::Number(n) => n.as_f64().map_or(Datum::Missing, Datum::Number),
        Value::String(s) => Datum::Text(s.clone()),
        Value::Bool(b) => Datum::Text(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Datum::Missing,
    }
}

fn decode_typed_array(dtype: &str, bdata: &str) -> std::result::Result<Vec<Datum>, String> {
    let bytes = STANDARD
        .decode(bdata)
        .map_err(|e| format!("invalid bdata: {e}"))?;
    let width = match dtype {
        "f8" => 8,
        "f4" | "i4" | "u4" => 4,
        "i2" | "u2" => 2,
        "i1" | "u1" => 1,
        other => return Err(format!("unsupported dtype '{other}'")),
    };
    if bytes.len() % width != 0 {
        return Err(format!(
            "bdata length {} is not a multiple of {width} for dtype '{dtype}'",
            bytes.len()
        ));
    }

    let values = bytes.chunks_exact(width).map(|c| {
        let n = match dtype {
            "f8" => f64::from_le_bytes(le(c)),
            "f4" => f32::from_le_bytes(le(c)) as f64,
            "i4" => i32::from_le_bytes(le(c)) as f64,
            "u4" => u32::from_le_bytes(le(c)) as f64,
            "i2" => i16::from_le_bytes(le(c)) as f64,
            "u2" => u16::from_le_bytes(le(c)) as f64,
            "i1" => c[0] as i8 as f64,
            _ => c[0] as f64,
        };
        if n.is_finite() {
            Datum::Number(n)
        } else {
            Datum::Missing
        }
    });
    Ok(values.collect())
}

fn le<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(chunk);
    buf
}
