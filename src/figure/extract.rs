//! Locating the figure description inside a chart document.

use blitz_dom::{BaseDocument, DocumentConfig, Node};
use blitz_html::HtmlDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::Figure;
use crate::error::{Error, Result};

const NEW_PLOT: &str = "Plotly.newPlot(";

/// Data array followed by a layout object, as written by Plotly's HTML export.
static FIGURE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Plotly\.newPlot\([^,]+,\s*(\[.*?\]),\s*(\{.*?\})")
        .expect("figure marker regex is valid")
});

/// Quick check for a `Plotly.newPlot(target, [...], {...})` call.
///
/// Only a pre-flight signal: a document can pass this check and still fail
/// reconstruction, and the captured text is never used as figure data.
pub fn has_figure_marker(html: &str) -> bool {
    FIGURE_MARKER.is_match(html)
}

pub(super) fn figure_from_html(html: &str) -> Result<Figure> {
    let scripts = script_sources(html);
    let mut sources: Vec<&str> = scripts
        .iter()
        .map(String::as_str)
        .filter(|s| s.contains(NEW_PLOT))
        .collect();
    if sources.is_empty() {
        debug!("no <script> element calls Plotly.newPlot; scanning raw document");
        sources.push(html);
    }

    let mut last_error = None;
    for source in sources {
        for (offset, _) in source.match_indices(NEW_PLOT) {
            match parse_call(&source[offset + NEW_PLOT.len()..]) {
                Ok(figure) => {
                    debug!(traces = figure.data.len(), "reconstructed figure");
                    return Ok(figure);
                }
                Err(e) => {
                    // The inlined plotly.js bundle mentions newPlot too.
                    debug!("skipping Plotly.newPlot call at byte {offset}: {e}");
                    last_error = Some(e);
                }
            }
        }
    }
    Err(last_error.unwrap_or(Error::FigureNotFound))
}

/// Text of every `<script>` element, in document order.
fn script_sources(html: &str) -> Vec<String> {
    let document = HtmlDocument::from_html(html, DocumentConfig::default());
    let doc: &BaseDocument = document.as_ref();
    let mut scripts = Vec::new();
    collect_scripts(doc, doc.root_element(), &mut scripts);
    scripts
}

fn collect_scripts(doc: &BaseDocument, node: &Node, out: &mut Vec<String>) {
    if let Some(element) = node.element_data() {
        if &*element.name.local == "script" {
            out.push(node.text_content());
            return;
        }
    }
    for child_id in node.children.iter() {
        if let Some(child) = doc.get_node(*child_id) {
            collect_scripts(doc, child, out);
        }
    }
}

/// Parse the arguments following `Plotly.newPlot(`.
fn parse_call(args: &str) -> Result<Figure> {
    let rest = skip_target(args)
        .ok_or_else(|| Error::FigureParse("missing plot target argument".to_string()))?;
    let (data, rest) = parse_json_prefix(rest)?;
    if !data.is_array() {
        return Err(Error::FigureParse("figure data is not a list of traces".to_string()));
    }

    let rest = rest.trim_start();
    let layout = match rest.strip_prefix(',') {
        Some(rest) if rest.trim_start().starts_with('{') => parse_json_prefix(rest)?.0,
        _ => Value::Null,
    };
    Figure::from_json(data, layout)
}

/// Skip the first call argument (the target element id) and its comma.
fn skip_target(args: &str) -> Option<&str> {
    let args = args.trim_start();
    let mut chars = args.char_indices();
    let end = match chars.next()? {
        (_, quote @ ('"' | '\'')) => {
            let mut escaped = false;
            let mut close = None;
            for (i, c) in chars {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    c if c == quote => {
                        close = Some(i + c.len_utf8());
                        break;
                    }
                    _ => {}
                }
            }
            close?
        }
        _ => args.find(',')?,
    };
    args[end..].trim_start().strip_prefix(',')
}

/// Parse one JSON value from the start of `text`, returning it and the remainder.
fn parse_json_prefix(text: &str) -> Result<(Value, &str)> {
    let text = text.trim_start();
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok((value, &text[stream.byte_offset()..])),
        Some(Err(e)) => Err(Error::FigureParse(e.to_string())),
        None => Err(Error::FigureParse("unexpected end of document".to_string())),
    }
}
