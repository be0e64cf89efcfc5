//! Binning of `histogram` traces into bar heights.
//!
//! Numeric samples fall into equal-width bins; anything else is counted per
//! distinct value in order of first appearance. Counts are raw (no `histnorm`).

use serde_json::Value;

use super::{Datum, Trace};

/// Upper bound on the number of bins, whatever `xbins` asks for.
const MAX_BINS: usize = 10_000;

/// Bar positions and heights for one histogram trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    /// Bin centres (numeric) or distinct values (categorical).
    pub positions: Vec<Datum>,
    pub counts: Vec<f64>,
    /// Bin size along the position axis; `None` for categorical bins.
    pub width: Option<f64>,
}

pub fn histogram(trace: &Trace) -> Binned {
    let (samples, nbins, bins) = if trace.is_horizontal() {
        (trace.y.as_ref(), trace.nbinsy, &trace.ybins)
    } else {
        (trace.x.as_ref(), trace.nbinsx, &trace.xbins)
    };
    let samples = samples.map(|v| v.0.as_slice()).unwrap_or_default();

    let present: Vec<&Datum> = samples
        .iter()
        .filter(|d| !matches!(d, Datum::Missing))
        .collect();
    let numbers: Option<Vec<f64>> = present.iter().map(|d| d.as_number()).collect();
    match numbers {
        Some(values) if !values.is_empty() => numeric(&values, nbins, bins),
        _ => categorical(&present),
    }
}

fn numeric(values: &[f64], nbins: Option<f64>, bins: &Bins) -> Binned {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let size = number(bins.size.as_ref())
        .filter(|s| *s > 0.0)
        .unwrap_or_else(|| {
            if hi > lo {
                // Sturges' rule unless the trace asks for a bin count.
                let count = nbins
                    .filter(|n| *n >= 1.0)
                    .unwrap_or_else(|| (values.len() as f64).log2().ceil() + 1.0);
                round_up_nice((hi - lo) / count)
            } else {
                1.0
            }
        });
    let start = number(bins.start.as_ref()).unwrap_or_else(|| {
        if hi > lo {
            (lo / size).floor() * size
        } else {
            lo - size / 2.0
        }
    });
    let end = number(bins.end.as_ref()).unwrap_or(hi);

    let count = (((end - start) / size).floor().max(0.0) as usize + 1).min(MAX_BINS);
    let mut counts = vec![0.0; count];
    for &v in values {
        if v < start || v > end {
            continue;
        }
        let i = ((v - start) / size).floor() as usize;
        if let Some(slot) = counts.get_mut(i) {
            *slot += 1.0;
        }
    }
    // A final empty bin only exists because `end` sits on a boundary.
    if counts.len() > 1 && counts.last() == Some(&0.0) {
        counts.pop();
    }

    Binned {
        positions: (0..counts.len())
            .map(|i| Datum::Number(start + (i as f64 + 0.5) * size))
            .collect(),
        counts,
        width: Some(size),
    }
}

fn categorical(samples: &[&Datum]) -> Binned {
    let mut positions: Vec<Datum> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();
    for d in samples {
        match positions.iter().position(|p| p == *d) {
            Some(i) => counts[i] += 1.0,
            None => {
                positions.push((*d).clone());
                counts.push(1.0);
            }
        }
    }
    Binned {
        positions,
        counts,
        width: None,
    }
}

/// `xbins` / `ybins` settings of a histogram trace.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Bins {
    pub start: Option<Value>,
    pub end: Option<Value>,
    pub size: Option<Value>,
}

fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n: &f64| n.is_finite())
}

/// Smallest 1, 2 or 5 x 10^k not below `raw`.
fn round_up_nice(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}
