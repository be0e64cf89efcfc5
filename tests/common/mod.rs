//! Shared fixtures for integration tests.

#![allow(dead_code)]

/// PNG header magic bytes
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A chart document shaped like Plotly's `write_html` output.
pub fn chart_document(data: &str, layout: &str) -> String {
    let id = "5c1e8a2e-0d2b-4d1e-9a57-3f1f0c9d7b21";
    format!(
        r#"<html>
<head><meta charset="utf-8" /></head>
<body>
    <div>                        <script type="text/javascript">window.PlotlyConfig = {{MathJaxConfig: 'local'}};</script>
        <script charset="utf-8" src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>                <div id="{id}" class="plotly-graph-div" style="height:100%; width:100%;"></div>            <script type="text/javascript">                                    window.PLOTLYENV=window.PLOTLYENV || {{}};                                    if (document.getElementById("{id}")) {{                    Plotly.newPlot(                        "{id}",                        {data},                        {layout},                        {{"responsive": true}}                    )                }};                            </script>        </div>
</body>
</html>"#
    )
}

/// A small line chart document.
pub fn line_chart() -> String {
    chart_document(
        r#"[{"mode":"lines+markers","name":"loss","x":[1,2,3,4],"y":[0.9,0.5,0.3,0.2],"type":"scatter"}]"#,
        r#"{"title":{"text":"Training loss"},"xaxis":{"title":{"text":"epoch"}},"yaxis":{"title":{"text":"loss"}}}"#,
    )
}

/// Parse PNG dimensions from the IHDR chunk.
/// Returns (width, height) or None if parsing fails.
pub fn parse_png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // 8-byte signature, then IHDR: 4-byte length, 4-byte type, width, height
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

#[cfg(feature = "png")]
use std::ops::Range;

/// A decoded RGBA image.
#[cfg(feature = "png")]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[cfg(feature = "png")]
impl Pixels {
    pub fn at(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }

    /// Pixels in rows `rows` whose RGB is within `tolerance` of `color` on every channel.
    pub fn count_near(&self, color: [u8; 3], tolerance: u8, rows: Range<u32>) -> usize {
        rows.flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let p = self.at(x, y);
                (0..3).all(|c| p[c].abs_diff(color[c]) <= tolerance)
            })
            .count()
    }

    pub fn count_color(&self, color: [u8; 3], tolerance: u8) -> usize {
        self.count_near(color, tolerance, 0..self.height)
    }
}

/// Decode an 8-bit RGBA PNG.
#[cfg(feature = "png")]
pub fn decode_png(data: &[u8]) -> Pixels {
    let decoder = png::Decoder::new(data);
    let mut reader = decoder.read_info().expect("PNG header should decode");
    let mut rgba = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut rgba).expect("PNG frame should decode");
    assert_eq!(info.color_type, png::ColorType::Rgba);
    assert_eq!(info.bit_depth, png::BitDepth::Eight);
    rgba.truncate(info.buffer_size());
    Pixels {
        width: info.width,
        height: info.height,
        rgba,
    }
}
