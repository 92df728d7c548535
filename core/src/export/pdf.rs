use std::io::Write;

use super::{ExportError, ReportData};

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const LEFT_MARGIN: u32 = 100;
const TOP_LINE: i32 = 750;
const BODY_TOP: i32 = 700;
const LINE_STEP: i32 = 20;
const BOTTOM_MARGIN: i32 = 50;
const FONT_SIZE: u32 = 12;

/// One line of report text at a fixed baseline.
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    y: i32,
    text: String,
}

/// Lays the report out top-down: title and timestamp at the head of the first
/// page, the body from `BODY_TOP`, a new page at the bottom margin.
fn layout(data: &ReportData<'_>) -> Vec<Vec<Placed>> {
    let mut first = vec![
        Placed {
            y: TOP_LINE,
            text: "WiFiMapper Network Analysis Report".to_string(),
        },
        Placed {
            y: TOP_LINE - LINE_STEP,
            text: format!("Generated: {}", data.generated_at),
        },
    ];

    let mut lines = Vec::new();
    for network in data.observations {
        lines.push(format!("SSID: {}", network.ssid));
        lines.push(format!("RSSI: {} dBm", network.rssi));
        lines.push(format!("Channel: {}", network.channel));
        lines.push(format!("SNR: {} dB", network.snr));
    }
    if let Some(stats) = data.grid_stats() {
        lines.push("Heatmap Statistics:".to_string());
        lines.push(format!("Average RSSI: {:.1} dBm", stats.mean));
        lines.push(format!("Min RSSI: {:.1} dBm", stats.min));
        lines.push(format!("Max RSSI: {:.1} dBm", stats.max));
    }

    let mut pages = Vec::new();
    let mut y = BODY_TOP;
    for text in lines {
        if y < BOTTOM_MARGIN {
            pages.push(std::mem::take(&mut first));
            y = TOP_LINE;
        }
        first.push(Placed { y, text });
        y -= LINE_STEP;
    }
    pages.push(first);
    pages
}

/// Escapes a string for a PDF literal; Helvetica only covers Latin-1 here.
fn pdf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(page: &[Placed]) -> String {
    let mut stream = String::new();
    for line in page {
        stream.push_str(&format!(
            "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
            FONT_SIZE,
            LEFT_MARGIN,
            line.y,
            pdf_literal(&line.text)
        ));
    }
    stream
}

/// Writes a minimal PDF 1.4 document: catalog, page tree, one Helvetica font
/// and a page/content object pair per page.
pub fn write_pdf<W: Write>(mut writer: W, data: &ReportData<'_>) -> Result<(), ExportError> {
    let pages = layout(data);
    let page_ids: Vec<usize> = (0..pages.len()).map(|index| 4 + index * 2).collect();

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids
                .iter()
                .map(|id| format!("{} 0 R", id))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            id + 1
        ));
        let stream = content_stream(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut body = Vec::new();
    body.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(body.len());
        body.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, object).as_bytes());
    }

    let xref_offset = body.len();
    body.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    body.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        body.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    body.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}
