//! RTF serialization of the memo document model.
//!
//! RTF is the output format because it is a single self-contained byte
//! stream with real pagination: page headers and footers repeat on every
//! page, `\chpgn` renders the current page number, and `\page` forces a
//! break. The writer is fully deterministic; identical documents render
//! to identical bytes.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::document::{Align, Block, Callout, Cell, Color, MemoDocument, Row, Table, TextRun};

/// Printable width in twips (6.5in page body on US Letter).
const PAGE_WIDTH_TWIPS: u32 = 9360;

/// Body font size in half-points (11pt).
const BODY_SIZE_HALF_POINTS: u32 = 22;

/// Render a memo document to RTF bytes.
pub fn render(doc: &MemoDocument) -> Vec<u8> {
    let colors = collect_colors(doc);
    let mut out = String::with_capacity(16 * 1024);

    out.push_str("{\\rtf1\\ansi\\deff0");
    out.push_str("{\\fonttbl{\\f0\\fswiss Calibri;}}");
    write_color_table(&mut out, &colors);
    out.push_str("\\paperw12240\\paperh15840\\margl1440\\margr1440\\margt1440\\margb1440\n");

    write_header_footer(&mut out, doc, &colors);

    for block in &doc.blocks {
        write_block(&mut out, block, &colors);
    }

    out.push('}');
    out.into_bytes()
}

/// Color indices are 1-based positions in the color table; 0 is auto.
type ColorMap = HashMap<Color, usize>;

fn collect_colors(doc: &MemoDocument) -> ColorMap {
    let mut colors = ColorMap::new();
    let mut order: Vec<Color> = Vec::new();
    let push = |color: Color, order: &mut Vec<Color>, colors: &mut ColorMap| {
        if !colors.contains_key(&color) {
            order.push(color);
            colors.insert(color, order.len());
        }
    };

    for block in &doc.blocks {
        match block {
            Block::Paragraph(runs) => {
                for run in runs {
                    if let Some(color) = run.color {
                        push(color, &mut order, &mut colors);
                    }
                }
            }
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        if let Some(fill) = cell.fill {
                            push(fill, &mut order, &mut colors);
                        }
                        for run in &cell.runs {
                            if let Some(color) = run.color {
                                push(color, &mut order, &mut colors);
                            }
                        }
                    }
                }
            }
            Block::Callout(callout) => {
                push(callout.border, &mut order, &mut colors);
                push(callout.fill, &mut order, &mut colors);
                for line in &callout.lines {
                    for run in line {
                        if let Some(color) = run.color {
                            push(color, &mut order, &mut colors);
                        }
                    }
                }
            }
            Block::Heading { .. } | Block::PageBreak => {}
        }
    }
    colors
}

fn write_color_table(out: &mut String, colors: &ColorMap) {
    let mut ordered: Vec<(&Color, &usize)> = colors.iter().collect();
    ordered.sort_by_key(|(_, idx)| **idx);

    out.push_str("{\\colortbl ;");
    for (color, _) in ordered {
        let _ = write!(out, "\\red{}\\green{}\\blue{};", color.r, color.g, color.b);
    }
    out.push('}');
}

fn write_header_footer(out: &mut String, doc: &MemoDocument, _colors: &ColorMap) {
    let _ = write!(
        out,
        "{{\\header\\pard\\qc\\fs18 {}\\par}}",
        escape(&doc.header_text)
    );
    let _ = write!(
        out,
        "{{\\footer\\pard\\qc\\fs18 {}  |  Page \\chpgn\\par}}",
        escape(&doc.footer_text)
    );
    out.push('\n');
}

fn write_block(out: &mut String, block: &Block, colors: &ColorMap) {
    match block {
        Block::Heading { level, text } => {
            let size = match level {
                0 => 48,
                1 => 32,
                _ => 26,
            };
            let _ = write!(
                out,
                "\\pard\\sb240\\sa120\\b\\fs{} {}\\b0\\fs{}\\par\n",
                size,
                escape(text),
                BODY_SIZE_HALF_POINTS
            );
        }
        Block::Paragraph(runs) => {
            out.push_str("\\pard\\sa120 ");
            for run in runs {
                write_run(out, run, colors);
            }
            out.push_str("\\par\n");
        }
        Block::Table(table) => write_table(out, table, colors),
        Block::Callout(callout) => write_callout(out, callout, colors),
        Block::PageBreak => out.push_str("\\page\n"),
    }
}

fn write_run(out: &mut String, run: &TextRun, colors: &ColorMap) {
    out.push('{');
    if run.bold {
        out.push_str("\\b");
    }
    if run.italic {
        out.push_str("\\i");
    }
    if let Some(size) = run.size {
        let _ = write!(out, "\\fs{}", size * 2);
    }
    if let Some(color) = run.color {
        if let Some(index) = colors.get(&color) {
            let _ = write!(out, "\\cf{}", index);
        }
    }
    out.push(' ');
    out.push_str(&escape(&run.text));
    out.push('}');
}

fn write_table(out: &mut String, table: &Table, colors: &ColorMap) {
    let weights = if table.col_weights.is_empty() {
        vec![1; table.rows.first().map(|r| r.cells.len()).unwrap_or(1)]
    } else {
        table.col_weights.clone()
    };
    let total: u32 = weights.iter().sum::<u32>().max(1);

    for row in &table.rows {
        write_table_row(out, row, &weights, total, colors);
    }
    out.push('\n');
}

fn write_table_row(
    out: &mut String,
    row: &Row,
    weights: &[u32],
    total: u32,
    colors: &ColorMap,
) {
    out.push_str("\\trowd\\trgaph108");

    let mut right_edge = 0u32;
    for (i, cell) in row.cells.iter().enumerate() {
        let weight = weights.get(i).copied().unwrap_or(1);
        right_edge += PAGE_WIDTH_TWIPS * weight / total;
        out.push_str("\\clbrdrt\\brdrs\\clbrdrl\\brdrs\\clbrdrb\\brdrs\\clbrdrr\\brdrs");
        if let Some(fill) = cell.fill {
            if let Some(index) = colors.get(&fill) {
                let _ = write!(out, "\\clcbpat{}", index);
            }
        }
        let _ = write!(out, "\\cellx{}", right_edge);
    }

    for cell in &row.cells {
        let align = match cell.align {
            Align::Left => "\\ql",
            Align::Center => "\\qc",
            Align::Right => "\\qr",
        };
        let _ = write!(out, "\\pard\\intbl{} ", align);
        for run in &cell.runs {
            let styled = if row.header && !run.bold {
                TextRun {
                    bold: true,
                    ..run.clone()
                }
            } else {
                run.clone()
            };
            write_run(out, &styled, colors);
        }
        out.push_str("\\cell");
    }
    out.push_str("\\row\n");
}

/// Callouts render as a one-column bordered table so the tint and border
/// survive in every RTF reader.
fn write_callout(out: &mut String, callout: &Callout, colors: &ColorMap) {
    let fill_index = colors.get(&callout.fill).copied().unwrap_or(0);

    for line in &callout.lines {
        out.push_str("\\trowd\\trgaph108");
        out.push_str("\\clbrdrt\\brdrs\\clbrdrl\\brdrs\\clbrdrb\\brdrs\\clbrdrr\\brdrs");
        let _ = write!(out, "\\clcbpat{}\\cellx{}", fill_index, PAGE_WIDTH_TWIPS);
        out.push_str("\\pard\\intbl\\ql ");
        for run in line {
            write_run(out, run, colors);
        }
        out.push_str("\\cell\\row\n");
    }
    out.push_str("\\pard\\sa120\\par\n");
}

/// Escape RTF control characters; non-ASCII goes out as unicode escapes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\line "),
            c if c.is_ascii() => out.push(c),
            c => {
                let _ = write!(out, "\\u{}?", c as u32 as i32);
            }
        }
    }
    out
}
