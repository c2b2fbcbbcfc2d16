//! Typed document model for the credit memo.
//!
//! The builder assembles one of these; the renderer serializes it. The
//! model is deliberately small: headings, styled paragraphs, tables,
//! callout boxes, and explicit page breaks, plus one header and footer
//! repeated on every page.

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

/// A styled run of text.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Color>,
    /// Font size in points; `None` uses the body default
    pub size: Option<u32>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        TextRun {
            text: text.into(),
            bold: false,
            italic: false,
            color: None,
            size: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        TextRun {
            bold: true,
            ..TextRun::plain(text)
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        TextRun {
            color: Some(color),
            ..TextRun::plain(text)
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// One table cell.
#[derive(Debug, Clone)]
pub struct Cell {
    pub runs: Vec<TextRun>,
    pub fill: Option<Color>,
    pub align: Align,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell {
            runs: vec![TextRun::plain(text)],
            fill: None,
            align: Align::Left,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Cell {
            runs: vec![TextRun::bold(text)],
            fill: None,
            align: Align::Left,
        }
    }

    pub fn money(text: impl Into<String>) -> Self {
        Cell {
            runs: vec![TextRun::plain(text)],
            fill: None,
            align: Align::Right,
        }
    }

    pub fn filled(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

/// One table row.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub header: bool,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row {
            cells,
            header: false,
        }
    }

    pub fn header(cells: Vec<Cell>) -> Self {
        Row {
            cells,
            header: true,
        }
    }
}

/// A bordered table. Column widths are relative weights; the renderer
/// scales them to the printable width.
#[derive(Debug, Clone)]
pub struct Table {
    pub rows: Vec<Row>,
    pub col_weights: Vec<u32>,
}

impl Table {
    pub fn new(col_weights: Vec<u32>, rows: Vec<Row>) -> Self {
        Table { rows, col_weights }
    }
}

/// A bordered, tinted box (risk flags, score callout, disclaimer).
#[derive(Debug, Clone)]
pub struct Callout {
    pub border: Color,
    pub fill: Color,
    pub lines: Vec<Vec<TextRun>>,
}

/// Top-level document content.
#[derive(Debug, Clone)]
pub enum Block {
    /// Section heading; level 0 is the title-page banner
    Heading { level: u8, text: String },
    Paragraph(Vec<TextRun>),
    Table(Table),
    Callout(Callout),
    PageBreak,
}

/// The assembled memo, ready to render.
#[derive(Debug, Clone)]
pub struct MemoDocument {
    /// Repeated at the top of every page
    pub header_text: String,
    /// Repeated at the bottom of every page, before the page number
    pub footer_text: String,
    pub blocks: Vec<Block>,
}

impl MemoDocument {
    pub fn paragraph(&mut self, runs: Vec<TextRun>) {
        self.blocks.push(Block::Paragraph(runs));
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.blocks.push(Block::Heading {
            level,
            text: text.into(),
        });
    }

    pub fn table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    pub fn callout(&mut self, callout: Callout) {
        self.blocks.push(Block::Callout(callout));
    }

    pub fn page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_helpers() {
        let mut doc = MemoDocument {
            header_text: "h".into(),
            footer_text: "f".into(),
            blocks: vec![],
        };
        doc.heading(1, "Summary");
        doc.paragraph(vec![TextRun::plain("body")]);
        doc.page_break();
        assert_eq!(doc.blocks.len(), 3);
        assert!(matches!(doc.blocks[2], Block::PageBreak));
    }

    #[test]
    fn test_run_styling_chain() {
        let run = TextRun::colored("x", Color::rgb(1, 2, 3)).with_bold().with_size(14);
        assert!(run.bold);
        assert_eq!(run.size, Some(14));
        assert_eq!(run.color, Some(Color::rgb(1, 2, 3)));
    }
}
