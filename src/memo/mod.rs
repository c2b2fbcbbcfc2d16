//! Credit memo assembly core.
//!
//! A fully deterministic generator: verified analysis in, styled and
//! paginated rich-text report out. `document` is the typed layout model,
//! `style` the fixed palette and color maps, `builder` the 12-section
//! assembly, and `render` the RTF serializer.

pub mod builder;
pub mod document;
pub mod render;
pub mod style;

pub use builder::{build_credit_memo, DocumentInventoryEntry, MemoInput};
pub use document::{Block, Callout, Cell, Color, MemoDocument, Row, Table, TextRun};
