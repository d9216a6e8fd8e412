//! Markdown rendering for flat documents.

use crate::analyze::RunningElements;
use crate::error::Result;
use crate::model::{FlatDocument, PictureBlock, Role};

use super::{EventStream, RenderEvent, RenderOptions, TableGrid};

/// Convert a document to Markdown.
pub fn to_markdown(
    doc: &FlatDocument,
    running: Option<&RunningElements>,
    options: &RenderOptions,
) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    let renderer = match running {
        Some(running) => renderer.with_running_elements(running),
        None => renderer,
    };
    renderer.render(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer<'r> {
    options: RenderOptions,
    running: Option<&'r RunningElements>,
}

impl<'r> MarkdownRenderer<'r> {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            running: None,
        }
    }

    /// Hide the lines these findings mark as running elements.
    pub fn with_running_elements(mut self, running: &'r RunningElements) -> Self {
        self.running = Some(running);
        self
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &FlatDocument) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
            output.push('\n');
        }

        for event in EventStream::new(doc, self.running, &self.options) {
            self.render_event(&mut output, event);
        }

        Ok(output.trim().to_string())
    }

    fn render_event(&self, output: &mut String, event: RenderEvent<'_>) {
        match event {
            RenderEvent::ChapterStart { .. } => {}
            RenderEvent::Heading { text, level } => {
                let level = level.min(self.options.max_heading_level);
                output.push_str(&"#".repeat(level as usize));
                output.push(' ');
                output.push_str(&self.escape(text));
                output.push_str("\n\n");
            }
            RenderEvent::Paragraph { text, role } => {
                let text = self.escape(text);
                if role == Role::TableCaption {
                    output.push_str(&format!("*{}*", text));
                } else {
                    output.push_str(&text);
                }
                output.push_str("\n\n");
            }
            RenderEvent::Picture(picture) => self.render_picture(output, picture),
            RenderEvent::Table(grid) => self.render_table(output, &grid),
            RenderEvent::Footnotes(notes) => {
                output.push_str("---\n\n");
                for note in notes {
                    output.push_str("> ");
                    output.push_str(&self.escape(note));
                    output.push_str("\n\n");
                }
            }
            RenderEvent::PageEnd { page_no } => {
                if self.options.include_page_markers {
                    output.push_str(&format!("<!-- page {} -->\n\n", page_no));
                }
            }
        }
    }

    fn render_picture(&self, output: &mut String, picture: &PictureBlock) {
        output.push_str(&format!(
            "<div class=\"picture\" style=\"width: {:.0}%\"><!-- page {} --></div>\n\n",
            picture.width_percent(),
            picture.page_no
        ));
    }

    fn render_table(&self, output: &mut String, grid: &TableGrid) {
        let col_count = grid.column_count();
        if col_count == 0 {
            return;
        }

        for (i, row) in grid.rows.iter().enumerate() {
            output.push('|');
            for c in 0..col_count {
                let content = row.get(c).map(String::as_str).unwrap_or("");
                let content = self.escape(content).replace('\n', "<br>");
                output.push_str(&format!(" {} |", content.trim()));
            }
            output.push('\n');

            if i == 0 {
                output.push('|');
                for _ in 0..col_count {
                    output.push_str(" --- |");
                }
                output.push('\n');
            }
        }

        output.push('\n');
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// Escape special Markdown characters.
/// Only characters that could be misinterpreted as Markdown syntax are
/// escaped, plus block markers at the start of the text.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    if text.starts_with(&['#', '>', '-', '+'][..]) {
        result.push('\\');
    }
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' | '<' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
