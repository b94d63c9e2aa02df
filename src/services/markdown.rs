//! Markdown rendering service
//!
//! Markdown to HTML conversion for resource content, using pulldown-cmark.
//!
//! # Example
//!
//! ```
//! use focushub::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("# Hello\n\nThis is **bold** text.");
//! assert!(html.contains("<h1>"));
//! assert!(html.contains("<strong>"));
//! ```

use pulldown_cmark::{html, Options, Parser};

/// A thread-safe Markdown renderer.
///
/// Supports the common Markdown features resource bodies use:
/// headings, lists, links and images, blockquotes, fenced code blocks,
/// bold/italic/strikethrough, tables, and task lists.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Creates a new MarkdownRenderer.
    pub fn new() -> Self {
        Self
    }

    /// Renders Markdown text to HTML.
    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }
}
