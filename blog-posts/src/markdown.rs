//! Markdown to HTML rendering
//!
//! Post bodies are written by trusted admins, so the HTML is not sanitized.
//! Rendering never fails: input that isn't well-formed markdown comes out as
//! best-effort HTML (usually literal text in a paragraph).

use pulldown_cmark::{html, Options, Parser};

/// Stateless CommonMark renderer
///
/// Built once and shared by reference; holds only the parser options.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    /// Plain CommonMark, no extensions
    fn default() -> Self {
        Self {
            options: Options::empty(),
        }
    }
}

impl MarkdownRenderer {
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    /// Render markdown source to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}
