//! Markdown to HTML conversion.

use pulldown_cmark::{html, Options, Parser};

/// Extensions enabled for every conversion.
fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Convert Markdown source to an HTML fragment.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, options());

    let mut html_output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html_output, parser);

    html_output
}
