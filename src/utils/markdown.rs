use pulldown_cmark::{html, Options, Parser};

/// Convert model-written Markdown to sanitised HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    // Model output is untrusted: strip scripts, handlers and odd URL schemes
    ammonia::clean(&html_output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_basic_markdown() {
        let html = render_markdown("**Bold** and *italic*\n\n- one\n- two");
        assert!(html.contains("<strong>Bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_plain_text_becomes_paragraph() {
        assert_eq!(render_markdown("Paris").trim(), "<p>Paris</p>");
    }

    #[test]
    fn test_strips_script_tags() {
        let html = render_markdown("hello <script>alert('x')</script>");
        assert!(!html.contains("<script"));
        assert!(html.contains("hello"));
    }
}
