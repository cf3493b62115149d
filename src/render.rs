//! Markdown rendering: Markdown → HTML → sanitised HTML.
//!
//! The analysis service returns Markdown written by an LLM, and Markdown may
//! legally embed raw HTML. Converter output is therefore never trusted: every
//! render runs the converter first and the sanitizer second, and only the
//! sanitizer's output is stored in the rendered view.
//!
//! Both steps are injected capabilities ([`MarkdownConverter`],
//! [`HtmlSanitizer`]) so hosts and tests can substitute their own. The
//! defaults are pulldown-cmark and ammonia.

use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

/// Markdown → HTML.
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// HTML → HTML with executable content removed.
///
/// Implementations must strip script elements, event-handler attributes and
/// script-bearing URLs.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// CommonMark plus the GFM extensions LLM output leans on (tables,
/// strikethrough, task lists, footnotes).
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkConverter {
    options: Options,
}

impl Default for CommonMarkConverter {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        Self { options }
    }
}

impl MarkdownConverter for CommonMarkConverter {
    fn to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// ammonia's default allow-list: drops `<script>`/`<style>` together with
/// their content, every `on*` attribute, and `javascript:`-style URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmmoniaSanitizer;

impl HtmlSanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        ammonia::clean(html)
    }
}

/// What the user sees after a render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedOutput {
    html: String,
    raw: String,
    last_markdown: String,
    exports_enabled: bool,
}

impl RenderedOutput {
    /// Sanitised HTML for the rendered view.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The raw view: the Markdown exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The Markdown the export actions operate on.
    pub fn last_markdown(&self) -> &str {
        &self.last_markdown
    }

    /// `false` while there is nothing worth copying or saving.
    pub fn exports_enabled(&self) -> bool {
        self.exports_enabled
    }
}

/// Renders Markdown into a [`RenderedOutput`].
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer<C = CommonMarkConverter, S = AmmoniaSanitizer> {
    converter: C,
    sanitizer: S,
}

impl MarkdownRenderer {
    /// pulldown-cmark + ammonia.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: MarkdownConverter, S: HtmlSanitizer> MarkdownRenderer<C, S> {
    pub fn with_capabilities(converter: C, sanitizer: S) -> Self {
        Self {
            converter,
            sanitizer,
        }
    }

    /// Render `markdown` (`None` = empty) into `out`.
    ///
    /// Rendering the empty string clears both views and disables exports.
    pub fn render<'a>(&self, markdown: impl Into<Option<&'a str>>, out: &mut RenderedOutput) {
        let markdown = markdown.into().unwrap_or_default();
        out.last_markdown = markdown.to_string();

        let unsafe_html = self.converter.to_html(markdown);
        out.html = self.sanitizer.sanitize(&unsafe_html);

        out.raw = markdown.to_string();
        out.exports_enabled = has_output(markdown);

        debug!(
            "Rendered {} bytes of Markdown → {} bytes of HTML",
            markdown.len(),
            out.html.len()
        );
    }
}

/// `true` when `markdown` contains anything besides whitespace.
pub fn has_output(markdown: &str) -> bool {
    !markdown
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every call so the convert → sanitize order can be asserted.
    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct TaggingConverter(CallLog);

    impl MarkdownConverter for TaggingConverter {
        fn to_html(&self, markdown: &str) -> String {
            self.0 .0.lock().unwrap().push(format!("convert:{markdown}"));
            format!("<converted>{markdown}</converted>")
        }
    }

    struct TaggingSanitizer(CallLog);

    impl HtmlSanitizer for TaggingSanitizer {
        fn sanitize(&self, html: &str) -> String {
            self.0 .0.lock().unwrap().push(format!("sanitize:{html}"));
            format!("<safe>{html}</safe>")
        }
    }

    #[test]
    fn sanitize_runs_after_convert_on_converter_output() {
        let log = CallLog::default();
        let renderer = MarkdownRenderer::with_capabilities(
            TaggingConverter(log.clone()),
            TaggingSanitizer(log.clone()),
        );
        let mut out = RenderedOutput::default();
        renderer.render("# Hi", &mut out);

        assert_eq!(
            log.entries(),
            vec![
                "convert:# Hi".to_string(),
                "sanitize:<converted># Hi</converted>".to_string()
            ]
        );
        assert_eq!(out.html(), "<safe><converted># Hi</converted></safe>");
    }

    #[test]
    fn raw_and_last_markdown_are_verbatim() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        let md = "  ## Problem\n\n- untrimmed  \n\n";
        renderer.render(md, &mut out);
        assert_eq!(out.raw(), md);
        assert_eq!(out.last_markdown(), md);
        assert!(out.exports_enabled());
    }

    #[test]
    fn heading_renders_to_html() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        renderer.render("# Hi", &mut out);
        assert!(out.html().contains("<h1>Hi</h1>"), "got: {}", out.html());
    }

    #[test]
    fn gfm_table_renders() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        renderer.render("| A | B |\n| --- | --- |\n| 1 | 2 |\n", &mut out);
        assert!(out.html().contains("<table>"), "got: {}", out.html());
        assert!(out.html().contains("<td>1</td>"), "got: {}", out.html());
    }

    #[test]
    fn empty_render_clears_and_disables() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        renderer.render("# Hi", &mut out);
        renderer.render("", &mut out);
        assert_eq!(out, RenderedOutput::default());

        renderer.render("# Hi", &mut out);
        renderer.render(None, &mut out);
        assert_eq!(out.html(), "");
        assert_eq!(out.raw(), "");
        assert!(!out.exports_enabled());
    }

    #[test]
    fn whitespace_only_disables_exports_but_is_kept_verbatim() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        for md in [" ", "\n\n", "\t \r\n", "\u{FEFF}\n"] {
            renderer.render(md, &mut out);
            assert!(!out.exports_enabled(), "{md:?} should disable exports");
            assert_eq!(out.last_markdown(), md);
        }
    }

    #[test]
    fn img_onerror_is_neutralised() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        renderer.render("Look: <img src=x onerror=alert(1)>", &mut out);
        assert!(!out.html().contains("onerror"), "got: {}", out.html());
        assert!(!out.html().contains("alert(1)"), "got: {}", out.html());
    }

    #[test]
    fn script_element_and_content_are_removed() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        renderer.render("ok\n\n<script>alert('x')</script>\n\ndone", &mut out);
        assert!(!out.html().contains("<script"), "got: {}", out.html());
        assert!(!out.html().contains("alert"), "got: {}", out.html());
        assert!(out.html().contains("done"));
        assert_eq!(out.raw(), "ok\n\n<script>alert('x')</script>\n\ndone");
    }

    #[test]
    fn javascript_links_lose_their_href() {
        let renderer = MarkdownRenderer::new();
        let mut out = RenderedOutput::default();
        renderer.render("[click](javascript:alert(1))", &mut out);
        assert!(!out.html().contains("javascript:"), "got: {}", out.html());
        assert!(out.html().contains("click"));
    }

    #[test]
    fn has_output_rules() {
        assert!(!has_output(""));
        assert!(!has_output("   \n"));
        assert!(has_output(" x "));
        assert!(has_output("# Hi"));
    }
}
