// Markup sanitizer that keeps inline math intact.
//
// Exam questions arrive as rich text exported from an editor: arbitrary tags,
// inline styles, and TeX math like `$x^2+1$` or `\[ \frac{a}{b} \]`. Math
// often contains `<` and `>`, which an HTML parser would happily eat, so each
// math span is swapped for an indexed placeholder before parsing and put back
// verbatim afterwards.
//
// What survives: a small whitelist of structural tags (without attributes)
// and the text of every other element. Script/style bodies and comments go.
// Text outside math has its `$` and `\` written as character references, so
// a second pass never finds a math span the first pass did not.

use std::sync::LazyLock;

use html_escape::encode_text;
use regex_lite::{Captures, Regex};
use scraper::{ElementRef, Html};

/// Tags kept in cleaned output. Everything else is unwrapped.
const ALLOWED_TAGS: [&str; 15] = [
    "p", "div", "span", "br", "ol", "ul", "li", "table", "tr", "td", "th", "strong", "em", "b",
    "i",
];

/// Tags dropped together with their content.
const DROPPED_TAGS: [&str; 2] = ["script", "style"];

static MATH_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(.*?)\$|\\\[(.*?)\\\]").expect("valid math span pattern")
});

static MATH_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__MATH_(\d+)__").expect("valid placeholder pattern"));

/// Clean raw question markup.
///
/// Never fails: malformed markup is parsed leniently and whatever text can be
/// recovered is kept. The result is stable under re-cleaning.
pub fn clean_markup(raw: &str) -> String {
    let (protected, spans) = protect_math(raw);
    let stripped = strip_markup(&protected);
    let normalized = normalize_whitespace(&stripped);
    restore_math(&normalized, &spans)
}

/// Replace every math span with `__MATH_<n>__` and return the captured spans.
pub fn protect_math(text: &str) -> (String, Vec<String>) {
    let mut spans = Vec::new();
    let protected = MATH_SPAN.replace_all(text, |caps: &Captures<'_>| {
        spans.push(caps[0].to_string());
        format!("__MATH_{}__", spans.len() - 1)
    });
    (protected.into_owned(), spans)
}

/// Put math spans back. A placeholder pointing past the end of `spans`
/// becomes the empty string.
pub fn restore_math(text: &str, spans: &[String]) -> String {
    MATH_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| spans.get(idx))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Drop control characters, collapse whitespace runs to one space, trim.
pub fn normalize_whitespace(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|c| c.is_whitespace() || !c.is_control())
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-serialize the markup keeping only whitelisted tags, with no attributes.
fn strip_markup(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut out = String::with_capacity(markup.len());
    render_children(fragment.root_element(), &mut out);
    out
}

fn render_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        if let Some(text) = child.value().as_text() {
            push_text(&encode_text(&**text), out);
            continue;
        }

        let Some(element) = ElementRef::wrap(child) else {
            // comments, doctypes, processing instructions
            continue;
        };

        let name = element.value().name();
        if DROPPED_TAGS.contains(&name) {
            continue;
        }
        if !ALLOWED_TAGS.contains(&name) {
            render_children(element, out);
            continue;
        }

        if name == "br" {
            out.push_str("<br/>");
            continue;
        }
        out.push('<');
        out.push_str(name);
        out.push('>');
        render_children(element, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

/// Append escaped text, with math delimiters as character references.
fn push_text(encoded: &str, out: &mut String) {
    for c in encoded.chars() {
        match c {
            '$' => out.push_str("&#36;"),
            '\\' => out.push_str("&#92;"),
            _ => out.push(c),
        }
    }
}
