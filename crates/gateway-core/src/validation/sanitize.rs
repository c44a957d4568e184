//! Allow-list HTML sanitizer for user-authored rich text.

use std::sync::LazyLock;

use regex::Regex;

const ALLOWED_TAGS: [&str; 6] = ["p", "br", "strong", "em", "u", "a"];

/// Elements removed together with everything inside them.
const DROPPED_WITH_CONTENT: [&str; 9] = [
    "script", "style", "iframe", "object", "embed", "template", "noscript", "textarea", "title",
];

const ALLOWED_TARGETS: [&str; 4] = ["_blank", "_self", "_parent", "_top"];

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("static pattern compiles")
});

/// Strip every tag and attribute that is not explicitly allowed.
///
/// Kept: `p`, `br`, `strong`, `em`, `u` without attributes, and `a` with
/// `href` (http, https, mailto or relative) and `target`. Everything else is
/// removed rather than escaped. Stray `<` in text is escaped.
pub fn sanitize_rich_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        push_text(&mut out, &rest[..lt]);
        let tail = &rest[lt..];

        if let Some(after) = tail.strip_prefix("<!--") {
            rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            continue;
        }

        match Tag::parse(tail) {
            Some(tag) => {
                rest = &tail[tag.len..];
                if !tag.closing && DROPPED_WITH_CONTENT.contains(&tag.name.as_str()) {
                    rest = skip_element_body(rest, &tag.name);
                    continue;
                }
                if let Some(rendered) = tag.render() {
                    out.push_str(&rendered);
                }
            }
            None => {
                out.push_str("&lt;");
                rest = &tail[1..];
            }
        }
    }

    push_text(&mut out, rest);
    out
}

fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Skip past the matching close tag, or drop the rest when it never closes.
fn skip_element_body<'a>(rest: &'a str, name: &str) -> &'a str {
    // ASCII lowercasing keeps byte offsets aligned with `rest`.
    let lowered = rest.to_ascii_lowercase();
    let Some(start) = lowered.find(&format!("</{}", name)) else {
        return "";
    };
    match rest[start..].find('>') {
        Some(end) => &rest[start + end + 1..],
        None => "",
    }
}

struct Tag {
    name: String,
    closing: bool,
    attributes: Vec<(String, String)>,
    /// Bytes consumed from the input, including `<` and `>`.
    len: usize,
}

impl Tag {
    /// Parse a tag at the start of `s`. `None` means the `<` does not open
    /// markup and should be treated as text.
    fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        let closing = bytes.get(1) == Some(&b'/');
        let name_start = if closing { 2 } else { 1 };

        // Doctype, processing instructions and the like: consume and drop.
        if !closing && matches!(bytes.get(1), Some(b'!') | Some(b'?')) {
            let end = find_tag_end(bytes, 2)?;
            return Some(Self {
                name: String::new(),
                closing: false,
                attributes: Vec::new(),
                len: end + 1,
            });
        }

        if !bytes.get(name_start)?.is_ascii_alphabetic() {
            return None;
        }
        let mut name_end = name_start;
        while name_end < bytes.len() && bytes[name_end].is_ascii_alphanumeric() {
            name_end += 1;
        }

        let end = find_tag_end(bytes, name_end)?;
        let attributes = if closing {
            Vec::new()
        } else {
            parse_attributes(&s[name_end..end])
        };

        Some(Self {
            name: s[name_start..name_end].to_ascii_lowercase(),
            closing,
            attributes,
            len: end + 1,
        })
    }

    fn render(&self) -> Option<String> {
        if !ALLOWED_TAGS.contains(&self.name.as_str()) {
            return None;
        }
        if self.closing {
            return (self.name != "br").then(|| format!("</{}>", self.name));
        }
        if self.name != "a" {
            return Some(format!("<{}>", self.name));
        }

        let mut rendered = String::from("<a");
        for (name, value) in &self.attributes {
            let keep = match name.as_str() {
                "href" => is_safe_href(value),
                "target" => ALLOWED_TARGETS.contains(&value.as_str()),
                _ => false,
            };
            if keep {
                rendered.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
            }
        }
        rendered.push('>');
        Some(rendered)
    }
}

/// Index of the `>` closing a tag, ignoring any inside quoted values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (None, b'"') | (None, b'\'') => quote = Some(b),
            (Some(q), b) if q == b => quote = None,
            (None, b'>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (name, value.to_string())
        })
        .collect()
}

fn is_safe_href(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    // Entity-encoded characters can hide a scheme from the check below.
    if compact.contains("&#") || compact.contains("&colon") {
        return false;
    }

    match compact.find([':', '/', '?', '#']) {
        Some(i) if compact.as_bytes()[i] == b':' => ALLOWED_SCHEMES.contains(&&compact[..i]),
        _ => true,
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_removed_allowed_markup_kept() {
        let out = sanitize_rich_text("<script>alert(1)</script><strong>hi</strong>");

        assert!(out.contains("<strong>hi</strong>"));
        assert!(!out.to_lowercase().contains("<script"));
        assert!(!out.contains("alert"));
    }

    #[test]
    fn test_disallowed_attributes_stripped() {
        let out = sanitize_rich_text(r#"<p class="lead" onclick="steal()" data-id="7">Hi</p>"#);
        assert_eq!(out, "<p>Hi</p>");
    }

    #[test]
    fn test_anchor_keeps_safe_href_and_target() {
        let out = sanitize_rich_text(
            r#"<a href="https://example.com/a?b=1" target="_blank" data-track="x" style="color:red">link</a>"#,
        );
        assert_eq!(
            out,
            r#"<a href="https://example.com/a?b=1" target="_blank">link</a>"#
        );
    }

    #[test]
    fn test_anchor_drops_script_urls() {
        for href in [
            "javascript:alert(1)",
            "JaVaScRiPt:alert(1)",
            " java\tscript:alert(1)",
            "javascript&#58;alert(1)",
            "vbscript:msgbox",
            "data:text/html;base64,AAAA",
        ] {
            let out = sanitize_rich_text(&format!(r#"<a href="{}">x</a>"#, href));
            assert_eq!(out, "<a>x</a>", "href {:?} survived", href);
        }
    }

    #[test]
    fn test_relative_and_mailto_hrefs_allowed() {
        assert_eq!(
            sanitize_rich_text(r#"<a href="/posts/1">p</a>"#),
            r#"<a href="/posts/1">p</a>"#
        );
        assert_eq!(
            sanitize_rich_text("<a href='mailto:me@example.com'>m</a>"),
            r#"<a href="mailto:me@example.com">m</a>"#
        );
    }

    #[test]
    fn test_unknown_tags_removed_content_kept() {
        let out = sanitize_rich_text("<div><em>ok</em> <img src=x onerror=alert(1)></div>");
        assert_eq!(out, "<em>ok</em> ");
    }

    #[test]
    fn test_uppercase_tags_normalized() {
        assert_eq!(sanitize_rich_text("<STRONG>a</STRONG><BR/>"), "<strong>a</strong><br>");
    }

    #[test]
    fn test_comments_and_doctype_removed() {
        let out = sanitize_rich_text("<!DOCTYPE html><!-- <script>x</script> --><p>a</p>");
        assert_eq!(out, "<p>a</p>");
    }

    #[test]
    fn test_stray_angle_brackets_escaped() {
        assert_eq!(sanitize_rich_text("1 < 2 > 0"), "1 &lt; 2 &gt; 0");
    }

    #[test]
    fn test_unterminated_dangerous_element_drops_rest() {
        assert_eq!(sanitize_rich_text("safe<style>body{}"), "safe");
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let out = sanitize_rich_text(r#"<a title="a>b" href="/x">t</a>"#);
        assert_eq!(out, r#"<a href="/x">t</a>"#);
    }
}
