//! Reading the visible text of a page over HTTP.

use page_chat_model::PageContentProvider;
use reqwest::Client;

/// Elements whose contents are never visible.
const HIDDEN_ELEMENTS: &[&str] =
    &["head", "noscript", "script", "style", "template"];

/// Elements that start on a new line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

/// A [`PageContentProvider`] that downloads a page and converts its HTML
/// to plain text with [`html_to_text`].
///
/// The page identity must be an absolute URL.
#[derive(Clone, Debug, Default)]
pub struct HtmlPageReader {
    client: Client,
}

impl HtmlPageReader {
    /// Creates a reader with a default HTTP client.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader with a custom HTTP client.
    #[inline]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl PageContentProvider for HtmlPageReader {
    type Error = reqwest::Error;

    fn fetch_content(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static {
        let req = self.client.get(identity);
        async move {
            let resp = req.send().await?.error_for_status()?;
            let html = resp.text().await?;
            trace!("downloaded {} bytes of html", html.len());
            Ok(html_to_text(&html))
        }
    }
}

/// Converts an HTML document to the text a reader would see.
///
/// Tags are dropped and block elements start new lines. Comments and the
/// contents of `head`, `script`, `style`, `noscript` and `template` are
/// skipped. Character references are decoded, whitespace runs become a
/// single space and blank lines are removed.
pub fn html_to_text(html: &str) -> String {
    // ASCII lowercasing keeps byte offsets, so both strings share indices.
    let lower = html.to_ascii_lowercase();
    let mut text = String::with_capacity(html.len() / 2);
    let mut pos = 0;

    while pos < html.len() {
        let Some(offset) = html[pos..].find('<') else {
            push_text(&mut text, &html[pos..]);
            break;
        };
        push_text(&mut text, &html[pos..pos + offset]);
        let start = pos + offset;

        let starts_tag = html[start + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        if !starts_tag {
            text.push('<');
            pos = start + 1;
            continue;
        }

        if lower[start..].starts_with("<!--") {
            pos = match lower[start + 4..].find("-->") {
                Some(len) => start + 4 + len + 3,
                None => html.len(),
            };
            continue;
        }

        let Some(len) = html[start..].find('>') else {
            // Unterminated tag.
            break;
        };
        let end = start + len + 1;
        pos = end;

        let tag = &lower[start + 1..end - 1];
        let (closing, tag) = match tag.strip_prefix('/') {
            Some(tag) => (true, tag),
            None => (false, tag),
        };
        let name_len = tag
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(tag.len());
        let name = &tag[..name_len];

        if !closing && !tag.ends_with('/') && HIDDEN_ELEMENTS.contains(&name)
        {
            pos = skip_element(html, &lower, end, name);
            continue;
        }
        if BLOCK_ELEMENTS.contains(&name) {
            text.push('\n');
        }
    }

    normalize(&text)
}

/// Returns the offset right after the closing tag of `name`, searching
/// from `from`.
///
/// An unclosed `head` ends where `body` starts, as HTML allows omitting
/// `</head>`.
fn skip_element(html: &str, lower: &str, from: usize, name: &str) -> usize {
    let close_start = find_tag(lower, from, &format!("</{name}"));
    if name == "head" {
        if let Some(body_start) = find_tag(lower, from, "<body") {
            if close_start.is_none_or(|close| body_start < close) {
                return body_start;
            }
        }
    }
    let Some(close_start) = close_start else {
        return html.len();
    };
    match html[close_start..].find('>') {
        Some(len) => close_start + len + 1,
        None => html.len(),
    }
}

/// Finds the first `prefix` from `from` that is followed by the end of the
/// tag name, so `</head` doesn't match `</header`.
fn find_tag(lower: &str, from: usize, prefix: &str) -> Option<usize> {
    let mut at = from;
    while let Some(offset) = lower[at..].find(prefix) {
        let start = at + offset;
        let ends_name = match lower.as_bytes().get(start + prefix.len()) {
            Some(&b) => b == b'>' || b == b'/' || b.is_ascii_whitespace(),
            None => true,
        };
        if ends_name {
            return Some(start);
        }
        at = start + prefix.len();
    }
    None
}

fn push_text(out: &mut String, raw: &str) {
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        push_plain(out, &rest[..amp]);
        rest = &rest[amp..];
        match decode_entity(rest) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    push_plain(out, rest);
}

fn push_plain(out: &mut String, raw: &str) {
    out.extend(raw.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
}

/// Decodes the character reference at the start of `s`, returning the
/// character and the length of the reference.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let (end, _) = s.char_indices().take(12).find(|&(_, c)| c == ';')?;
    let name = &s[1..end];
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let number = name.strip_prefix('#')?;
            let hex = number
                .strip_prefix('x')
                .or_else(|| number.strip_prefix('X'));
            let code = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((c, end + 1))
}

fn normalize(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_content_is_skipped() {
        let html = r#"<!DOCTYPE html>
            <html>
              <head><title>Owls</title><style>p { color: red; }</style></head>
              <body>
                <script type="text/javascript">var secret = "<p>";</script>
                <noscript>Enable JavaScript</noscript>
                <p>Owls are birds.</p>
                <!-- <p>Not shown</p> -->
                <template><p>Later</p></template>
                <SCRIPT>alert(1)</SCRIPT>
              </body>
            </html>"#;
        assert_eq!(html_to_text(html), "Owls are birds.");
    }

    #[test]
    fn test_unclosed_head_ends_at_body() {
        let html = "<html><head><title>Owls</title>\
                    <body><p>Owls are birds.</p></body></html>";
        assert_eq!(html_to_text(html), "Owls are birds.");
    }

    #[test]
    fn test_hidden_element_ends_at_its_own_closing_tag() {
        let html = "<html><head><title>Owls</title></head>\
                    <body><header>Site</header><p>Owls are birds.</p></body>";
        assert_eq!(html_to_text(html), "Site\nOwls are birds.");
        let html = "<script>let s = '</scripts>';</script ><p>Owls</p>";
        assert_eq!(html_to_text(html), "Owls");
    }

    #[test]
    fn test_blocks_and_inline_elements() {
        let html = "<h1>Owls</h1><p>Owls are <b>nocturnal</b>\n   birds.\
                    </p><ul><li>Barn owl</li><li>Snowy owl</li></ul>\
                    Line<br>break";
        assert_eq!(
            html_to_text(html),
            "Owls\nOwls are nocturnal birds.\nBarn owl\nSnowy owl\nLine\nbreak"
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            html_to_text("<p>Tom &amp; Jerry&nbsp;&lt;3 &#39;cheese&#x27;</p>"),
            "Tom & Jerry <3 'cheese'"
        );
        // Unknown references and bare ampersands are kept.
        assert_eq!(html_to_text("A &bogus; B & C"), "A &bogus; B & C");
    }

    #[test]
    fn test_stray_angle_brackets() {
        assert_eq!(html_to_text("1 < 2 and 3 > 2"), "1 < 2 and 3 > 2");
        assert_eq!(html_to_text("cut <b"), "cut");
    }
}
