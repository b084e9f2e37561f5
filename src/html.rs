//! Visible-text extraction from HTML pages for full-text indexing.
//!
//! Documentation bundles carry hand-written HTML of wildly varying vintage, so
//! this is a tolerant single-pass scanner rather than a strict parser: tags
//! are dropped, `<script>`/`<style>` bodies and comments are skipped whole,
//! character references are decoded, and whitespace is collapsed. Good enough
//! for an index term stream; never used to render anything.

/// Extracts the visible text of an HTML document.
pub fn extract_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;

    loop {
        let Some(pos) = rest.find('<') else {
            decode_into(rest, &mut out);
            break;
        };
        decode_into(&rest[..pos], &mut out);
        rest = &rest[pos..];

        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => rest = &rest[end + 3..],
                None => break,
            }
            out.push(' ');
            continue;
        }

        let Some(close) = rest.find('>') else { break };
        let tag_body = &rest[1..close];
        rest = &rest[close + 1..];

        let name = tag_name(tag_body);
        let is_closing = tag_body.starts_with('/');
        let is_self_closing = tag_body.ends_with('/');
        if !is_closing && !is_self_closing {
            if name.eq_ignore_ascii_case("script") {
                rest = skip_raw_element(rest, "</script");
                continue;
            }
            if name.eq_ignore_ascii_case("style") {
                rest = skip_raw_element(rest, "</style");
                continue;
            }
        }
        // Tags never glue adjacent words together.
        out.push(' ');
    }

    collapse_whitespace(&out)
}

fn tag_name(tag_body: &str) -> &str {
    tag_body
        .trim_start_matches('/')
        .split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or("")
}

/// Skips to the matching close tag of a raw-text element, case-insensitively.
/// The close tag itself is left in place for the main loop to consume.
fn skip_raw_element<'a>(rest: &'a str, close_tag: &str) -> &'a str {
    match rest.to_ascii_lowercase().find(close_tag) {
        Some(pos) => &rest[pos..],
        None => "",
    }
}

/// Decodes character references while appending `text` to `out`.
fn decode_into(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        // The window end must not split a multi-byte character.
        let mut window = rest.len().min(12);
        while !rest.is_char_boundary(window) {
            window -= 1;
        }
        let probe = &rest[..window];
        match probe.find(';') {
            Some(semi) if semi > 1 => {
                match decode_entity(&rest[1..semi]) {
                    Some(c) => {
                        out.push(c);
                        rest = &rest[semi + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_and_collapses_whitespace() {
        let html = "<html><body>\n  <h1>Title</h1>\n  <p>Some   <b>bold</b> text.</p>\n</body></html>";
        assert_eq!(extract_text(html), "Title Some bold text.");
    }

    #[test]
    fn drops_script_and_style_bodies() {
        let html = r#"<head><style>body { color: red; }</style>
            <SCRIPT type="text/javascript">var x = "<p>not text</p>";</SCRIPT></head>
            <body>visible</body>"#;
        assert_eq!(extract_text(html), "visible");
    }

    #[test]
    fn drops_comments() {
        assert_eq!(extract_text("a<!-- hidden <b>stuff</b> -->b"), "a b");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            extract_text("fish &amp; chips &lt;tasty&gt; &#65;&#x42; caf&eacute;"),
            "fish & chips <tasty> AB caf&eacute;"
        );
    }

    #[test]
    fn tolerates_unterminated_markup() {
        assert_eq!(extract_text("text <b unfinished"), "text");
        assert_eq!(extract_text("<script>never closed"), "");
    }

    #[test]
    fn bare_ampersand_before_multibyte_text_is_kept() {
        // An accented character straddling the entity lookahead must not
        // panic on a byte-offset slice.
        assert_eq!(extract_text("&0123456789é tail"), "&0123456789é tail");
        assert_eq!(extract_text("AT&T r&eacute;sum&eacute;"), "AT&T r&eacute;sum&eacute;");
        assert_eq!(extract_text("caf&é"), "caf&é");
    }

    #[test]
    fn tags_separate_words() {
        assert_eq!(extract_text("one<br>two"), "one two");
    }
}
