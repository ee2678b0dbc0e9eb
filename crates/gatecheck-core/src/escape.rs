//! HTML text escaping for values echoed into markup.

use std::borrow::Cow;

fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        '/' => Some("&#x2F;"),
        _ => None,
    }
}

/// Encode `& < > " ' /`. Borrows the input when nothing needs encoding.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    let Some(first) = text.find(|c| entity(c).is_some()) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(&text[..first]);
    for c in text[first..].chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tag_is_inert() {
        let out = escape_html("<script>alert('x')</script>");
        assert_eq!(
            out,
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;&#x2F;script&gt;"
        );
        assert!(!out.contains('<'));
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_html("hello world"), Cow::Borrowed(_)));
        assert!(matches!(escape_html(""), Cow::Borrowed(_)));
    }

    #[test]
    fn ampersand_first_no_double_encoding_of_output() {
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
        assert_eq!(escape_html(r#"x="1""#), "x=&quot;1&quot;");
    }

    #[test]
    fn template_syntax_passes_through_as_text() {
        // Braces are not markup; they stay literal so no engine sees an expression.
        assert_eq!(escape_html("{{7*7}}"), "{{7*7}}");
        assert_eq!(escape_html("żółw ☃"), "żółw ☃");
    }
}
