//! Lexer for template markup using logos
//!
//! Markup is tokenized in two passes: [`Token`] splits the input into text,
//! tags, comments and declarations; the inside of each open tag is then
//! tokenized by a second lexer into attribute names and values.

use logos::Logos;

use crate::dom::is_void_element;
use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A lexed open tag with its attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Lowercased tag name
    pub name: String,
    /// Attributes in source order, names lowercased, values entity-decoded
    pub attributes: Vec<(String, String)>,
    /// Written as `<name ... />`
    pub self_closing: bool,
}

impl Tag {
    /// Whether the element has no children and no closing tag
    pub fn is_empty_element(&self) -> bool {
        self.self_closing || is_void_element(&self.name)
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[regex(r"<!--([^-]|-[^-]|--[^>])*-->", |lex| {
        let s = lex.slice();
        s[4..s.len() - 3].to_string()
    })]
    Comment(String),

    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\][^>])*\]\]>", |lex| {
        let s = lex.slice();
        s[9..s.len() - 3].to_string()
    })]
    CData(String),

    #[regex(r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>", |lex| {
        let s = lex.slice();
        s[9..s.len() - 1].trim().to_string()
    })]
    Doctype(String),

    #[regex(r"<\?[^>]*>", |lex| {
        let s = lex.slice();
        let inner = &s[2..s.len() - 1];
        inner.strip_suffix('?').unwrap_or(inner).to_string()
    })]
    Instruction(String),

    #[regex(r"</[a-zA-Z][^>\s]*\s*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim().to_ascii_lowercase()
    })]
    CloseTag(String),

    #[regex(r#"<[a-zA-Z][^\s/>]*([^>"']|"[^"]*"|'[^']*')*>"#, lex_open_tag)]
    OpenTag(Tag),

    // A lone `<` that starts no tag is plain text
    #[token("<", |_| "<".to_string())]
    #[regex(r"[^<]+", |lex| decode_entities(lex.slice()))]
    Text(String),
}

/// Tokens inside an open tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\x0C]+")]
enum AttrToken {
    #[regex(r#"[^\s"'>/=]+"#)]
    Name,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    #[regex(r"'[^']*'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Quoted(String),

    #[token("/")]
    Slash,
}

fn lex_open_tag(lex: &mut logos::Lexer<Token>) -> Option<Tag> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1];
    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let (attributes, self_closing) = lex_attributes(&inner[name_end..])?;
    Some(Tag {
        name: inner[..name_end].to_ascii_lowercase(),
        attributes,
        self_closing,
    })
}

/// Parse `name`, `name=value`, `name="value"` and `name='value'` pairs
///
/// Returns `None` for input that is not a valid attribute list. Repeated
/// names keep their first value.
fn lex_attributes(src: &str) -> Option<(Vec<(String, String)>, bool)> {
    let tokens = AttrToken::lexer(src)
        .spanned()
        .map(|(tok, span)| tok.ok().map(|t| (t, span)))
        .collect::<Option<Vec<_>>>()?;

    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            (AttrToken::Name, span) => {
                let name = src[span.clone()].to_ascii_lowercase();
                i += 1;
                let mut value = String::new();
                if matches!(tokens.get(i), Some((AttrToken::Equals, _))) {
                    i += 1;
                    match tokens.get(i) {
                        Some((AttrToken::Quoted(raw), _)) => {
                            value = decode_entities(raw);
                            i += 1;
                        }
                        // Unquoted values run until whitespace, slashes included
                        Some((AttrToken::Name | AttrToken::Slash, span)) => {
                            let start = span.start;
                            let mut end = span.end;
                            i += 1;
                            while let Some((
                                AttrToken::Name | AttrToken::Slash | AttrToken::Equals,
                                next,
                            )) = tokens.get(i)
                            {
                                if next.start != end {
                                    break;
                                }
                                end = next.end;
                                i += 1;
                            }
                            value = decode_entities(&src[start..end]);
                        }
                        _ => return None,
                    }
                }
                if !attributes.iter().any(|(n, _)| *n == name) {
                    attributes.push((name, value));
                }
            }
            (AttrToken::Slash, _) => {
                self_closing = i + 1 == tokens.len();
                i += 1;
            }
            (AttrToken::Equals | AttrToken::Quoted(_), _) => return None,
        }
    }
    Some((attributes, self_closing))
}

/// Decode character references (`&amp;`, `&#39;`, `&#x41;`, ...)
///
/// Unknown references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number
                .strip_prefix('x')
                .or_else(|| number.strip_prefix('X'))
            {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            // NUL, surrogates and out-of-range code points become U+FFFD
            Some(
                char::from_u32(code)
                    .filter(|&c| c != '\0')
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            )
        }
    }
}

/// Lex markup into tokens with spans
///
/// Adjacent text tokens are merged so a stray `<` does not split text.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut tokens: Vec<(Token, Span)> = Vec::new();
    for (tok, span) in Token::lexer(input).spanned() {
        let Ok(tok) = tok else {
            return Err(ParseError::Syntax {
                message: "Malformed tag".to_string(),
                expected: Vec::new(),
                span,
            });
        };
        if let Token::Text(text) = &tok {
            if let Some((Token::Text(prev), prev_span)) = tokens.last_mut() {
                prev.push_str(text);
                prev_span.end = span.end;
                continue;
            }
        }
        tokens.push((tok, span));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    fn tag(name: &str, attributes: &[(&str, &str)], self_closing: bool) -> Token {
        Token::OpenTag(Tag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            self_closing,
        })
    }

    #[test]
    fn test_text_and_tags() {
        assert_eq!(
            kinds("<p>Hello</p>"),
            vec![
                tag("p", &[], false),
                Token::Text("Hello".to_string()),
                Token::CloseTag("p".to_string()),
            ]
        );
    }

    #[test]
    fn test_attribute_forms() {
        assert_eq!(
            kinds(r#"<input type="text" value='a b' disabled data-x=1>"#),
            vec![tag(
                "input",
                &[
                    ("type", "text"),
                    ("value", "a b"),
                    ("disabled", ""),
                    ("data-x", "1")
                ],
                false
            )]
        );
    }

    #[test]
    fn test_unquoted_value_with_slashes() {
        assert_eq!(
            kinds("<a href=/character/7>"),
            vec![tag("a", &[("href", "/character/7")], false)]
        );
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(kinds("<br/>"), vec![tag("br", &[], true)]);
        assert_eq!(
            kinds(r#"<img src="x.png" />"#),
            vec![tag("img", &[("src", "x.png")], true)]
        );
    }

    #[test]
    fn test_names_are_lowercased() {
        assert_eq!(
            kinds("<DIV onClick=x></DIV>"),
            vec![
                tag("div", &[("onclick", "x")], false),
                Token::CloseTag("div".to_string()),
            ]
        );
    }

    #[test]
    fn test_gt_inside_quoted_attribute() {
        assert_eq!(
            kinds(r#"<p title="a > b">"#),
            vec![tag("p", &[("title", "a > b")], false)]
        );
    }

    #[test]
    fn test_comment_cdata_doctype_instruction() {
        assert_eq!(
            kinds("<!-- note --><![CDATA[x]]><!DOCTYPE html><?xml version=\"1.0\"?>"),
            vec![
                Token::Comment(" note ".to_string()),
                Token::CData("x".to_string()),
                Token::Doctype("html".to_string()),
                Token::Instruction("xml version=\"1.0\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_stray_lt_is_text() {
        assert_eq!(kinds("1 < 2"), vec![Token::Text("1 < 2".to_string())]);
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(
            kinds("a &amp; b &#39;c&#x27; &bogus;"),
            vec![Token::Text("a & b 'c' &bogus;".to_string())]
        );
    }

    #[test]
    fn test_invalid_code_points_decode_to_replacement_character() {
        assert_eq!(decode_entities("a&#0;b"), "a\u{FFFD}b");
        assert_eq!(decode_entities("&#xD800;&#x110000;"), "\u{FFFD}\u{FFFD}");
        assert_eq!(decode_entities("&#x41;"), "A");
    }

    #[test]
    fn test_marker_survives_in_values_and_text() {
        assert_eq!(
            kinds(r#"<a class="x {{}}" href={{}}>{{}}</a>"#),
            vec![
                tag("a", &[("class", "x {{}}"), ("href", "{{}}")], false),
                Token::Text("{{}}".to_string()),
                Token::CloseTag("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        assert_eq!(
            kinds(r#"<p id="a" id="b">"#),
            vec![tag("p", &[("id", "a")], false)]
        );
    }

    #[test]
    fn test_malformed_tag_is_error() {
        assert!(lex(r#"<p ="x">"#).is_err());
    }
}
