use logos::{Lexer, Logos};
use std::fmt;

/// Tokens between tags.
///
/// The lexer runs in this mode until it sees a start tag, then morphs into
/// [`AttrToken`] for the attribute list and back again after the closing `>`.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum ContentToken<'src> {
    #[token("<!--", comment_body)]
    Comment(&'src str),

    #[regex(r"<![a-zA-Z][^>]*>")]
    Doctype,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_.-]*[ \t\r\n\f]*>", |lex| {
        lex.slice()[2..].trim_end_matches('>').trim_end()
    })]
    EndTag(&'src str),

    #[regex(r"<[a-zA-Z][a-zA-Z0-9:_.-]*", |lex| &lex.slice()[1..])]
    StartTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not open a tag
    #[token("<")]
    Lt,
}

/// Tokens inside a start tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum AttrToken<'src> {
    #[regex(r#"[^ \t\r\n\f"'<>/=]+"#, |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,
}

fn comment_body<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            &rest[..end]
        }
        None => {
            lex.bump(rest.len());
            rest
        }
    }
}

/// Read an attribute value directly after `=`, quoted or not.
///
/// Values are read by hand rather than tokenized since an unquoted value may
/// contain characters that are separators elsewhere in a tag (e.g. `/`).
pub fn read_attribute_value<'src>(lex: &mut Lexer<'src, AttrToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    let trimmed = rest.trim_start_matches(is_html_whitespace);
    let skipped = rest.len() - trimmed.len();

    match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) => match trimmed[1..].find(quote) {
            Some(end) => {
                lex.bump(skipped + end + 2);
                &trimmed[1..end + 1]
            }
            None => {
                lex.bump(rest.len());
                &trimmed[1..]
            }
        },
        _ => {
            let end = trimmed
                .find(|c: char| is_html_whitespace(c) || c == '>')
                .unwrap_or(trimmed.len());
            lex.bump(skipped + end);
            &trimmed[..end]
        }
    }
}

pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{c}')
}

impl<'src> fmt::Display for ContentToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentToken::Comment(c) => write!(f, "comment '{}'", c),
            ContentToken::Doctype => write!(f, "doctype"),
            ContentToken::EndTag(name) => write!(f, "end tag '{}'", name),
            ContentToken::StartTag(name) => write!(f, "start tag '{}'", name),
            ContentToken::Text(t) => write!(f, "text '{}'", t),
            ContentToken::Lt => write!(f, "<"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_tokens(source: &str) -> Vec<ContentToken<'_>> {
        ContentToken::lexer(source)
            .filter_map(|token| token.ok())
            .collect()
    }

    #[test]
    fn test_content_tokens() {
        let tokens = content_tokens("<!DOCTYPE html>a < b<!-- c --></p >");
        assert_eq!(
            tokens,
            vec![
                ContentToken::Doctype,
                ContentToken::Text("a "),
                ContentToken::Lt,
                ContentToken::Text(" b"),
                ContentToken::Comment(" c "),
                ContentToken::EndTag("p"),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let tokens = content_tokens("<!-- open");
        assert_eq!(tokens, vec![ContentToken::Comment(" open")]);
    }

    #[test]
    fn test_morph_into_attributes() {
        let mut lex = ContentToken::lexer(r#"<input type="text" disabled/>rest"#);
        assert_eq!(lex.next(), Some(Ok(ContentToken::StartTag("input"))));

        let mut attrs = lex.morph::<AttrToken>();
        assert_eq!(attrs.next(), Some(Ok(AttrToken::Name("type"))));
        assert_eq!(attrs.next(), Some(Ok(AttrToken::Equals)));
        assert_eq!(read_attribute_value(&mut attrs), "text");
        assert_eq!(attrs.next(), Some(Ok(AttrToken::Name("disabled"))));
        assert_eq!(attrs.next(), Some(Ok(AttrToken::SelfClose)));

        let mut lex = attrs.morph::<ContentToken>();
        assert_eq!(lex.next(), Some(Ok(ContentToken::Text("rest"))));
    }

    #[test]
    fn test_unquoted_value_stops_at_close() {
        let mut lex = AttrToken::lexer("href=/a/b>");
        assert_eq!(lex.next(), Some(Ok(AttrToken::Name("href"))));
        assert_eq!(lex.next(), Some(Ok(AttrToken::Equals)));
        assert_eq!(read_attribute_value(&mut lex), "/a/b");
        assert_eq!(lex.next(), Some(Ok(AttrToken::Close)));
    }
}
