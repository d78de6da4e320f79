//! Markup tree grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::{self, Token};

/// Parse markup into a list of top-level nodes
pub fn parse(input: &str) -> Result<Vec<Spanned<MarkupNode>>, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = lexer::lex(input).map_err(|e| vec![e])?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    fragment_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn fragment_parser<'a, I>(
) -> impl Parser<'a, I, Vec<Spanned<MarkupNode>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let node = recursive(|node| {
        let leaf = select! {
            Token::Text(s) => MarkupNode::Text(s),
            Token::Comment(s) => MarkupNode::Comment(s),
            Token::CData(s) => MarkupNode::CData(s),
            Token::Doctype(s) => MarkupNode::Doctype(s),
            Token::Instruction(s) => MarkupNode::ProcessingInstruction(s),
        };

        // Void elements and `<x/>` take no children and no closing tag
        let empty_element = select! {
            Token::OpenTag(tag) if tag.is_empty_element() => tag,
        }
        .map(|tag| MarkupNode::Element(Element::new(tag, Vec::new())));

        let element = select! {
            Token::OpenTag(tag) if !tag.is_empty_element() => tag,
        }
        .then(node.repeated().collect::<Vec<_>>())
        .then(select! { Token::CloseTag(name) => name })
        .try_map(|((tag, children), close), span| {
            if tag.name == close {
                Ok(MarkupNode::Element(Element::new(tag, children)))
            } else {
                Err(Rich::custom(
                    span,
                    format!("Expected </{}> but found </{}>", tag.name, close),
                ))
            }
        });

        choice((leaf, empty_element, element))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    node.repeated().collect().then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(node: &Spanned<MarkupNode>) -> &Element {
        match &node.node {
            MarkupNode::Element(el) => el,
            other => panic!("Expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_elements() {
        let nodes = parse("<ul><li>a</li><li>b</li></ul>").expect("Should parse");
        assert_eq!(nodes.len(), 1);
        let ul = element(&nodes[0]);
        assert_eq!(ul.name, "ul");
        assert_eq!(ul.children.len(), 2);
        let li = element(&ul.children[1]);
        assert_eq!(li.children[0].node, MarkupNode::Text("b".to_string()));
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        let nodes = parse("<p>a<br>b<span/>c</p>").expect("Should parse");
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 5);
        assert_eq!(element(&p.children[1]).name, "br");
        assert!(element(&p.children[3]).children.is_empty());
    }

    #[test]
    fn test_parse_top_level_mix() {
        let nodes = parse("\n<h1>Title</h1>\n<!-- c -->").expect("Should parse");
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].node, MarkupNode::Text("\n".to_string()));
        assert_eq!(nodes[3].node, MarkupNode::Comment(" c ".to_string()));
    }

    #[test]
    fn test_parse_spans() {
        let nodes = parse("<b>x</b>").expect("Should parse");
        assert_eq!(nodes[0].span, 0..8);
        assert_eq!(element(&nodes[0]).children[0].span, 3..4);
    }

    #[test]
    fn test_mismatched_close_tag() {
        let errors = parse("<div></span>").unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unclosed_element() {
        assert!(parse("<div><p>text</p>").is_err());
    }

    #[test]
    fn test_stray_close_tag() {
        assert!(parse("text</p>").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").expect("Should parse"), vec![]);
    }
}
