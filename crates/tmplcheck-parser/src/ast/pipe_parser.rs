//! Pipeline, command and operand parsing.

use tmplcheck_core::{ParseError, ParseErrorKind};

use super::literal::{NumberKind, unquote_string};
use super::node::{
    BoolNode, ChainNode, CommandNode, FieldNode, Ident, IdentifierNode, Node, NumberNode,
    PipeNode, StringNode, VariableNode,
};
use super::parser::{Parser, describe};
use crate::lexer::{Token, TokenKind};

impl<'src> Parser<'src> {
    /// Parse a pipeline up to and including `end`.
    ///
    /// Grammar: `(VARIABLE (',' VARIABLE)? (':=' | '='))? COMMAND ('|' COMMAND)*`
    ///
    /// `allow_two` permits the two-variable form used by `range`.
    pub(super) fn parse_pipeline(
        &mut self,
        context: &str,
        allow_two: bool,
        end: TokenKind,
    ) -> Result<PipeNode, ParseError> {
        let mut pipe = PipeNode {
            span: self.peek().span,
            ..PipeNode::default()
        };
        self.parse_declarations(&mut pipe, context, allow_two)?;

        loop {
            let token = *self.peek();
            if token.kind == end {
                self.advance();
                break;
            }
            if matches!(token.kind, TokenKind::RightDelim | TokenKind::RightParen) {
                let token = self.advance();
                return Err(self.unexpected(token, context));
            }
            let (cmd, piped) = self.parse_command(context)?;
            pipe.cmds.push(cmd);
            if piped && self.check(end) {
                let token = self.advance();
                return Err(self.error(
                    ParseErrorKind::ExpectedToken,
                    token.span,
                    format!("missing command after '|' in {context}"),
                ));
            }
        }

        if pipe.cmds.is_empty() {
            return Err(self.error(
                ParseErrorKind::ExpectedToken,
                pipe.span,
                format!("missing value for {context}"),
            ));
        }
        Ok(pipe)
    }

    fn parse_declarations(
        &mut self,
        pipe: &mut PipeNode,
        context: &str,
        allow_two: bool,
    ) -> Result<(), ParseError> {
        while self.check(TokenKind::Variable) {
            let next = self.lexer.peek_nth(1).kind;
            match next {
                TokenKind::Declare | TokenKind::Assign => {
                    let var = self.advance();
                    self.advance();
                    pipe.is_assign = next == TokenKind::Assign;
                    self.declare(pipe, var);
                    return Ok(());
                }
                TokenKind::Comma => {
                    let var = self.advance();
                    self.advance();
                    self.declare(pipe, var);
                    if !allow_two || pipe.decl.len() >= 2 {
                        return Err(self.error(
                            ParseErrorKind::TooManyDeclarations,
                            var.span,
                            format!("too many declarations in {context}"),
                        ));
                    }
                    if !self.check(TokenKind::Variable) {
                        let token = self.advance();
                        return Err(self.error(
                            ParseErrorKind::ExpectedToken,
                            token.span,
                            format!("{context} can only initialize variables"),
                        ));
                    }
                }
                _ => return Ok(()),
            }
        }
        Ok(())
    }

    fn declare(&mut self, pipe: &mut PipeNode, var: Token<'src>) {
        pipe.decl.push(Ident::new(var.lexeme, var.span));
        self.vars.push(var.lexeme.to_string());
    }

    /// Parse one command. Consumes a trailing `|` and reports whether there was one.
    fn parse_command(&mut self, context: &str) -> Result<(CommandNode, bool), ParseError> {
        let mut cmd = CommandNode {
            args: Vec::new(),
            span: self.peek().span,
        };

        loop {
            match self.parse_operand()? {
                Some(node) => cmd.args.push(node),
                None => {
                    let token = self.advance();
                    return Err(self.unexpected(token, context));
                }
            }

            let next = *self.peek();
            match next.kind {
                TokenKind::RightDelim | TokenKind::RightParen => return Ok((cmd, false)),
                TokenKind::Pipe => {
                    self.advance();
                    return Ok((cmd, true));
                }
                TokenKind::Error | TokenKind::Eof => {
                    let token = self.advance();
                    return Err(self.unexpected(token, context));
                }
                _ if next.spaced => continue,
                _ => {
                    let token = self.advance();
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken,
                        token.span,
                        format!("unexpected {} in operand; missing space?", describe(&token)),
                    ));
                }
            }
        }
    }

    /// A term optionally followed by field accesses: `.A.B`, `$x.A`, `(pipe).A`.
    fn parse_operand(&mut self) -> Result<Option<Node>, ParseError> {
        let Some(node) = self.parse_term()? else {
            return Ok(None);
        };

        let mut fields = Vec::new();
        while self.check(TokenKind::Field) && !self.peek().spaced {
            let token = self.advance();
            fields.push(field_ident(&token));
        }
        if fields.is_empty() {
            return Ok(Some(node));
        }

        Ok(Some(match node {
            Node::Field(mut field) => {
                field.idents.extend(fields);
                Node::Field(field)
            }
            Node::Variable(mut var) => {
                var.idents.extend(fields);
                Node::Variable(var)
            }
            Node::Bool(_) | Node::String(_) | Node::Number(_) | Node::Nil(_) | Node::Dot(_) => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedToken,
                    fields[0].span,
                    format!("unexpected . after term {:?}", node.to_string()),
                ));
            }
            other => {
                let span = other.span();
                Node::Chain(ChainNode {
                    node: Box::new(other),
                    fields,
                    span,
                })
            }
        }))
    }

    fn parse_term(&mut self) -> Result<Option<Node>, ParseError> {
        let token = *self.peek();
        let node = match token.kind {
            TokenKind::Identifier => Node::Identifier(IdentifierNode {
                name: token.lexeme.to_string(),
                span: token.span,
            }),
            TokenKind::Dot => Node::Dot(token.span),
            TokenKind::Nil => Node::Nil(token.span),
            TokenKind::Variable => {
                if !self.vars.iter().any(|v| v == token.lexeme) {
                    return Err(self.error(
                        ParseErrorKind::UndefinedVariable,
                        token.span,
                        format!("undefined variable {:?}", token.lexeme),
                    ));
                }
                Node::Variable(VariableNode {
                    idents: vec![Ident::new(token.lexeme, token.span)],
                    span: token.span,
                })
            }
            TokenKind::Field => Node::Field(FieldNode {
                idents: vec![field_ident(&token)],
                span: token.span,
            }),
            TokenKind::Bool => Node::Bool(BoolNode {
                value: token.lexeme == "true",
                span: token.span,
            }),
            TokenKind::Number | TokenKind::Char => {
                let Some(kind) = NumberKind::classify(token.lexeme) else {
                    return Err(self.error(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("illegal number syntax: {:?}", token.lexeme),
                    ));
                };
                Node::Number(NumberNode {
                    text: token.lexeme.to_string(),
                    kind,
                    span: token.span,
                })
            }
            TokenKind::String | TokenKind::RawString => {
                let Some(text) = unquote_string(token.lexeme) else {
                    return Err(self.error(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("invalid string literal {}", token.lexeme),
                    ));
                };
                Node::String(StringNode {
                    quoted: token.lexeme.to_string(),
                    text,
                    span: token.span,
                })
            }
            TokenKind::LeftParen => {
                self.advance();
                let pipe =
                    self.parse_pipeline("parenthesized pipeline", false, TokenKind::RightParen)?;
                return Ok(Some(Node::Pipe(PipeNode {
                    span: token.span,
                    ..pipe
                })));
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(node))
    }
}

/// `.Name` token to an identifier positioned at the name.
fn field_ident(token: &Token<'_>) -> Ident {
    let mut span = token.span;
    span.col += 1;
    span.len = span.len.saturating_sub(1);
    Ident::new(&token.lexeme[1..], span)
}
