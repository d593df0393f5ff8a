//! Template parser.
//!
//! The parser is recursive descent over the token stream of a [`Lexer`].
//! Parsing one source produces one tree for the top-level template plus one
//! per `{{define}}` and `{{block}}` it contains.
//!
//! Besides building nodes it tracks the declared variables of the enclosing
//! scopes, so a use of an undeclared `$name` is reported at parse time, and
//! it rejects `{{break}}`/`{{continue}}` outside a `{{range}}`.

use tmplcheck_core::{ParseError, ParseErrorKind, Span};
use tracing::debug;

use super::literal::unquote_string;
use super::node::{
    ActionNode, BranchNode, CommentNode, ListNode, Node, PipeNode, TemplateNode, TextNode,
};
use super::tree::Tree;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parser for template source.
pub struct Parser<'src> {
    pub(super) lexer: Lexer<'src>,
    /// Name of the source, recorded in every tree and error.
    pub(super) file: String,
    /// Trees completed so far.
    trees: Vec<Tree>,
    /// Variables visible at the current position, innermost last.
    pub(super) vars: Vec<String>,
    /// Number of enclosing `{{range}}` actions.
    range_depth: usize,
}

/// What `parse_item` found.
enum Item {
    Node(Node),
    /// `{{else`, with the rest of the action still unread.
    Else(Span),
    /// `{{end}}`
    End,
}

impl<'src> Parser<'src> {
    /// Create a parser over `source`, reporting locations against `file`.
    pub fn new(file: impl Into<String>, source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            file: file.into(),
            trees: Vec::new(),
            vars: vec!["$".to_string()],
            range_depth: 0,
        }
    }

    /// Parse `source` as the template `name`.
    ///
    /// Returns the top-level tree and every template it defines. The source
    /// name of each tree is `name`.
    ///
    /// # Example
    ///
    /// ```
    /// use tmplcheck_parser::Parser;
    ///
    /// let trees = Parser::parse("page", r#"{{define "row"}}{{.}}{{end}}{{template "row" .Name}}"#).unwrap();
    /// let names: Vec<_> = trees.iter().map(|t| t.name.as_str()).collect();
    /// assert_eq!(names, ["row", "page"]);
    /// ```
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(name: &str, source: &'src str) -> Result<Vec<Tree>, ParseError> {
        let mut parser = Parser::new(name, source);
        parser.parse_root(name)?;
        debug!(template = name, trees = parser.trees.len(), "parsed template source");
        Ok(parser.trees)
    }

    fn parse_root(&mut self, name: &str) -> Result<(), ParseError> {
        let mut root = ListNode::new(Span::new(1, 1, 0));
        loop {
            let token = *self.peek();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::LeftDelim if self.lexer.peek_nth(1).kind == TokenKind::Define => {
                    self.advance();
                    self.advance();
                    self.parse_define()?;
                }
                _ => match self.parse_item()? {
                    Item::Node(node) => root.nodes.push(node),
                    Item::Else(span) => {
                        return Err(self.error(
                            ParseErrorKind::MisplacedKeyword,
                            span,
                            "unexpected {{else}}",
                        ));
                    }
                    Item::End => {
                        return Err(self.error(
                            ParseErrorKind::MisplacedKeyword,
                            token.span,
                            "unexpected {{end}}",
                        ));
                    }
                },
            }
        }
        let file = self.file.clone();
        self.add_tree(Tree::new(name, file, root), Span::new(1, 1, 0))
    }

    // =========================================
    // Token helpers
    // =========================================

    pub(super) fn peek(&mut self) -> &Token<'src> {
        self.lexer.peek()
    }

    pub(super) fn advance(&mut self) -> Token<'src> {
        self.lexer.next_token()
    }

    pub(super) fn check(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(super) fn expect(
        &mut self,
        kind: TokenKind,
        context: &str,
    ) -> Result<Token<'src>, ParseError> {
        if let Some(token) = self.eat(kind) {
            return Ok(token);
        }
        let found = self.advance();
        if matches!(found.kind, TokenKind::Error | TokenKind::Eof) {
            return Err(self.unexpected(found, context));
        }
        Err(self.error(
            ParseErrorKind::ExpectedToken,
            found.span,
            format!("expected {kind} in {context}, found {}", describe(&found)),
        ))
    }

    pub(super) fn error(
        &self,
        kind: ParseErrorKind,
        span: Span,
        message: impl Into<String>,
    ) -> ParseError {
        ParseError::new(kind, self.file.as_str(), span, message)
    }

    /// Error for a token that cannot appear here. Lexer failures surface as their own error.
    pub(super) fn unexpected(&mut self, token: Token<'src>, context: &str) -> ParseError {
        match token.kind {
            TokenKind::Error => match self.lexer.take_error() {
                Some(error) => error.into_parse_error(&self.file),
                None => self.error(ParseErrorKind::UnexpectedToken, token.span, "invalid input"),
            },
            TokenKind::Eof => self.error(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("unexpected EOF in {context}"),
            ),
            _ => self.error(
                ParseErrorKind::UnexpectedToken,
                token.span,
                format!("unexpected {} in {context}", describe(&token)),
            ),
        }
    }

    // =========================================
    // Lists and actions
    // =========================================

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Text => Ok(Item::Node(Node::Text(TextNode {
                text: token.lexeme.to_string(),
                span: token.span,
            }))),
            TokenKind::Comment => Ok(Item::Node(Node::Comment(CommentNode {
                text: token.lexeme.to_string(),
                span: token.span,
            }))),
            TokenKind::LeftDelim => self.parse_action(),
            _ => Err(self.unexpected(token, "input")),
        }
    }

    /// Parse the body of an action whose `{{` was consumed.
    fn parse_action(&mut self) -> Result<Item, ParseError> {
        let token = *self.peek();
        match token.kind {
            TokenKind::Block => {
                self.advance();
                self.parse_block(token.span).map(Item::Node)
            }
            TokenKind::Break | TokenKind::Continue => {
                self.advance();
                if self.range_depth == 0 {
                    return Err(self.error(
                        ParseErrorKind::MisplacedKeyword,
                        token.span,
                        format!("{{{{{}}}}} outside {{{{range}}}}", token.lexeme),
                    ));
                }
                self.expect(TokenKind::RightDelim, token.lexeme)?;
                Ok(Item::Node(if token.kind == TokenKind::Break {
                    Node::Break(token.span)
                } else {
                    Node::Continue(token.span)
                }))
            }
            TokenKind::Define => Err(self.error(
                ParseErrorKind::MisplacedKeyword,
                token.span,
                "{{define}} must appear at the top level",
            )),
            TokenKind::Else => {
                self.advance();
                Ok(Item::Else(token.span))
            }
            TokenKind::End => {
                self.advance();
                self.expect(TokenKind::RightDelim, "end")?;
                Ok(Item::End)
            }
            TokenKind::If | TokenKind::Range | TokenKind::With => {
                let keyword = self.advance();
                self.parse_control(keyword).map(Item::Node)
            }
            TokenKind::Template => {
                self.advance();
                self.parse_template(token.span).map(Item::Node)
            }
            _ => {
                let pipe = self.parse_pipeline("command", false, TokenKind::RightDelim)?;
                Ok(Item::Node(Node::Action(ActionNode {
                    span: pipe.span,
                    pipe,
                })))
            }
        }
    }

    /// Parse nodes up to `{{else` or `{{end}}`.
    fn parse_list(&mut self) -> Result<(ListNode, Option<Span>), ParseError> {
        let mut list = ListNode::new(self.peek().span);
        loop {
            if self.check(TokenKind::Eof) {
                let token = self.advance();
                return Err(self.unexpected(token, "list"));
            }
            match self.parse_item()? {
                Item::Node(node) => list.nodes.push(node),
                Item::Else(span) => return Ok((list, Some(span))),
                Item::End => return Ok((list, None)),
            }
        }
    }

    // =========================================
    // Control structures
    // =========================================

    /// `if`, `range` and `with`, after the keyword.
    fn parse_control(&mut self, keyword: Token<'src>) -> Result<Node, ParseError> {
        let mark = self.vars.len();
        let is_range = keyword.kind == TokenKind::Range;

        let result = self
            .parse_pipeline(keyword.lexeme, is_range, TokenKind::RightDelim)
            .and_then(|pipe| {
                if is_range {
                    self.range_depth += 1;
                }
                let body = self.parse_branch(keyword, pipe);
                if is_range {
                    self.range_depth -= 1;
                }
                body
            });

        self.vars.truncate(mark);
        result
    }

    fn parse_branch(
        &mut self,
        keyword: Token<'src>,
        pipe: PipeNode,
    ) -> Result<Node, ParseError> {
        let (list, else_span) = self.parse_list()?;

        let else_list = match else_span {
            None => None,
            Some(span) => {
                let next = *self.peek();
                let chained = next.kind == keyword.kind
                    && matches!(keyword.kind, TokenKind::If | TokenKind::With);
                if chained {
                    // {{else if ...}} shares the {{end}} of the outer action.
                    let nested_keyword = self.advance();
                    let nested = self.parse_control(nested_keyword)?;
                    let mut else_list = ListNode::new(span);
                    else_list.nodes.push(nested);
                    Some(else_list)
                } else {
                    self.expect(TokenKind::RightDelim, "else")?;
                    let (else_list, again) = self.parse_list()?;
                    if let Some(span) = again {
                        return Err(self.error(
                            ParseErrorKind::MisplacedKeyword,
                            span,
                            "expected end; found {{else}}",
                        ));
                    }
                    Some(else_list)
                }
            }
        };

        let branch = BranchNode {
            pipe,
            list,
            else_list,
            span: keyword.span,
        };
        Ok(match keyword.kind {
            TokenKind::If => Node::If(branch),
            TokenKind::Range => Node::Range(branch),
            _ => Node::With(branch),
        })
    }

    /// `{{template "name" pipeline}}`, after the keyword.
    fn parse_template(&mut self, span: Span) -> Result<Node, ParseError> {
        let name = self.parse_template_name("template clause")?;
        let pipe = if self.eat(TokenKind::RightDelim).is_some() {
            None
        } else {
            Some(self.parse_pipeline("template clause", false, TokenKind::RightDelim)?)
        };
        Ok(Node::Template(TemplateNode { name, pipe, span }))
    }

    /// `{{block "name" pipeline}} list {{end}}`: defines `name` and invokes it.
    fn parse_block(&mut self, span: Span) -> Result<Node, ParseError> {
        let name = self.parse_template_name("block clause")?;
        let pipe = self.parse_pipeline("block clause", false, TokenKind::RightDelim)?;
        let list = self.parse_template_body("block clause")?;
        let file = self.file.clone();
        self.add_tree(Tree::new(name.clone(), file, list), span)?;
        Ok(Node::Template(TemplateNode {
            name,
            pipe: Some(pipe),
            span,
        }))
    }

    /// `{{define "name"}} list {{end}}`, after the keyword.
    fn parse_define(&mut self) -> Result<(), ParseError> {
        let span = self.peek().span;
        let name = self.parse_template_name("define clause")?;
        self.expect(TokenKind::RightDelim, "define clause")?;
        let list = self.parse_template_body("define clause")?;
        let file = self.file.clone();
        self.add_tree(Tree::new(name, file, list), span)
    }

    /// A nested template body, parsed with fresh variable scope.
    fn parse_template_body(&mut self, context: &str) -> Result<ListNode, ParseError> {
        let saved_vars = std::mem::replace(&mut self.vars, vec!["$".to_string()]);
        let saved_depth = std::mem::take(&mut self.range_depth);
        let result = self.parse_list();
        self.vars = saved_vars;
        self.range_depth = saved_depth;

        match result? {
            (list, None) => Ok(list),
            (_, Some(span)) => Err(self.error(
                ParseErrorKind::MisplacedKeyword,
                span,
                format!("unexpected {{{{else}}}} in {context}"),
            )),
        }
    }

    fn parse_template_name(&mut self, context: &str) -> Result<String, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::String | TokenKind::RawString => unquote_string(token.lexeme).ok_or_else(|| {
                self.error(
                    ParseErrorKind::InvalidLiteral,
                    token.span,
                    format!("invalid template name {}", token.lexeme),
                )
            }),
            TokenKind::Error | TokenKind::Eof => Err(self.unexpected(token, context)),
            _ => Err(self.error(
                ParseErrorKind::ExpectedToken,
                token.span,
                format!("expected template name in {context}, found {}", describe(&token)),
            )),
        }
    }

    /// Record a finished tree. A blank tree never replaces a non-blank one.
    fn add_tree(&mut self, tree: Tree, span: Span) -> Result<(), ParseError> {
        match self.trees.iter().position(|t| t.name == tree.name) {
            None => self.trees.push(tree),
            Some(index) if self.trees[index].is_blank() => self.trees[index] = tree,
            Some(_) if tree.is_blank() => {}
            Some(_) => {
                return Err(self.error(
                    ParseErrorKind::DuplicateTemplate,
                    span,
                    format!("multiple definition of template {:?}", tree.name),
                ));
            }
        }
        Ok(())
    }
}

/// Token text for messages.
pub(super) fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Eof | TokenKind::Error => token.kind.description().to_string(),
        _ if token.lexeme.is_empty() => token.kind.description().to_string(),
        _ => format!("{:?}", token.lexeme),
    }
}
