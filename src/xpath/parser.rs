//! Recursive-descent parser producing the expression tree.
//!
//! Precedence, lowest first: `or`, `and`, `=`/`!=`, `<`/`<=`/`>`/`>=`,
//! `+`/`-`, `*`/`div`/`mod`, unary `-`, `|`, path/filter.

use super::lexer::{Spanned, Token};
use super::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Path(LocationPath),
    /// Primary expression with predicates and/or a trailing relative path,
    /// e.g. `(//p)[1]` or `(//div)//a`.
    Filter {
        base: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Union(Vec<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    /// The step `//` abbreviates.
    fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    Namespace,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "attribute" => Axis::Attribute,
            "namespace" => Axis::Namespace,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(String),
    Any,
    Text,
    Comment,
    /// `processing-instruction()`, optionally restricted to one target.
    ProcessingInstruction(Option<String>),
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    // Node-set
    Last,
    Position,
    Count,
    Id,
    LocalName,
    NamespaceUri,
    Name,
    // String
    String,
    Concat,
    StartsWith,
    Contains,
    SubstringBefore,
    SubstringAfter,
    Substring,
    StringLength,
    NormalizeSpace,
    Translate,
    // Boolean
    Boolean,
    Not,
    True,
    False,
    Lang,
    // Number
    Number,
    Sum,
    Floor,
    Ceiling,
    Round,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Function::Last,
            "position" => Function::Position,
            "count" => Function::Count,
            "id" => Function::Id,
            "local-name" => Function::LocalName,
            "namespace-uri" => Function::NamespaceUri,
            "name" => Function::Name,
            "string" => Function::String,
            "concat" => Function::Concat,
            "starts-with" => Function::StartsWith,
            "contains" => Function::Contains,
            "substring-before" => Function::SubstringBefore,
            "substring-after" => Function::SubstringAfter,
            "substring" => Function::Substring,
            "string-length" => Function::StringLength,
            "normalize-space" => Function::NormalizeSpace,
            "translate" => Function::Translate,
            "boolean" => Function::Boolean,
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "lang" => Function::Lang,
            "number" => Function::Number,
            "sum" => Function::Sum,
            "floor" => Function::Floor,
            "ceiling" => Function::Ceiling,
            "round" => Function::Round,
            _ => return None,
        })
    }

    /// Accepted argument counts, inclusive.
    fn arity(self) -> (usize, usize) {
        match self {
            Function::Position | Function::Last | Function::True | Function::False => (0, 0),
            Function::Count
            | Function::Id
            | Function::Boolean
            | Function::Not
            | Function::Lang
            | Function::Sum
            | Function::Floor
            | Function::Ceiling
            | Function::Round => (1, 1),
            Function::StartsWith
            | Function::Contains
            | Function::SubstringBefore
            | Function::SubstringAfter => (2, 2),
            Function::Translate => (3, 3),
            Function::Substring => (2, 3),
            Function::LocalName
            | Function::NamespaceUri
            | Function::Name
            | Function::String
            | Function::StringLength
            | Function::NormalizeSpace
            | Function::Number => (0, 1),
            Function::Concat => (2, usize::MAX),
        }
    }
}

/// Node-type tests that look like function calls.
fn node_type(name: &str) -> Option<NodeTest> {
    match name {
        "text" => Some(NodeTest::Text),
        "comment" => Some(NodeTest::Comment),
        "processing-instruction" => Some(NodeTest::ProcessingInstruction(None)),
        "node" => Some(NodeTest::Node),
        _ => None,
    }
}

pub(crate) fn parse(tokens: &[Spanned], input_len: usize) -> Result<Expr, SyntaxError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len,
    };
    if tokens.is_empty() {
        return Err(SyntaxError::new(0, "empty expression"));
    }
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error(format!("unexpected {}", token.describe()))),
    }
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    input_len: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.input_len, |(_, o)| *o)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.offset(), message)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t);
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), SyntaxError> {
        if self.eat(token) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), Token::describe);
        Err(self.error(format!("expected {}, found {found}", token.describe())))
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::Or) {
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.equality_expr()?;
        while self.eat(&Token::And) {
            let rhs = self.equality_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational_expr()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.additive_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.additive_expr()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn additive_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative_expr()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Multiply) => ArithOp::Mul,
                Some(Token::Div) => ArithOp::Div,
                Some(Token::Mod) => ArithOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary_expr()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Minus) {
            let operand = self.unary_expr()?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.union_expr()
    }

    fn union_expr(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.path_expr()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat(&Token::Pipe) {
            parts.push(self.path_expr()?);
        }
        Ok(Expr::Union(parts))
    }

    fn path_expr(&mut self) -> Result<Expr, SyntaxError> {
        let is_call = matches!(
            (self.peek(), self.peek_at(1)),
            (Some(Token::Name(name)), Some(Token::LParen)) if node_type(name).is_none()
        );
        match self.peek() {
            Some(Token::Literal(_) | Token::Number(_) | Token::LParen) => self.filter_expr(),
            Some(_) if is_call => self.filter_expr(),
            Some(_) => Ok(Expr::Path(self.location_path()?)),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn filter_expr(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.primary()?;
        let predicates = self.predicates()?;
        let mut steps = Vec::new();
        self.relative_tail(&mut steps)?;
        if predicates.is_empty() && steps.is_empty() {
            Ok(base)
        } else {
            Ok(Expr::Filter {
                base: Box::new(base),
                predicates,
                steps,
            })
        }
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.offset();
        match self.advance().cloned() {
            Some(Token::Literal(text)) => Ok(Expr::Literal(text)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                let function = Function::from_name(&name)
                    .ok_or_else(|| SyntaxError::new(start, format!("unknown function '{name}()'")))?;
                self.expect(&Token::LParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(&Token::Comma)?;
                    }
                }
                let (min, max) = function.arity();
                if args.len() < min || args.len() > max {
                    return Err(SyntaxError::new(
                        start,
                        format!("wrong number of arguments to '{name}()': {}", args.len()),
                    ));
                }
                Ok(Expr::Call(function, args))
            }
            _ => Err(SyntaxError::new(start, "expected an expression")),
        }
    }

    fn location_path(&mut self) -> Result<LocationPath, SyntaxError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if self.starts_step() {
                    steps.push(self.step()?);
                    self.relative_tail(&mut steps)?;
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self());
                steps.push(self.step()?);
                self.relative_tail(&mut steps)?;
                true
            }
            _ => {
                steps.push(self.step()?);
                self.relative_tail(&mut steps)?;
                false
            }
        };
        Ok(LocationPath { absolute, steps })
    }

    /// Parses any number of `/step` or `//step` continuations.
    fn relative_tail(&mut self, steps: &mut Vec<Step>) -> Result<(), SyntaxError> {
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn step(&mut self) -> Result<Step, SyntaxError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) = (self.peek(), self.peek_at(1)) {
            let axis = Axis::from_name(name).ok_or_else(|| self.error(format!("unknown axis '{name}'")))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let predicates = self.predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest, SyntaxError> {
        let start = self.offset();
        match self.advance().cloned() {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::Name(name)) => {
                if self.eat(&Token::LParen) {
                    let mut test = node_type(&name)
                        .ok_or_else(|| SyntaxError::new(start, format!("unknown node type '{name}()'")))?;
                    if test == NodeTest::ProcessingInstruction(None) {
                        if let Some(Token::Literal(target)) = self.peek().cloned() {
                            self.pos += 1;
                            test = NodeTest::ProcessingInstruction(Some(target));
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(test)
                } else {
                    Ok(NodeTest::Name(name))
                }
            }
            Some(other) => Err(SyntaxError::new(
                start,
                format!("expected a node test, found {}", other.describe()),
            )),
            None => Err(SyntaxError::new(start, "expected a node test, found end of expression")),
        }
    }

    fn predicates(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.expr()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::lexer::tokenize;

    fn parse_str(input: &str) -> Result<Expr, SyntaxError> {
        parse(&tokenize(input)?, input.len())
    }

    fn path(input: &str) -> LocationPath {
        match parse_str(input).unwrap() {
            Expr::Path(path) => path,
            other => panic!("expected a location path, got {other:?}"),
        }
    }

    #[test]
    fn double_slash_expands_to_descendant_or_self() {
        let p = path("//a");
        assert!(p.absolute);
        assert_eq!(
            p.steps,
            [
                Step::new(Axis::DescendantOrSelf, NodeTest::Node),
                Step::new(Axis::Child, NodeTest::Name("a".into())),
            ]
        );
    }

    #[test]
    fn root_alone_is_a_path() {
        let p = path("/");
        assert!(p.absolute);
        assert!(p.steps.is_empty());
    }

    #[test]
    fn abbreviations() {
        let p = path("../@href");
        assert!(!p.absolute);
        assert_eq!(p.steps[0], Step::new(Axis::Parent, NodeTest::Node));
        assert_eq!(p.steps[1], Step::new(Axis::Attribute, NodeTest::Name("href".into())));
    }

    #[test]
    fn explicit_axes_and_node_types() {
        let p = path("ancestor-or-self::div/following-sibling::*/text()");
        let axes: Vec<_> = p.steps.iter().map(|s| s.axis).collect();
        assert_eq!(axes, [Axis::AncestorOrSelf, Axis::FollowingSibling, Axis::Child]);
        assert_eq!(p.steps[1].test, NodeTest::Any);
        assert_eq!(p.steps[2].test, NodeTest::Text);
    }

    #[test]
    fn predicates_attach_to_steps() {
        let p = path("//li[2][@class='x']");
        assert_eq!(p.steps[1].predicates.len(), 2);
        assert_eq!(p.steps[1].predicates[0], Expr::Number(2.0));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse_str("1 or 2 and 3").unwrap();
        assert!(matches!(expr, Expr::Or(_, ref rhs) if matches!(**rhs, Expr::And(..))));
    }

    #[test]
    fn union_of_paths() {
        let expr = parse_str("//h1 | //h2 | //h3").unwrap();
        assert!(matches!(expr, Expr::Union(ref parts) if parts.len() == 3));
    }

    #[test]
    fn filter_expression_with_predicate_and_tail() {
        let expr = parse_str("(//table)[1]//td").unwrap();
        match expr {
            Expr::Filter {
                predicates, steps, ..
            } => {
                assert_eq!(predicates, [Expr::Number(1.0)]);
                assert_eq!(steps.len(), 2);
            }
            other => panic!("expected filter, got {other:?}"),
        }
    }

    #[test]
    fn function_arity_is_checked() {
        let err = parse_str("//a[contains(@href)]").unwrap_err();
        assert!(err.message.contains("contains"));
        assert!(parse_str("//a[position()=last()]").is_ok());
        assert!(parse_str("concat('a')").is_err());
        assert!(parse_str("substring('abc', 2)").is_ok());
        assert!(parse_str("substring('abc')").is_err());
        assert!(parse_str("translate('a', 'b')").is_err());
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse_str("1 + 2 * 3 = 7").unwrap();
        let Expr::Compare(CompareOp::Eq, lhs, _) = expr else {
            panic!("expected equality");
        };
        match *lhs {
            Expr::Arith(ArithOp::Add, _, ref rhs) => {
                assert!(matches!(**rhs, Expr::Arith(ArithOp::Mul, ..)));
            }
            ref other => panic!("expected addition, got {other:?}"),
        }
    }

    #[test]
    fn relational_binds_tighter_than_equality() {
        let expr = parse_str("1 < 2 = true()").unwrap();
        assert!(matches!(expr, Expr::Compare(CompareOp::Eq, ref lhs, _) if matches!(**lhs, Expr::Compare(CompareOp::Lt, ..))));
    }

    #[test]
    fn unary_minus_and_predicate_arithmetic() {
        assert!(matches!(parse_str("-1").unwrap(), Expr::Negate(_)));
        assert!(matches!(parse_str("--1").unwrap(), Expr::Negate(ref inner) if matches!(**inner, Expr::Negate(_))));
        let p = path("//p[last()-1]");
        assert!(matches!(p.steps[1].predicates[0], Expr::Arith(ArithOp::Sub, ..)));
        let p = path("//tr[position() mod 2 = 0]");
        assert!(matches!(p.steps[1].predicates[0], Expr::Compare(CompareOp::Eq, ..)));
    }

    #[test]
    fn document_order_axes() {
        let p = path("following::p/preceding::h2/namespace::*");
        let axes: Vec<_> = p.steps.iter().map(|s| s.axis).collect();
        assert_eq!(axes, [Axis::Following, Axis::Preceding, Axis::Namespace]);
    }

    #[test]
    fn processing_instruction_tests() {
        assert_eq!(path("//processing-instruction()").steps[1].test, NodeTest::ProcessingInstruction(None));
        assert_eq!(
            path("processing-instruction('xml-stylesheet')").steps[0].test,
            NodeTest::ProcessingInstruction(Some("xml-stylesheet".into()))
        );
        assert!(parse_str("text('x')").is_err());
    }

    #[test]
    fn element_named_like_keyword() {
        let p = path("//and/or");
        assert_eq!(p.steps[2].test, NodeTest::Name("or".into()));
        let p = path("div/mod");
        assert_eq!(p.steps[1].test, NodeTest::Name("mod".into()));
    }

    #[test]
    fn malformed_expressions() {
        for input in ["", "//", "//a[", "//a]", "/a/", "foo(", "//a[@]", "bogus::a", "//a[1", "@", "1 +", "//a[* 2]", "-"] {
            assert!(parse_str(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn error_offset_points_at_problem() {
        let err = parse_str("//div[@id='x']]").unwrap_err();
        assert_eq!(err.offset, 14);
    }

    #[test]
    fn unknown_function_is_an_error() {
        let err = parse_str("//a[frobnicate()]").unwrap_err();
        assert!(err.message.contains("frobnicate"));
    }
}
