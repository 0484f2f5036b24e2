//! Tokenizer for XPath expressions.

use super::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    Star,
    ColonColon,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Multiply,
    And,
    Or,
    Div,
    Mod,
    Name(String),
    Literal(String),
    Number(f64),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Slash => "'/'".into(),
            Token::DoubleSlash => "'//'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::At => "'@'".into(),
            Token::Comma => "','".into(),
            Token::Pipe => "'|'".into(),
            Token::Dot => "'.'".into(),
            Token::DotDot => "'..'".into(),
            Token::Star => "'*'".into(),
            Token::ColonColon => "'::'".into(),
            Token::Eq => "'='".into(),
            Token::NotEq => "'!='".into(),
            Token::Lt => "'<'".into(),
            Token::Le => "'<='".into(),
            Token::Gt => "'>'".into(),
            Token::Ge => "'>='".into(),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Multiply => "operator '*'".into(),
            Token::And => "operator 'and'".into(),
            Token::Or => "operator 'or'".into(),
            Token::Div => "operator 'div'".into(),
            Token::Mod => "operator 'mod'".into(),
            Token::Name(name) => format!("name '{name}'"),
            Token::Literal(text) => format!("literal {text:?}"),
            Token::Number(n) => format!("number {n}"),
        }
    }

    fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::And
                | Token::Or
                | Token::Div
                | Token::Mod
                | Token::Multiply
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
        )
    }
}

/// `*` and the names `and`, `or`, `div`, `mod` are operators only when the
/// previous token ends an operand.
fn disambiguate(token: Token, prev: Option<&Token>) -> Token {
    let operator_position = prev.is_some_and(|p| {
        !p.is_operator()
            && !matches!(
                p,
                Token::At | Token::ColonColon | Token::LParen | Token::LBracket | Token::Comma
            )
    });
    if !operator_position {
        return token;
    }
    match token {
        Token::Star => Token::Multiply,
        Token::Name(name) => match name.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "div" => Token::Div,
            "mod" => Token::Mod,
            _ => Token::Name(name),
        },
        other => other,
    }
}

/// A token and the byte offset where it starts.
pub(crate) type Spanned = (Token, usize);

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '/' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '[' => single(&mut chars, Token::LBracket),
            ']' => single(&mut chars, Token::RBracket),
            '(' => single(&mut chars, Token::LParen),
            ')' => single(&mut chars, Token::RParen),
            '@' => single(&mut chars, Token::At),
            ',' => single(&mut chars, Token::Comma),
            '|' => single(&mut chars, Token::Pipe),
            '*' => single(&mut chars, Token::Star),
            '+' => single(&mut chars, Token::Plus),
            '-' => single(&mut chars, Token::Minus),
            '$' => {
                return Err(SyntaxError::new(start, "variable references are not supported"));
            }
            '=' => single(&mut chars, Token::Eq),
            '!' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '=').is_none() {
                    return Err(SyntaxError::new(start, "expected '=' after '!'"));
                }
                Token::NotEq
            }
            '<' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            ':' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == ':').is_none() {
                    return Err(SyntaxError::new(start, "namespace prefixes are not supported"));
                }
                Token::ColonColon
            }
            '"' | '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, q)) if q == c => break,
                        Some((_, ch)) => text.push(ch),
                        None => return Err(SyntaxError::new(start, "unterminated string literal")),
                    }
                }
                Token::Literal(text)
            }
            '.' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '.').is_some() {
                    Token::DotDot
                } else if chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
                    let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                    number(start, &format!("0.{digits}"))?
                } else {
                    Token::Dot
                }
            }
            c if c.is_ascii_digit() => {
                let mut text = take_while(&mut chars, |c| c.is_ascii_digit());
                if chars.next_if(|&(_, c)| c == '.').is_some() {
                    text.push('.');
                    text.push_str(&take_while(&mut chars, |c| c.is_ascii_digit()));
                }
                number(start, &text)?
            }
            c if is_name_start(c) => Token::Name(take_while(&mut chars, is_name_char)),
            other => {
                return Err(SyntaxError::new(start, format!("unexpected character '{other}'")));
            }
        };
        let token = disambiguate(token, tokens.last().map(|(t, _)| t));
        tokens.push((token, start));
    }

    Ok(tokens)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn single(chars: &mut Chars<'_>, token: Token) -> Token {
    chars.next();
    token
}

fn take_while(chars: &mut Chars<'_>, pred: impl Fn(char) -> bool) -> String {
    let mut text = String::new();
    while let Some((_, c)) = chars.next_if(|&(_, c)| pred(c)) {
        text.push(c);
    }
    text
}

fn number(start: usize, text: &str) -> Result<Token, SyntaxError> {
    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|e| SyntaxError::new(start, format!("invalid number '{text}': {e}")))
}
