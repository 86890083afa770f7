use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
pub enum Token {
    // Keywords are uppercase, as in the canonical display form
    #[token("IF")]
    If,
    #[token("GOTO")]
    Goto,

    #[token("<-")]
    Assign,
    #[token("!=")]
    NotEquals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,

    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Number(u64),

    // Variables and labels share one shape; the catalog checks which is which
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // One instruction per line
    #[token("\n")]
    Newline,
}

impl Token {
    /// Human-readable form used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::If => "'IF'".into(),
            Token::Goto => "'GOTO'".into(),
            Token::Assign => "'<-'".into(),
            Token::NotEquals => "'!='".into(),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Number(n) => format!("number {n}"),
            Token::Ident(name) => format!("'{name}'"),
            Token::Newline => "end of line".into(),
        }
    }
}

/// Lex source text into a stream of tokens with byte ranges.
/// Stops at the first character that cannot start a token.
pub fn lex(source: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                return Err(LexError {
                    position: span.start,
                    snippet: source[span.clone()].to_string(),
                    suggestion: suggest_fix(&source[span]),
                });
            }
        }
    }

    Ok(tokens)
}

fn suggest_fix(bad_token: &str) -> String {
    match bad_token {
        "←" | "<" => "write assignment as '<-'".to_string(),
        "≠" | "!" => "write the jump condition as '!= 0'".to_string(),
        "=" => "assignment is '<-'; the jump condition is '!='".to_string(),
        "*" | "/" => "only '+ 1' and '- 1' are instructions".to_string(),
        digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            format!("number literal '{digits}' is too large; values must fit in 64 bits")
        }
        _ => format!("unexpected character(s) '{bad_token}'; comments start with '#'"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected character '{snippet}' at byte {position}. {suggestion}")]
pub struct LexError {
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}

impl LexError {
    pub fn code(&self) -> &'static str {
        "SEM-L001"
    }
}
