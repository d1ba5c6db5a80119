use std::fmt;

/// A token plus the 1-based source line it began on. The line survives all
/// the way into error reporting, so every token carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Token {
        Token { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Newline,
    Illegal(String),

    // Literals
    Int(String),
    Text(String),

    // Operators
    Assign,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Mod,
    Lt,
    Gt,
    Neq,
    Le,
    Ge,

    // Keywords
    Erwache,
    Verneinung,
    Ding,
    Vorstellung,
    Wille,
    Wenn,
    Dann,
    Sonst,
    Solange,
    Ende,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[rustfmt::skip]
        let pretty = match self {
            TokenKind::Illegal(string) => format!("ILLEGAL: {}", string),
            TokenKind::Int(string)     => string.clone(),
            TokenKind::Text(string)    => format!("\"{}\"", string),
            TokenKind::Eof         => "EOF".to_string(),
            TokenKind::Newline     => "end of line".to_string(),
            TokenKind::Assign      => "=".to_string(),
            TokenKind::Plus        => "+".to_string(),
            TokenKind::Minus       => "-".to_string(),
            TokenKind::Asterisk    => "*".to_string(),
            TokenKind::Slash       => "/".to_string(),
            TokenKind::Mod         => "MOD".to_string(),
            TokenKind::Lt          => "<".to_string(),
            TokenKind::Gt          => ">".to_string(),
            TokenKind::Neq         => "!=".to_string(),
            TokenKind::Le          => "<=".to_string(),
            TokenKind::Ge          => ">=".to_string(),
            TokenKind::Erwache     => "ERWACHE".to_string(),
            TokenKind::Verneinung  => "VERNEINUNG".to_string(),
            TokenKind::Ding        => "DING".to_string(),
            TokenKind::Vorstellung => "VORSTELLUNG".to_string(),
            TokenKind::Wille       => "WILLE".to_string(),
            TokenKind::Wenn        => "WENN".to_string(),
            TokenKind::Dann        => "DANN".to_string(),
            TokenKind::Sonst       => "SONST".to_string(),
            TokenKind::Solange     => "SOLANGE".to_string(),
            TokenKind::Ende        => "ENDE".to_string(),
        };

        write!(f, "{}", pretty)
    }
}
