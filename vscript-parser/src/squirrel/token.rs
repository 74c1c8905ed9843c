//! Token kinds and helpers for the Squirrel dialect.
//!
//! Every byte of the input belongs to exactly one token, trivia included:
//! whitespace runs, line feeds and comments are emitted as tokens of their
//! own so downstream consumers can rely on spans partitioning the file.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use super::lexing::Tokenization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Invalid,
    Eof,

    // Trivia
    Whitespace,
    LineFeed,
    LineComment,
    BlockComment,
    DocComment,

    // Punctuation and single-character operators
    OpenRound,
    CloseRound,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
    Semicolon,
    Comma,
    Question,
    Caret,
    Tilde,
    Dot,
    Colon,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Less,
    Greater,
    Assign,
    Exclamation,
    At,

    // Multi-character operators
    PlusPlus,
    MinusMinus,
    Equals,
    NotEquals,
    LessEquals,
    GreaterEquals,
    AmpersandAmpersand,
    PipePipe,
    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,
    PercentAssign,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    ThreeWayCompare,
    NewSlot,
    DoubleColon,
    AttrOpen,
    AttrClose,
    Varparams,

    // Literals and identifiers
    Identifier,
    String,
    VerbatimString,
    Integer,
    Float,

    // Keywords
    BaseKeyword,
    BreakKeyword,
    CaseKeyword,
    CatchKeyword,
    ClassKeyword,
    CloneKeyword,
    ConstKeyword,
    ConstructorKeyword,
    ContinueKeyword,
    DefaultKeyword,
    DeleteKeyword,
    DoKeyword,
    ElseKeyword,
    EnumKeyword,
    ExtendsKeyword,
    FalseKeyword,
    ForKeyword,
    ForeachKeyword,
    FunctionKeyword,
    IfKeyword,
    InKeyword,
    InstanceOfKeyword,
    LocalKeyword,
    NullKeyword,
    RawCallKeyword,
    ResumeKeyword,
    ReturnKeyword,
    StaticKeyword,
    SwitchKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeOfKeyword,
    WhileKeyword,
    YieldKeyword,
    LineMacro,
    FileMacro,
}

impl TokenKind {
    /// Fixed source text of the kind, for kinds with a single spelling.
    pub fn text(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            OpenRound => "(",
            CloseRound => ")",
            OpenCurly => "{",
            CloseCurly => "}",
            OpenSquare => "[",
            CloseSquare => "]",
            Semicolon => ";",
            Comma => ",",
            Question => "?",
            Caret => "^",
            Tilde => "~",
            Dot => ".",
            Colon => ":",
            Plus => "+",
            Minus => "-",
            Asterisk => "*",
            Slash => "/",
            Percent => "%",
            Ampersand => "&",
            Pipe => "|",
            Less => "<",
            Greater => ">",
            Assign => "=",
            Exclamation => "!",
            At => "@",
            PlusPlus => "++",
            MinusMinus => "--",
            Equals => "==",
            NotEquals => "!=",
            LessEquals => "<=",
            GreaterEquals => ">=",
            AmpersandAmpersand => "&&",
            PipePipe => "||",
            PlusAssign => "+=",
            MinusAssign => "-=",
            AsteriskAssign => "*=",
            SlashAssign => "/=",
            PercentAssign => "%=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            UnsignedShiftRight => ">>>",
            ThreeWayCompare => "<=>",
            NewSlot => "<-",
            DoubleColon => "::",
            AttrOpen => "</",
            AttrClose => "/>",
            Varparams => "...",
            BaseKeyword => "base",
            BreakKeyword => "break",
            CaseKeyword => "case",
            CatchKeyword => "catch",
            ClassKeyword => "class",
            CloneKeyword => "clone",
            ConstKeyword => "const",
            ConstructorKeyword => "constructor",
            ContinueKeyword => "continue",
            DefaultKeyword => "default",
            DeleteKeyword => "delete",
            DoKeyword => "do",
            ElseKeyword => "else",
            EnumKeyword => "enum",
            ExtendsKeyword => "extends",
            FalseKeyword => "false",
            ForKeyword => "for",
            ForeachKeyword => "foreach",
            FunctionKeyword => "function",
            IfKeyword => "if",
            InKeyword => "in",
            InstanceOfKeyword => "instanceof",
            LocalKeyword => "local",
            NullKeyword => "null",
            RawCallKeyword => "rawcall",
            ResumeKeyword => "resume",
            ReturnKeyword => "return",
            StaticKeyword => "static",
            SwitchKeyword => "switch",
            ThisKeyword => "this",
            ThrowKeyword => "throw",
            TrueKeyword => "true",
            TryKeyword => "try",
            TypeOfKeyword => "typeof",
            WhileKeyword => "while",
            YieldKeyword => "yield",
            LineMacro => "__LINE__",
            FileMacro => "__FILE__",
            _ => return None,
        })
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment
        )
    }

    pub fn is_trivia(self) -> bool {
        self.is_comment() || matches!(self, TokenKind::Whitespace | TokenKind::LineFeed)
    }

    pub fn is_string(self) -> bool {
        matches!(self, TokenKind::String | TokenKind::VerbatimString)
    }
}

/// Keyword spelling to token kind.
pub static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("while", WhileKeyword),
        ("do", DoKeyword),
        ("if", IfKeyword),
        ("else", ElseKeyword),
        ("break", BreakKeyword),
        ("continue", ContinueKeyword),
        ("return", ReturnKeyword),
        ("null", NullKeyword),
        ("function", FunctionKeyword),
        ("local", LocalKeyword),
        ("for", ForKeyword),
        ("foreach", ForeachKeyword),
        ("in", InKeyword),
        ("typeof", TypeOfKeyword),
        ("base", BaseKeyword),
        ("delete", DeleteKeyword),
        ("try", TryKeyword),
        ("catch", CatchKeyword),
        ("throw", ThrowKeyword),
        ("clone", CloneKeyword),
        ("yield", YieldKeyword),
        ("resume", ResumeKeyword),
        ("switch", SwitchKeyword),
        ("case", CaseKeyword),
        ("default", DefaultKeyword),
        ("this", ThisKeyword),
        ("class", ClassKeyword),
        ("extends", ExtendsKeyword),
        ("constructor", ConstructorKeyword),
        ("instanceof", InstanceOfKeyword),
        ("true", TrueKeyword),
        ("false", FalseKeyword),
        ("static", StaticKeyword),
        ("enum", EnumKeyword),
        ("const", ConstKeyword),
        ("rawcall", RawCallKeyword),
        ("__LINE__", LineMacro),
        ("__FILE__", FileMacro),
    ])
});

/// Extra payload of string tokens: the pre-decode offset of every character
/// of `Token::value` plus a trailing sentinel, and the owned tokenization of
/// embedded script when the string turned out to contain one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringData {
    pub source_positions: Vec<usize>,
    pub embedded: Option<Tokenization>,
}

/// A single token. `value` is present only for kinds that carry text:
/// identifiers, literals and comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub value: Option<String>,
    pub string: Option<Box<StringData>>,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            value: None,
            string: None,
        }
    }

    pub fn with_value(kind: TokenKind, start: usize, end: usize, value: String) -> Self {
        Self {
            kind,
            start,
            end,
            value: Some(value),
            string: None,
        }
    }

    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}
