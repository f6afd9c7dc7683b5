use {
    firn_core::{
        log::{Diagnostic, DiagnosticFlags, Log},
        phase::Parser,
        tree::{ClassDecl, CompilationUnit, Name, SourceFile, Tree},
    },
    std::{fmt, iter::Peekable, str::CharIndices},
    thiserror::Error,
};

/* -------------------------------------------------------------------------- */
/*                                    Lexing                                  */
/* -------------------------------------------------------------------------- */

/// Token along with its byte offset.
#[allow(missing_docs)]
#[derive(Debug)]
pub struct Lexeme
{
    pub offset: usize,
    pub token: Token,
}

/// Structured information about a lexeme.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token
{
    /** `{` */ LeftBrace,
    /** `}` */ RightBrace,
    /** `;` */ Semicolon,
    /** `::` */ ColonColon,

    /// Keyword or name.
    Word(Name),
}

impl fmt::Display for Token
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self {
            Self::LeftBrace  => write!(f, "`{{`"),
            Self::RightBrace => write!(f, "`}}`"),
            Self::Semicolon  => write!(f, "`;`"),
            Self::ColonColon => write!(f, "`::`"),
            Self::Word(word) => write!(f, "`{word}`"),
        }
    }
}

/// Error returned during parsing.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error
{
    #[error("Invalid token: {0:?}")]
    InvalidToken(char),

    #[error("Expected {0}, got {1}")]
    ExpectedToken(&'static str, Token),

    #[error("Unexpected end of file")]
    UnexpectedEof,
}

/// Result from the parser.
pub type Result<T> =
    std::result::Result<T, Error>;

/// Splits source code into a sequence of tokens.
///
/// Line comments start with `//`.
pub struct Lexer<'a>
{
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a>
{
    /// Create a lexer for some source code.
    pub fn new(input: &'a str) -> Self
    {
        Self{input, chars: input.char_indices().peekable()}
    }

    fn read_lexeme(&mut self) -> Option<Result<Lexeme>>
    {
        self.read_whitespace();
        let (offset, c) = self.chars.next()?;
        Some(self.read_token(offset, c).map(|token| Lexeme{offset, token}))
    }

    fn read_whitespace(&mut self)
    {
        loop {
            while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {
            }
            match self.chars.peek() {
                Some(&(i, '/')) if self.input[i ..].starts_with("//") =>
                    while self.chars.next_if(|&(_, c)| c != '\n').is_some() {
                    },
                _ => break,
            }
        }
    }

    fn read_token(&mut self, offset: usize, c: char) -> Result<Token>
    {
        match c {
            '{' => Ok(Token::LeftBrace),
            '}' => Ok(Token::RightBrace),
            ';' => Ok(Token::Semicolon),
            ':' if self.chars.next_if(|&(_, c)| c == ':').is_some() =>
                Ok(Token::ColonColon),
            c if Self::is_word_char(c) => {
                let mut end = offset + c.len_utf8();
                while let Some((i, c)) =
                    self.chars.next_if(|&(_, c)| Self::is_word_char(c))
                {
                    end = i + c.len_utf8();
                }
                Ok(Token::Word(self.input[offset .. end].into()))
            },
            _ => Err(Error::InvalidToken(c)),
        }
    }

    fn is_word_char(c: char) -> bool
    {
        c.is_alphanumeric() || matches!(c, '_' | '$' | '.')
    }
}

impl<'a> Iterator for Lexer<'a>
{
    type Item = Result<Lexeme>;

    fn next(&mut self) -> Option<Self::Item>
    {
        self.read_lexeme()
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Parsing                                  */
/* -------------------------------------------------------------------------- */

type Lexemes<'a> = Peekable<Lexer<'a>>;

/// Parse the declarations of a compilation unit.
///
/// Returns the module and package directives and the class declarations.
pub fn parse_unit(input: &str)
    -> Result<(Option<Name>, Option<Name>, Vec<ClassDecl>)>
{
    let mut lexemes = Lexer::new(input).peekable();
    let mut module = None;
    let mut package = None;
    let mut defs = Vec::new();
    while let Some(token) = peek(&mut lexemes)? {
        match word(&token) {
            Some("module") => {
                next(&mut lexemes)?;
                module = Some(expect_word(&mut lexemes, "module name")?);
                expect(&mut lexemes, Token::Semicolon, "`;`")?;
            },
            Some("package") => {
                next(&mut lexemes)?;
                package = Some(expect_word(&mut lexemes, "package name")?);
                expect(&mut lexemes, Token::Semicolon, "`;`")?;
            },
            Some("class") =>
                defs.push(parse_class(&mut lexemes)?),
            _ =>
                return Err(Error::ExpectedToken("`class`", token)),
        }
    }
    Ok((module, package, defs))
}

fn parse_class(lexemes: &mut Lexemes) -> Result<ClassDecl>
{
    expect_keyword(lexemes, "class")?;
    let name = expect_word(lexemes, "class name")?;
    let extends = match peek(lexemes)? {
        Some(token) if word(&token) == Some("extends") => {
            next(lexemes)?;
            Some(expect_word(lexemes, "superclass name")?)
        },
        _ => None,
    };
    let members = parse_block(lexemes)?;
    Ok(ClassDecl{name, extends, members})
}

fn parse_block(lexemes: &mut Lexemes) -> Result<Vec<Tree>>
{
    expect(lexemes, Token::LeftBrace, "`{`")?;
    let mut trees = Vec::new();
    loop {
        match peek(lexemes)? {
            Some(Token::RightBrace) => {
                next(lexemes)?;
                break Ok(trees);
            },
            Some(_) => trees.push(parse_tree(lexemes)?),
            None => break Err(Error::UnexpectedEof),
        }
    }
}

fn parse_tree(lexemes: &mut Lexemes) -> Result<Tree>
{
    let token = peek(lexemes)?.ok_or(Error::UnexpectedEof)?;
    let Some(keyword) = word(&token) else {
        return Err(Error::ExpectedToken("member", token));
    };
    let tree = match keyword {
        "class" =>
            return parse_class(lexemes).map(Tree::Class),
        "field" => {
            next(lexemes)?;
            Tree::Field{name: expect_word(lexemes, "field name")?}
        },
        "method" => {
            next(lexemes)?;
            let name = expect_word(lexemes, "method name")?;
            return Ok(Tree::Method{name, body: parse_block(lexemes)?});
        },
        "lambda" => {
            next(lexemes)?;
            return Ok(Tree::Lambda{body: parse_block(lexemes)?});
        },
        "ref" => {
            next(lexemes)?;
            let qualifier = expect_word(lexemes, "qualifier")?;
            expect(lexemes, Token::ColonColon, "`::`")?;
            let member = expect_word(lexemes, "member name")?;
            Tree::MethodRef{qualifier, member}
        },
        "use" => {
            next(lexemes)?;
            Tree::Ident(expect_word(lexemes, "class name")?)
        },
        _ => {
            next(lexemes)?;
            Tree::Stmt(keyword.into())
        },
    };
    expect(lexemes, Token::Semicolon, "`;`")?;
    Ok(tree)
}

fn word(token: &Token) -> Option<&str>
{
    match token {
        Token::Word(word) => Some(word),
        _ => None,
    }
}

fn peek(lexemes: &mut Lexemes) -> Result<Option<Token>>
{
    match lexemes.peek() {
        None => Ok(None),
        Some(Ok(lexeme)) => Ok(Some(lexeme.token.clone())),
        Some(Err(_)) => next(lexemes).map(Some),
    }
}

fn next(lexemes: &mut Lexemes) -> Result<Token>
{
    match lexemes.next() {
        None => Err(Error::UnexpectedEof),
        Some(lexeme) => lexeme.map(|l| l.token),
    }
}

fn expect(lexemes: &mut Lexemes, expected: Token, what: &'static str)
    -> Result<()>
{
    match next(lexemes)? {
        token if token == expected => Ok(()),
        token => Err(Error::ExpectedToken(what, token)),
    }
}

fn expect_keyword(lexemes: &mut Lexemes, keyword: &'static str) -> Result<()>
{
    match next(lexemes)? {
        Token::Word(word) if &*word == keyword => Ok(()),
        token => Err(Error::ExpectedToken(keyword, token)),
    }
}

fn expect_word(lexemes: &mut Lexemes, what: &'static str) -> Result<Name>
{
    match next(lexemes)? {
        Token::Word(word) => Ok(word),
        token => Err(Error::ExpectedToken(what, token)),
    }
}

/* -------------------------------------------------------------------------- */
/*                                    Phase                                   */
/* -------------------------------------------------------------------------- */

/// Parser for the class declaration language.
///
/// A syntax error is reported and discards the whole unit.
#[derive(Debug, Default)]
pub struct ToyParser;

impl Parser for ToyParser
{
    fn parse(&mut self, log: &mut Log, file: &SourceFile, text: &str)
        -> CompilationUnit
    {
        match parse_unit(text) {
            Ok((module, package, defs)) => {
                let mut unit = CompilationUnit::new(file.clone(), defs);
                unit.package = package;
                if let Some(module) = module {
                    // A fresh unit has no module yet.
                    let _ = unit.set_module(module);
                }
                unit
            },
            Err(error) => {
                log.report(Diagnostic::error("compiler.err.syntax", error.to_string())
                    .with_flags(DiagnosticFlags::SYNTAX)
                    .with_source(file.clone()));
                CompilationUnit::empty(file.clone())
            },
        }
    }
}
