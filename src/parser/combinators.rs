use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, multispace0, one_of},
    combinator::{map, value},
    multi::fold_many1,
    sequence::preceded,
};

use super::ast::Token;

// ── Low-level nom parsers ──────────────────────────────────────────────────

/// `'...'` or `"..."`. A backslash escapes the closing quote or another
/// backslash; any other backslash is kept. An unterminated quote runs to the
/// end of the input.
pub fn parse_quoted(input: &str) -> IResult<&str, String> {
    let (rest, quote) = one_of("'\"").parse(input)?;
    let mut content = String::new();
    let mut chars = rest.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Ok((&rest[i + c.len_utf8()..], content));
        }
        if c == '\\' {
            if let Some(&(_, next)) = chars.peek() {
                if next == quote || next == '\\' {
                    chars.next();
                    content.push(next);
                    continue;
                }
            }
        }
        content.push(c);
    }

    Ok(("", content))
}

pub fn parse_bare(input: &str) -> IResult<&str, String> {
    // Stop at whitespace, quotes, and the operator characters | & > <
    map(is_not(" \t\r\n'\"|&><"), str::to_string).parse(input)
}

/// A word is any run of bare and quoted pieces with no space between them.
pub fn parse_word(input: &str) -> IResult<&str, String> {
    fold_many1(
        alt((parse_quoted, parse_bare)),
        String::new,
        |mut word, piece| {
            word.push_str(&piece);
            word
        },
    )
    .parse(input)
}

pub fn parse_token(input: &str) -> IResult<&str, Token> {
    preceded(
        multispace0,
        alt((
            // `>>` must come before `>`.
            value(Token::Append, tag(">>")),
            value(Token::Output, char('>')),
            value(Token::Input, char('<')),
            value(Token::Pipe, char('|')),
            value(Token::Background, char('&')),
            map(parse_word, Token::Word),
        )),
    )
    .parse(input)
}

/// Split a line into tokens. The input line is never modified.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = line;

    while !rest.trim_start().is_empty() {
        match parse_token(rest) {
            Ok((after, token)) => {
                tokens.push(token);
                rest = after;
            }
            Err(_) => break,
        }
    }
    tokens
}
