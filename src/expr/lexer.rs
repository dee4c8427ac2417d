use chumsky::prelude::*;

use super::ExprError;

pub type Span = SimpleSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    /// A string literal that runs to the end of input.
    UnterminatedStr,
    True,
    False,
    Null,
    Undefined,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StrictEq,
    StrictNotEq,
    LooseEq,
    LooseNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Bang,
    Question,
    Colon,
}

pub fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<(Token, Span)>, extra::Err<Rich<'src, char>>>
{
    let mantissa = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .ignored()
        .or(just('.').then(text::digits(10)).ignored());
    let exponent = one_of("eE").then(one_of("+-").or_not()).then(text::digits(10));
    let number = mantissa
        .then(exponent.or_not())
        .to_slice()
        .try_map(|digits: &str, span| {
            digits
                .parse::<f64>()
                .map(Token::Number)
                .map_err(|_| Rich::custom(span, format!("Invalid number '{digits}'")))
        });

    let escape = just('\\').ignore_then(any().map(|c| match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }));
    let single_quoted = just('\'')
        .ignore_then(none_of("'\\").or(escape.clone()).repeated().collect::<String>())
        .then(just('\'').or_not());
    let double_quoted = just('"')
        .ignore_then(none_of("\"\\").or(escape).repeated().collect::<String>())
        .then(just('"').or_not());
    let string = single_quoted
        .or(double_quoted)
        .map(|(value, closing)| match closing {
            Some(_) => Token::Str(value),
            None => Token::UnterminatedStr,
        });

    let word = any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_' || *c == '$')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
                .repeated(),
        )
        .to_slice()
        .map(|word: &str| match word {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "undefined" => Token::Undefined,
            _ => Token::Ident(word.to_string()),
        });

    // Longest operators first.
    let operator = choice((
        just("===").to(Token::StrictEq),
        just("!==").to(Token::StrictNotEq),
        just("==").to(Token::LooseEq),
        just("!=").to(Token::LooseNotEq),
        just("<=").to(Token::LessEq),
        just(">=").to(Token::GreaterEq),
        just("&&").to(Token::And),
        just("||").to(Token::Or),
    ));

    let punctuation = choice((
        just('.').to(Token::Dot),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('<').to(Token::Less),
        just('>').to(Token::Greater),
        just('!').to(Token::Bang),
        just('?').to(Token::Question),
        just(':').to(Token::Colon),
    ));

    choice((number, string, word, operator, punctuation))
        .map_with(|token, extra| (token, extra.span()))
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

/// Splits `source` into spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, ExprError> {
    let tokens = lexer().parse(source).into_result().map_err(|errors| {
        match errors.first() {
            Some(error) => match error.found() {
                Some(found) => ExprError::UnexpectedChar {
                    found: *found,
                    offset: error.span().start,
                },
                None => ExprError::UnexpectedEnd {
                    offset: error.span().start,
                },
            },
            None => ExprError::UnexpectedEnd {
                offset: source.len(),
            },
        }
    })?;

    if let Some((_, span)) = tokens
        .iter()
        .find(|(token, _)| *token == Token::UnterminatedStr)
    {
        return Err(ExprError::UnterminatedString { offset: span.start });
    }
    Ok(tokens)
}
