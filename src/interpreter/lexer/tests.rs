use pretty_assertions::assert_eq;
use super::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).unwrap().into_iter().map(|token| token.kind).collect()
}

#[test]
fn addition() {
    let tokens = tokenize("1+2").unwrap();

    assert_eq!(tokens, vec![
        Token::with_value(TokenKind::Number, LiteralValue::Int(1), 1),
        Token::new(TokenKind::Plus, 1),
        Token::with_value(TokenKind::Number, LiteralValue::Int(2), 1),
        Token::new(TokenKind::Eof, 1),
    ]);
}

#[test]
fn integer_and_float_literals() {
    let tokens = tokenize("42 3.25 0.5").unwrap();

    assert_eq!(tokens[0].value, Some(LiteralValue::Int(42)));
    assert_eq!(tokens[1].value, Some(LiteralValue::Float(3.25)));
    assert_eq!(tokens[2].value, Some(LiteralValue::Float(0.5)));
}

#[test]
fn out_of_range_integer_literal() {
    assert_eq!(tokenize("99999999999999999999"), Err(LexerError::InvalidIntLiteral { line: 1 }));
}

#[test]
fn trailing_dot_is_not_a_float() {
    assert_eq!(tokenize("3."), Err(LexerError::InvalidFloatLiteral { line: 1 }));
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(kinds("var x while whilst"), vec![
        TokenKind::Var,
        TokenKind::Identifier,
        TokenKind::While,
        TokenKind::Identifier,
        TokenKind::Eof,
    ]);
}

#[test]
fn booleans_carry_their_value() {
    let tokens = tokenize("true false").unwrap();

    assert_eq!(tokens[0], Token::with_value(TokenKind::True, LiteralValue::Bool(true), 1));
    assert_eq!(tokens[1], Token::with_value(TokenKind::False, LiteralValue::Bool(false), 1));
}

#[test]
fn two_character_operators() {
    assert_eq!(kinds("== != <= >= && || = ! < >"), vec![
        TokenKind::Equal,
        TokenKind::NotEqual,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Assign,
        TokenKind::Not,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::Eof,
    ]);
}

#[test]
fn lone_ampersand_is_rejected() {
    assert_eq!(tokenize("a & b"), Err(LexerError::LoneOperator { line: 1, c: '&' }));
    assert_eq!(tokenize("a | b"), Err(LexerError::LoneOperator { line: 1, c: '|' }));
}

#[test]
fn string_with_escapes() {
    let tokens = tokenize(r#""a\tb\nc\"d\\e""#).unwrap();

    assert_eq!(tokens[0].value, Some(LiteralValue::Text(String::from("a\tb\nc\"d\\e"))));
}

#[test]
fn unterminated_string() {
    assert_eq!(tokenize("\"abc"), Err(LexerError::UnterminatedString { line: 1 }));
}

#[test]
fn invalid_escape() {
    assert_eq!(tokenize(r#""\q""#), Err(LexerError::InvalidEscape { line: 1, c: 'q' }));
}

#[test]
fn escape_at_end_of_input() {
    assert_eq!(tokenize("\"abc\\"), Err(LexerError::UnterminatedEscape { line: 1 }));
}

#[test]
fn raw_newline_in_string() {
    assert!(matches!(tokenize("\"a\nb\""), Err(LexerError::NewlineInString { .. })));
}

#[test]
fn comments_run_to_end_of_line() {
    assert_eq!(kinds("1 // ignored + 2\n3"), vec![
        TokenKind::Number,
        TokenKind::Number,
        TokenKind::Eof,
    ]);
}

#[test]
fn line_numbers_advance() {
    let tokens = tokenize("1\n2\n\n3").unwrap();

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 4);
}

#[test]
fn unexpected_character() {
    assert!(matches!(tokenize("var x = #;"),
        Err(LexerError::UnexpectedCharacter { line: 1, c: '#', .. })));
}

#[test]
fn empty_input_yields_only_eof() {
    assert_eq!(tokenize("").unwrap(), vec![Token::new(TokenKind::Eof, 1)]);
    assert_eq!(tokenize("   \n\t ").unwrap(), vec![Token::new(TokenKind::Eof, 2)]);
}

#[test]
fn punctuation() {
    assert_eq!(kinds("(){},;."), vec![
        TokenKind::ParenLeft,
        TokenKind::ParenRight,
        TokenKind::BraceLeft,
        TokenKind::BraceRight,
        TokenKind::Comma,
        TokenKind::Semicolon,
        TokenKind::Dot,
        TokenKind::Eof,
    ]);
}
