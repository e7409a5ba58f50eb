use crate::error::FormulaError;

/// Token kinds in an allocation formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

/// Tokenizes a formula string.
///
/// Identifiers are lowercased here so the vocabulary check in the parser is
/// case-insensitive. Minus is always lexed as an operator; unary negation is
/// the parser's business.
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push((Token::Plus, pos));
            }
            '-' => {
                chars.next();
                tokens.push((Token::Minus, pos));
            }
            '*' => {
                chars.next();
                tokens.push((Token::Star, pos));
            }
            '/' => {
                chars.next();
                tokens.push((Token::Slash, pos));
            }
            '(' => {
                chars.next();
                tokens.push((Token::LParen, pos));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, pos));
            }
            ',' => {
                chars.next();
                tokens.push((Token::Comma, pos));
            }
            '0'..='9' | '.' => {
                let mut text = String::new();
                let mut has_dot = false;
                while let Some(&(_, c)) = chars.peek() {
                    match c {
                        '0'..='9' => {
                            text.push(c);
                            chars.next();
                        }
                        '.' if !has_dot => {
                            has_dot = true;
                            text.push(c);
                            chars.next();
                        }
                        'e' | 'E' => {
                            text.push(c);
                            chars.next();
                            if let Some(&(_, sign)) = chars.peek() {
                                if sign == '+' || sign == '-' {
                                    text.push(sign);
                                    chars.next();
                                }
                            }
                        }
                        _ => break,
                    }
                }
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber(pos))?;
                tokens.push((Token::Number(value), pos));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut text = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c.to_ascii_lowercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(text), pos));
            }
            _ => return Err(FormulaError::UnexpectedChar(ch, pos)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn tokenizes_operators_and_idents() {
        let tokens = kinds("sharpe * omega / drawdown");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("sharpe".into()),
                Token::Star,
                Token::Ident("omega".into()),
                Token::Slash,
                Token::Ident("drawdown".into()),
            ]
        );
    }

    #[test]
    fn lowercases_identifiers() {
        assert_eq!(kinds("SHARPE"), vec![Token::Ident("sharpe".into())]);
    }

    #[test]
    fn reads_scientific_notation() {
        match kinds("1.5e-2")[0] {
            Token::Number(n) => assert!((n - 0.015).abs() < 1e-12),
            ref other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn rejects_foreign_characters() {
        assert!(matches!(
            tokenize("sharpe ^ 2"),
            Err(FormulaError::UnexpectedChar('^', _))
        ));
    }
}
