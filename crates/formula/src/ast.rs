use crate::error::FormulaError;
use crate::lexer::{Token, tokenize};
use std::fmt;

/// A metric variable from the closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sharpe,
    Omega,
    Volatility,
    Drawdown,
    WinRate,
    ProfitFactor,
    TotalReturn,
    Calmar,
    Sortino,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sharpe" => Some(Self::Sharpe),
            "omega" => Some(Self::Omega),
            "volatility" => Some(Self::Volatility),
            "drawdown" => Some(Self::Drawdown),
            "win_rate" => Some(Self::WinRate),
            "profit_factor" => Some(Self::ProfitFactor),
            "total_return" => Some(Self::TotalReturn),
            "calmar" => Some(Self::Calmar),
            "sortino" => Some(Self::Sortino),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sharpe => "sharpe",
            Self::Omega => "omega",
            Self::Volatility => "volatility",
            Self::Drawdown => "drawdown",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::TotalReturn => "total_return",
            Self::Calmar => "calmar",
            Self::Sortino => "sortino",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A whitelisted function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Abs,
    Log,
    Exp,
    Max,
    Min,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            "log" => Some(Self::Log),
            "exp" => Some(Self::Exp),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Sqrt | Self::Abs | Self::Log | Self::Exp => 1,
            Self::Max | Self::Min => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// An allocation-formula expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Metric(Metric),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Parses a formula string into an expression tree.
    ///
    /// Grammar: `expr := term (('+'|'-') term)*`,
    /// `term := unary (('*'|'/') unary)*`,
    /// `unary := '-' unary | primary`,
    /// `primary := number | metric | func '(' args ')' | '(' expr ')'`.
    ///
    /// Identifiers outside the metric vocabulary and the function whitelist
    /// are rejected here, before anything is evaluated.
    pub fn parse(input: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(FormulaError::EmptyFormula);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        if let Some((token, pos)) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(pos, format!("{token:?}")));
        }
        Ok(expr)
    }

    /// Structural complexity: operators weigh 1, function calls 2, with an
    /// extra 3 per division (the overfitting detector reports this).
    pub fn complexity(&self) -> u32 {
        match self {
            Expr::Number(_) | Expr::Metric(_) => 0,
            Expr::Neg(inner) => 1 + inner.complexity(),
            Expr::Binary { op, lhs, rhs } => {
                let weight = if *op == BinaryOp::Div { 4 } else { 1 };
                weight + lhs.complexity() + rhs.complexity()
            }
            Expr::Call { args, .. } => 2 + args.iter().map(Expr::complexity).sum::<u32>(),
        }
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.pos).cloned()
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some((token, _)) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some((token, _)) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if let Some((Token::Minus, _)) = self.peek() {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(Expr::Number(value)),
            Some((Token::Ident(name), _)) => {
                if let Some((Token::LParen, _)) = self.peek() {
                    let func = Func::from_name(&name)
                        .ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;
                    self.advance();
                    let args = self.arguments()?;
                    if args.len() != func.arity() {
                        return Err(FormulaError::WrongArity {
                            function: name,
                            expected: func.arity(),
                            got: args.len(),
                        });
                    }
                    Ok(Expr::Call { func, args })
                } else {
                    Metric::from_name(&name)
                        .map(Expr::Metric)
                        .ok_or(FormulaError::UnknownIdentifier(name))
                }
            }
            Some((Token::LParen, _)) => {
                let expr = self.expression()?;
                match self.advance() {
                    Some((Token::RParen, _)) => Ok(expr),
                    _ => Err(FormulaError::UnclosedParen),
                }
            }
            Some((token, pos)) => Err(FormulaError::UnexpectedToken(pos, format!("{token:?}"))),
            None => Err(FormulaError::UnclosedParen),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = vec![self.expression()?];
        loop {
            match self.advance() {
                Some((Token::Comma, _)) => args.push(self.expression()?),
                Some((Token::RParen, _)) => return Ok(args),
                _ => return Err(FormulaError::UnclosedParen),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precedence() {
        // 1 + 2 * 3 groups the multiplication first.
        let expr = Expr::parse("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add, ..
            } => {}
            other => panic!("expected top-level Add, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_functions() {
        let expr = Expr::parse("max(sharpe, sqrt(omega)) * 10").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_identifier() {
        assert_eq!(
            Expr::parse("alpha * 2"),
            Err(FormulaError::UnknownIdentifier("alpha".to_string()))
        );
    }

    #[test]
    fn rejects_unknown_function() {
        assert_eq!(
            Expr::parse("rank(sharpe)"),
            Err(FormulaError::UnknownFunction("rank".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(matches!(
            Expr::parse("max(sharpe)"),
            Err(FormulaError::WrongArity { .. })
        ));
        assert!(matches!(
            Expr::parse("sqrt(sharpe, omega)"),
            Err(FormulaError::WrongArity { .. })
        ));
    }

    #[test]
    fn unary_minus_binds_tighter_than_subtraction() {
        let expr = Expr::parse("-sharpe - 1").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Sub,
                ..
            }
        ));
    }

    #[test]
    fn vocabulary_is_case_insensitive() {
        assert!(Expr::parse("Sharpe / Drawdown").is_ok());
    }

    #[test]
    fn division_raises_complexity() {
        let plain = Expr::parse("sharpe + omega").unwrap();
        let divided = Expr::parse("sharpe / omega").unwrap();
        assert!(divided.complexity() > plain.complexity());
    }
}
