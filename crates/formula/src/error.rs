use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("Invalid number at position {0}")]
    InvalidNumber(usize),

    #[error("Unexpected token at position {0}: {1}")]
    UnexpectedToken(usize, String),

    #[error("Unknown identifier '{0}': not in the metric vocabulary")]
    UnknownIdentifier(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} argument(s), got {got}")]
    WrongArity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Unclosed parenthesis")]
    UnclosedParen,

    #[error("Empty formula")]
    EmptyFormula,

    #[error("Metric '{0}' is missing from the evaluation context")]
    MissingMetric(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error in '{0}'")]
    Domain(&'static str),

    #[error("Formula produced a non-finite result")]
    NonFinite,
}
