use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of allocation methods.
///
/// Each call is stateless; there are no transitions between methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    EqualWeight,
    RiskParity,
    MinVariance,
    MaxSharpe,
    MaxOmega,
    Kelly,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::EqualWeight => "equal_weight",
            Method::RiskParity => "risk_parity",
            Method::MinVariance => "min_variance",
            Method::MaxSharpe => "max_sharpe",
            Method::MaxOmega => "max_omega",
            Method::Kelly => "kelly",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal_weight" => Ok(Method::EqualWeight),
            "risk_parity" => Ok(Method::RiskParity),
            "min_variance" => Ok(Method::MinVariance),
            "max_sharpe" => Ok(Method::MaxSharpe),
            "max_omega" => Ok(Method::MaxOmega),
            "kelly" => Ok(Method::Kelly),
            other => Err(format!("unknown allocation method '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_names() {
        for method in [
            Method::EqualWeight,
            Method::RiskParity,
            Method::MinVariance,
            Method::MaxSharpe,
            Method::MaxOmega,
            Method::Kelly,
        ] {
            assert_eq!(method.name().parse::<Method>(), Ok(method));
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("martingale".parse::<Method>().is_err());
    }
}
