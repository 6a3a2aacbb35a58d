use serde::{Deserialize, Serialize};

/// How a prediction was produced, ordered roughly by trust: a direct
/// identifier hit beats an alias substring beats a whole-token keyword,
/// and `model` marks the keyword-bucket fallback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    VpaAlias,
    AliasKeyword,
    Keyword,
    Model,
    None,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VpaAlias => write!(f, "vpa_alias"),
            Self::AliasKeyword => write!(f, "alias_keyword"),
            Self::Keyword => write!(f, "keyword"),
            Self::Model => write!(f, "model"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for MatchMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vpa_alias" => Ok(Self::VpaAlias),
            "alias_keyword" => Ok(Self::AliasKeyword),
            "keyword" => Ok(Self::Keyword),
            "model" => Ok(Self::Model),
            "none" => Ok(Self::None),
            other => Err(format!("unknown match method: {other}")),
        }
    }
}
