use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalEndpoint {
    ListModels,
    Generate,
    ChatCompletion,
}

impl LogicalEndpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListModels => "list_models",
            Self::Generate => "generate",
            Self::ChatCompletion => "chat_completion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Native,
    OpenAiCompatible,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::OpenAiCompatible => "openai",
        }
    }

    /// Concrete path suffix for an endpoint, or `None` when the dialect has no such operation.
    pub fn path_for(self, endpoint: LogicalEndpoint) -> Option<&'static str> {
        match (self, endpoint) {
            (Self::Native, LogicalEndpoint::ListModels) => Some("/api/tags"),
            (Self::Native, LogicalEndpoint::Generate) => Some("/api/generate"),
            (Self::Native, LogicalEndpoint::ChatCompletion) => Some("/api/chat"),
            (Self::OpenAiCompatible, LogicalEndpoint::ListModels) => Some("/v1/models"),
            (Self::OpenAiCompatible, LogicalEndpoint::Generate) => None,
            (Self::OpenAiCompatible, LogicalEndpoint::ChatCompletion) => {
                Some("/v1/chat/completions")
            }
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Native => Self::OpenAiCompatible,
            Self::OpenAiCompatible => Self::Native,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectPreference {
    Native,
    OpenAiCompatible,
    #[default]
    AutoDetect,
}

impl DialectPreference {
    /// Dialects to try, in order. `hint` is the dialect implied by an inbound path, if any.
    pub fn candidates(self, hint: Option<Dialect>) -> Vec<Dialect> {
        match self {
            Self::Native => vec![Dialect::Native],
            Self::OpenAiCompatible => vec![Dialect::OpenAiCompatible],
            Self::AutoDetect => {
                let first = hint.unwrap_or(Dialect::Native);
                vec![first, first.other()]
            }
        }
    }

    pub fn select(self, endpoint: LogicalEndpoint, hint: Option<Dialect>) -> Option<Dialect> {
        self.candidates(hint)
            .into_iter()
            .find(|dialect| dialect.path_for(endpoint).is_some())
    }
}

impl FromStr for DialectPreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" | "ollama" => Ok(Self::Native),
            "openai" | "openai-compatible" | "openai_compatible" => Ok(Self::OpenAiCompatible),
            "auto" | "autodetect" | "auto-detect" => Ok(Self::AutoDetect),
            other => Err(format!("unknown dialect `{other}`")),
        }
    }
}

const RECOGNIZED: [(&str, LogicalEndpoint, Dialect); 5] = [
    ("/api/tags", LogicalEndpoint::ListModels, Dialect::Native),
    ("/api/generate", LogicalEndpoint::Generate, Dialect::Native),
    ("/api/chat", LogicalEndpoint::ChatCompletion, Dialect::Native),
    ("/v1/models", LogicalEndpoint::ListModels, Dialect::OpenAiCompatible),
    (
        "/v1/chat/completions",
        LogicalEndpoint::ChatCompletion,
        Dialect::OpenAiCompatible,
    ),
];

/// Maps an inbound path onto its logical endpoint and the dialect it was written for.
///
/// A doubled leading segment (`/api/api/tags`) is collapsed once before matching.
pub fn recognize(path: &str) -> Option<(LogicalEndpoint, Dialect)> {
    let path = collapse_doubled_prefix(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    RECOGNIZED
        .iter()
        .find(|(concrete, _, _)| *concrete == path)
        .map(|(_, endpoint, dialect)| (*endpoint, *dialect))
}

fn collapse_doubled_prefix(path: &str) -> &str {
    for prefix in ["/api", "/v1"] {
        let Some(rest) = path.strip_prefix(prefix) else {
            continue;
        };
        if rest.starts_with(prefix) && rest[prefix.len()..].starts_with('/') {
            return rest;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_dialect_has_no_raw_generate() {
        assert_eq!(Dialect::OpenAiCompatible.path_for(LogicalEndpoint::Generate), None);
        assert_eq!(
            DialectPreference::OpenAiCompatible.select(LogicalEndpoint::Generate, None),
            None
        );
    }

    #[test]
    fn auto_detect_prefers_hint_then_falls_back() {
        let auto = DialectPreference::AutoDetect;
        assert_eq!(
            auto.select(LogicalEndpoint::ListModels, Some(Dialect::OpenAiCompatible)),
            Some(Dialect::OpenAiCompatible)
        );
        assert_eq!(
            auto.select(LogicalEndpoint::Generate, Some(Dialect::OpenAiCompatible)),
            Some(Dialect::Native)
        );
        assert_eq!(
            auto.select(LogicalEndpoint::ChatCompletion, None),
            Some(Dialect::Native)
        );
    }

    #[test]
    fn recognizes_doubled_prefix_only_once() {
        assert_eq!(
            recognize("/api/api/tags"),
            Some((LogicalEndpoint::ListModels, Dialect::Native))
        );
        assert_eq!(
            recognize("/v1/v1/chat/completions"),
            Some((LogicalEndpoint::ChatCompletion, Dialect::OpenAiCompatible))
        );
        assert_eq!(recognize("/api/api/api/tags"), None);
        assert_eq!(recognize("/api/show"), None);
        assert_eq!(recognize("/apitags"), None);
    }

    #[test]
    fn parses_dialect_names() {
        assert_eq!("OpenAI".parse::<DialectPreference>(), Ok(DialectPreference::OpenAiCompatible));
        assert_eq!("auto".parse::<DialectPreference>(), Ok(DialectPreference::AutoDetect));
        assert!("grpc".parse::<DialectPreference>().is_err());
    }
}
