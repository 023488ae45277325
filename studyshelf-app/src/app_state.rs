use std::str::FromStr;

/// Top-level section the application is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Tab {
    /// Landing section shown at startup.
    #[default]
    Home,
    /// Topic roadmap of the current subject.
    Roadmap,
    Books,
    Videos,
}

impl Tab {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Roadmap => "roadmap",
            Self::Books => "books",
            Self::Videos => "videos",
        }
    }

    /// The back action is offered everywhere except home.
    pub(crate) fn shows_back(self) -> bool {
        self != Self::Home
    }

    pub(crate) fn has_search(self) -> bool {
        self != Self::Home
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "roadmap" => Ok(Self::Roadmap),
            "books" => Ok(Self::Books),
            "videos" => Ok(Self::Videos),
            other => Err(format!("unknown tab {other:?}")),
        }
    }
}
