/// Whether we're allowed to stop and ask the user things.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interactivity {
    Full,
    None,
}

impl Default for Interactivity {
    fn default() -> Self {
        Self::Full
    }
}

impl Interactivity {
    fn from_ci_var(ci: Option<&str>) -> Self {
        if matches!(ci, Some("true") | Some("1")) {
            log::info!("env var `CI` is set to `true` or `1`; not prompting for anything");
            Self::None
        } else {
            Self::default()
        }
    }

    pub fn from_flag(non_interactive: bool) -> Self {
        if non_interactive {
            Self::None
        } else {
            Self::from_ci_var(std::env::var("CI").ok().as_deref())
        }
    }

    pub fn full(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Destructive work asks first, unless it was told yes up front or
    /// there's nobody around to answer.
    pub fn should_confirm(self, assume_yes: bool) -> bool {
        self.full() && !assume_yes
    }
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum NoiseLevel {
    Polite,
    LoudAndProud,
    FranklyQuitePedantic,
}

impl Default for NoiseLevel {
    fn default() -> Self {
        Self::Polite
    }
}

impl NoiseLevel {
    pub fn from_occurrences(occurrences: u64) -> Self {
        match occurrences {
            0 => Self::Polite,
            1 => Self::LoudAndProud,
            _ => Self::FranklyQuitePedantic,
        }
    }

    /// Filter used when `RUST_LOG` isn't set.
    pub fn log_filter(self) -> &'static str {
        match self {
            Self::Polite => "warn",
            Self::LoudAndProud => "simbatch=info",
            Self::FranklyQuitePedantic => "info,simbatch=debug",
        }
    }
}
