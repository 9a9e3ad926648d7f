use std::fmt;

/// Where an effective target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Flag,
    Env(&'static str),
    Default,
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSource::Flag => f.write_str("command line"),
            TargetSource::Env(var) => write!(f, "${var}"),
            TargetSource::Default => f.write_str("default"),
        }
    }
}

/// A target descriptor together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub value: String,
    pub source: TargetSource,
}

/// Resolve a target descriptor from the process environment.
///
/// Precedence: command-line flag, then `env_var` if set and non-empty, then
/// the compiled-in default.
pub fn resolve_target(flag: Option<&str>, env_var: &'static str, default: &str) -> ResolvedTarget {
    resolve_target_with(flag, env_var, default, |var| std::env::var(var).ok())
}

/// [`resolve_target`] with an injectable environment lookup.
pub fn resolve_target_with<L>(
    flag: Option<&str>,
    env_var: &'static str,
    default: &str,
    lookup: L,
) -> ResolvedTarget
where
    L: Fn(&str) -> Option<String>,
{
    if let Some(value) = flag {
        return ResolvedTarget {
            value: value.to_string(),
            source: TargetSource::Flag,
        };
    }

    match lookup(env_var) {
        Some(value) if !value.is_empty() => ResolvedTarget {
            value,
            source: TargetSource::Env(env_var),
        },
        _ => ResolvedTarget {
            value: default.to_string(),
            source: TargetSource::Default,
        },
    }
}
