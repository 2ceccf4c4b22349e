//! Startup settings read once from the process arguments.

const USERNAME_FLAG: &str = "--username=";
const DEFAULT_USER_NAME: &str = "Guest";

/// Settings consumed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Name used in the welcome and farewell messages.
    pub user_name: String,
}

impl Settings {
    /// Build settings from process arguments (program name included or not).
    ///
    /// The first `--username=<name>` argument wins. Text after a second `=` is ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let user_name = args
            .into_iter()
            .find_map(|arg| {
                arg.as_ref()
                    .strip_prefix(USERNAME_FLAG)
                    .map(|rest| rest.split('=').next().unwrap_or_default().to_string())
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        Self { user_name }
    }
}
