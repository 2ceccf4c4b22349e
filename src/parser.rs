//! Splitting a raw input line into a command name and its arguments.

/// Prefix that turns the first argument into a bare flag value (`os --EOL` -> `EOL`).
const FLAG_PREFIX: &str = "--";

/// Quoted fragments this short or shorter are separator leftovers and are dropped.
const MIN_FRAGMENT_LEN: usize = 2;

/// Result of parsing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The first whitespace-separated token, empty for a blank line.
    pub cmd: String,
    /// Normalized arguments: zero, one or two entries.
    ///
    /// `None` when the line's arguments couldn't be reduced to that shape,
    /// e.g. three unquoted tokens. Such a line never matches a command.
    pub args: Option<Vec<String>>,
}

impl ParsedCommand {
    /// Arguments as borrowed slices, for handing to a command factory.
    pub fn arg_refs(&self) -> Option<Vec<&str>> {
        self.args
            .as_ref()
            .map(|args| args.iter().map(String::as_str).collect())
    }
}

/// Parse a raw input line.
///
/// Rules, applied to the tokens after the command name:
/// 1. no tokens: no arguments;
/// 2. first token starts with `--`: a single argument, the token without the prefix;
/// 3. any token contains a quote: tokens are re-joined and split on the quote character
///    (`'` when only single quotes appear, `"` otherwise), short fragments are dropped
///    and the first one or two remaining fragments become the arguments;
/// 4. otherwise one or two bare tokens are the arguments.
pub fn parse_line(line: &str) -> ParsedCommand {
    let mut tokens = line.split_whitespace();
    let cmd = tokens.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = tokens.collect();
    ParsedCommand {
        cmd,
        args: parse_args(&rest),
    }
}

fn parse_args(tokens: &[&str]) -> Option<Vec<String>> {
    let Some(first) = tokens.first() else {
        return Some(Vec::new());
    };

    if let Some(flag) = first.strip_prefix(FLAG_PREFIX) {
        return Some(vec![flag.to_string()]);
    }

    let has_single = tokens.iter().any(|t| t.contains('\''));
    let has_double = tokens.iter().any(|t| t.contains('"'));

    if has_single || has_double {
        let separator = if has_single && !has_double { '\'' } else { '"' };
        let fragments = split_quoted(&tokens.join(" "), separator);
        return match fragments.as_slice() {
            [] => None,
            [only] => Some(vec![only.clone()]),
            [first, second, ..] => Some(vec![first.clone(), second.clone()]),
        };
    }

    match tokens {
        [only] => Some(vec![only.to_string()]),
        [first, second] => Some(vec![first.to_string(), second.to_string()]),
        _ => None,
    }
}

/// Split on `separator`, keep fragments longer than [`MIN_FRAGMENT_LEN`],
/// then strip the padding left around the quotes.
fn split_quoted(joined: &str, separator: char) -> Vec<String> {
    joined
        .split(separator)
        .filter(|fragment| fragment.chars().count() > MIN_FRAGMENT_LEN)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(String::from)
        .collect()
}
