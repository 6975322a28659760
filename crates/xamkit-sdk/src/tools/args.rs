//! Command-line argument assembly.
//!
//! An [`ArgumentSequence`] is an ordered list of typed tokens. It has two
//! views:
//!
//! - [`ArgumentSequence::render`] - the command line as a shell would show it,
//!   with path-like tokens quoted and secrets replaced by `[REDACTED]`. Used for
//!   logs and error messages, and byte-identical for identical input.
//! - [`ArgumentSequence::to_argv`] - the raw tokens handed to the OS. No shell
//!   sits in between, so quoting is not applied here.

use std::fmt;
use std::path::{Component, Path, PathBuf};

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Quoted(String),
    Secret(String),
    Switch {
        key: String,
        delimiter: &'static str,
        value: String,
        quoted: bool,
        secret: bool,
    },
}

impl Token {
    fn raw(&self) -> String {
        match self {
            Token::Text(value) | Token::Quoted(value) | Token::Secret(value) => value.clone(),
            Token::Switch {
                key,
                delimiter,
                value,
                ..
            } => format!("{}{}{}", key, delimiter, value),
        }
    }

    fn rendered(&self) -> String {
        match self {
            Token::Text(value) => value.clone(),
            Token::Quoted(value) => quote(value),
            Token::Secret(_) => REDACTED.to_string(),
            Token::Switch {
                key,
                delimiter,
                value,
                quoted,
                secret,
            } => {
                let value = match (secret, quoted) {
                    (true, _) => REDACTED.to_string(),
                    (false, true) => quote(value),
                    (false, false) => value.clone(),
                };
                format!("{}{}{}", key, delimiter, value)
            }
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Ordered command-line tokens for one tool invocation.
///
/// # Example
///
/// ```
/// use xamkit_sdk::tools::ArgumentSequence;
///
/// let mut args = ArgumentSequence::new();
/// args.append_if(true, "-v")
///     .append("build")
///     .append_switch("-t", ":", "Build")
///     .append_switch_quoted("-c", ":", "Debug|iPhoneSimulator")
///     .append_quoted("/src/My App.sln");
///
/// assert_eq!(
///     args.render(),
///     r#"-v build -t:Build -c:"Debug|iPhoneSimulator" "/src/My App.sln""#
/// );
/// assert_eq!(args.to_argv()[4], "/src/My App.sln");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSequence {
    tokens: Vec<Token>,
}

impl ArgumentSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::Text(value.into()));
        self
    }

    /// Appends `flag` only when `enabled` is set.
    pub fn append_if(&mut self, enabled: bool, flag: impl Into<String>) -> &mut Self {
        if enabled {
            self.append(flag);
        }
        self
    }

    pub fn append_quoted(&mut self, value: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::Quoted(value.into()));
        self
    }

    /// Appends a path, quoted. Callers normalise it first.
    pub fn append_path(&mut self, path: &Path) -> &mut Self {
        self.append_quoted(path.display().to_string())
    }

    pub fn append_secret(&mut self, value: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::Secret(value.into()));
        self
    }

    /// Appends `key` and `value` joined by `delimiter` as a single token.
    pub fn append_switch(
        &mut self,
        key: impl Into<String>,
        delimiter: &'static str,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_switch(key.into(), delimiter, value.into(), false, false)
    }

    pub fn append_switch_quoted(
        &mut self,
        key: impl Into<String>,
        delimiter: &'static str,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_switch(key.into(), delimiter, value.into(), true, false)
    }

    pub fn append_switch_secret(
        &mut self,
        key: impl Into<String>,
        delimiter: &'static str,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_switch(key.into(), delimiter, value.into(), false, true)
    }

    /// Appends `flag` followed by `value` as two tokens, if `value` is set.
    pub fn append_option(&mut self, flag: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.append(flag).append(value);
        }
        self
    }

    /// Like [`append_option`](Self::append_option) with a quoted value.
    pub fn append_option_quoted(&mut self, flag: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.append(flag).append_quoted(value);
        }
        self
    }

    fn push_switch(
        &mut self,
        key: String,
        delimiter: &'static str,
        value: String,
        quoted: bool,
        secret: bool,
    ) -> &mut Self {
        self.tokens.push(Token::Switch {
            key,
            delimiter,
            value,
            quoted,
            secret,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Raw tokens for the OS.
    pub fn to_argv(&self) -> Vec<String> {
        self.tokens.iter().map(Token::raw).collect()
    }

    /// Quoted, redacted tokens.
    pub fn rendered_tokens(&self) -> Vec<String> {
        self.tokens.iter().map(Token::rendered).collect()
    }

    pub fn render(&self) -> String {
        self.rendered_tokens().join(" ")
    }
}

impl fmt::Display for ArgumentSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Resolves `path` against `base` and removes `.` and `..` segments lexically.
///
/// Absolute inputs are only cleaned. The filesystem is not consulted.
pub fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_quotes_paths_and_switch_values() {
        let mut args = ArgumentSequence::new();
        args.append("archive")
            .append_switch("-p", ":", "MyApp.iOS")
            .append_switch_quoted("-c", ":", "Release|iPhone")
            .append_path(Path::new("/work/My Solution.sln"));

        assert_eq!(
            args.render(),
            r#"archive -p:MyApp.iOS -c:"Release|iPhone" "/work/My Solution.sln""#
        );
        assert_eq!(
            args.to_argv(),
            vec![
                "archive",
                "-p:MyApp.iOS",
                "-c:Release|iPhone",
                "/work/My Solution.sln"
            ]
        );
    }

    #[test]
    fn secrets_never_render() {
        let mut args = ArgumentSequence::new();
        args.append("restore")
            .append_switch("-u", ":", "dev@example.com")
            .append_switch_secret("-p", ":", "hunter2")
            .append_secret("api-key-123");

        let rendered = args.render();
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("api-key-123"));
        assert_eq!(rendered, "restore -u:dev@example.com -p:[REDACTED] [REDACTED]");
        assert_eq!(args.to_argv()[2], "-p:hunter2");
        assert_eq!(args.to_argv()[3], "api-key-123");
    }

    #[test]
    fn conditional_and_optional_tokens() {
        let mut args = ArgumentSequence::new();
        args.append_if(false, "-v")
            .append("submit")
            .append_option("--fixture", None)
            .append_option("--series", Some("master"))
            .append_option_quoted("--dsym", Some("/out/App.dSYM"));

        assert_eq!(args.render(), r#"submit --series master --dsym "/out/App.dSYM""#);
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn embedded_quotes_are_escaped_in_render() {
        let mut args = ArgumentSequence::new();
        args.append_quoted(r#"say "hi""#);
        assert_eq!(args.render(), r#""say \"hi\"""#);
        assert_eq!(args.to_argv(), vec![r#"say "hi""#]);
    }

    #[test]
    fn make_absolute_resolves_relative_paths() {
        let base = Path::new("/work/repo");
        assert_eq!(
            make_absolute(Path::new("src/App.sln"), base),
            PathBuf::from("/work/repo/src/App.sln")
        );
        assert_eq!(
            make_absolute(Path::new("./a/../b/App.csproj"), base),
            PathBuf::from("/work/repo/b/App.csproj")
        );
        assert_eq!(
            make_absolute(Path::new("../other/App.sln"), base),
            PathBuf::from("/work/other/App.sln")
        );
    }

    #[test]
    fn make_absolute_keeps_absolute_paths() {
        assert_eq!(
            make_absolute(Path::new("/abs/./App.sln"), Path::new("/ignored")),
            PathBuf::from("/abs/App.sln")
        );
    }
}
