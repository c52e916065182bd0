//! A configuration source made of `-c key=value` command-line options.

use config::{ConfigError, Source, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Alias for the Result type from config.
type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration overrides given on the command line.
///
/// Each override is one line of TOML.  For convenience, an override of
/// the form `key=bareword` has its bareword quoted, so that
/// `-c spool.flavor=microdesc` works.
#[derive(Debug, Clone, Default)]
pub(crate) struct CmdLine {
    /// The overrides, in the order they were given.
    lines: Vec<String>,
}

impl CmdLine {
    /// Make a new CmdLine holding `lines`.
    pub(crate) fn new<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        CmdLine {
            lines: lines.into_iter().map(|l| l.as_ref().to_string()).collect(),
        }
    }

    /// Join our overrides into a single TOML document.
    fn to_toml(&self) -> String {
        let mut s = String::new();
        for line in &self.lines {
            match quote_bareword(line) {
                Some(q) => s.push_str(&q),
                None => s.push_str(line),
            }
            s.push('\n');
        }
        s
    }

    /// Describe a TOML error in terms of the override that caused it.
    fn describe_error(&self, e: &toml::de::Error) -> String {
        /// Regex to strip the position from a toml error message.
        static POSITION: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(.*?) at line [0-9]+ column [0-9]+$").expect("Can't compile regex")
        });
        let msg = e.to_string();
        let msg = match POSITION.captures(&msg) {
            Some(c) => c.get(1).map_or(msg.as_str(), |m| m.as_str()).to_string(),
            None => msg.clone(),
        };
        match e.line_col() {
            Some((line, _)) if line < self.lines.len() => {
                format!("{} in option {:?}", msg, self.lines[line])
            }
            _ => format!("{} on command line", msg),
        }
    }
}

impl Source for CmdLine {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<HashMap<String, Value>> {
        let v: toml::Value =
            toml::from_str(&self.to_toml()).map_err(|e| ConfigError::Message(self.describe_error(&e)))?;
        v.try_into().map_err(|e| ConfigError::Foreign(Box::new(e)))
    }
}

/// If `s` looks like `dotted.key=bareword`, return it with the bareword
/// quoted.
fn quote_bareword(s: &str) -> Option<String> {
    /// Regex to match a key=bareword item.
    static BAREWORD: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r#"(?x:
               ^ [ \t]*
               # dotted key
               ((?:[a-zA-Z0-9_\-]+\.)* [a-zA-Z0-9_\-]+)
               [ \t]* = [ \t]*
               # a bareword that isn't a boolean
               ([a-zA-Z0-9_]+)
               [ \t]* $)"#,
        )
        .expect("Built-in regex compilation failed")
    });

    let c = BAREWORD.captures(s)?;
    match &c[2] {
        "true" | "false" => None,
        _ if c[2].bytes().all(|b| b.is_ascii_digit()) => None,
        word => Some(format!("{}=\"{}\"", &c[1], word)),
    }
}
