use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A command line as carried by `Cmd`, `Entrypoint` and `Shell`.
///
/// The engine accepts either a bare string or an argument list on read. The
/// in-memory form records which one the caller chose, but the wire form is
/// always a list: `Shell(s)` is written as `[s]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandLine {
    Shell(String),
    Exec(Vec<String>),
}

impl CommandLine {
    pub fn shell(command: impl Into<String>) -> Self {
        CommandLine::Shell(command.into())
    }

    pub fn exec<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::Exec(args.into_iter().map(Into::into).collect())
    }

    pub fn is_shell(&self) -> bool {
        matches!(self, CommandLine::Shell(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CommandLine::Shell(s) => s.is_empty(),
            CommandLine::Exec(args) => args.is_empty(),
        }
    }

    /// Argument vector as the engine would see it once the string form has
    /// been coerced into a one-element list.
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            CommandLine::Shell(s) => vec![s.clone()],
            CommandLine::Exec(args) => args.clone(),
        }
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(args: Vec<String>) -> Self {
        CommandLine::Exec(args)
    }
}

impl From<&str> for CommandLine {
    fn from(s: &str) -> Self {
        CommandLine::Shell(s.to_string())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandLine::Shell(s) => f.write_str(s),
            CommandLine::Exec(args) => write!(f, "{}", args.join(" ")),
        }
    }
}

impl Serialize for CommandLine {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            CommandLine::Shell(cmd) => [cmd].serialize(s),
            CommandLine::Exec(args) => args.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for CommandLine {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct CommandLineVisitor;

        impl<'de> Visitor<'de> for CommandLineVisitor {
            type Value = CommandLine;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or a list of strings")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(CommandLine::Shell(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(CommandLine::Shell(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut args = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(arg) = seq.next_element::<String>()? {
                    args.push(arg);
                }
                Ok(CommandLine::Exec(args))
            }
        }

        d.deserialize_any(CommandLineVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_form_roundtrip() {
        let cmd = CommandLine::exec(["nginx", "-g", "daemon off;"]);
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"["nginx","-g","daemon off;"]"#);
        assert_eq!(serde_json::from_str::<CommandLine>(&json).unwrap(), cmd);
    }

    #[test]
    fn test_shell_form_is_written_as_list() {
        let cmd: CommandLine = serde_json::from_str(r#""echo hello && sleep 1""#).unwrap();
        assert!(cmd.is_shell());
        assert_eq!(serde_json::to_string(&cmd).unwrap(), r#"["echo hello && sleep 1"]"#);
        assert_eq!(cmd.to_argv(), vec!["echo hello && sleep 1".to_string()]);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(serde_json::from_str::<CommandLine>("42").is_err());
        assert!(serde_json::from_str::<CommandLine>(r#"[1, 2]"#).is_err());
    }
}
