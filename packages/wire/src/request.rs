//! Token-based request encoding.
//!
//! A request is a sequence of string tokens joined by `::`: a fixed `fs`
//! namespace marker, the command name, then stringified arguments.
//! Numbers travel as decimal text.

use std::fmt;
use std::str::FromStr;

use treefs_core::Error;

/// Namespace marker, token 0 of every request.
pub const NAMESPACE: &str = "fs";

/// Token delimiter.
///
/// There is no escaping: an argument value containing the delimiter
/// splits into extra tokens on decode, shifting everything after it.
/// Callers must keep the delimiter out of paths, names, and contents.
pub const DELIMITER: &str = "::";

/// The command vocabulary the server dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ChangeDirectory,
    CreateDirectory,
    Move,
    Delete,
    Save,
    MemoryMap,
    Root,
    Current,
    CreateFile,
    OpenFile,
    DeleteFile,
    WriteContents,
    ReadContents,
    MoveContents,
    TruncateContents,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::ChangeDirectory => "change_directory",
            Command::CreateDirectory => "create_directory",
            Command::Move => "move",
            Command::Delete => "delete",
            Command::Save => "save",
            Command::MemoryMap => "memory_map",
            Command::Root => "root",
            Command::Current => "current",
            Command::CreateFile => "create_file",
            Command::OpenFile => "open_file",
            Command::DeleteFile => "delete_file",
            Command::WriteContents => "write_contents",
            Command::ReadContents => "read_contents",
            Command::MoveContents => "move_contents",
            Command::TruncateContents => "truncate_contents",
        }
    }

    /// Whether the command produces a response frame.
    pub fn returns_value(self) -> bool {
        matches!(
            self,
            Command::ChangeDirectory
                | Command::MemoryMap
                | Command::Root
                | Command::Current
                | Command::OpenFile
                | Command::ReadContents
        )
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "change_directory" => Ok(Command::ChangeDirectory),
            "create_directory" => Ok(Command::CreateDirectory),
            "move" => Ok(Command::Move),
            "delete" => Ok(Command::Delete),
            "save" => Ok(Command::Save),
            "memory_map" => Ok(Command::MemoryMap),
            "root" => Ok(Command::Root),
            "current" => Ok(Command::Current),
            "create_file" => Ok(Command::CreateFile),
            "open_file" => Ok(Command::OpenFile),
            "delete_file" => Ok(Command::DeleteFile),
            "write_contents" => Ok(Command::WriteContents),
            "read_contents" => Ok(Command::ReadContents),
            "move_contents" => Ok(Command::MoveContents),
            "truncate_contents" => Ok(Command::TruncateContents),
            other => Err(Error::invalid_arguments(format!(
                "unknown command '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded request: a command and its string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub args: Vec<String>,
}

impl Request {
    pub fn new(command: Command, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Request {
            command,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Encode as `fs::<command>::<args...>` UTF-8 bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut tokens = vec![NAMESPACE.to_string(), self.command.as_str().to_string()];
        tokens.extend(self.args.iter().cloned());
        tokens.join(DELIMITER).into_bytes()
    }

    /// Decode a request payload, validating the namespace marker and the
    /// command token. A wrong marker or unknown command fails only this
    /// request.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::invalid_arguments("request is not valid UTF-8"))?;
        let mut tokens = text.split(DELIMITER);

        let namespace = tokens
            .next()
            .ok_or_else(|| Error::invalid_arguments("empty request"))?;
        if namespace != NAMESPACE {
            return Err(Error::invalid_arguments(format!(
                "invalid starting sequence '{}'",
                namespace
            )));
        }

        let command = tokens
            .next()
            .ok_or_else(|| Error::invalid_arguments("missing command token"))?
            .parse()?;

        Ok(Request {
            command,
            args: tokens.map(str::to_string).collect(),
        })
    }

    /// The argument at `index`, or `InvalidArguments`.
    pub fn arg(&self, index: usize) -> Result<&str, Error> {
        self.args.get(index).map(String::as_str).ok_or_else(|| {
            Error::invalid_arguments(format!(
                "{}: missing argument {}",
                self.command,
                index + 1
            ))
        })
    }

    /// The argument at `index` parsed as a decimal integer.
    pub fn int_arg<T: FromStr>(&self, index: usize) -> Result<T, Error> {
        let raw = self.arg(index)?;
        raw.parse().map_err(|_| {
            Error::invalid_arguments(format!("{}: '{}' is not a number", self.command, raw))
        })
    }
}
