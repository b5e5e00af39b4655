//! Statement grammar and the up-front parser.
//!
//! A script is parsed line by line into statements before anything
//! executes; the first malformed line aborts the whole script with a
//! syntax error naming it. Blank lines and `#` comments are skipped.

use treefs_core::Mode;

use crate::error::ScriptError;

/// One executable statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create an empty file in the current folder.
    Create { name: String },
    /// Delete a file in the current folder.
    Delete { name: String },
    /// Open a file in the current folder and register the handle.
    Open { name: String, mode: Mode },
    /// Close and drop a registered handle.
    Close { name: String },
    /// Read through a registered handle; output goes to the transcript.
    Read {
        name: String,
        start: usize,
        size: Option<usize>,
    },
    /// Write through a registered handle.
    Write {
        name: String,
        contents: String,
        start: Option<usize>,
    },
    /// Truncate through a registered handle.
    Truncate { name: String, end: usize },
    Mkdir { path: String },
    Rmdir { path: String },
    Chdir { path: String },
    Move { src: String, dest: String },
    ShowMemoryMap,
}

/// A statement with its source position, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// 1-based source line.
    pub line: usize,
    pub text: String,
    pub statement: Statement,
}

/// Parse a whole script. Returns every statement or the first syntax
/// error; nothing executes on a parse failure.
pub fn parse(source: &str) -> Result<Vec<Located>, ScriptError> {
    let mut statements = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let statement = parse_line(text).map_err(|message| ScriptError::Syntax {
            line,
            text: text.to_string(),
            message,
        })?;
        statements.push(Located {
            line,
            text: text.to_string(),
            statement,
        });
    }
    Ok(statements)
}

fn parse_line(text: &str) -> Result<Statement, String> {
    let mut tokens = text.split_whitespace();
    let command = tokens.next().expect("caller skips blank lines");
    let args: Vec<&str> = tokens.collect();

    match command {
        "create" => Ok(Statement::Create {
            name: exactly_one(&args)?,
        }),
        "delete" => Ok(Statement::Delete {
            name: exactly_one(&args)?,
        }),
        "open" => {
            let [name, mode] = exactly::<2>(&args)?;
            let mode: Mode = mode.parse().map_err(|_| format!("unknown mode '{}'", mode))?;
            Ok(Statement::Open {
                name: name.to_string(),
                mode,
            })
        }
        "close" => Ok(Statement::Close {
            name: exactly_one(&args)?,
        }),
        "read" => {
            if args.is_empty() || args.len() > 3 {
                return Err("expected: read <name> [start [size]]".to_string());
            }
            Ok(Statement::Read {
                name: args[0].to_string(),
                start: parse_number(args.get(1))?.unwrap_or(0),
                size: parse_number(args.get(2))?,
            })
        }
        "write_to_file" => {
            if args.len() < 2 {
                return Err("expected: write_to_file <name> <contents...> [start]".to_string());
            }
            let name = args[0].to_string();
            let mut rest = args[1..].to_vec();
            // A trailing integer after at least one contents token is the
            // start offset.
            let start = if rest.len() >= 2 {
                match rest.last().and_then(|t| t.parse::<usize>().ok()) {
                    Some(n) => {
                        rest.pop();
                        Some(n)
                    }
                    None => None,
                }
            } else {
                None
            };
            Ok(Statement::Write {
                name,
                contents: rest.join(" "),
                start,
            })
        }
        "truncate" => {
            let [name, end] = exactly::<2>(&args)?;
            let end = end
                .parse()
                .map_err(|_| format!("'{}' is not a number", end))?;
            Ok(Statement::Truncate {
                name: name.to_string(),
                end,
            })
        }
        "mkdir" => Ok(Statement::Mkdir {
            path: exactly_one(&args)?,
        }),
        "rmdir" => Ok(Statement::Rmdir {
            path: exactly_one(&args)?,
        }),
        "chdir" => Ok(Statement::Chdir {
            path: exactly_one(&args)?,
        }),
        "move" => {
            let [src, dest] = exactly::<2>(&args)?;
            Ok(Statement::Move {
                src: src.to_string(),
                dest: dest.to_string(),
            })
        }
        "show_memory_map" => {
            if !args.is_empty() {
                return Err("show_memory_map takes no arguments".to_string());
            }
            Ok(Statement::ShowMemoryMap)
        }
        other => Err(format!("unknown statement '{}'", other)),
    }
}

fn exactly_one(args: &[&str]) -> Result<String, String> {
    let [only] = exactly::<1>(args)?;
    Ok(only.to_string())
}

fn exactly<'a, const N: usize>(args: &[&'a str]) -> Result<[&'a str; N], String> {
    <[&str; N]>::try_from(args).map_err(|_| format!("expected {} argument(s)", N))
}

fn parse_number(token: Option<&&str>) -> Result<Option<usize>, String> {
    match token {
        None => Ok(None),
        Some(t) => t
            .parse()
            .map(Some)
            .map_err(|_| format!("'{}' is not a number", t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(text: &str) -> Statement {
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.len(), 1);
        parsed[0].statement.clone()
    }

    #[test]
    fn parses_every_statement_kind() {
        assert_eq!(
            one("create a.txt"),
            Statement::Create {
                name: "a.txt".to_string()
            }
        );
        assert_eq!(
            one("open a.txt rw"),
            Statement::Open {
                name: "a.txt".to_string(),
                mode: Mode::ReadWrite,
            }
        );
        assert_eq!(
            one("read a.txt 2 5"),
            Statement::Read {
                name: "a.txt".to_string(),
                start: 2,
                size: Some(5),
            }
        );
        assert_eq!(
            one("read a.txt"),
            Statement::Read {
                name: "a.txt".to_string(),
                start: 0,
                size: None,
            }
        );
        assert_eq!(
            one("truncate a.txt 10"),
            Statement::Truncate {
                name: "a.txt".to_string(),
                end: 10,
            }
        );
        assert_eq!(
            one("move /a /b"),
            Statement::Move {
                src: "/a".to_string(),
                dest: "/b".to_string(),
            }
        );
        assert_eq!(one("show_memory_map"), Statement::ShowMemoryMap);
        assert_eq!(
            one("mkdir /docs"),
            Statement::Mkdir {
                path: "/docs".to_string()
            }
        );
    }

    #[test]
    fn write_joins_contents_tokens() {
        assert_eq!(
            one("write_to_file a.txt hello world"),
            Statement::Write {
                name: "a.txt".to_string(),
                contents: "hello world".to_string(),
                start: None,
            }
        );
    }

    #[test]
    fn write_trailing_integer_is_the_offset() {
        assert_eq!(
            one("write_to_file a.txt hello 4"),
            Statement::Write {
                name: "a.txt".to_string(),
                contents: "hello".to_string(),
                start: Some(4),
            }
        );
        // A single token is always contents, even when numeric.
        assert_eq!(
            one("write_to_file a.txt 42"),
            Statement::Write {
                name: "a.txt".to_string(),
                contents: "42".to_string(),
                start: None,
            }
        );
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        let parsed = parse("\n# a comment\n  \ncreate a.txt\n").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].line, 4);
    }

    #[test]
    fn syntax_error_names_the_line() {
        let err = parse("create a.txt\nfrobnicate x\n").unwrap_err();
        match err {
            ScriptError::Syntax { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "frobnicate x");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn bad_mode_is_a_syntax_error() {
        assert!(parse("open a.txt xyz").is_err());
    }

    #[test]
    fn bad_argument_count_is_a_syntax_error() {
        assert!(parse("open a.txt").is_err());
        assert!(parse("truncate a.txt").is_err());
        assert!(parse("move /a").is_err());
        assert!(parse("show_memory_map please").is_err());
    }

    #[test]
    fn bad_number_is_a_syntax_error() {
        assert!(parse("read a.txt zero").is_err());
        assert!(parse("truncate a.txt soon").is_err());
    }
}
