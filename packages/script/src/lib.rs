//! TreeFS script interpreter.
//!
//! Parses a line-oriented script into statements up front, then executes
//! them in order against a shared [`treefs_core::FileSystem`]. Many
//! scripts can run as concurrent threads over one tree; per-file and
//! per-tree locks keep every statement atomic.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use treefs_core::FileSystem;
//! use treefs_script::Interpreter;
//!
//! let interp = Interpreter::new(Arc::new(FileSystem::new()));
//! let transcript = interp
//!     .run("open a.txt rw\nwrite_to_file a.txt hello\nread a.txt\n")
//!     .unwrap();
//! assert_eq!(transcript, vec!["hello".to_string()]);
//! ```

mod error;
mod interpreter;
mod statement;

pub use error::ScriptError;
pub use interpreter::Interpreter;
pub use statement::{parse, Located, Statement};
