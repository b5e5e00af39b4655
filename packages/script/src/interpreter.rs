//! Statement execution and the concurrent multi-script runner.
//!
//! All scripts run against one shared filesystem and its open-handle
//! table. Buffer access serializes on each file's own lock and
//! structural access on the tree lock, so concurrent scripts never see a
//! partially applied statement. An execution error aborts only the
//! failing script; siblings keep running.

use std::sync::Arc;
use std::thread;

use treefs_core::{FileSystem, TreeOps};

use crate::error::ScriptError;
use crate::statement::{parse, Located, Statement};

pub struct Interpreter {
    fs: Arc<FileSystem>,
}

impl Interpreter {
    pub fn new(fs: Arc<FileSystem>) -> Self {
        Interpreter { fs }
    }

    pub fn fs(&self) -> &Arc<FileSystem> {
        &self.fs
    }

    /// Parse and run one script. Returns the transcript produced by
    /// `read` and `show_memory_map` statements.
    pub fn run(&self, source: &str) -> Result<Vec<String>, ScriptError> {
        let statements = parse(source)?;
        let mut transcript = Vec::new();
        for located in &statements {
            log::debug!("line {}: {}", located.line, located.text);
            self.execute(located, &mut transcript)
                .map_err(|source| ScriptError::Execution {
                    line: located.line,
                    text: located.text.clone(),
                    source,
                })?;
        }
        Ok(transcript)
    }

    /// Run several scripts concurrently, one thread per script. Each
    /// script's outcome is independent: a failing script does not stop
    /// its siblings.
    pub fn run_concurrent(&self, sources: &[String]) -> Vec<Result<Vec<String>, ScriptError>> {
        thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|source| scope.spawn(|| self.run(source)))
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(outcome) => outcome,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    fn execute(
        &self,
        located: &Located,
        transcript: &mut Vec<String>,
    ) -> Result<(), treefs_core::Error> {
        let fs = &self.fs;
        match &located.statement {
            Statement::Create { name } => fs.create_file(name),
            Statement::Delete { name } => fs.delete_file_in("", name),
            Statement::Open { name, mode } => {
                let handle = fs.open_file(name, mode.as_str())?;
                fs.handles().insert(handle)
            }
            Statement::Close { name } => fs.handles().close(name),
            Statement::Read { name, start, size } => {
                let handle = fs.handles().get(name)?;
                let end = match size {
                    // Saturate; the read clamps to the buffer anyway.
                    Some(size) => i64::try_from(start.saturating_add(*size)).unwrap_or(i64::MAX),
                    None => -1,
                };
                let bytes = handle.read(*start, end)?;
                transcript.push(String::from_utf8_lossy(&bytes).into_owned());
                Ok(())
            }
            Statement::Write {
                name,
                contents,
                start,
            } => {
                let handle = fs.handles().get(name)?;
                handle.write(contents.as_bytes(), start.unwrap_or(0))
            }
            Statement::Truncate { name, end } => {
                let handle = fs.handles().get(name)?;
                handle.truncate(*end)
            }
            Statement::Mkdir { path } => fs.create_directory(path),
            Statement::Rmdir { path } => fs.delete(path),
            Statement::Chdir { path } => fs.change_directory(path).map(|_| ()),
            Statement::Move { src, dest } => fs.move_node(src, dest),
            Statement::ShowMemoryMap => {
                transcript.push(fs.memory_map()?.formatted());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treefs_core::Error;

    fn interpreter() -> Interpreter {
        Interpreter::new(Arc::new(FileSystem::new()))
    }

    #[test]
    fn open_write_read_close() {
        let interp = interpreter();
        let transcript = interp
            .run("open a.txt rw\nwrite_to_file a.txt hello\nread a.txt\nclose a.txt\n")
            .unwrap();
        assert_eq!(transcript, vec!["hello".to_string()]);
        assert!(interp.fs().handles().is_empty());
    }

    #[test]
    fn read_with_start_and_size() {
        let interp = interpreter();
        let transcript = interp
            .run("open a.txt rw\nwrite_to_file a.txt abcdef\nread a.txt 1 3\n")
            .unwrap();
        assert_eq!(transcript, vec!["bcd".to_string()]);
    }

    #[test]
    fn read_with_out_of_range_bounds_clamps() {
        let interp = interpreter();
        let script = format!(
            "open a.txt rw\nwrite_to_file a.txt abcdef\nread a.txt {} 1\nread a.txt 2 {}\n",
            usize::MAX,
            usize::MAX
        );
        let transcript = interp.run(&script).unwrap();
        assert_eq!(transcript, vec!["".to_string(), "cdef".to_string()]);
    }

    #[test]
    fn directory_statements() {
        let interp = interpreter();
        interp
            .run("mkdir /docs\nmkdir /docs/img\nchdir /docs\ncreate a.txt\n")
            .unwrap();

        let docs = interp.fs().change_directory("/docs").unwrap();
        assert!(docs.contains("img"));
        assert!(docs.contains("a.txt"));
    }

    #[test]
    fn move_and_rmdir() {
        let interp = interpreter();
        interp
            .run("mkdir /a\nmkdir /b\nmove /a /b\nrmdir /b/a\n")
            .unwrap();
        let b = interp.fs().change_directory("/b").unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn truncate_statement() {
        let interp = interpreter();
        let transcript = interp
            .run("open a.txt rw\nwrite_to_file a.txt abcdef\ntruncate a.txt 3\nread a.txt\n")
            .unwrap();
        assert_eq!(transcript, vec!["abc".to_string()]);
    }

    #[test]
    fn show_memory_map_outputs_rows() {
        let interp = interpreter();
        let transcript = interp.run("mkdir /docs\nshow_memory_map\n").unwrap();
        assert_eq!(transcript.len(), 1);
        assert!(transcript[0].starts_with("00000000 :: "));
    }

    #[test]
    fn delete_statement_removes_file() {
        let interp = interpreter();
        interp.run("create a.txt\ndelete a.txt\n").unwrap();
        assert!(!interp.fs().root().unwrap().contains("a.txt"));
    }

    #[test]
    fn capability_violation_reports_line() {
        let interp = interpreter();
        let err = interp
            .run("open a.txt w\nclose a.txt\nopen a.txt r\nwrite_to_file a.txt nope\n")
            .unwrap_err();
        match err {
            ScriptError::Execution { line, source, .. } => {
                assert_eq!(line, 4);
                assert!(matches!(source, Error::UnsupportedOperation { .. }));
            }
            other => panic!("expected execution error, got {:?}", other),
        }
    }

    #[test]
    fn read_through_write_handle_fails() {
        let interp = interpreter();
        let err = interp.run("open a.txt w\nread a.txt\n").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Execution {
                line: 2,
                source: Error::UnsupportedOperation { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_handle_fails() {
        let interp = interpreter();
        let err = interp.run("read ghost.txt\n").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Execution {
                source: Error::NotFound { .. },
                ..
            }
        ));
    }

    #[test]
    fn parse_error_prevents_all_execution() {
        let interp = interpreter();
        let err = interp.run("create a.txt\nfrobnicate\n").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { line: 2, .. }));
        // Line 1 must not have run.
        assert!(!interp.fs().root().unwrap().contains("a.txt"));
    }

    #[test]
    fn execution_error_stops_that_script_only_at_that_line() {
        let interp = interpreter();
        let err = interp
            .run("create a.txt\nread ghost\ncreate b.txt\n")
            .unwrap_err();
        assert!(matches!(err, ScriptError::Execution { line: 2, .. }));
        let root = interp.fs().root().unwrap();
        assert!(root.contains("a.txt"));
        assert!(!root.contains("b.txt"));
    }

    #[test]
    fn handle_cap_exceeded_is_resource_exhausted() {
        let interp = Interpreter::new(Arc::new(FileSystem::new().with_max_open(2)));
        let err = interp
            .run("open a.txt w\nopen b.txt w\nopen c.txt w\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Execution {
                line: 3,
                source: Error::ResourceExhausted { .. },
                ..
            }
        ));
        // The existing open set is unchanged.
        assert_eq!(interp.fs().handles().len(), 2);
    }

    #[test]
    fn failing_script_does_not_stop_siblings() {
        let interp = interpreter();
        let sources = vec![
            "open shared.txt rw\nwrite_to_file shared.txt data\n".to_string(),
            "read ghost\n".to_string(),
        ];
        let outcomes = interp.run_concurrent(&sources);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
    }

    #[test]
    fn concurrent_write_and_read_never_interleave() {
        // One script writes a run of x's, the other reads the same open
        // file; the reader must see all-or-nothing.
        for _ in 0..20 {
            let interp = interpreter();
            interp.run("open a.txt rw\n").unwrap();

            let sources = vec![
                "write_to_file a.txt xxxx\n".to_string(),
                "read a.txt\n".to_string(),
            ];
            let outcomes = interp.run_concurrent(&sources);
            let transcript = outcomes[1].as_ref().unwrap();
            assert!(
                transcript[0].is_empty() || transcript[0] == "xxxx",
                "interleaved read: {:?}",
                transcript[0]
            );
            assert!(outcomes[0].is_ok());
        }
    }

    #[test]
    fn concurrent_structural_mutation_stays_consistent() {
        let interp = interpreter();
        let sources: Vec<String> = (0..4).map(|i| format!("mkdir /d{}\n", i)).collect();
        for outcome in interp.run_concurrent(&sources) {
            outcome.unwrap();
        }
        let root = interp.fs().root().unwrap();
        for i in 0..4 {
            assert!(root.contains(&format!("d{}", i)));
        }
    }
}
