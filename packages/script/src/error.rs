//! Script errors, always reported with the offending source line.

#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    /// Parse failure; nothing in the script executed.
    #[error("line {line}: syntax error in '{text}': {message}")]
    Syntax {
        line: usize,
        text: String,
        message: String,
    },

    /// Execution failure; statements after `line` were not run.
    #[error("line {line}: '{text}': {source}")]
    Execution {
        line: usize,
        text: String,
        source: treefs_core::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_line_and_text() {
        let e = ScriptError::Execution {
            line: 3,
            text: "read ghost".to_string(),
            source: treefs_core::Error::not_found("ghost"),
        };
        let msg = format!("{}", e);
        assert!(msg.contains("line 3"));
        assert!(msg.contains("read ghost"));
        assert!(msg.contains("not found"));
    }
}
