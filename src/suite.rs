//! Test suite file management
//!
//! A test suite file declares an ordered list of scenario scripts, one per
//! line, relative to the suite file's directory. Blank lines and `#`
//! comments are skipped; a leading `+` is stripped; a leading `-` removes a
//! previously listed script.

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Test suite file reader.
#[derive(Debug)]
pub struct TestSuiteFile {
    /// Test suite file path.
    pub path: PathBuf,
    /// Script paths declared by the test suite file.
    ///
    /// Filled once the file has been successfully read.
    pub script_paths: Vec<PathBuf>,
}

impl TestSuiteFile {
    /// New reader for the given suite file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            script_paths: Vec::new(),
        }
    }

    /// Read and parse the test suite file.
    pub fn read(&mut self) -> Result<()> {
        // Reset in case `read()` is called several times.
        self.script_paths = Vec::new();

        tracing::debug!("Reading '{}'", self.path.display());
        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| Error::suite_read(&self.path, err))?;
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        for (line_number, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(removed) = line.strip_prefix('-') {
                let removed = base_dir.join(removed.trim());
                tracing::debug!("Black list line: '{}'", removed.display());
                self.script_paths.retain(|path| *path != removed);
                continue;
            }

            let line = line.strip_prefix('+').map(str::trim).unwrap_or(line);
            if line.contains('*') {
                return Err(Error::suite_read(
                    &self.path,
                    format!(
                        "glob patterns are not supported (line {}): '{}'",
                        line_number + 1,
                        line
                    ),
                ));
            }

            let script_path = base_dir.join(line);
            tracing::debug!("White list line: '{}'", script_path.display());
            self.script_paths.push(script_path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_suite(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_scripts_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_suite(
            dir.path(),
            "demo.lst",
            "# demo campaign\n\nfirst.case\nsub/second.case\n+ third.case\n",
        );

        let mut suite = TestSuiteFile::new(&path);
        suite.read().unwrap();

        assert_eq!(
            suite.script_paths,
            vec![
                dir.path().join("first.case"),
                dir.path().join("sub/second.case"),
                dir.path().join("third.case"),
            ]
        );
    }

    #[test]
    fn black_list_removes_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_suite(
            dir.path(),
            "demo.lst",
            "first.case\nsecond.case\n- first.case\n",
        );

        let mut suite = TestSuiteFile::new(&path);
        suite.read().unwrap();

        assert_eq!(suite.script_paths, vec![dir.path().join("second.case")]);
    }

    #[test]
    fn rereading_resets_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_suite(dir.path(), "demo.lst", "only.case\n");

        let mut suite = TestSuiteFile::new(&path);
        suite.read().unwrap();
        suite.read().unwrap();

        assert_eq!(suite.script_paths.len(), 1);
    }

    #[test]
    fn missing_file_is_a_suite_read_error() {
        let mut suite = TestSuiteFile::new("no/such/suite.lst");
        let err = suite.read().unwrap_err();
        assert!(matches!(err, Error::SuiteRead { .. }));
    }

    #[test]
    fn glob_lines_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_suite(dir.path(), "demo.lst", "*.case\n");

        let mut suite = TestSuiteFile::new(&path);
        let err = suite.read().unwrap_err();
        assert!(err.to_string().contains("glob patterns"));
    }
}
