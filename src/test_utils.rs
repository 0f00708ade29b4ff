#[cfg(test)]
pub mod fixtures {
    use crate::analyzer::{Analyzer, AnalyzerError, Language};
    use crate::fetch::{FetchError, FetchResult, Fetcher};
    use crate::rules::{Finding, Severity};
    use crate::store::WorkItem;
    use crate::workdir::WorkingDirectory;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    pub fn create_finding(kind: &str, severity: Severity, file: &str, line: usize) -> Finding {
        Finding {
            file: file.to_string(),
            line,
            kind: kind.to_string(),
            severity,
            description: "test finding".to_string(),
            snippet: Some("test".to_string()),
            exploit: None,
            fix: Some("test fix".to_string()),
            cwe: vec![],
            owasp: None,
        }
    }

    pub fn rce_finding() -> Finding {
        let mut finding = create_finding("rce", Severity::High, "shell.php", 9);
        finding.description = "shell_exec on a value read from options".to_string();
        finding.cwe = vec!["CWE-78".to_string()];
        finding
    }

    enum StubMode {
        Returning(Vec<Finding>),
        Failing,
        FailingOn(String, Vec<Finding>),
        PanickingOn(String),
    }

    #[derive(Default)]
    struct Calls {
        files: Vec<String>,
        contents: Vec<String>,
        languages: Vec<Language>,
    }

    /// Analyzer double that records every call.
    pub struct StubAnalyzer {
        mode: StubMode,
        calls: Mutex<Calls>,
    }

    impl StubAnalyzer {
        fn with_mode(mode: StubMode) -> Self {
            Self {
                mode,
                calls: Mutex::new(Calls::default()),
            }
        }

        /// Returns `findings` for every file.
        pub fn returning(findings: Vec<Finding>) -> Self {
            Self::with_mode(StubMode::Returning(findings))
        }

        pub fn failing() -> Self {
            Self::with_mode(StubMode::Failing)
        }

        /// Fails on `file`, returns `findings` for every other file.
        pub fn failing_on(file: &str, findings: Vec<Finding>) -> Self {
            Self::with_mode(StubMode::FailingOn(file.to_string(), findings))
        }

        pub fn panicking_on(file: &str) -> Self {
            Self::with_mode(StubMode::PanickingOn(file.to_string()))
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().files.clone()
        }

        pub fn contents(&self) -> Vec<String> {
            self.calls.lock().unwrap().contents.clone()
        }

        pub fn languages(&self) -> Vec<Language> {
            self.calls.lock().unwrap().languages.clone()
        }
    }

    impl Analyzer for StubAnalyzer {
        fn analyze(
            &self,
            content: &str,
            file_path: &str,
            language: Language,
        ) -> Result<Vec<Finding>, AnalyzerError> {
            {
                let mut calls = self.calls.lock().unwrap();
                calls.files.push(file_path.to_string());
                calls.contents.push(content.to_string());
                calls.languages.push(language);
            }

            match &self.mode {
                StubMode::Returning(findings) => Ok(findings.clone()),
                StubMode::Failing => Err(AnalyzerError::failed(file_path, "stub failure")),
                StubMode::FailingOn(file, _) if file == file_path => {
                    Err(AnalyzerError::failed(file_path, "stub failure"))
                }
                StubMode::FailingOn(_, findings) => Ok(findings.clone()),
                StubMode::PanickingOn(file) if file == file_path => {
                    panic!("stub analyzer panic on {file_path}")
                }
                StubMode::PanickingOn(_) => Ok(vec![]),
            }
        }
    }

    enum Script {
        Files(Vec<(String, String)>),
        Timeout,
        Exit(String),
    }

    /// Fetcher double. Each identifier can be scripted to produce a file
    /// tree, time out or exit non-zero; unscripted identifiers produce an
    /// empty tree. Directories come from a real [`WorkingDirectory`].
    pub struct ScriptedFetcher {
        workdir: WorkingDirectory,
        scripts: HashMap<String, Script>,
        fetched: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn new(base: &Path) -> Self {
            Self {
                workdir: WorkingDirectory::new(base),
                scripts: HashMap::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        pub fn with_files(mut self, identifier: &str, files: &[(&str, &str)]) -> Self {
            let files = files
                .iter()
                .map(|(name, content)| (name.to_string(), content.to_string()))
                .collect();
            self.scripts
                .insert(identifier.to_string(), Script::Files(files));
            self
        }

        pub fn with_timeout(mut self, identifier: &str) -> Self {
            self.scripts.insert(identifier.to_string(), Script::Timeout);
            self
        }

        pub fn with_exit(mut self, identifier: &str, stderr: &str) -> Self {
            self.scripts
                .insert(identifier.to_string(), Script::Exit(stderr.to_string()));
            self
        }

        pub fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl Fetcher for ScriptedFetcher {
        fn fetch(&self, item: &WorkItem) -> Result<FetchResult, FetchError> {
            let id = item.identifier.as_str();
            self.fetched.lock().unwrap().push(id.to_string());

            let dir = self.workdir.acquire(id).unwrap();
            let failure = match self.scripts.get(id) {
                Some(Script::Timeout) => Some(FetchError::Timeout {
                    identifier: id.to_string(),
                    program: "svn".to_string(),
                    timeout_secs: 300,
                    stderr: String::new(),
                }),
                Some(Script::Exit(stderr)) => Some(FetchError::Exit {
                    identifier: id.to_string(),
                    program: "git".to_string(),
                    status: "exit status: 128".to_string(),
                    stderr: stderr.clone(),
                }),
                Some(Script::Files(files)) => {
                    for (name, content) in files {
                        let path = dir.path().join(name);
                        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                        std::fs::write(path, content).unwrap();
                    }
                    None
                }
                None => None,
            };

            match failure {
                Some(err) => {
                    dir.release().unwrap();
                    Err(err)
                }
                None => Ok(FetchResult::new(dir.path().to_path_buf(), dir)),
            }
        }
    }
}
