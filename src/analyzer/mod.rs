//! Content analyzer boundary.
//!
//! An analyzer takes the text of one file and returns the findings it sees
//! in it. The orchestrator does not care whether findings come from the
//! built-in pattern rules ([`crate::rules::PatternAnalyzer`]), from an
//! external command ([`CommandAnalyzer`]) or from anything else implementing
//! [`Analyzer`].

mod command;
mod error;
mod language;
pub mod wordpress;

pub use command::CommandAnalyzer;
pub use error::AnalyzerError;
pub use language::Language;
pub use wordpress::WordPressAnalyzer;

use crate::rules::Finding;

/// Analyzes one file's content.
pub trait Analyzer {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError>;
}

impl<T: Analyzer + ?Sized> Analyzer for &T {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        (**self).analyze(content, file_path, language)
    }
}

impl<T: Analyzer + ?Sized> Analyzer for Box<T> {
    fn analyze(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        (**self).analyze(content, file_path, language)
    }
}

/// Build the analyzer selected by configuration: the external command when
/// one is configured, the built-in rules otherwise. Both are wrapped in the
/// WordPress enrichment pass.
pub fn from_config(config: &crate::config::AnalyzerConfig) -> Box<dyn Analyzer> {
    match config.command.as_deref() {
        Some([program, args @ ..]) => Box::new(WordPressAnalyzer::new(
            CommandAnalyzer::new(program, args).with_timeout(config.timeout_secs),
        )),
        _ => Box::new(WordPressAnalyzer::new(crate::rules::PatternAnalyzer::new())),
    }
}
