use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error("Failed to read benchmark manifest {path}: {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse benchmark manifest {path}: {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Benchmark case {id}: no such file {path}")]
    MissingCase { id: String, path: PathBuf },

    #[error("Failed to write benchmark results {path}: {source}")]
    WriteResults {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize benchmark results: {0}")]
    Serialize(#[from] serde_json::Error),
}
