use std::path::{Path, PathBuf};

use crate::config::GraphConfig;
use crate::error::CaptionError;

const MODEL_DIR_ENV: &str = "IM2TXT_MODEL_DIR";

pub fn missing_model_files(model_dir: &Path, graph: &GraphConfig) -> Vec<String> {
    [
        graph.encoder_model.as_str(),
        graph.decoder_model.as_str(),
        graph.vocabulary_file.as_str(),
    ]
    .iter()
    .filter(|file| !model_dir.join(file).exists())
    .map(|file| (*file).to_string())
    .collect()
}

/// `IM2TXT_MODEL_DIR` when set, otherwise `<cache dir>/im2txt`.
pub fn default_model_root() -> PathBuf {
    if let Some(dir) = std::env::var_os(MODEL_DIR_ENV) {
        return PathBuf::from(dir);
    }
    fallback_model_root()
}

pub fn fallback_model_root() -> PathBuf {
    let base = dirs_next::cache_dir()
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("im2txt")
}

/// Checks that `root` holds every file named by `graph`.
pub fn resolve_model_dir<P: AsRef<Path>>(
    root: P,
    graph: &GraphConfig,
) -> Result<PathBuf, CaptionError> {
    let root = root.as_ref();
    log::debug!("resolve_model_dir: checking {}", root.display());

    if !root.is_dir() {
        return Err(CaptionError::ModelNotFound(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let missing = missing_model_files(root, graph);
    if !missing.is_empty() {
        log::warn!(
            "Model directory {} is missing {}",
            root.display(),
            missing.join(", ")
        );
        return Err(CaptionError::ModelNotFound(format!(
            "{} (missing {})",
            root.display(),
            missing.join(", ")
        )));
    }

    Ok(root.to_path_buf())
}
