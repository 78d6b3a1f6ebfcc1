use super::{GradientBoostedClassifier, ModelLoadError};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

struct SharedModel {
    path: PathBuf,
    model: Arc<GradientBoostedClassifier>,
}

static SHARED_MODEL: OnceLock<SharedModel> = OnceLock::new();

/// Load a classifier artifact from disk.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<GradientBoostedClassifier, ModelLoadError> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading model artifact");

    let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model = GradientBoostedClassifier::from_json_str(&normalize_non_finite(&raw))?;

    let summary = model.summary();
    info!(
        path = %path.display(),
        trees = summary.trees,
        categorical_splits = summary.categorical_splits,
        objective = %summary.objective,
        "model artifact loaded"
    );
    Ok(model)
}

/// Process-wide model handle, loaded on first use and reused for the process lifetime.
///
/// The first successful call fixes the model; later calls naming another path get the
/// already loaded instance back. A failed load leaves the handle empty.
pub fn shared_model<P: AsRef<Path>>(
    path: P,
) -> Result<Arc<GradientBoostedClassifier>, ModelLoadError> {
    let path = path.as_ref();
    if let Some(shared) = SHARED_MODEL.get() {
        return Ok(reuse(shared, path));
    }

    let model = Arc::new(load_model(path)?);
    // A concurrent first call may have won the race; keep whichever was stored.
    let shared = SHARED_MODEL.get_or_init(|| SharedModel {
        path: path.to_path_buf(),
        model,
    });
    Ok(reuse(shared, path))
}

fn reuse(shared: &SharedModel, requested: &Path) -> Arc<GradientBoostedClassifier> {
    if shared.path != requested {
        warn!(
            loaded = %shared.path.display(),
            requested = %requested.display(),
            "model already loaded for this process, ignoring requested path"
        );
    }
    Arc::clone(&shared.model)
}

/// Replace the `NaN`/`Infinity` literals XGBoost writes for undefined split values with
/// `null`, which strict JSON parsers accept.
pub(crate) fn normalize_non_finite(raw: &str) -> Cow<'_, str> {
    const TOKENS: [&str; 4] = ["-Infinity", "Infinity", "-NaN", "NaN"];

    let bytes = raw.as_bytes();
    let mut normalized: Option<String> = None;
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            index += 1;
            continue;
        }
        if byte == b'"' {
            in_string = true;
            index += 1;
            continue;
        }

        let token = TOKENS
            .iter()
            .find(|token| bytes[index..].starts_with(token.as_bytes()));
        match token {
            Some(token) => {
                let buffer = normalized.get_or_insert_with(|| String::with_capacity(raw.len()));
                buffer.push_str(&raw[copied..index]);
                buffer.push_str("null");
                index += token.len();
                copied = index;
            }
            None => index += 1,
        }
    }

    match normalized {
        Some(mut buffer) => {
            buffer.push_str(&raw[copied..]);
            Cow::Owned(buffer)
        }
        None => Cow::Borrowed(raw),
    }
}
