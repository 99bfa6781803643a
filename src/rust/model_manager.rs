use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use serde::Deserialize;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::{BuiltinModel, ModelInfo};

/// Environment variable overriding the cache root, models land in `$EMOTIVE_CACHE/models`
pub const CACHE_ENV: &str = "EMOTIVE_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Incomplete {file_type} download: expected {expected} bytes, got {actual}")]
    IncompleteDownload {
        file_type: String,
        expected: u64,
        actual: u64,
    },
    #[error("Downloaded {file_type} file is unusable: {reason}")]
    InvalidContent {
        file_type: String,
        reason: String,
    },
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid model config: {0}")]
    ConfigError(String),
}

/// The part of a HuggingFace `config.json` that names the classification labels
#[derive(Debug, Deserialize)]
struct ModelConfigFile {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

/// Reads the label vocabulary from a `config.json`, ordered by logit index.
pub fn read_labels(path: &Path) -> Result<Vec<String>, ModelError> {
    let raw = fs::read_to_string(path)?;
    let config: ModelConfigFile = serde_json::from_str(&raw)
        .map_err(|e| ModelError::ConfigError(format!("{}: {}", path.display(), e)))?;

    let mut indexed = Vec::with_capacity(config.id2label.len());
    for (id, label) in config.id2label {
        let index: usize = id.parse()
            .map_err(|_| ModelError::ConfigError(format!("id2label key '{}' is not an index", id)))?;
        indexed.push((index, label));
    }
    indexed.sort_by_key(|(index, _)| *index);

    // Indices must be exactly 0..n so that label i lines up with logit i
    if let Some(pos) = indexed.iter().enumerate().position(|(pos, (index, _))| pos != *index) {
        return Err(ModelError::ConfigError(format!("id2label has no entry for index {}", pos)));
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Checksums recorded when each file was downloaded, kept next to the files
const CHECKSUMS_FILE: &str = "checksums.json";

/// Smallest file accepted as an ONNX graph
const MIN_ONNX_BYTES: usize = 16;

/// Field 1 (`ir_version`, varint) of an ONNX `ModelProto` opens every exported graph
const ONNX_IR_VERSION_TAG: u8 = 0x08;

/// The three files that make up a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Artifact {
    Model,
    Tokenizer,
    Config,
}

impl Artifact {
    const ALL: [Artifact; 3] = [Artifact::Model, Artifact::Tokenizer, Artifact::Config];

    fn file_name(self) -> &'static str {
        match self {
            Self::Model => "model.onnx",
            Self::Tokenizer => "tokenizer.json",
            Self::Config => "config.json",
        }
    }

    fn file_type(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Tokenizer => "tokenizer",
            Self::Config => "config",
        }
    }

    fn url(self, info: &ModelInfo) -> &str {
        match self {
            Self::Model => &info.model_url,
            Self::Tokenizer => &info.tokenizer_url,
            Self::Config => &info.config_url,
        }
    }

    fn pinned_hash(self, info: &ModelInfo) -> Option<&str> {
        match self {
            Self::Model => info.model_hash.as_deref(),
            Self::Tokenizer => info.tokenizer_hash.as_deref(),
            Self::Config => None,
        }
    }

    /// Rejects bytes that cannot be this kind of file, such as an HTML error page
    fn check_content(self, bytes: &[u8]) -> Result<(), String> {
        match self {
            Self::Model => {
                if bytes.len() < MIN_ONNX_BYTES {
                    return Err(format!("{} bytes is too small for an ONNX model", bytes.len()));
                }
                if bytes[0] != ONNX_IR_VERSION_TAG {
                    return Err("not an ONNX model (missing ir_version header)".to_string());
                }
                Ok(())
            }
            Self::Tokenizer => match serde_json::from_slice::<serde_json::Value>(bytes) {
                Ok(value) if value.is_object() => Ok(()),
                Ok(_) => Err("tokenizer file is not a JSON object".to_string()),
                Err(e) => Err(format!("tokenizer file is not valid JSON: {}", e)),
            },
            Self::Config => serde_json::from_slice::<ModelConfigFile>(bytes)
                .map(|_| ())
                .map_err(|e| format!("config file is not a model config: {}", e)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        Self::models_dir_from(env::var(CACHE_ENV).ok())
    }

    /// Models directory for a given `EMOTIVE_CACHE` value
    pub fn models_dir_from(cache_root: Option<String>) -> PathBuf {
        if let Some(path) = cache_root.filter(|path| !path.trim().is_empty()) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("emotive").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("emotive").join("models");
        }

        env::temp_dir().join("emotive").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn model_dir(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.model_dir(model.name()).join(Artifact::Model.file_name())
    }

    pub fn get_tokenizer_path(&self, model: BuiltinModel) -> PathBuf {
        self.model_dir(model.name()).join(Artifact::Tokenizer.file_name())
    }

    pub fn get_config_path(&self, model: BuiltinModel) -> PathBuf {
        self.model_dir(model.name()).join(Artifact::Config.file_name())
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        log::debug!("Checking if model {:?} is downloaded", model);
        self.files_present(model.name())
    }

    fn files_present(&self, name: &str) -> bool {
        let dir = self.model_dir(name);
        Artifact::ALL.iter().all(|artifact| {
            let path = dir.join(artifact.file_name());
            let exists = path.exists();
            log::debug!("  {:?} (exists: {})", path, exists);
            exists
        })
    }

    /// Label vocabulary of a downloaded model, in logit order
    pub fn load_labels(&self, model: BuiltinModel) -> Result<Vec<String>, ModelError> {
        let path = self.get_config_path(model);
        if !path.exists() {
            return Err(ModelError::NotDownloaded(format!("{:?}", model)));
        }
        let labels = read_labels(&path)?;
        if labels.is_empty() {
            log::warn!("{:?} has no id2label, falling back to built-in labels", path);
            return Ok(model.default_labels().iter().map(|l| l.to_string()).collect());
        }
        Ok(labels)
    }

    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        self.download_from(&model.get_model_info()).await
    }

    /// Fetches every file named by `info` into `<models_dir>/<info.name>`.
    ///
    /// Files that already verify are kept. On any failure all of the model's files are removed.
    pub async fn download_from(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.model_dir(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for artifact in Artifact::ALL {
            let file_type = artifact.file_type();
            let expected_hash = artifact.pinned_hash(info);
            let path = model_dir.join(artifact.file_name());

            let result = if path.exists() && self.verify_file(&model_dir, artifact, expected_hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                Ok(())
            } else {
                if path.exists() {
                    log::warn!("{} file verification failed, redownloading", file_type);
                }
                self.download_and_verify_file(artifact.url(info), &model_dir, artifact, expected_hash)
                    .await
            };

            if let Err(e) = result {
                log::error!("Failed to setup {} file: {}", file_type, e);
                let _ = self.remove_files(&info.name);
                return Err(e);
            }
        }

        log::info!("Model {} ready to use", info.name);
        Ok(())
    }

    fn read_checksums(&self, model_dir: &Path) -> BTreeMap<String, String> {
        let path = model_dir.join(CHECKSUMS_FILE);
        let Ok(raw) = fs::read(&path) else {
            return BTreeMap::new();
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {:?}: {}", path, e);
            BTreeMap::new()
        })
    }

    fn record_checksum(&self, model_dir: &Path, artifact: Artifact, hash: &str) -> Result<(), ModelError> {
        let mut checksums = self.read_checksums(model_dir);
        checksums.insert(artifact.file_name().to_string(), hash.to_string());
        let raw = serde_json::to_vec_pretty(&checksums)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(model_dir.join(CHECKSUMS_FILE), raw)?;
        Ok(())
    }

    /// A file verifies when it is non-empty, looks like its kind, and hashes to the pinned
    /// checksum or, without a pin, to the checksum recorded when it was downloaded.
    fn verify_file(&self, model_dir: &Path, artifact: Artifact, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let path = model_dir.join(artifact.file_name());
        if !path.exists() {
            return Ok(false);
        }
        let bytes = fs::read(&path)?;
        if bytes.is_empty() {
            log::warn!("{:?} is empty", path);
            return Ok(false);
        }
        if let Err(reason) = artifact.check_content(&bytes) {
            log::warn!("{:?} is not usable: {}", path, reason);
            return Ok(false);
        }

        let expected = match expected_hash {
            Some(pinned) => Some(pinned.to_string()),
            None => self.read_checksums(model_dir).remove(artifact.file_name()),
        };
        let Some(expected) = expected else {
            log::warn!("{:?} has no recorded checksum", path);
            return Ok(false);
        };

        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: calculated {}, expected {}", path, hash, expected);
        Ok(hash.eq_ignore_ascii_case(&expected))
    }

    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        self.verify_info(&model.get_model_info())
    }

    /// Checks every file of `info` against its pinned or recorded checksum
    pub fn verify_info(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        if !self.files_present(&info.name) {
            log::info!("Model {} is missing files", info.name);
            return Ok(false);
        }

        let model_dir = self.model_dir(&info.name);
        let mut results = Vec::with_capacity(Artifact::ALL.len());
        for artifact in Artifact::ALL {
            results.push(self.verify_file(&model_dir, artifact, artifact.pinned_hash(info))?);
        }

        log::info!(
            "Verification results for {}: model={} tokenizer={} config={}",
            info.name, results[0], results[1], results[2]
        );

        Ok(results.iter().all(|ok| *ok))
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        model_dir: &Path,
        artifact: Artifact,
        expected_hash: Option<&str>,
    ) -> Result<(), ModelError> {
        let file_type = artifact.file_type();
        let path = model_dir.join(artifact.file_name());
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let announced = response.content_length();
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = announced {
            if bytes.len() as u64 != expected {
                return Err(ModelError::IncompleteDownload {
                    file_type: file_type.to_string(),
                    expected,
                    actual: bytes.len() as u64,
                });
            }
        }

        artifact.check_content(&bytes).map_err(|reason| ModelError::InvalidContent {
            file_type: file_type.to_string(),
            reason,
        })?;

        let hash = sha256_hex(&bytes);
        if let Some(expected) = expected_hash {
            if !hash.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        fs::create_dir_all(model_dir)?;
        fs::write(&path, &bytes)?;
        self.record_checksum(model_dir, artifact, &hash)?;

        if !self.verify_file(model_dir, artifact, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        self.remove_files(model.name())
    }

    fn remove_files(&self, name: &str) -> Result<(), ModelError> {
        let model_dir = self.model_dir(name);
        let names = Artifact::ALL.iter().map(|artifact| artifact.file_name()).chain([CHECKSUMS_FILE]);
        for file_name in names {
            let path = model_dir.join(file_name);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        self.ensure_downloaded_from(&model.get_model_info()).await
    }

    pub async fn ensure_downloaded_from(&self, info: &ModelInfo) -> Result<(), ModelError> {
        if !self.files_present(&info.name) {
            log::info!("Model {} not found, downloading...", info.name);
            self.download_from(info).await?;
        } else if !self.verify_info(info)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_files(&info.name)?;
            self.download_from(info).await?;
        } else {
            log::info!("Model {} verification successful", info.name);
        }
        Ok(())
    }
}
