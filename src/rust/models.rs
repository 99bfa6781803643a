use std::env;

/// Environment variable that replaces the base URL the built-in model files are fetched from.
pub const MODEL_BASE_URL_ENV: &str = "EMOTIVE_MODEL_BASE_URL";

const DISTILBERT_EMOTION_BASE_URL: &str =
    "https://huggingface.co/bhadresh-savani/distilbert-base-uncased-emotion/resolve/main";

/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// DistilBERT fine-tuned on the six-class emotion dataset
    ///
    /// Characteristics:
    /// - Labels: sadness, joy, love, anger, fear, surprise
    /// - Max sequence length: 512
    /// - Size: ~255MB
    DistilBertEmotion,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Maximum sequence length the model can handle, longer inputs are truncated
    pub max_sequence_length: usize,
    /// Number of labels the classification head produces logits for
    pub num_labels: usize,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

/// Where the files of a model live and how to check them
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub config_url: String,
    /// Pinned SHA-256 of `model.onnx`. When `None` the checksum recorded at download time is used.
    pub model_hash: Option<String>,
    /// Pinned SHA-256 of `tokenizer.json`. When `None` the checksum recorded at download time is used.
    pub tokenizer_hash: Option<String>,
}

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::DistilBertEmotion => ModelCharacteristics {
                max_sequence_length: 512,
                num_labels: 6,
                model_size_mb: 255,
            },
        }
    }

    /// Labels in logit order, used when a model's `config.json` carries no `id2label`
    pub fn default_labels(&self) -> &'static [&'static str] {
        match self {
            Self::DistilBertEmotion => &["sadness", "joy", "love", "anger", "fear", "surprise"],
        }
    }

    /// Directory name of the model inside the models dir
    pub fn name(&self) -> &'static str {
        match self {
            Self::DistilBertEmotion => "distilbert-emotion",
        }
    }

    /// Download locations, honouring `EMOTIVE_MODEL_BASE_URL`
    pub fn get_model_info(&self) -> ModelInfo {
        match env::var(MODEL_BASE_URL_ENV) {
            Ok(base) if !base.trim().is_empty() => self.model_info_from(&base),
            _ => self.model_info_from(self.default_base_url()),
        }
    }

    /// Download locations under `base_url`, which must mirror the repository layout
    /// (`onnx/model.onnx`, `tokenizer.json`, `config.json`).
    pub fn model_info_from(&self, base_url: &str) -> ModelInfo {
        let base = base_url.trim().trim_end_matches('/');
        ModelInfo {
            name: self.name().to_string(),
            model_url: format!("{}/onnx/model.onnx", base),
            tokenizer_url: format!("{}/tokenizer.json", base),
            config_url: format!("{}/config.json", base),
            model_hash: None,
            tokenizer_hash: None,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::DistilBertEmotion => DISTILBERT_EMOTION_BASE_URL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristics_match_labels() {
        let model = BuiltinModel::DistilBertEmotion;
        assert_eq!(model.characteristics().num_labels, model.default_labels().len());
        assert_eq!(model.characteristics().max_sequence_length, 512);
    }

    #[test]
    fn test_model_info_urls() {
        let info = BuiltinModel::DistilBertEmotion.get_model_info();
        assert_eq!(info.name, "distilbert-emotion");
        assert!(info.model_url.ends_with("/onnx/model.onnx"));
        assert!(info.tokenizer_url.ends_with("/tokenizer.json"));
        assert!(info.config_url.ends_with("/config.json"));
    }

    #[test]
    fn test_model_info_from_mirror() {
        let info = BuiltinModel::DistilBertEmotion.model_info_from("http://mirror.local/emotion/");
        assert_eq!(info.name, BuiltinModel::DistilBertEmotion.name());
        assert_eq!(info.model_url, "http://mirror.local/emotion/onnx/model.onnx");
        assert_eq!(info.tokenizer_url, "http://mirror.local/emotion/tokenizer.json");
        assert_eq!(info.config_url, "http://mirror.local/emotion/config.json");
    }
}
