//! 設定ファイル管理
//!
//! `~/.config/zai/config.toml` から TOML 形式の設定を読み込み、
//! 環境変数 `OPENROUTER_API_KEY` / `OPENROUTER_MODEL` で上書きする。
//! ファイルが存在しない場合はテンプレートを生成してデフォルト値を使用する。
//!
//! # 設定ファイル例
//!
//! ```toml
//! [ai]
//! model = "openai/gpt-4o-mini"
//! temperature = 0.3
//!
//! [context]
//! max_turns = 6
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// API キーを上書きする環境変数
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// モデル名を上書きする環境変数
pub const MODEL_ENV: &str = "OPENROUTER_MODEL";

/// アプリケーション設定全体
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// AI エンドポイント関連設定
    pub ai: AiConfig,
    /// 会話コンテキスト設定
    pub context: ContextConfig,
}

/// AI エンドポイントの接続設定。
///
/// 実行中は `setkey` / `setmodel` で書き換えられるが、ファイルには保存しない。
/// ゲートウェイは呼び出しごとにこの値を受け取る。
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "z-ai/glm-4.5-air:free".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl AiConfig {
    /// API キーが設定済みかどうか
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// `{base_url}/chat/completions` を組み立てる。末尾スラッシュの有無は問わない。
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// 会話コンテキストの設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// AI に渡す直近のターン数
    pub max_turns: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_turns: 10 }
    }
}

impl AppConfig {
    /// デフォルトパスから設定を読み込む。
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// 指定パスから設定を読み込み、環境変数の上書きを適用する。
    ///
    /// ファイルがなければテンプレートを生成してデフォルト値を返す。
    /// 読み込み・パースに失敗した場合は警告を表示してデフォルト値を使う。
    pub fn load_from(path: &Path) -> Self {
        debug!(path = %path.display(), "Loading config file");

        let mut config = if !path.exists() {
            Self::create_default_config(path);
            Self::default()
        } else {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!(
                            path = %path.display(),
                            model = %config.ai.model,
                            base_url = %config.ai.base_url,
                            max_turns = config.context.max_turns,
                            "Config loaded successfully"
                        );
                        config
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to parse config file");
                        eprintln!("zai: warning: failed to parse config file: {e}");
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read config file");
                    eprintln!("zai: warning: failed to read config file: {e}");
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.context.max_turns = config.context.max_turns.max(1);
        config
    }

    /// 環境変数による上書き。空文字列は無視する。
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            debug!("API key taken from {API_KEY_ENV}");
            self.ai.api_key = key;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(model = %model, "Model taken from {MODEL_ENV}");
            self.ai.model = model;
        }
    }

    /// 設定ファイルのパスを返す。
    ///
    /// `$HOME` が取得できない場合は `./.config/zai/config.toml` にフォールバックする。
    pub fn config_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/zai/config.toml")
    }

    /// キャッシュ・ログ・生レスポンスの保存先ディレクトリを返す。
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "zai").context("failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// 設定ファイルが存在しない場合にテンプレートから生成する。
    /// 生成に失敗しても起動は継続する。
    fn create_default_config(path: &Path) {
        const TEMPLATE: &str = r#"# zai configuration
#
# OPENROUTER_API_KEY / OPENROUTER_MODEL environment variables override this file.

[ai]
# api_key = ""
# model = "z-ai/glm-4.5-air:free"
# base_url = "https://openrouter.ai/api/v1"
# temperature = 0.7
# max_tokens = 1000

[context]
# max_turns = 10
"#;

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create config directory");
                eprintln!("zai: warning: failed to create config directory: {e}");
                return;
            }
        }

        match std::fs::write(path, TEMPLATE) {
            Ok(()) => info!(path = %path.display(), "Created default config file"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to create default config file");
                eprintln!("zai: warning: failed to create config file: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_from_str(content: &str) -> AppConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = AppConfig::default();
        assert_eq!(config.ai.model, "z-ai/glm-4.5-air:free");
        assert_eq!(config.ai.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.ai.temperature, 0.7);
        assert_eq!(config.ai.max_tokens, 1000);
        assert!(!config.ai.has_api_key());
        assert_eq!(config.context.max_turns, 10);
    }

    #[test]
    fn parse_full_config() {
        let config = load_from_str(
            r#"
[ai]
api_key = "sk-test"
model = "openai/gpt-4o-mini"
base_url = "http://localhost:8080/v1/"
temperature = 0.2
max_tokens = 256

[context]
max_turns = 4
"#,
        );
        assert!(config.ai.has_api_key());
        assert_eq!(config.ai.model, "openai/gpt-4o-mini");
        assert_eq!(config.ai.temperature, 0.2);
        assert_eq!(config.ai.max_tokens, 256);
        assert_eq!(config.context.max_turns, 4);
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let config = load_from_str("[context]\nmax_turns = 3\n");
        // ai セクションが省略されていてもデフォルト値が使われる
        assert_eq!(config.ai.model, "z-ai/glm-4.5-air:free");
        assert_eq!(config.context.max_turns, 3);
    }

    #[test]
    fn completions_url_ignores_trailing_slash() {
        let mut ai = AiConfig::default();
        assert_eq!(
            ai.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        ai.base_url = "http://localhost:8080/v1/".to_string();
        assert_eq!(ai.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn env_overrides_non_empty_values_only() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            API_KEY_ENV => Some("sk-env".to_string()),
            MODEL_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.ai.api_key, "sk-env");
        assert_eq!(config.ai.model, "z-ai/glm-4.5-air:free");
    }

    #[test]
    fn load_from_invalid_file_falls_back_to_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[ai\nmodel = ").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.context.max_turns, 10);
    }

    #[test]
    fn load_from_clamps_zero_max_turns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[context]\nmax_turns = 0\n").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.context.max_turns, 1);
    }

    #[test]
    fn create_default_config_creates_file_and_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sub/dir/config.toml");

        assert!(!path.exists());
        AppConfig::create_default_config(&path);
        assert!(path.exists());

        // テンプレートが有効な TOML としてパースできること
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[ai]"));
        assert!(content.contains("[context]"));
        let config: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.ai.max_tokens, 1000);
    }
}
