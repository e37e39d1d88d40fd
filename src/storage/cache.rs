//! AI 応答キャッシュ
//!
//! 正規化した質問文 → 回答テキストの対応を JSON ファイルに永続化する。
//! 有効期限・サイズ上限はない。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// 質問文をキーにした永続キャッシュ。
///
/// キーは前後の空白を除去し、大文字小文字を区別しない。
/// 参照・更新・ファイル書き出しはすべて同じ `Mutex` の中で行う。
pub struct ResponseCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl ResponseCache {
    /// キャッシュファイルを読み込んで初期化する。
    ///
    /// ファイルがない、または壊れている場合は空のキャッシュとして扱う。
    pub fn open(path: PathBuf) -> Self {
        let entries = if path.exists() {
            match Self::load(&path) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "Response cache loaded");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable response cache");
                    BTreeMap::new()
                }
            }
        } else {
            debug!(path = %path.display(), "No response cache file yet");
            BTreeMap::new()
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// 質問に対するキャッシュ済みの回答を返す。
    pub fn get(&self, question: &str) -> Option<String> {
        self.lock().get(&normalize_key(question)).cloned()
    }

    /// 回答を登録し、ファイル全体を書き直す。
    ///
    /// 書き込みに失敗してもメモリ上の値は保持し、エラーは警告ログに留める。
    pub fn set(&self, question: &str, answer: &str) {
        let mut entries = self.lock();
        entries.insert(normalize_key(question), answer.to_string());
        if let Err(e) = Self::save(&self.path, &entries) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist response cache");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // 保持しているのは単純なマップなので、パニック後も中身はそのまま使える
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read cache file: {}", path.display()))?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse cache file: {}", path.display()))?;

        // 古いファイルのキーも正規化しておく
        Ok(raw
            .into_iter()
            .map(|(k, v)| (normalize_key(&k), v))
            .collect())
    }

    fn save(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create cache directory: {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string(entries).context("failed to serialize cache")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write cache file: {}", path.display()))?;
        Ok(())
    }
}

/// キャッシュキーの正規化: 前後の空白除去 + 小文字化
pub fn normalize_key(question: &str) -> String {
    question.trim().to_lowercase()
}
