//! エラー分類
//!
//! ハンドラとゲートウェイが返す失敗の種類。`Display` はそのままユーザー向け
//! メッセージとして出力される。ルーターより外へは伝播しない。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// 認証情報など必須設定の欠落
    #[error("Ошибка конфигурации: {0}")]
    Configuration(String),

    /// 非 2xx ステータスまたは通信失敗
    #[error("{0}")]
    Network(String),

    /// 応答をどの抽出手段でも解釈できなかった
    #[error("Ошибка разбора ответа: {0}")]
    Parse(String),

    /// 式に不正な文字が含まれる、数値でない引数など
    #[error("{0}")]
    Validation(String),

    /// パス不在・権限不足・I/O 失敗
    #[error("{0}")]
    FileSystem(String),
}

impl AssistantError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn file_system(message: impl Into<String>) -> Self {
        Self::FileSystem(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_user_facing_message() {
        let err = AssistantError::validation("Выражение содержит недопустимые символы");
        assert_eq!(err.to_string(), "Выражение содержит недопустимые символы");

        let err = AssistantError::Configuration("API ключ не задан".to_string());
        assert!(err.to_string().starts_with("Ошибка конфигурации"));
    }
}
