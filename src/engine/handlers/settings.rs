//! 実行時設定ハンドラ（setkey / setmodel / showconfig / setcontext）
//!
//! 変更はこのプロセス内だけで有効で、設定ファイルには書き戻さない。

use tracing::info;

use crate::config::AiConfig;
use crate::error::AssistantError;

pub fn set_api_key(config: &mut AiConfig, key: &str) -> Result<String, AssistantError> {
    if key.is_empty() {
        return Err(AssistantError::validation(
            "Укажите ключ после команды: setkey sk-...",
        ));
    }
    config.api_key = key.to_string();
    info!("API key replaced for this session");
    Ok("API ключ установлен (в этом сеансе).".to_string())
}

pub fn set_model(config: &mut AiConfig, model: &str) -> Result<String, AssistantError> {
    if model.is_empty() {
        return Err(AssistantError::validation(
            "Укажите название модели после команды: setmodel openai/gpt-4o-mini",
        ));
    }
    config.model = model.to_string();
    info!(model = %model, "Model replaced for this session");
    Ok(format!("Модель установлена: {model} (в этом сеансе)."))
}

/// 現在の設定を表示する。API キーの値そのものは出さない。
pub fn show_config(config: &AiConfig, max_turns: usize) -> String {
    let key_state = if config.has_api_key() {
        "(установлен)"
    } else {
        "(не установлен)"
    };
    format!(
        "Модель: {}\nAPI ключ: {key_state}\nБаза: {}\nТемпература: {}\nМакс. токенов: {}\nДлина контекста: {max_turns}",
        config.model, config.base_url, config.temperature, config.max_tokens
    )
}

/// 会話コンテキストの長さを変更する。0 以下は 1 に切り上げる。
pub fn set_context_length(max_turns: &mut usize, value: &str) -> Result<String, AssistantError> {
    let parsed: i64 = value.trim().parse().map_err(|_| {
        AssistantError::validation("Укажите корректное числовое значение, например: setcontext 10")
    })?;

    *max_turns = usize::try_from(parsed).unwrap_or(0).max(1);
    info!(max_turns = *max_turns, "Context length changed");
    Ok(format!(
        "Длина контекста установлена в {} сообщений.",
        *max_turns
    ))
}
