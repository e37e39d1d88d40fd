//! 意図ごとのハンドラ
//!
//! 各ハンドラは `Result<String, AssistantError>` を返し、ルーターが
//! `Err` を表示用メッセージに変換する。

pub mod files;
pub mod settings;
pub mod site;

use chrono::Local;

pub fn greeting() -> String {
    "Привет! Чем могу помочь?".to_string()
}

pub fn current_time() -> String {
    format!("Текущее время: {}", Local::now().format("%H:%M:%S"))
}

pub fn unknown_command() -> String {
    "Извините, я не знаю такой команды. Список команд показан при запуске.".to_string()
}
