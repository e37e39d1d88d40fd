use chrono::{Local, Timelike};

use super::assistant::assistant_talk;
use super::color::{bold_cyan, cyan, gray, white, yellow};

/// 起動時に表示するコマンド一覧（書式, 説明）
pub const COMMANDS: &[(&str, &str)] = &[
    ("открыть сайт <url>", "открыть сайт в браузере"),
    ("посчитать <выражение> | = <выражение>", "калькулятор"),
    ("создать файл <путь> <текст>", "создать файл"),
    ("читать <путь>", "показать содержимое файла"),
    ("dir [путь]", "содержимое папки"),
    ("удалить <путь>", "удалить файл или папку (с подтверждением)"),
    ("спроси <вопрос> | ? <вопрос>", "вопрос к ИИ"),
    ("setkey <ключ>", "API ключ OpenRouter на этот сеанс"),
    ("setmodel <модель>", "модель ИИ на этот сеанс"),
    ("setcontext <N>", "сколько сообщений диалога отправлять ИИ"),
    ("showconfig", "текущие настройки"),
    ("привет | время", "приветствие и текущее время"),
    ("очистить | забыть", "очистить экран / сбросить диалог с ИИ"),
];

/// 時間帯に応じた挨拶を返す。
fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Доброе утро",
        12..=17 => "Добрый день",
        18..=22 => "Добрый вечер",
        _ => "Доброй ночи",
    }
}

/// 起動時の Welcome バナーとコマンド一覧を表示する。
pub fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    let separator = "==================================================";

    println!();
    println!("{}", cyan(separator));
    println!(
        "     {}  ::  {} {}",
        bold_cyan("ZAI"),
        white("ИИ-ассистент для рабочего стола"),
        yellow(&format!("v{version}"))
    );
    println!("{}", cyan(separator));
    println!();
    for (usage, description) in COMMANDS {
        println!("  {:<40} {}", yellow(usage), gray(description));
    }
    println!();
    assistant_talk(&format!(
        "{}! Чем могу помочь?",
        greeting_for_hour(Local::now().hour())
    ));
    println!();
}

/// 終了時の Farewell メッセージを表示する。
pub fn print_goodbye() {
    println!();
    assistant_talk("До встречи!");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_follows_time_of_day() {
        assert_eq!(greeting_for_hour(5), "Доброе утро");
        assert_eq!(greeting_for_hour(11), "Доброе утро");
        assert_eq!(greeting_for_hour(12), "Добрый день");
        assert_eq!(greeting_for_hour(18), "Добрый вечер");
        assert_eq!(greeting_for_hour(23), "Доброй ночи");
        assert_eq!(greeting_for_hour(0), "Доброй ночи");
    }

    #[test]
    fn command_list_mentions_every_command_family() {
        let usages: String = COMMANDS.iter().map(|(u, _)| *u).collect::<Vec<_>>().join(" ");
        for word in ["открыть сайт", "посчитать", "удалить", "спроси", "setcontext", "забыть"] {
            assert!(usages.contains(word), "{word}");
        }
    }
}
