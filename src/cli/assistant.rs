use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::color::{gray, white, yellow};
use crate::engine::{InputSlot, RouterState};

/// アシスタントが発話するときに使う共通関数。
/// 先頭に 🤖 を付け、複数行の場合は 2 行目以降を字下げする。
pub fn assistant_talk(message: &str) {
    let mut lines = message.lines();
    if let Some(first) = lines.next() {
        println!("🤖 {}", white(first));
    }
    for line in lines {
        println!("   {}", white(line));
    }
}

/// AI が提案したコマンドを表示する。入力欄にも同じ内容が入る。
pub fn assistant_notice(command: &str) {
    println!("\n👉 {}\n", yellow(command));
}

/// AI への問い合わせ中に表示するスピナーを生成・開始する。
pub fn assistant_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("🤖 {spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("думаю...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// ルーターの状態スナップショットを端末に描画する。
pub fn render_state(state: &RouterState) {
    match &state.input {
        InputSlot::Proposed(command) => {
            if let Some(intro) = state.output.lines().next() {
                assistant_talk(intro);
            }
            assistant_notice(command);
        }
        _ if state.output.is_empty() => {
            // очистить: 端末もクリアする
            print!("\x1B[2J\x1B[1;1H");
        }
        _ => assistant_talk(&state.output),
    }

    if let Some(path) = &state.pending_confirmation {
        println!("{}", gray(&format!("   (ожидает подтверждения: {})", path.display())));
    }
    println!();
}
