//! Shell モジュール: REPL ループ
//!
//! 入力を `CommandRouter` に渡し、返ってきた状態スナップショットを描画する。
//! AI がコマンドを提案した場合は次の入力行にそれを入れておく。

mod editor;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reedline::{EditCommand, Reedline, Signal};
use tracing::{debug, info, warn};

use crate::cli::assistant::{assistant_spinner, render_state};
use crate::cli::banner::{print_goodbye, print_welcome};
use crate::cli::prompt::AssistantPrompt;
use crate::engine::{CommandRouter, InputSlot};

pub struct Shell {
    editor: Reedline,
    prompt: AssistantPrompt,
    router: CommandRouter,
    /// 削除の確認待ちかどうか（プロンプト表示と共有）
    awaiting_confirmation: Arc<AtomicBool>,
}

impl Shell {
    pub fn new(router: CommandRouter, history_path: PathBuf) -> Self {
        let awaiting_confirmation = Arc::new(AtomicBool::new(false));
        Self {
            editor: editor::build_editor(history_path),
            prompt: AssistantPrompt::new(Arc::clone(&awaiting_confirmation)),
            router,
            awaiting_confirmation,
        }
    }

    /// REPL ループを実行する。Ctrl-D で終了する。
    ///
    /// 戻り値: 終了コード（REPL 内部エラー時のみ `1`）
    pub async fn run(&mut self) -> u8 {
        print_welcome();

        let mut exit_code: u8 = 0;

        loop {
            match self.editor.read_line(&self.prompt) {
                Ok(Signal::Success(line)) => self.handle_input(&line).await,
                Ok(Signal::CtrlC) => {
                    // 入力中の行を捨てるだけ
                    println!();
                }
                Ok(Signal::CtrlD) => {
                    info!("Ctrl-D received, exiting");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "REPL error, exiting");
                    eprintln!("zai: error: {e}");
                    exit_code = 1;
                    break;
                }
            }
        }

        print_goodbye();
        exit_code
    }

    async fn handle_input(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        debug!(input = %line, "User input received");

        let spinner = self.router.will_query_ai(line).then(assistant_spinner);
        let state = self.router.execute(line).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        render_state(&state);
        debug!(
            history_entries = state.history.len(),
            conversation_turns = state.conversation.len(),
            "Router state rendered"
        );
        self.awaiting_confirmation
            .store(self.router.is_awaiting_confirmation(), Ordering::Relaxed);

        if let InputSlot::Proposed(command) = state.input {
            self.editor.run_edit_commands(&[
                EditCommand::Clear,
                EditCommand::InsertString(command),
            ]);
        }
    }
}
