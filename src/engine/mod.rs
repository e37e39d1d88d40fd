//! コマンドルーター
//!
//! 入力 1 件ごとに次の順で処理し、結果を `RouterState` のスナップショットとして返す。
//!
//! 1. 削除確認待ちなら、入力を回答として消費して終了
//! 2. 接頭辞表で意図を分類
//! 3. 意図のハンドラを実行（失敗はメッセージに変換）
//! 4. 表示履歴に追加（確認待ちに入った削除だけは追加しない）
//! 5. 入力欄を空にする（確認待ち・AI のコマンド提案時を除く）

pub mod calc;
pub mod classifier;
pub mod confirm;
pub mod handlers;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::ai::prompts::COMMAND_MARKER;
use crate::ai::{AiGateway, ConversationContext, ConversationTurn};
use crate::config::{AiConfig, AppConfig};
use crate::error::AssistantError;
use classifier::{classify, Intent};
use confirm::{ConfirmationStateMachine, Resolution};
use handlers::site::SiteOpener;
use handlers::{files, settings, site};

/// 表示履歴の 1 行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub input: String,
    pub output: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] > {} -> {}",
            self.timestamp.format("%H:%M:%S"),
            self.input,
            self.output
        )
    }
}

/// 処理後の入力欄の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSlot {
    /// 空にする
    Cleared,
    /// 入力したテキストを残す（削除の確認待ち）
    Retained(String),
    /// AI が提案したコマンドを入れる。自動実行はしない。
    Proposed(String),
}

/// `execute` ごとに返す状態のスナップショット。表示層はこれを描画する。
///
/// 履歴と会話はルーターと共有しており、取得はコピーなしの O(1)。
/// 後続の `execute` で変わっても、取得済みのスナップショットは変わらない。
#[derive(Debug, Clone)]
pub struct RouterState {
    pub output: String,
    pub input: InputSlot,
    pub pending_confirmation: Option<PathBuf>,
    pub history: Arc<Vec<HistoryEntry>>,
    pub conversation: Arc<Vec<ConversationTurn>>,
}

/// ハンドラの結果と、履歴・入力欄の扱い
struct Outcome {
    output: String,
    deferral: Deferral,
}

enum Deferral {
    None,
    AwaitConfirmation,
    Proposed(String),
}

impl Outcome {
    fn done(output: String) -> Self {
        Self {
            output,
            deferral: Deferral::None,
        }
    }

    fn from_result(result: Result<String, AssistantError>) -> Self {
        Self::done(result.unwrap_or_else(|e| e.to_string()))
    }
}

pub struct CommandRouter {
    ai_config: AiConfig,
    max_turns: usize,
    gateway: AiGateway,
    opener: Box<dyn SiteOpener>,
    confirmation: ConfirmationStateMachine,
    conversation: ConversationContext,
    history: Arc<Vec<HistoryEntry>>,
    output: String,
}

impl CommandRouter {
    pub fn new(config: &AppConfig, gateway: AiGateway, opener: Box<dyn SiteOpener>) -> Self {
        Self {
            ai_config: config.ai.clone(),
            max_turns: config.context.max_turns.max(1),
            gateway,
            opener,
            confirmation: ConfirmationStateMachine::new(),
            conversation: ConversationContext::new(),
            history: Arc::default(),
            output: String::new(),
        }
    }

    /// この入力が AI への問い合わせになるかどうか（スピナー表示用）
    pub fn will_query_ai(&self, raw: &str) -> bool {
        !self.confirmation.is_pending() && matches!(classify(raw), Intent::AskAi { .. })
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.confirmation.is_pending()
    }

    /// 入力 1 件を処理する。空白だけの入力は無視する。
    pub async fn execute(&mut self, raw: &str) -> RouterState {
        let text = raw.trim();
        if text.is_empty() {
            return self.snapshot(InputSlot::Cleared);
        }

        info!(input = %text, "Executing command");

        if self.confirmation.is_pending() {
            let output = self.resolve_confirmation(text).await;
            return self.finish(text, Outcome::done(output));
        }

        let intent = classify(text);
        debug!(intent = ?intent, "Dispatching intent");
        let outcome = self.dispatch(intent).await;
        self.finish(text, outcome)
    }

    async fn dispatch(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::AskAi { question } => self.ask_ai(&question).await,
            Intent::OpenSite { url } => {
                Outcome::from_result(site::open_site(self.opener.as_ref(), &url))
            }
            Intent::Calculate { expr } => Outcome::from_result(calc::calculate(&expr)),
            Intent::SetApiKey { key } => {
                Outcome::from_result(settings::set_api_key(&mut self.ai_config, &key))
            }
            Intent::SetModel { model } => {
                Outcome::from_result(settings::set_model(&mut self.ai_config, &model))
            }
            Intent::ShowConfig => {
                Outcome::done(settings::show_config(&self.ai_config, self.max_turns))
            }
            Intent::CreateFile { path, content } => {
                Outcome::from_result(files::create_file(&path, &content).await)
            }
            Intent::SetContextLength { value } => {
                Outcome::from_result(settings::set_context_length(&mut self.max_turns, &value))
            }
            Intent::Delete { path } => self.arm_deletion(&path).await,
            Intent::ListDirectory { path } => {
                Outcome::from_result(files::list_directory(path.as_deref()).await)
            }
            Intent::ReadFile { path } => Outcome::from_result(files::read_file(&path).await),
            Intent::Greeting => Outcome::done(handlers::greeting()),
            Intent::Time => Outcome::done(handlers::current_time()),
            Intent::ClearOutput => {
                self.history = Arc::default();
                self.conversation.clear();
                info!("Output, history and conversation cleared");
                Outcome::done(String::new())
            }
            Intent::ForgetContext => {
                info!(was_empty = self.conversation.is_empty(), "Conversation cleared");
                self.conversation.clear();
                Outcome::done("Диалог с ИИ сброшен.".to_string())
            }
            Intent::Unknown => Outcome::done(handlers::unknown_command()),
        }
    }

    async fn ask_ai(&mut self, question: &str) -> Outcome {
        if question.is_empty() {
            return Outcome::done(
                "Задайте вопрос после команды, например: спроси какая погода?".to_string(),
            );
        }

        let context = self.conversation.window(self.max_turns).to_vec();
        debug!(
            stored_turns = self.conversation.len(),
            sent_turns = context.len(),
            "Conversation window selected"
        );
        let answer = self.gateway.ask(question, &context, &self.ai_config).await;

        self.conversation.append(ConversationTurn::user(question));
        self.conversation.append(ConversationTurn::assistant(answer.clone()));

        match proposed_command(&answer) {
            Some(command) => {
                info!(command = %command, "AI proposed a command");
                Outcome {
                    output: format!(
                        "ИИ предлагает команду. Нажмите Enter, чтобы выполнить:\n\n{command}"
                    ),
                    deferral: Deferral::Proposed(command.to_string()),
                }
            }
            None => Outcome::done(answer),
        }
    }

    async fn arm_deletion(&mut self, path: &str) -> Outcome {
        match files::resolve_delete_target(path).await {
            Ok(target) => {
                let output = format!(
                    "Вы уверены, что хотите удалить '{}'? Введите 'да' для подтверждения.",
                    target.display()
                );
                self.confirmation.arm(target);
                Outcome {
                    output,
                    deferral: Deferral::AwaitConfirmation,
                }
            }
            Err(e) => Outcome::done(e.to_string()),
        }
    }

    async fn resolve_confirmation(&mut self, answer: &str) -> String {
        match self.confirmation.resolve(answer) {
            Some(Resolution::Confirmed(path)) => files::delete_path(&path)
                .await
                .unwrap_or_else(|e| e.to_string()),
            Some(Resolution::Cancelled(path)) => {
                info!(path = %path.display(), "Deletion cancelled");
                "Удаление отменено.".to_string()
            }
            None => "Удаление отменено.".to_string(),
        }
    }

    fn finish(&mut self, text: &str, outcome: Outcome) -> RouterState {
        self.output = outcome.output;
        let input = match outcome.deferral {
            Deferral::None => {
                self.record(text);
                InputSlot::Cleared
            }
            Deferral::AwaitConfirmation => InputSlot::Retained(text.to_string()),
            Deferral::Proposed(command) => {
                self.record(text);
                InputSlot::Proposed(command)
            }
        };
        self.snapshot(input)
    }

    fn record(&mut self, text: &str) {
        Arc::make_mut(&mut self.history).push(HistoryEntry {
            timestamp: Local::now(),
            input: text.to_string(),
            output: self.output.clone(),
        });
    }

    fn snapshot(&self, input: InputSlot) -> RouterState {
        RouterState {
            output: self.output.clone(),
            input,
            pending_confirmation: self.confirmation.pending().map(PathBuf::from),
            history: Arc::clone(&self.history),
            conversation: self.conversation.shared(),
        }
    }
}

/// `COMMAND: <команда>` 形式の回答からコマンド部分を取り出す。
pub fn proposed_command(answer: &str) -> Option<&str> {
    answer
        .strip_prefix(COMMAND_MARKER)
        .map(str::trim)
        .filter(|command| !command.is_empty())
}
