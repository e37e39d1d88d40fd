//! 会話コンテキスト
//!
//! 過去の質問・回答を追加順に保持する。保持量に上限はなく、
//! AI に渡すときだけ末尾 N 件を切り出す。
//!
//! ログは `Arc` で共有し、スナップショットはクローンせずに参照を渡す。
//! 共有中に追加された場合だけ書き込み側がコピーする。

use std::sync::Arc;

use super::types::ConversationTurn;

#[derive(Debug, Default, Clone)]
pub struct ConversationContext {
    turns: Arc<Vec<ConversationTurn>>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        Arc::make_mut(&mut self.turns).push(turn);
    }

    /// 全ターンを破棄する（`забыть` / `очистить`）。
    pub fn clear(&mut self) {
        self.turns = Arc::default();
    }

    /// 末尾 `max_turns` 件を元の順序のまま返す。履歴自体は変更しない。
    pub fn window(&self, max_turns: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(max_turns);
        &self.turns[start..]
    }

    /// 現在のログを共有参照で返す。
    pub fn shared(&self) -> Arc<Vec<ConversationTurn>> {
        Arc::clone(&self.turns)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
