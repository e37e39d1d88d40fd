//! AI ゲートウェイ
//!
//! 質問をキャッシュで確認し、なければ OpenAI 互換エンドポイントへ 1 回だけ送信する。
//! 失敗はすべて説明文に変換して返すため、呼び出し側でエラー処理は不要。
//! 設定（キー・モデル等）は保持せず、呼び出しごとに受け取る。

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};

use crate::config::AiConfig;
use crate::error::AssistantError;
use crate::storage::ResponseCache;

use super::extract::{extract_answer, ExtractionPath};
use super::prompts::SYSTEM_PROMPT;
use super::types::{ChatRequest, ConversationTurn};

/// HTTP 応答（ステータスと生ボディ）
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

/// チャット API への送信手段。テストではスクリプト化した実装に差し替える。
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Bearer 認証付きで JSON ボディを POST し、ステータスとボディを返す。
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<HttpReply, AssistantError>;
}

/// reqwest による実装。タイムアウトもリトライも設定しない。
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<HttpReply, AssistantError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistantError::Network(format!("Ошибка соединения: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::Network(format!("Ошибка чтения ответа: {e}")))?;

        Ok(HttpReply { status, body })
    }
}

/// 質問を AI に問い合わせるゲートウェイ
pub struct AiGateway {
    cache: Arc<ResponseCache>,
    transport: Arc<dyn ChatTransport>,
    /// 解釈できなかった生レスポンスの保存先（None なら保存しない）
    dump_dir: Option<PathBuf>,
}

impl AiGateway {
    pub fn new(cache: Arc<ResponseCache>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            cache,
            transport,
            dump_dir: None,
        }
    }

    pub fn with_dump_dir(mut self, dir: PathBuf) -> Self {
        self.dump_dir = Some(dir);
        self
    }

    /// 質問に対する回答テキストを返す。失敗時もエラーメッセージを文字列で返す。
    pub async fn ask(
        &self,
        question: &str,
        context: &[ConversationTurn],
        config: &AiConfig,
    ) -> String {
        match self.try_ask(question, context, config).await {
            Ok(answer) => answer,
            Err(e) => e.to_string(),
        }
    }

    async fn try_ask(
        &self,
        question: &str,
        context: &[ConversationTurn],
        config: &AiConfig,
    ) -> Result<String, AssistantError> {
        let key = question.trim();

        if let Some(cached) = self.cache.get(key) {
            info!(question = %key, "Cache hit, skipping AI request");
            return Ok(cached);
        }

        if !config.has_api_key() {
            error!("OpenRouter API key not set");
            return Err(AssistantError::Configuration(
                "API ключ OpenRouter не настроен. Установите OPENROUTER_API_KEY или используйте setkey <key>"
                    .to_string(),
            ));
        }

        let url = config.completions_url();
        let request = Self::build_request(question, context, config);

        info!(
            model = %config.model,
            url = %url,
            context_turns = context.len(),
            "Sending AI request"
        );
        debug!(question = %question, "AI request question");

        let reply = match self.transport.post(&url, &config.api_key, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "AI request failed");
                return Err(e);
            }
        };

        if !reply.status.is_success() {
            error!(status = %reply.status, body = %reply.body, "AI endpoint returned error status");
            return Err(AssistantError::Network(format!(
                "Ошибка от API: {} {}",
                reply.status, reply.body
            )));
        }

        debug!(body = %reply.body, "AI raw response");

        let (path, answer) = match extract_answer(&reply.body) {
            Ok(extracted) => extracted,
            Err(e) => {
                error!(error = %e, "Failed to parse AI response, passing raw body through");
                self.dump_raw_response(&reply.body);
                (ExtractionPath::RawBody, reply.body.clone())
            }
        };

        if path != ExtractionPath::MessageContent {
            warn!(path = ?path, "AI response did not follow the chat completion schema");
        }

        self.cache.set(key, &answer);
        info!(question = %key, path = ?path, "AI response cached");
        Ok(answer)
    }

    /// システム指示 + 直近の会話 + 新しい質問の順でリクエストを組み立てる。
    pub fn build_request(
        question: &str,
        context: &[ConversationTurn],
        config: &AiConfig,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(ConversationTurn::system(SYSTEM_PROMPT));
        messages.extend(context.iter().cloned());
        messages.push(ConversationTurn::user(question));

        ChatRequest {
            model: config.model.clone(),
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// 解釈できなかった生レスポンスをタイムスタンプ付きファイルに保存する。
    /// 失敗しても呼び出し元には影響させない。
    fn dump_raw_response(&self, body: &str) {
        let Some(dir) = &self.dump_dir else {
            return;
        };
        let name = format!("raw_response_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let result = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, body));
        match result {
            Ok(()) => info!(path = %path.display(), "Raw response written"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write raw response"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::{completion_body, ScriptedTransport};
    use super::*;
    use crate::ai::types::Role;
    use tempfile::TempDir;

    fn config_with_key() -> AiConfig {
        AiConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:9/v1/".to_string(),
            ..AiConfig::default()
        }
    }

    fn gateway(tmp: &TempDir, transport: Arc<ScriptedTransport>) -> (AiGateway, Arc<ResponseCache>) {
        let cache = Arc::new(ResponseCache::open(tmp.path().join("cache.json")));
        let gw = AiGateway::new(Arc::clone(&cache), transport).with_dump_dir(tmp.path().join("dumps"));
        (gw, cache)
    }

    #[tokio::test]
    async fn returns_message_content_and_caches_it() {
        let tmp = TempDir::new().unwrap();
        let transport =
            Arc::new(ScriptedTransport::new().reply(StatusCode::OK, &completion_body("Париж")));
        let (gw, cache) = gateway(&tmp, Arc::clone(&transport));

        let answer = gw.ask("Столица Франции?", &[], &config_with_key()).await;
        assert_eq!(answer, "Париж");
        assert_eq!(cache.get("столица франции?").as_deref(), Some("Париж"));

        let sent = transport.sent.lock().unwrap();
        let (url, key, _) = &sent[0];
        assert_eq!(url, "http://localhost:9/v1/chat/completions");
        assert_eq!(key, "sk-test");
    }

    #[tokio::test]
    async fn cached_answer_matches_first_answer_after_trim() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(
            ScriptedTransport::new().reply(StatusCode::OK, &completion_body("\n  Берлин  \n")),
        );
        let (gw, cache) = gateway(&tmp, Arc::clone(&transport));

        let first = gw.ask("Столица Германии?", &[], &config_with_key()).await;
        let second = gw.ask("столица германии?", &[], &config_with_key()).await;
        assert_eq!(first, "Берлин");
        assert_eq!(second, first);
        assert_eq!(cache.get("Столица Германии?").as_deref(), Some("Берлин"));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_network() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let (gw, cache) = gateway(&tmp, Arc::clone(&transport));
        cache.set("hello", "cached answer");

        let answer = gw.ask("  HELLO ", &[], &config_with_key()).await;
        assert_eq!(answer, "cached answer");
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn cache_hit_works_without_api_key() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let (gw, cache) = gateway(&tmp, Arc::clone(&transport));
        cache.set("q", "a");

        assert_eq!(gw.ask("q", &[], &AiConfig::default()).await, "a");
    }

    #[tokio::test]
    async fn missing_key_fails_fast_without_request() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let (gw, _) = gateway(&tmp, Arc::clone(&transport));

        let answer = gw.ask("q", &[], &AiConfig::default()).await;
        assert!(answer.contains("API ключ"));
        assert!(answer.contains("setkey"));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn error_status_reports_status_and_body_without_caching() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(
            ScriptedTransport::new().reply(StatusCode::UNAUTHORIZED, r#"{"error":"bad key"}"#),
        );
        let (gw, cache) = gateway(&tmp, Arc::clone(&transport));

        let answer = gw.ask("q", &[], &config_with_key()).await;
        assert!(answer.starts_with("Ошибка от API: 401"));
        assert!(answer.contains(r#"{"error":"bad key"}"#));
        assert!(cache.get("q").is_none());
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_once() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new().fail("Ошибка соединения: refused"));
        let (gw, cache) = gateway(&tmp, Arc::clone(&transport));

        let answer = gw.ask("q", &[], &config_with_key()).await;
        assert_eq!(answer, "Ошибка соединения: refused");
        assert_eq!(transport.sent_count(), 1);
        assert!(cache.get("q").is_none());
    }

    #[tokio::test]
    async fn body_without_strings_is_returned_raw_and_cached() {
        let tmp = TempDir::new().unwrap();
        let body = r#"{"choices":[{"index":0,"score":1.5,"done":true}]}"#;
        let transport = Arc::new(ScriptedTransport::new().reply(StatusCode::OK, body));
        let (gw, cache) = gateway(&tmp, transport);

        let answer = gw.ask("strange", &[], &config_with_key()).await;
        assert_eq!(answer, body);
        assert_eq!(cache.get("strange").as_deref(), Some(body));
    }

    #[tokio::test]
    async fn non_json_body_is_dumped_and_passed_through() {
        let tmp = TempDir::new().unwrap();
        let body = "<html>upstream error</html>";
        let transport = Arc::new(ScriptedTransport::new().reply(StatusCode::OK, body));
        let (gw, cache) = gateway(&tmp, transport);

        let answer = gw.ask("html?", &[], &config_with_key()).await;
        assert_eq!(answer, body);
        assert_eq!(cache.get("html?").as_deref(), Some(body));

        let dumps: Vec<_> = std::fs::read_dir(tmp.path().join("dumps"))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(dumps.len(), 1);
        assert_eq!(std::fs::read_to_string(dumps[0].path()).unwrap(), body);
    }

    #[tokio::test]
    async fn unwritable_dump_dir_does_not_fail_the_call() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let cache = Arc::new(ResponseCache::open(tmp.path().join("cache.json")));
        let transport = Arc::new(ScriptedTransport::new().reply(StatusCode::OK, "not json"));
        let gw = AiGateway::new(cache, transport).with_dump_dir(blocker.join("dumps"));

        assert_eq!(gw.ask("q", &[], &config_with_key()).await, "not json");
    }

    #[test]
    fn request_orders_system_context_then_question() {
        let context = vec![
            ConversationTurn::user("предыдущий вопрос"),
            ConversationTurn::assistant("предыдущий ответ"),
        ];
        let config = AiConfig {
            model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 42,
            ..config_with_key()
        };

        let request = AiGateway::build_request("новый вопрос", &context, &config);
        assert_eq!(request.model, "openai/gpt-4o-mini");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 42);

        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[3].content, "новый вопрос");
    }

    #[tokio::test]
    async fn config_is_read_per_call() {
        let tmp = TempDir::new().unwrap();
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(StatusCode::OK, &completion_body("one"))
                .reply(StatusCode::OK, &completion_body("two")),
        );
        let (gw, _) = gateway(&tmp, Arc::clone(&transport));

        let mut config = config_with_key();
        gw.ask("first", &[], &config).await;
        config.model = "other/model".to_string();
        gw.ask("second", &[], &config).await;

        assert_eq!(transport.last_request().unwrap().model, "other/model");
    }
}
