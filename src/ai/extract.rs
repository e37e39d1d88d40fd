//! 応答テキストの抽出
//!
//! エンドポイントが OpenAI 互換の形を返すとは限らないため、次の順で回答を探す。
//!
//! 1. `choices[0].message.content`
//! 2. `choices[0].text`
//! 3. JSON 全体を深さ優先で走査し、文書順で最初に見つかった文字列
//! 4. 何も見つからなければボディをそのまま返す
//!
//! 空文字列は「見つからなかった」として扱い、次の手段へ進む。

use serde_json::Value;

use crate::error::AssistantError;

/// 回答をどの手段で取り出したか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    MessageContent,
    ChoiceText,
    FirstString,
    RawBody,
}

/// レスポンスボディから回答テキストを取り出す。
///
/// ボディが JSON として解釈できない場合のみ `Err` を返す。
/// 抽出できた文字列は前後の空白を除去し、`RawBody` の場合は一切加工しない。
pub fn extract_answer(body: &str) -> Result<(ExtractionPath, String), AssistantError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| AssistantError::Parse(e.to_string()))?;

    let first_choice = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first());

    if let Some(choice) = first_choice {
        if let Some(text) = non_empty_str(choice.pointer("/message/content")) {
            return Ok((ExtractionPath::MessageContent, text.trim().to_string()));
        }
        if let Some(text) = non_empty_str(choice.get("text")) {
            return Ok((ExtractionPath::ChoiceText, text.trim().to_string()));
        }
    }

    if let Some(text) = first_string(&root) {
        return Ok((ExtractionPath::FirstString, text.trim().to_string()));
    }

    Ok((ExtractionPath::RawBody, body.to_string()))
}

/// 値ツリーを深さ優先で走査し、最初の空でない文字列を返す。
///
/// オブジェクトはキーの出現順（`preserve_order`）、配列は添字順に辿る。
pub fn first_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        Value::Object(map) => map.values().find_map(first_string),
        Value::Array(items) => items.iter().find_map(first_string),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_message_content_wins() {
        let body = r#"{"choices":[{"message":{"content":"  Привет!  "},"text":"other"}]}"#;
        let (path, text) = extract_answer(body).unwrap();
        assert_eq!(path, ExtractionPath::MessageContent);
        assert_eq!(text, "Привет!");
    }

    #[test]
    fn command_answer_is_returned_literally() {
        let body = r#"{"choices":[{"message":{"content":"COMMAND: открыть сайт youtube.com"}}]}"#;
        let (_, text) = extract_answer(body).unwrap();
        assert_eq!(text, "COMMAND: открыть сайт youtube.com");
    }

    #[test]
    fn falls_back_to_choice_text() {
        let body = r#"{"choices":[{"text":"completion style"}]}"#;
        assert_eq!(
            extract_answer(body).unwrap(),
            (ExtractionPath::ChoiceText, "completion style".to_string())
        );
    }

    #[test]
    fn empty_content_falls_through_to_text() {
        let body = r#"{"choices":[{"message":{"content":""},"text":"fallback"}]}"#;
        let (path, text) = extract_answer(body).unwrap();
        assert_eq!(path, ExtractionPath::ChoiceText);
        assert_eq!(text, "fallback");
    }

    #[test]
    fn falls_back_to_first_string_in_document_order() {
        let body = r#"{"id":7,"output":{"z_last":"first by position","a_first":"second"}}"#;
        let (path, text) = extract_answer(body).unwrap();
        assert_eq!(path, ExtractionPath::FirstString);
        assert_eq!(text, "first by position");
    }

    #[test]
    fn first_string_recurses_into_arrays() {
        let value = json!({"a": [null, 1, [true, {"b": "deep"}]], "c": "later"});
        assert_eq!(first_string(&value), Some("deep"));
    }

    #[test]
    fn first_string_skips_empty_strings() {
        let value = json!(["", {"k": ""}, "found"]);
        assert_eq!(first_string(&value), Some("found"));
    }

    #[test]
    fn no_strings_returns_raw_body_unmodified() {
        let body = "{\"choices\": [], \"n\": [1, 2, null]}\n";
        let (path, text) = extract_answer(body).unwrap();
        assert_eq!(path, ExtractionPath::RawBody);
        assert_eq!(text, body);
    }

    #[test]
    fn non_json_is_parse_error() {
        let err = extract_answer("<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, AssistantError::Parse(_)));
    }
}
