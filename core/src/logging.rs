use log::Level;
use serde_json::{json, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Emit a structured diagnostic record through the `log` facade.
///
/// `module` doubles as the log target so subscribers can filter per stage
/// (`rag.retrieval`, `rag.generation`, ...).
pub fn log_event(
    level: Level,
    code: Option<&str>,
    module: &str,
    message: &str,
    explain: Option<&str>,
    data: Option<Value>,
) {
    if !log::log_enabled!(target: module, level) {
        return;
    }
    let record = build_record(level, code, module, message, explain, data);
    log::log!(target: module, level, "{record}");
}

fn build_record(
    level: Level,
    code: Option<&str>,
    module: &str,
    message: &str,
    explain: Option<&str>,
    data: Option<Value>,
) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "ts": OffsetDateTime::now_utc().unix_timestamp(),
        "level": level.as_str().to_lowercase(),
        "code": code,
        "module": module,
        "message": message,
        "explain": explain,
        "data": data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_contains_all_fields() {
        let record = build_record(
            Level::Warn,
            Some("TOOL-2001"),
            "rag.retrieval",
            "search failed",
            Some("falling back"),
            Some(json!({ "query": "q" })),
        );
        assert_eq!(record["level"], "warn");
        assert_eq!(record["code"], "TOOL-2001");
        assert_eq!(record["module"], "rag.retrieval");
        assert_eq!(record["data"]["query"], "q");
        assert!(record["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[test]
    fn optional_fields_serialise_as_null() {
        let record = build_record(Level::Info, None, "rag", "ok", None, None);
        assert!(record["code"].is_null());
        assert!(record["explain"].is_null());
        assert!(record["data"].is_null());
    }
}
