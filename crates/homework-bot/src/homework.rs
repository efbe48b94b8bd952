//! Homework payload validation and status translation
//!
//! Pure functions only: nothing in here talks to the network or logs.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{BotError, BotResult, ShapeError};

/// Review status of a homework, as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    /// Human-readable verdict for this status
    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// Checks that the API answer is an object with a `homeworks` list and
/// returns that list.
pub fn check_response(response: &Value) -> BotResult<&[Value]> {
    let object = response
        .as_object()
        .ok_or_else(|| ShapeError::NotAMapping(json_type(response)))?;
    let homeworks = object.get("homeworks").ok_or(ShapeError::MissingHomeworks)?;
    let list = homeworks
        .as_array()
        .ok_or_else(|| ShapeError::HomeworksNotAList(json_type(homeworks)))?;
    Ok(list.as_slice())
}

/// Builds the notification text for one homework record.
///
/// A field that is absent, `null` or not a string counts as missing.
/// Fields other than `homework_name` and `status` are not looked at.
pub fn parse_status(homework: &Value) -> BotResult<String> {
    let record = homework
        .as_object()
        .ok_or_else(|| ShapeError::InvalidRecord(format!("expected an object, got {}", json_type(homework))))?;

    let name = record
        .get("homework_name")
        .and_then(Value::as_str)
        .ok_or(BotError::MissingHomeworkName)?;
    let raw_status = record
        .get("status")
        .and_then(Value::as_str)
        .ok_or(BotError::MissingStatus)?;
    let status =
        HomeworkStatus::from_str(raw_status).map_err(|_| BotError::UnknownStatus(raw_status.to_string()))?;

    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        name,
        status.verdict()
    ))
}

/// Text sent to the chat when a poll cycle fails.
pub fn failure_message(error: &BotError) -> String {
    format!("Сбой в работе программы: {}", error)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
