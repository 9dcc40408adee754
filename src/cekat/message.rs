//! WhatsApp message bodies for the Cekat chat node
//!
//! A plain message carries text and an optional file URL. Interactive
//! messages add a header, a footer and one of three action shapes:
//!
//! | media type | action |
//! |---|---|
//! | `cta_url` | `{name: "cta_url", parameters: {display_text, url}}` |
//! | `button` | `{buttons: [{type: "reply", reply: {id, title}}]}` |
//! | `list` | `{button, sections: [{title, rows: [{id, title, description}]}]}` |
//!
//! Buttons and list sections come either from the manual UI collections
//! or as JSON from a previous node (`dynamic` input method).

use super::client::{CekatClient, UrlVariant};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::{value_to_string, JsonObject, JsonValue};
use serde_json::json;
use tracing::warn;

/// Build the `/messages/whatsapp` body for one item
pub fn build_message_body(params: &dyn ParameterSource, item: usize) -> Result<JsonValue> {
    let mut body = JsonObject::new();
    body.insert(
        "conversation_id".into(),
        json!(params.required_str("conversationId", item)?),
    );
    body.insert(
        "receiver".into(),
        json!(params.required_str("receiverPhoneNumber", item)?),
    );
    body.insert("message".into(), json!(params.str_or("text", item, "")));

    if !params.bool_or("isInteractive", item, false) {
        body.insert("file_url".into(), json!(params.str_or("fileUrl", item, "")));
        return Ok(JsonValue::Object(body));
    }

    let media_type = params.required_str("mediaType", item)?;
    let header_param = if media_type == "list" {
        "headerWithoutFileUrl"
    } else {
        "headerWithFileUrl"
    };
    let header = params.object_or_empty(header_param, item);
    let footer = params.object_or_empty("footer", item);

    let mut header_out = JsonObject::new();
    copy_field(&header, "header_text", &mut header_out, "text");
    if media_type != "list" {
        copy_field(&header, "header_file_url", &mut header_out, "file_url");
    }

    let action = match media_type.as_str() {
        "cta_url" => {
            let cta = params.object_or_empty("ctaButton", item);
            let mut parameters = JsonObject::new();
            copy_field(&cta, "display_text", &mut parameters, "display_text");
            copy_field(&cta, "url", &mut parameters, "url");
            json!({ "name": "cta_url", "parameters": parameters })
        }
        "button" => json!({ "buttons": reply_buttons(params, item)? }),
        "list" => {
            let (button, sections) = list_sections(params, item)?;
            json!({ "button": button, "sections": sections })
        }
        other => {
            return Err(Error::invalid_param(
                "mediaType",
                format!("unsupported interactive media type '{other}'"),
            ))
        }
    };

    body.insert("media_type".into(), json!(media_type));
    body.insert("header".into(), JsonValue::Object(header_out));
    if let Some(text) = footer.get("footer_text") {
        body.insert("footer".into(), text.clone());
    }
    body.insert("action".into(), action);
    Ok(JsonValue::Object(body))
}

fn copy_field(from: &JsonObject, key: &str, to: &mut JsonObject, as_key: &str) {
    if let Some(value) = from.get(key) {
        to.insert(as_key.to_string(), value.clone());
    }
}

fn reply_buttons(params: &dyn ParameterSource, item: usize) -> Result<Vec<JsonValue>> {
    let buttons = if params.str_or("buttonInputMethod", item, "manual") == "dynamic" {
        json_array(params, "dynamicButtons", item)?
    } else {
        params.array_or_empty("buttons.button", item)
    };

    Ok(buttons
        .iter()
        .map(|b| {
            json!({
                "type": "reply",
                "reply": {
                    "id": b.get("id").cloned().unwrap_or(JsonValue::Null),
                    "title": b.get("title").cloned().unwrap_or(JsonValue::Null),
                },
            })
        })
        .collect())
}

fn list_sections(params: &dyn ParameterSource, item: usize) -> Result<(String, Vec<JsonValue>)> {
    if params.str_or("listInputMethod", item, "manual") == "dynamic" {
        let button = params.str_or("dynamicButtonText", item, "");
        return Ok((button, json_array(params, "dynamicSections", item)?));
    }

    let button = params.str_or("buttonText", item, "");
    let sections = params
        .array_or_empty("sections.section", item)
        .iter()
        .map(|section| {
            let rows: Vec<JsonValue> = section
                .pointer("/rows/row")
                .and_then(JsonValue::as_array)
                .map(|rows| {
                    rows.iter()
                        .map(|r| {
                            json!({
                                "id": r.get("id").cloned().unwrap_or(JsonValue::Null),
                                "title": r.get("title").cloned().unwrap_or(JsonValue::Null),
                                "description": r.get("description").cloned().unwrap_or(JsonValue::Null),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "title": section.get("title").cloned().unwrap_or(JsonValue::Null),
                "rows": rows,
            })
        })
        .collect();
    Ok((button, sections))
}

fn json_array(params: &dyn ParameterSource, name: &str, item: usize) -> Result<Vec<JsonValue>> {
    match params.json_value(name, item)? {
        Some(JsonValue::Array(values)) => Ok(values),
        Some(_) => Err(Error::invalid_param(name, "expected a JSON array")),
        None => Ok(Vec::new()),
    }
}

/// Resolve the WhatsApp template id for a Cekat template, then send it
pub(crate) async fn send_template_message(
    client: &CekatClient,
    params: &dyn ParameterSource,
    item: usize,
) -> Result<JsonValue> {
    let inbox_id = params.required_str("inboxId", item)?;
    let template_id = params.required_str("templateId", item)?;

    let templates = client
        .call(
            UrlVariant::Api,
            ApiRequest::get("/templates").query("inbox_id", inbox_id.as_str()),
        )
        .await?;
    let wa_template_id = find_wa_template_id(&templates, &template_id).ok_or_else(|| {
        warn!(template_id = %template_id, inbox_id = %inbox_id, "Template lookup missed");
        Error::not_found("Template", template_id.as_str(), format!("inbox {inbox_id}"))
    })?;

    let body = json!({
        "inbox_id": inbox_id,
        "wa_template_id": wa_template_id,
        "template_body_variables": body_variables(&params.array_or_empty("bodyVariables.variable", item)),
        "phone_number": params.required_str("receiverPhoneNumber", item)?,
        "phone_name": params.str_or("receiverName", item, ""),
    });
    client
        .call(UrlVariant::Api, ApiRequest::post("/templates/send").json(body))
        .await
}

/// `wa_template_id` of the template whose `id` matches
pub(crate) fn find_wa_template_id(templates: &JsonValue, template_id: &str) -> Option<JsonValue> {
    templates
        .get("data")
        .and_then(JsonValue::as_array)?
        .iter()
        .find(|t| t.get("id").map(value_to_string).as_deref() == Some(template_id))
        .map(|t| t.get("wa_template_id").cloned().unwrap_or(JsonValue::Null))
}

fn body_variables(variables: &[JsonValue]) -> Vec<JsonValue> {
    variables
        .iter()
        .map(|v| v.get("value").cloned().unwrap_or(JsonValue::Null))
        .collect()
}
