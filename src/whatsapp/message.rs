//! WhatsApp message builders

use crate::error::Result;
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Strip `+`, `-`, `(` and `)` from a phone number; spaces are kept
pub fn sanitize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, '+' | '-' | '(' | ')'))
        .collect()
}

/// One answer offered in an approval message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub style: String,
}

impl ApprovalOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>, style: &str) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            style: style.to_string(),
        }
    }
}

/// What an approval message shows and where answers go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendAndWaitConfig {
    #[serde(default)]
    pub title: String,
    pub message: String,
    /// Resume URL each option links to
    pub url: String,
    pub options: Vec<ApprovalOption>,
}

impl SendAndWaitConfig {
    /// Read the approval settings of one item
    ///
    /// `approvalOptions.values.approvalType` is `single` (approve only,
    /// the default) or `double` (approve and decline).
    pub fn from_params(params: &dyn ParameterSource, item: usize, url: String) -> Result<Self> {
        let approval = params.object_or_empty("approvalOptions.values", item);
        let text = |key: &str, default: &str| {
            approval
                .get(key)
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let mut options = vec![ApprovalOption::new(
            text("approveLabel", "Approve"),
            "true",
            "primary",
        )];
        if text("approvalType", "single") == "double" {
            options.push(ApprovalOption::new(
                text("disapproveLabel", "Decline"),
                "false",
                "secondary",
            ));
        }

        Ok(Self {
            title: params.str_or("subject", item, ""),
            message: params.required_str("message", item)?,
            url,
            options,
        })
    }

    /// Message text listing every option with its answer link
    pub fn body_text(&self) -> String {
        let mut text = format!("{}\n\n", self.message);
        for option in &self.options {
            text.push_str(&format!(
                "*{}:*\n_{}?approved={}_\n\n",
                option.label, self.url, option.value
            ));
        }
        text
    }
}

/// Text message body
pub fn text_body(recipient: &str, text: &str, preview_url: bool) -> JsonValue {
    let mut body = json!({
        "messaging_product": "whatsapp",
        "to": sanitize_phone_number(recipient),
        "type": "text",
        "text": { "body": text },
    });
    if preview_url {
        body["text"]["preview_url"] = json!(true);
    }
    body
}

/// Request sending an approval message from `phone_number_id`
pub fn create_message(config: &SendAndWaitConfig, phone_number_id: &str, recipient: &str) -> ApiRequest {
    ApiRequest::post(format!("{phone_number_id}/messages"))
        .json(text_body(recipient, &config.body_text(), false))
}
