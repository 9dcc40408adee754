//! WhatsApp Business Cloud node (`whatsApp`)

use super::message::{create_message, text_body, SendAndWaitConfig};
use crate::auth::WHATSAPP_CREDENTIAL;
use crate::dispatch::{operation_table, selected_operation, ExecutionContext, Node, OperationKey};
use crate::error::Result;
use crate::http::ApiRequest;
use crate::params::ParameterSourceExt;
use crate::types::OutputRecord;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

operation_table! {
    /// Operations of the WhatsApp node
    pub enum WhatsAppOperation {
        Send => ("message", "send"),
        SendAndWait => ("message", "sendAndWait"),
    }
}

/// The WhatsApp node
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatsAppNode;

#[async_trait]
impl Node for WhatsAppNode {
    fn name(&self) -> &'static str {
        "whatsApp"
    }

    fn operations(&self) -> Vec<OperationKey> {
        WhatsAppOperation::ALL.iter().map(|op| op.key()).collect()
    }

    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord> {
        let (resource, operation) = selected_operation(ctx, item)?;
        let op = WhatsAppOperation::parse(&resource, &operation)?;
        debug!(item, key = %op.key(), "Dispatching WhatsApp operation");

        let credential = ctx.credentials.credential(WHATSAPP_CREDENTIAL).await?;
        let client = ctx.http_client(&ctx.config.whatsapp.base_url, credential.bearer_auth())?;

        let params = ctx.params;
        let phone_number_id = params.required_str("phoneNumberId", item)?;
        let recipient = params.required_str("recipientPhoneNumber", item)?;

        match op {
            WhatsAppOperation::Send => {
                let text = params.required_str("textBody", item)?;
                let preview_url = params.bool_or("additionalFields.previewUrl", item, false);
                let request = ApiRequest::post(format!("{phone_number_id}/messages"))
                    .json(text_body(&recipient, &text, preview_url));
                let response = client.call(request).await?;
                Ok(OutputRecord::paired(response, item))
            }
            WhatsAppOperation::SendAndWait => {
                let resume_url = params.required_str("resumeUrl", item)?;
                let config = SendAndWaitConfig::from_params(params, item, resume_url)?;
                let response = client
                    .call(create_message(&config, &phone_number_id, &recipient))
                    .await?;
                info!(item, options = config.options.len(), "Approval message sent");
                Ok(OutputRecord::paired(
                    json!({
                        "status": "waiting",
                        "resumeUrl": config.url,
                        "options": config.options,
                        "response": response,
                    }),
                    item,
                ))
            }
        }
    }
}
