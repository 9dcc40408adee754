//! Cekat Order node (`cekatOrder`)
//!
//! Lookups read from the staging host; create and update go to the server
//! host. Failed items captured under continue-on-fail also record which
//! item, resource and operation failed, plus when.

use super::client::{CekatClient, UrlVariant};
use crate::dispatch::{operation_table, selected_operation, ExecutionContext, Node, OperationKey};
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::{number_to_json, JsonObject, JsonValue, OutputRecord};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::debug;

operation_table! {
    /// Operations of the Cekat Order node
    pub enum OrderOperation {
        GetAllOrders => ("lookup", "getAllOrders"),
        GetOrder => ("lookup", "getOrder"),
        CreateOrder => ("action", "createOrder"),
        UpdateOrder => ("action", "updateOrder"),
    }
}

/// The Cekat Order node
#[derive(Debug, Clone, Copy, Default)]
pub struct CekatOrderNode;

#[async_trait]
impl Node for CekatOrderNode {
    fn name(&self) -> &'static str {
        "cekatOrder"
    }

    fn operations(&self) -> Vec<OperationKey> {
        OrderOperation::ALL.iter().map(|op| op.key()).collect()
    }

    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord> {
        let (resource, operation) = selected_operation(ctx, item)?;
        let op = OrderOperation::parse(&resource, &operation)?;
        debug!(item, key = %op.key(), "Dispatching order operation");

        let client = CekatClient::from_context(ctx).await?;
        let json = match op {
            OrderOperation::GetAllOrders => {
                let response = client
                    .call(UrlVariant::Staging, ApiRequest::get("/api/orders"))
                    .await?;
                json!({ "success": true, "operation": "getAllOrders", "response": response })
            }
            OrderOperation::GetOrder => {
                let order_id = ctx.params.required_str("orderId", item)?;
                let request = ApiRequest::get(format!("/api/orders/{order_id}"));
                let response = client.call(UrlVariant::Staging, request).await?;
                json!({ "success": true, "operation": "getOrder", "orderId": order_id, "response": response })
            }
            OrderOperation::CreateOrder => {
                let customer_method = ctx.params.required_str("customerIdMethod", item)?;
                let body = create_order_body(ctx.params, item)?;
                let request = ApiRequest::post("/api/orders").json(JsonValue::Object(body.clone()));
                let response = client.call(UrlVariant::Server, request).await?;
                json!({
                    "success": true,
                    "operation": "createOrder",
                    "customerIdMethod": customer_method,
                    "fieldsCount": body.len(),
                    "createdFields": body,
                    "response": response,
                })
            }
            OrderOperation::UpdateOrder => {
                let order_id = ctx.params.required_str("orderId", item)?;
                let body = update_order_body(ctx.params, item);
                let request = ApiRequest::put(format!("/api/orders/{order_id}"))
                    .json(JsonValue::Object(body.clone()));
                let response = client.call(UrlVariant::Server, request).await?;
                json!({
                    "success": true,
                    "operation": "updateOrder",
                    "orderId": order_id,
                    "fieldsCount": body.len(),
                    "updatedFields": body,
                    "response": response,
                })
            }
        };

        Ok(OutputRecord::paired(json, item))
    }

    fn error_record(&self, ctx: &ExecutionContext<'_>, item: usize, error: &Error) -> OutputRecord {
        OutputRecord::paired(
            json!({
                "error": error.to_string(),
                "item": item,
                "resource": ctx.params.str_or("resource", item, ""),
                "operation": ctx.params.str_or("operation", item, ""),
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            item,
        )
    }
}

/// Build the create-order body
///
/// The customer is identified by conversation, contact or phone; the
/// chosen method's field is required and the other two are optional.
pub fn create_order_body(params: &dyn ParameterSource, item: usize) -> Result<JsonObject> {
    let payment_method = params.required_str("paymentMethod", item)?;
    let customer_method = params.required_str("customerIdMethod", item)?;

    let (conversation_id, contact_id, phone_number) = match customer_method.as_str() {
        "conversation" => (
            Some(params.required_str("conversationId", item)?),
            params.opt_str("contactIdOptional", item),
            params.opt_str("phoneNumberOptional", item),
        ),
        "contact" => (
            params.opt_str("conversationIdOptional", item),
            Some(params.required_str("contactId", item)?),
            params.opt_str("phoneNumberOptional", item),
        ),
        "phone" => (
            params.opt_str("conversationIdOptional", item),
            params.opt_str("contactIdOptional", item),
            Some(params.required_str("phoneNumber", item)?),
        ),
        _ => (None, None, None),
    };

    if conversation_id.is_none() && contact_id.is_none() && phone_number.is_none() {
        return Err(Error::invalid_param(
            "customerIdMethod",
            "At least one of conversation_id, contact_id, or phone_number is required",
        ));
    }

    let order_items = params
        .json_value("orderItems", item)
        .map_err(|e| Error::invalid_param("orderItems", format!("Invalid JSON format for order items: {e}")))?
        .ok_or_else(|| Error::missing_param("orderItems", item))?;

    let mut body = JsonObject::new();
    body.insert("orders_products".into(), order_items);
    body.insert("payment_method".into(), json!(payment_method));

    for (key, value) in [
        ("conversation_id", conversation_id),
        ("contact_id", contact_id),
        ("phone_number", phone_number),
        ("notes", params.opt_str("notes", item)),
        ("address", params.opt_str("address", item)),
    ] {
        if let Some(value) = value {
            body.insert(key.into(), json!(value));
        }
    }

    for (key, param) in [("shipping_fee", "shippingFee"), ("discount", "discount"), ("vat", "vat")] {
        let amount = params.f64_or(param, item, 0.0);
        if amount > 0.0 {
            body.insert(key.into(), number_to_json(amount));
        }
    }

    match payment_method.as_str() {
        "manual" => {
            let account = params.required_str("bankAccountNumber", item)?;
            body.insert("bank_account_number".into(), json!(account));
        }
        "custom" => {
            let url = params.required_str("customInvoiceUrl", item)?;
            body.insert("custom_invoice_url".into(), json!(url));
        }
        _ => {}
    }

    debug!(fields = body.len(), "Built create-order body");
    Ok(body)
}

/// Update body holding only the statuses that were set
pub fn update_order_body(params: &dyn ParameterSource, item: usize) -> JsonObject {
    let mut body = JsonObject::new();
    for (key, param) in [
        ("order_status", "orderStatus"),
        ("payment_status", "paymentStatus"),
        ("payment_method", "paymentMethod"),
    ] {
        if let Some(value) = params.opt_str(param, item) {
            body.insert(key.into(), json!(value));
        }
    }
    body
}
