//! Dropdown loaders for the Cekat nodes

use super::client::{CekatClient, UrlVariant};
use crate::dispatch::ExecutionContext;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::options::{extract_list, first_text, named_options, OptionItem, OptionLoader};
use crate::params::ParameterSourceExt;
use crate::types::{value_to_string, JsonValue};
use async_trait::async_trait;
use tracing::warn;

/// Option methods shared by every Cekat node
#[derive(Debug, Clone, Copy)]
pub struct CekatOptions {
    node: &'static str,
}

impl CekatOptions {
    pub const METHODS: &'static [&'static str] = &[
        "getInboxes",
        "getTemplates",
        "getAgentsDropdown",
        "getLabelsDropdown",
        "getPipelinesDropdown",
        "getBoards",
        "getBoardColumns",
        "getItems",
        "getOrders",
        "getContacts",
    ];

    /// Loader answering for the given node type
    pub fn for_node(node: &'static str) -> Self {
        Self { node }
    }
}

#[async_trait]
impl OptionLoader for CekatOptions {
    fn node(&self) -> &'static str {
        self.node
    }

    fn methods(&self) -> &'static [&'static str] {
        Self::METHODS
    }

    async fn load(&self, method: &str, ctx: &ExecutionContext<'_>) -> Result<Vec<OptionItem>> {
        if !Self::METHODS.contains(&method) {
            return Err(self.unknown_method(method));
        }
        let client = CekatClient::from_context(ctx).await?;

        match method {
            "getInboxes" => {
                let response = client.call(UrlVariant::Api, ApiRequest::get("/inboxes")).await?;
                Ok(extract_list(&response, None).iter().filter_map(inbox_option).collect())
            }
            "getTemplates" => {
                let inbox_id = ctx.params.str_or("inboxId", 0, "");
                let request = ApiRequest::get("/templates").query("inbox_id", inbox_id);
                let response = client.call(UrlVariant::Api, request).await?;
                Ok(named_options(extract_list(&response, None), &["name"], "id"))
            }
            "getAgentsDropdown" => {
                let response = server_get(&client, "/business_workflows/agents").await?;
                Ok(named_options(extract_list(&response, None), &["name", "email"], "id"))
            }
            "getLabelsDropdown" => {
                let response = server_get(&client, "/business_workflows/labels").await?;
                Ok(named_options(extract_list(&response, None), &["name"], "id"))
            }
            "getPipelinesDropdown" => {
                let response = server_get(&client, "/business_workflows/pipeline-status").await?;
                Ok(named_options(extract_list(&response, None), &["name"], "id"))
            }
            "getBoards" => {
                let response = server_get(&client, "/api/crm/boards").await?;
                Ok(named_options(extract_list(&response, Some("boards")), &["name"], "id"))
            }
            "getBoardColumns" => {
                let Some(board_id) = ctx.params.opt_str("boardId", 0) else {
                    return Ok(Vec::new());
                };
                let response = server_get(&client, &format!("/api/crm/boards/{board_id}")).await?;
                let board = response.get("data").unwrap_or(&response);
                Ok(named_options(extract_list(board, Some("columns")), &["name"], "name"))
            }
            "getItems" => {
                let Some(board_id) = ctx.params.opt_str("boardId", 0) else {
                    return Ok(Vec::new());
                };
                let response = server_get(&client, &format!("/api/crm/boards/{board_id}/items")).await?;
                Ok(named_options(
                    extract_list(&response, Some("items")),
                    &["item_name", "name"],
                    "id",
                ))
            }
            "getOrders" => {
                let response = server_get(&client, "/api/orders").await?;
                Ok(extract_list(&response, Some("orders"))
                    .iter()
                    .filter_map(order_option)
                    .collect())
            }
            "getContacts" => match server_get(&client, "/api/contacts").await {
                Ok(response) => Ok(extract_list(&response, Some("contacts"))
                    .iter()
                    .filter_map(contact_option)
                    .collect()),
                Err(e) => {
                    warn!(error = %e, "Failed to load contacts");
                    Ok(Vec::new())
                }
            },
            _ => Err(self.unknown_method(method)),
        }
    }
}

async fn server_get(client: &CekatClient, path: &str) -> Result<JsonValue> {
    client.call(UrlVariant::Server, ApiRequest::get(path)).await
}

/// `"<name> (<type> - <phone>)"`, omitting whatever is missing
pub(crate) fn inbox_option(inbox: &JsonValue) -> Option<OptionItem> {
    let id = inbox.get("id")?.clone();
    let mut name = inbox.get("name").map(value_to_string).unwrap_or_default();
    if let Some(kind) = first_text(inbox, &["type"]) {
        match first_text(inbox, &["phone_number"]) {
            Some(phone) => name.push_str(&format!(" ({kind} - {phone})")),
            None => name.push_str(&format!(" ({kind})")),
        }
    }
    Some(OptionItem::new(name, id))
}

/// `"Order #<number> - <contact name | No Contact>"`
pub(crate) fn order_option(order: &JsonValue) -> Option<OptionItem> {
    let id = order.get("id")?.clone();
    let number = order.get("order_number").map(value_to_string).unwrap_or_default();
    let contact = order
        .get("contact")
        .and_then(|c| first_text(c, &["display_name"]))
        .unwrap_or_else(|| "No Contact".to_string());
    Some(OptionItem::new(format!("Order #{number} - {contact}"), id))
}

pub(crate) fn contact_option(contact: &JsonValue) -> Option<OptionItem> {
    let id = contact.get("id")?.clone();
    let name = first_text(contact, &["display_name", "name", "phone_number"])
        .unwrap_or_else(|| "Unknown Contact".to_string());
    let option = OptionItem::new(name, id);
    Some(match first_text(contact, &["phone_number"]) {
        Some(phone) => option.with_description(format!("Phone: {phone}")),
        None => option,
    })
}
