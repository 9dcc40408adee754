//! Built-in nodes, option loaders and triggers
//!
//! Lets the CLI and server address everything by its node type name, e.g.
//! `--node cekatCrm` or `--trigger cekatAiToolTrigger`.

use crate::cekat::{
    CekatAiAgentNode, CekatAiToolTrigger, CekatCrmNode, CekatCrmTrigger, CekatNode, CekatOptions,
    CekatOrderNode, CekatOrderTrigger, CekatTrigger,
};
use crate::dispatch::Node;
use crate::error::{Error, Result};
use crate::options::OptionLoader;
use crate::powerbi::{PowerBiNode, PowerBiOptions};
use crate::trigger::WebhookTrigger;
use crate::whatsapp::WhatsAppNode;

/// Node metadata for display
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub credential: &'static str,
}

/// Every built-in action node, in display order
pub const NODES: &[NodeInfo] = &[
    NodeInfo {
        name: "cekat",
        description: "Cekat chat: lookups, contacts, webhooks, conversations, WhatsApp messages",
        credential: crate::auth::CEKAT_CREDENTIAL,
    },
    NodeInfo {
        name: "cekatCrm",
        description: "Cekat CRM boards and items",
        credential: crate::auth::CEKAT_CREDENTIAL,
    },
    NodeInfo {
        name: "cekatOrder",
        description: "Cekat orders",
        credential: crate::auth::CEKAT_CREDENTIAL,
    },
    NodeInfo {
        name: "cekatAiAgent",
        description: "Send a conversation to a Cekat AI agent",
        credential: crate::auth::CEKAT_CREDENTIAL,
    },
    NodeInfo {
        name: "powerBi",
        description: "Power BI workspaces, datasets, reports, dataflows and gateways",
        credential: crate::auth::POWERBI_OAUTH2_CREDENTIAL,
    },
    NodeInfo {
        name: "whatsApp",
        description: "WhatsApp Business Cloud text and approval messages",
        credential: crate::auth::WHATSAPP_CREDENTIAL,
    },
];

/// Every built-in trigger name
pub const TRIGGERS: &[&str] = &[
    "cekatTrigger",
    "cekatCrmTrigger",
    "cekatOrderTrigger",
    "cekatAiToolTrigger",
];

/// Look up an action node by type name
pub fn node(name: &str) -> Result<Box<dyn Node>> {
    let node: Box<dyn Node> = match name {
        "cekat" => Box::new(CekatNode),
        "cekatCrm" => Box::new(CekatCrmNode),
        "cekatOrder" => Box::new(CekatOrderNode),
        "cekatAiAgent" => Box::new(CekatAiAgentNode),
        "powerBi" => Box::new(PowerBiNode::new()),
        "whatsApp" => Box::new(WhatsAppNode),
        _ => return Err(unknown(name)),
    };
    Ok(node)
}

/// Look up the option loader of a node
///
/// The Cekat nodes share one set of methods.
pub fn options(name: &str) -> Result<Box<dyn OptionLoader>> {
    let loader: Box<dyn OptionLoader> = match name {
        "cekat" => Box::new(CekatOptions::for_node("cekat")),
        "cekatCrm" => Box::new(CekatOptions::for_node("cekatCrm")),
        "cekatOrder" => Box::new(CekatOptions::for_node("cekatOrder")),
        "cekatAiAgent" => Box::new(CekatOptions::for_node("cekatAiAgent")),
        "powerBi" => Box::new(PowerBiOptions),
        _ => return Err(unknown(name)),
    };
    Ok(loader)
}

/// Look up a trigger by type name
pub fn trigger(name: &str) -> Result<Box<dyn WebhookTrigger>> {
    let trigger: Box<dyn WebhookTrigger> = match name {
        "cekatTrigger" => Box::new(CekatTrigger),
        "cekatCrmTrigger" => Box::new(CekatCrmTrigger),
        "cekatOrderTrigger" => Box::new(CekatOrderTrigger),
        "cekatAiToolTrigger" => Box::new(CekatAiToolTrigger),
        _ => return Err(unknown(name)),
    };
    Ok(trigger)
}

fn unknown(name: &str) -> Error {
    Error::UnknownNode {
        name: name.to_string(),
    }
}
