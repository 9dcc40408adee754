//! Cekat nodes
//!
//! Four action nodes and four triggers over the Cekat REST API, all
//! authenticated with the same `CekatOpenApi` key.
//!
//! | Node | Type name | Resources |
//! |---|---|---|
//! | Chat | `cekat` | lookup, contact, webhook, conversation, message |
//! | CRM | `cekatCrm` | lookup, action (boards and items) |
//! | Order | `cekatOrder` | lookup, action (orders) |
//! | AI Agent | `cekatAiAgent` | message |

mod ai_agent;
mod chat;
mod client;
mod crm;
mod loaders;
mod message;
mod order;
mod triggers;

pub use ai_agent::{parse_messages, AiAgentOperation, CekatAiAgentNode};
pub use chat::{ChatOperation, CekatNode};
pub use client::{CekatClient, UrlVariant};
pub use crm::{create_item_body, delete_guard, search_conditions, update_item_body, CekatCrmNode, CrmOperation};
pub use loaders::CekatOptions;
pub use message::build_message_body;
pub use order::{create_order_body, update_order_body, CekatOrderNode, OrderOperation};
pub use triggers::{CekatAiToolTrigger, CekatCrmTrigger, CekatOrderTrigger, CekatTrigger};
