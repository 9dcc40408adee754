//! WhatsApp Business Cloud node
//!
//! Sends plain text messages and approval messages whose options link back
//! to a resume URL (`<url>?approved=<value>`). Waiting for the answer is up
//! to the host that owns the resume URL.

mod message;
mod node;

pub use message::{create_message, sanitize_phone_number, text_body, ApprovalOption, SendAndWaitConfig};
pub use node::{WhatsAppNode, WhatsAppOperation};

#[cfg(test)]
mod tests;
