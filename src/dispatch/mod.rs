//! Operation Dispatch Table
//!
//! Each node declares its `resource:operation` pairs as a closed enum built
//! with [`operation_table!`]. Parsing the pair selected for an item either
//! yields one variant or fails with `UnsupportedOperation` before any HTTP
//! call is made. The node then matches on the variant to reach exactly one
//! handler.

mod context;
mod key;

pub use context::ExecutionContext;
pub use key::OperationKey;

use crate::error::Result;
use crate::params::ParameterSourceExt;
use crate::types::OutputRecord;
use async_trait::async_trait;

/// Declare a closed set of operations with their `resource:operation` keys
///
/// Generates the enum plus `ALL`, `key()` and `parse()`.
macro_rules! operation_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => ($resource:literal, $operation:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            /// Every registered operation
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The `resource:operation` pair for this variant
            pub fn key(self) -> $crate::dispatch::OperationKey {
                match self {
                    $($name::$variant => $crate::dispatch::OperationKey::new($resource, $operation)),+
                }
            }

            /// Resolve a `resource:operation` pair
            pub fn parse(resource: &str, operation: &str) -> $crate::error::Result<Self> {
                match (resource, operation) {
                    $(($resource, $operation) => Ok($name::$variant),)+
                    _ => Err($crate::error::Error::unsupported(resource, operation)),
                }
            }
        }
    };
}

pub(crate) use operation_table;

/// A workflow node: one dispatch table plus its handlers
#[async_trait]
pub trait Node: Send + Sync {
    /// Node type name, e.g. `cekatCrm`
    fn name(&self) -> &'static str;

    /// Every `resource:operation` pair this node handles
    fn operations(&self) -> Vec<OperationKey>;

    /// Run the handler selected for one item
    async fn execute_item(&self, ctx: &ExecutionContext<'_>, item: usize) -> Result<OutputRecord>;

    /// Record emitted for a failed item when continue-on-fail is set
    fn error_record(
        &self,
        _ctx: &ExecutionContext<'_>,
        item: usize,
        error: &crate::error::Error,
    ) -> OutputRecord {
        OutputRecord::error(error.to_string(), item)
    }
}

/// Read the `resource` and `operation` parameters of an item
pub fn selected_operation(ctx: &ExecutionContext<'_>, item: usize) -> Result<(String, String)> {
    let resource = ctx.params.required_str("resource", item)?;
    let operation = ctx.params.required_str("operation", item)?;
    Ok((resource, operation))
}
