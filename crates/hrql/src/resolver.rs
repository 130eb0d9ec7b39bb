//! Side-effecting lookups the compiler performs against live data (spec §2,
//! "Resolver interface"; spec §4.4.3).
//!
//! Production implementations are database-backed; tests use
//! [`crate::testing::MemoryResolver`]. There is no global state — the
//! compiler is handed a `&dyn Resolver` for the duration of one
//! [`crate::compile::compile`] call (spec §9, "Resolver is a capability
//! abstraction passed by reference").

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use hrql_ast::{Error, ErrorKind, Reason};

/// The compiler's only suspension points (spec §5, "Suspension points"). Both
/// methods take a [`CancellationToken`] so a caller-initiated cancellation
/// aborts compilation without partial side effects.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// The hierarchical `ltree` path of an employee, root to self, as
    /// dot-joined 32-char hex labels (spec §3, "Invariants").
    async fn lookup_path(&self, id: Uuid, cancel: &CancellationToken) -> Result<String, Error>;

    /// The textual value of a field on an employee. An empty string denotes
    /// SQL NULL (spec §4.4.3).
    async fn lookup_field_value(
        &self,
        id: Uuid,
        api_name: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error>;
}

/// Checks a cancellation token and turns it into [`ErrorKind::Cancelled`].
/// Every `Resolver` call site in the compiler calls this before and after
/// awaiting, matching spec §5's "every Resolver call carries a cancellation
/// token... on cancellation the compilation aborts... without partial side
/// effects".
pub fn check_cancelled(cancel: &CancellationToken) -> Result<(), Error> {
    if cancel.is_cancelled() {
        return Err(Error::cancelled());
    }
    Ok(())
}

pub fn not_found(id: Uuid) -> Error {
    Error::new(
        ErrorKind::Resolver,
        Reason::NotFound {
            name: id.to_string(),
            namespace: "employee".to_string(),
        },
    )
}
