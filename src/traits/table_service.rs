use crate::types::{DefTable, TableHandle, TableInfo, TableKind, TableStatus, TableView};

/// External table/config service: registration, loads, versioned activation,
/// sharing and address management.
///
/// Status codes map verbatim onto the service's own
/// (`Success`/`InfoUpdated`/`ErrNeverLoaded`/`ErrUnregistered`/`Error`).
pub trait TableService: Send {
    /// Identifier for logging/telemetry.
    fn name(&self) -> &'static str;

    /// Register a definition table owned by this application.
    fn register(&mut self, name: &str, kind: TableKind) -> Result<TableHandle, TableStatus>;

    /// Load a new table image; it becomes visible after the next `manage`.
    fn load(&mut self, handle: TableHandle, defs: DefTable) -> TableStatus;

    /// Load a table image from a JSON file.
    fn load_file(&mut self, handle: TableHandle, path: &str) -> TableStatus;

    /// Service the table's pending actions. `InfoUpdated` signals a version bump.
    fn manage(&mut self, handle: TableHandle) -> TableStatus;

    /// Acquire the table's current view (content plus live region).
    fn get_address(&mut self, handle: TableHandle) -> Result<TableView, TableStatus>;

    /// Release a view acquired with `get_address`.
    fn release_address(&mut self, handle: TableHandle) -> TableStatus;

    /// Obtain a handle to a table registered by another application.
    fn share(&mut self, name: &str) -> Result<TableHandle, TableStatus>;

    /// Look up table metadata by name.
    fn get_info(&self, name: &str) -> Result<TableInfo, TableStatus>;
}
