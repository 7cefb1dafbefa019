use crate::traits::TableService;
use crate::types::{DefTable, TableHandle, TableInfo, TableKind, TableStatus, TableView};

use super::{MockTableService, SimTableService};

/// Enum representing all table service backends.
pub enum TableServiceVariant {
    Sim(SimTableService),
    Mock(MockTableService),
}

impl TableServiceVariant {
    pub fn new_sim(owner: &str) -> Self {
        TableServiceVariant::Sim(SimTableService::new(owner))
    }

    pub fn new_mock(mock: MockTableService) -> Self {
        TableServiceVariant::Mock(mock)
    }

    pub fn as_sim_mut(&mut self) -> Option<&mut SimTableService> {
        match self {
            TableServiceVariant::Sim(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_mock(&self) -> Option<&MockTableService> {
        match self {
            TableServiceVariant::Mock(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_mock_mut(&mut self) -> Option<&mut MockTableService> {
        match self {
            TableServiceVariant::Mock(inner) => Some(inner),
            _ => None,
        }
    }
}

impl TableService for TableServiceVariant {
    fn name(&self) -> &'static str {
        match self {
            TableServiceVariant::Sim(inner) => inner.name(),
            TableServiceVariant::Mock(inner) => inner.name(),
        }
    }

    fn register(&mut self, name: &str, kind: TableKind) -> Result<TableHandle, TableStatus> {
        match self {
            TableServiceVariant::Sim(inner) => inner.register(name, kind),
            TableServiceVariant::Mock(inner) => inner.register(name, kind),
        }
    }

    fn load(&mut self, handle: TableHandle, defs: DefTable) -> TableStatus {
        match self {
            TableServiceVariant::Sim(inner) => inner.load(handle, defs),
            TableServiceVariant::Mock(inner) => inner.load(handle, defs),
        }
    }

    fn load_file(&mut self, handle: TableHandle, path: &str) -> TableStatus {
        match self {
            TableServiceVariant::Sim(inner) => inner.load_file(handle, path),
            TableServiceVariant::Mock(inner) => inner.load_file(handle, path),
        }
    }

    fn manage(&mut self, handle: TableHandle) -> TableStatus {
        match self {
            TableServiceVariant::Sim(inner) => inner.manage(handle),
            TableServiceVariant::Mock(inner) => inner.manage(handle),
        }
    }

    fn get_address(&mut self, handle: TableHandle) -> Result<TableView, TableStatus> {
        match self {
            TableServiceVariant::Sim(inner) => inner.get_address(handle),
            TableServiceVariant::Mock(inner) => inner.get_address(handle),
        }
    }

    fn release_address(&mut self, handle: TableHandle) -> TableStatus {
        match self {
            TableServiceVariant::Sim(inner) => inner.release_address(handle),
            TableServiceVariant::Mock(inner) => inner.release_address(handle),
        }
    }

    fn share(&mut self, name: &str) -> Result<TableHandle, TableStatus> {
        match self {
            TableServiceVariant::Sim(inner) => inner.share(name),
            TableServiceVariant::Mock(inner) => inner.share(name),
        }
    }

    fn get_info(&self, name: &str) -> Result<TableInfo, TableStatus> {
        match self {
            TableServiceVariant::Sim(inner) => inner.get_info(name),
            TableServiceVariant::Mock(inner) => inner.get_info(name),
        }
    }
}
