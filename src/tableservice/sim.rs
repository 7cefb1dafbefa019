use std::collections::HashMap;

use crate::traits::TableService;
use crate::types::{DefTable, TableHandle, TableInfo, TableKind, TableStatus, TableView};

#[derive(Debug)]
struct TableRec {
    name: String,
    owner: String,
    kind: Option<TableKind>,
    defs: Option<DefTable>,
    region: Option<(u32, u32)>,
    /// Bumped on every load; a pending load activates on `manage`.
    version: u32,
    last_seen_version: u32,
    pending: bool,
    addr_taken: bool,
}

/// In-memory table service: versioned definition tables plus foreign raw
/// tables registered by the host for the Tables domain to checksum.
pub struct SimTableService {
    owner: String,
    next: u32,
    by_name: HashMap<String, TableHandle>,
    recs: HashMap<u32, TableRec>,
}

impl SimTableService {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            next: 1,
            by_name: HashMap::new(),
            recs: HashMap::new(),
        }
    }

    fn alloc(&mut self) -> TableHandle {
        let handle = TableHandle(self.next);
        self.next += 1;
        handle
    }

    fn rec_mut(&mut self, handle: TableHandle) -> Result<&mut TableRec, TableStatus> {
        self.recs
            .get_mut(&handle.0)
            .ok_or(TableStatus::ErrUnregistered)
    }

    /// Register a raw table owned by another (simulated) application, backed
    /// by a platform memory region. Host-side wiring, not part of the trait.
    pub fn register_raw(
        &mut self,
        name: &str,
        owner: &str,
        addr: u32,
        size: u32,
    ) -> Result<TableHandle, TableStatus> {
        if self.by_name.contains_key(name) {
            return Err(TableStatus::Error);
        }
        let handle = self.alloc();
        self.recs.insert(
            handle.0,
            TableRec {
                name: name.to_string(),
                owner: owner.to_string(),
                kind: None,
                defs: None,
                region: Some((addr, size)),
                version: 1,
                last_seen_version: 0,
                pending: false,
                addr_taken: false,
            },
        );
        self.by_name.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Attach a live memory region to a registered definition table.
    /// Host-side wiring for checksumming our own tables.
    pub fn set_region(&mut self, handle: TableHandle, addr: u32, size: u32) -> TableStatus {
        match self.recs.get_mut(&handle.0) {
            Some(rec) => {
                rec.region = Some((addr, size));
                TableStatus::Success
            }
            None => TableStatus::ErrUnregistered,
        }
    }

    /// Simulate another application replacing a raw table's content region.
    pub fn update_raw(&mut self, name: &str, addr: u32, size: u32) -> TableStatus {
        let handle = self.by_name.get(name).copied();
        match handle.and_then(|handle| self.recs.get_mut(&handle.0)) {
            Some(rec) => {
                rec.region = Some((addr, size));
                rec.version += 1;
                TableStatus::Success
            }
            None => TableStatus::ErrUnregistered,
        }
    }

    /// Drop a table entirely (simulates its owner unregistering it).
    pub fn unregister(&mut self, name: &str) -> TableStatus {
        match self.by_name.remove(name) {
            Some(handle) => {
                self.recs.remove(&handle.0);
                TableStatus::Success
            }
            None => TableStatus::ErrUnregistered,
        }
    }
}

impl TableService for SimTableService {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn register(&mut self, name: &str, kind: TableKind) -> Result<TableHandle, TableStatus> {
        if self.by_name.contains_key(name) {
            return Err(TableStatus::Error);
        }
        let owner = self.owner.clone();
        let handle = self.alloc();
        self.recs.insert(
            handle.0,
            TableRec {
                name: name.to_string(),
                owner,
                kind: Some(kind),
                defs: None,
                region: None,
                version: 0,
                last_seen_version: 0,
                pending: false,
                addr_taken: false,
            },
        );
        self.by_name.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn load(&mut self, handle: TableHandle, defs: DefTable) -> TableStatus {
        let rec = match self.rec_mut(handle) {
            Ok(rec) => rec,
            Err(status) => return status,
        };
        match (rec.kind, &defs) {
            (Some(TableKind::MemoryDefs), DefTable::Memory(_)) => {}
            (Some(TableKind::NameDefs), DefTable::Name(_)) => {}
            _ => return TableStatus::Error,
        }
        rec.defs = Some(defs);
        rec.version += 1;
        rec.pending = true;
        TableStatus::Success
    }

    fn load_file(&mut self, handle: TableHandle, path: &str) -> TableStatus {
        let kind = match self.recs.get(&handle.0) {
            Some(rec) => rec.kind,
            None => return TableStatus::ErrUnregistered,
        };
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(_) => return TableStatus::Error,
        };
        let defs = match kind {
            Some(TableKind::MemoryDefs) => match serde_json::from_slice(&raw) {
                Ok(defs) => DefTable::Memory(defs),
                Err(_) => return TableStatus::Error,
            },
            Some(TableKind::NameDefs) => match serde_json::from_slice(&raw) {
                Ok(defs) => DefTable::Name(defs),
                Err(_) => return TableStatus::Error,
            },
            None => return TableStatus::Error,
        };
        self.load(handle, defs)
    }

    fn manage(&mut self, handle: TableHandle) -> TableStatus {
        match self.rec_mut(handle) {
            Ok(rec) if rec.pending => {
                rec.pending = false;
                TableStatus::InfoUpdated
            }
            Ok(_) => TableStatus::Success,
            Err(status) => status,
        }
    }

    fn get_address(&mut self, handle: TableHandle) -> Result<TableView, TableStatus> {
        let rec = self.rec_mut(handle)?;
        if rec.defs.is_none() && rec.region.is_none() {
            return Err(TableStatus::ErrNeverLoaded);
        }
        let updated = rec.last_seen_version != rec.version;
        rec.last_seen_version = rec.version;
        rec.addr_taken = true;
        Ok(TableView {
            defs: rec.defs.clone(),
            region: rec.region,
            updated,
        })
    }

    fn release_address(&mut self, handle: TableHandle) -> TableStatus {
        match self.rec_mut(handle) {
            Ok(rec) => {
                rec.addr_taken = false;
                TableStatus::Success
            }
            Err(status) => status,
        }
    }

    fn share(&mut self, name: &str) -> Result<TableHandle, TableStatus> {
        self.by_name
            .get(name)
            .copied()
            .ok_or(TableStatus::ErrUnregistered)
    }

    fn get_info(&self, name: &str) -> Result<TableInfo, TableStatus> {
        let handle = self
            .by_name
            .get(name)
            .ok_or(TableStatus::ErrUnregistered)?;
        let rec = self.recs.get(&handle.0).ok_or(TableStatus::ErrUnregistered)?;
        let size = match (rec.region, &rec.defs) {
            (Some((_, size)), _) => size,
            (None, Some(defs)) => defs.entry_count() as u32,
            (None, None) => return Err(TableStatus::ErrNeverLoaded),
        };
        Ok(TableInfo {
            size,
            owner: rec.owner.clone(),
        })
    }
}
