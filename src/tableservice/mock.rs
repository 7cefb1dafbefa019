use std::cell::RefCell;
use std::collections::VecDeque;

use crate::traits::TableService;
use crate::types::{DefTable, TableHandle, TableInfo, TableKind, TableStatus, TableView};

/// Scripted table service for testing. Each queue is popped front-first;
/// an exhausted queue falls back to the default result for that call.
#[derive(Default)]
pub struct MockTableService {
    pub share_results: VecDeque<Result<TableHandle, TableStatus>>,
    pub get_address_results: VecDeque<Result<TableView, TableStatus>>,
    pub info_results: RefCell<VecDeque<Result<TableInfo, TableStatus>>>,
    pub manage_results: VecDeque<TableStatus>,
    pub load_results: VecDeque<TableStatus>,
    pub release_results: VecDeque<TableStatus>,
    /// Recorded call names, in order.
    pub calls: Vec<String>,
    next_handle: u32,
}

impl MockTableService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == name).count()
    }
}

impl TableService for MockTableService {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn register(&mut self, name: &str, _kind: TableKind) -> Result<TableHandle, TableStatus> {
        self.calls.push(format!("register:{name}"));
        self.next_handle += 1;
        Ok(TableHandle(self.next_handle))
    }

    fn load(&mut self, _handle: TableHandle, _defs: DefTable) -> TableStatus {
        self.calls.push("load".to_string());
        self.load_results.pop_front().unwrap_or(TableStatus::Success)
    }

    fn load_file(&mut self, _handle: TableHandle, path: &str) -> TableStatus {
        self.calls.push(format!("load_file:{path}"));
        self.load_results.pop_front().unwrap_or(TableStatus::Success)
    }

    fn manage(&mut self, _handle: TableHandle) -> TableStatus {
        self.calls.push("manage".to_string());
        self.manage_results.pop_front().unwrap_or(TableStatus::Success)
    }

    fn get_address(&mut self, _handle: TableHandle) -> Result<TableView, TableStatus> {
        self.calls.push("get_address".to_string());
        self.get_address_results
            .pop_front()
            .unwrap_or(Err(TableStatus::ErrNeverLoaded))
    }

    fn release_address(&mut self, _handle: TableHandle) -> TableStatus {
        self.calls.push("release_address".to_string());
        self.release_results
            .pop_front()
            .unwrap_or(TableStatus::Success)
    }

    fn share(&mut self, name: &str) -> Result<TableHandle, TableStatus> {
        self.calls.push(format!("share:{name}"));
        self.share_results
            .pop_front()
            .unwrap_or(Err(TableStatus::ErrUnregistered))
    }

    fn get_info(&self, name: &str) -> Result<TableInfo, TableStatus> {
        // &self on the trait, so the script queue sits behind a RefCell
        let _ = name;
        self.info_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(TableStatus::ErrUnregistered))
    }
}
