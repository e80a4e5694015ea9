//! In-memory targets for exercising the injection protocol.

use crate::injection::{
    InjectionOutcome, InjectionResult, LibraryInjector, ModuleLoader, RemoteAddress,
    RemoteProcess,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct FakeState {
    next_address: usize,
    live: HashMap<RemoteAddress, usize>,
    written: HashMap<RemoteAddress, Vec<u8>>,
    allocations: usize,
    frees: usize,
    free_attempts: usize,
    threads: Vec<(ModuleLoader, RemoteAddress)>,
}

/// A target process whose address space is a map.
pub(crate) struct FakeProcess {
    pid: u32,
    alloc_error: Option<i32>,
    write_error: Option<i32>,
    short_write: bool,
    thread_error: Option<i32>,
    join_error: Option<i32>,
    free_error: bool,
    arch_matches: bool,
    exit_code: u32,
    state: RefCell<FakeState>,
}

impl FakeProcess {
    pub(crate) fn new(pid: u32) -> Self {
        Self {
            pid,
            alloc_error: None,
            write_error: None,
            short_write: false,
            thread_error: None,
            join_error: None,
            free_error: false,
            arch_matches: true,
            exit_code: 0x1000,
            state: RefCell::new(FakeState {
                next_address: 0x10000,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn fail_allocation(mut self, code: i32) -> Self {
        self.alloc_error = Some(code);
        self
    }

    pub(crate) fn fail_write(mut self, code: i32) -> Self {
        self.write_error = Some(code);
        self
    }

    pub(crate) fn short_write(mut self) -> Self {
        self.short_write = true;
        self
    }

    pub(crate) fn fail_thread(mut self, code: i32) -> Self {
        self.thread_error = Some(code);
        self
    }

    pub(crate) fn fail_join(mut self, code: i32) -> Self {
        self.join_error = Some(code);
        self
    }

    pub(crate) fn fail_free(mut self) -> Self {
        self.free_error = true;
        self
    }

    pub(crate) fn foreign_architecture(mut self) -> Self {
        self.arch_matches = false;
        self
    }

    pub(crate) fn loader_returns(mut self, exit_code: u32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub(crate) fn allocations(&self) -> usize {
        self.state.borrow().allocations
    }

    pub(crate) fn frees(&self) -> usize {
        self.state.borrow().frees
    }

    pub(crate) fn free_attempts(&self) -> usize {
        self.state.borrow().free_attempts
    }

    pub(crate) fn live_allocations(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub(crate) fn threads(&self) -> Vec<(ModuleLoader, RemoteAddress)> {
        self.state.borrow().threads.clone()
    }

    /// The UTF-16 string last written at `address`, without its terminator.
    pub(crate) fn written(&self, address: RemoteAddress) -> Option<String> {
        let state = self.state.borrow();
        let bytes = state.written.get(&address)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .take_while(|&unit| unit != 0)
            .collect();
        Some(String::from_utf16_lossy(&units))
    }
}

impl RemoteProcess for FakeProcess {
    type Thread = RemoteAddress;

    fn pid(&self) -> u32 {
        self.pid
    }

    fn matches_architecture(&self) -> std::io::Result<bool> {
        Ok(self.arch_matches)
    }

    fn allocate(&self, size: usize) -> std::io::Result<RemoteAddress> {
        if let Some(code) = self.alloc_error {
            return Err(std::io::Error::from_raw_os_error(code));
        }

        let mut state = self.state.borrow_mut();
        let address = RemoteAddress::new(state.next_address);
        state.next_address += size.max(1).next_multiple_of(0x1000);
        state.live.insert(address, size);
        state.allocations += 1;
        Ok(address)
    }

    fn write(&self, address: RemoteAddress, data: &[u8]) -> std::io::Result<usize> {
        if let Some(code) = self.write_error {
            return Err(std::io::Error::from_raw_os_error(code));
        }

        let mut state = self.state.borrow_mut();
        let capacity = *state
            .live
            .get(&address)
            .ok_or_else(|| std::io::Error::from_raw_os_error(487))?;
        let len = if self.short_write {
            data.len() / 2
        } else {
            data.len().min(capacity)
        };
        state.written.insert(address, data[..len].to_vec());
        Ok(len)
    }

    fn spawn_thread(
        &self,
        start: ModuleLoader,
        parameter: RemoteAddress,
    ) -> std::io::Result<Self::Thread> {
        if let Some(code) = self.thread_error {
            return Err(std::io::Error::from_raw_os_error(code));
        }

        self.state.borrow_mut().threads.push((start, parameter));
        Ok(parameter)
    }

    fn join_thread(&self, thread: Self::Thread) -> std::io::Result<u32> {
        if let Some(code) = self.join_error {
            return Err(std::io::Error::from_raw_os_error(code));
        }

        // The loader reads its argument while running.
        if !self.state.borrow().live.contains_key(&thread) {
            return Err(std::io::Error::from_raw_os_error(998));
        }

        Ok(self.exit_code)
    }

    fn free(&self, address: RemoteAddress) -> std::io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.free_attempts += 1;

        if self.free_error {
            return Err(std::io::Error::from_raw_os_error(87));
        }

        state
            .live
            .remove(&address)
            .ok_or_else(|| std::io::Error::from_raw_os_error(487))?;
        state.frees += 1;
        Ok(())
    }
}

/// Injector that replays a fixed list of outcomes and records every call.
pub(crate) struct ScriptedInjector {
    outcomes: RefCell<std::vec::IntoIter<InjectionOutcome>>,
    calls: RefCell<Vec<(PathBuf, u32)>>,
    fatal_at: Cell<Option<usize>>,
}

impl ScriptedInjector {
    pub(crate) fn new(outcomes: Vec<InjectionOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into_iter()),
            calls: RefCell::new(Vec::new()),
            fatal_at: Cell::new(None),
        }
    }

    pub(crate) fn fatal_at(self, call: usize) -> Self {
        self.fatal_at.set(Some(call));
        self
    }

    pub(crate) fn calls(&self) -> Vec<(PathBuf, u32)> {
        self.calls.borrow().clone()
    }
}

/// Target identified only by its pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pid(pub(crate) u32);

impl LibraryInjector<Pid> for ScriptedInjector {
    fn inject_one(&self, library: &Path, target: &Pid) -> InjectionResult<InjectionOutcome> {
        let mut calls = self.calls.borrow_mut();
        calls.push((library.to_path_buf(), target.0));

        if self.fatal_at.get() == Some(calls.len() - 1) {
            return Err(crate::InjectionError::MemoryFreeFailed {
                pid: target.0,
                source: std::io::Error::from_raw_os_error(87),
            });
        }

        Ok(self
            .outcomes
            .borrow_mut()
            .next()
            .unwrap_or(InjectionOutcome::Success))
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }
}
