//! Token operations with registry preconditions.
//!
//! The pool itself is registry-agnostic; this layer checks requester state
//! before consulting it, holding the registry lock around the nested pool
//! lock per the crate-wide lock order.

use super::Runtime;
use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::trace::{TraceEvent, TraceEventKind};
use crate::types::{TaskId, TokenId};

pub use crate::token::TokenRequest;

impl Runtime {
    /// Acquires a token for `task`, which must be registered and in `New`
    /// or `Running` state.
    pub fn acquire_token(&self, task: TaskId, request: &TokenRequest) -> Result<TokenId> {
        let registry = self.registry().lock();
        let record = registry
            .lookup(task)
            .ok_or(ErrorKind::UnknownTask)
            .with_context(|| format!("{task}"))?;
        if !record.state().can_acquire() {
            drop(registry);
            let err = Error::new(ErrorKind::RequesterNotRunnable)
                .with_context(format!("{task} cannot acquire tokens"));
            self.record_token_event(TraceEventKind::TokenAcquire, task, 0, Some(&err));
            return Err(err);
        }
        let now = self.clock().now();
        let result = self.pool().lock().acquire(task, request, now);
        drop(registry);

        match &result {
            Ok(id) => self.record_token_event(TraceEventKind::TokenAcquire, task, id.raw(), None),
            Err(err) => self.record_token_event(TraceEventKind::TokenAcquire, task, 0, Some(err)),
        }
        result
    }

    /// Releases an owned token back to the pool.
    pub fn release_token(&self, token: TokenId) -> Result<()> {
        let mut pool = self.pool().lock();
        let owner = pool
            .token(token)
            .map_or(TaskId::NONE, |snapshot| snapshot.owner);
        let result = pool.release(token);
        drop(pool);

        self.record_token_event(
            TraceEventKind::TokenRelease,
            owner,
            token.raw(),
            result.as_ref().err(),
        );
        result
    }

    /// Transfers a single transferable token between two registered tasks.
    pub fn transfer_token(&self, token: TokenId, from: TaskId, to: TaskId) -> Result<()> {
        let registry = self.registry().lock();
        if registry.lookup(to).is_none() {
            drop(registry);
            let err = Error::new(ErrorKind::UnknownTask).with_context(format!("{to}"));
            self.record_token_event(TraceEventKind::TokenTransfer, from, token.raw(), Some(&err));
            return Err(err);
        }
        let result = self.pool().lock().transfer(token, from, to);
        drop(registry);

        self.record_token_event(
            TraceEventKind::TokenTransfer,
            from,
            token.raw(),
            result.as_ref().err(),
        );
        result
    }

    fn record_token_event(
        &self,
        kind: TraceEventKind,
        task: TaskId,
        other: u64,
        err: Option<&Error>,
    ) {
        let now = self.clock().now();
        let event = match err {
            None => TraceEvent::ok(now, kind, task, other),
            Some(err) => TraceEvent::failed(now, kind, task, other, err.kind().stable_name()),
        };
        self.telemetry().record(event);
    }
}
