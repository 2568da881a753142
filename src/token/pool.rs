//! Fixed-capacity token pool with ownership and transferability.
//!
//! The pool holds [`TOKEN_POOL_CAPACITY`] slots. Each token is either
//! *available* (owner = none, allocated bit only) or *owned* (owner set,
//! allocated and locked bits). Acquisition is first-fit in index order;
//! releases do not reorder. Linear scans are intentional at this capacity.
//!
//! The pool is a plain data structure injected into the runtime; it knows
//! nothing about the registry. Requester-state preconditions are enforced
//! by the runtime layer before the pool is consulted.

use super::name::ResourceName;
use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::tracing_compat::{debug, trace};
use crate::types::{TaskId, Time, TokenId};
use core::fmt;
use serde::Serialize;

/// Number of tokens in the pool.
pub const TOKEN_POOL_CAPACITY: usize = 64;

const VALID_ALLOCATED: u8 = 0b0000_0001;
const VALID_LOCKED: u8 = 0b0000_0010;

/// Access permission bitmask: bit 0 = read, bit 1 = write; higher bits
/// reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct AccessMask(u8);

impl AccessMask {
    /// Read permission.
    pub const READ: Self = Self(0b01);
    /// Write permission.
    pub const WRITE: Self = Self(0b10);
    /// Read and write permission.
    pub const READ_WRITE: Self = Self(0b11);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if the mask grants reads.
    #[must_use]
    pub const fn can_read(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    /// Returns true if the mask grants writes.
    #[must_use]
    pub const fn can_write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }
}

impl fmt::Display for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Parameters for a token acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// The resource the token guards.
    pub resource: ResourceName,
    /// Requested access permissions.
    pub mask: AccessMask,
    /// Whether custody may move to another task during a context switch.
    pub transferable: bool,
}

impl TokenRequest {
    /// Creates a non-transferable request, validating the resource name.
    pub fn new(resource: &str, mask: AccessMask) -> Result<Self> {
        Ok(Self {
            resource: ResourceName::new(resource)?,
            mask,
            transferable: false,
        })
    }

    /// Marks the requested token as transferable.
    #[must_use]
    pub const fn transferable(mut self, transferable: bool) -> Self {
        self.transferable = transferable;
        self
    }
}

/// Snapshot of one token slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based unique id within the pool.
    pub token_id: TokenId,
    /// Current owner, or [`TaskId::NONE`] when available.
    pub owner: TaskId,
    /// Granted access permissions.
    pub access_mask: AccessMask,
    /// The guarded resource, empty when available.
    pub resource_name: ResourceName,
    /// Timestamp of the most recent acquisition.
    pub acquisition_time: Time,
    /// State flags: bit 0 = allocated, bit 1 = locked-to-owner.
    pub validation_bits: u8,
    /// Whether custody may cross a context switch.
    pub is_transferable: bool,
}

impl Token {
    /// Returns true if the token is currently owned.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        !self.owner.is_none()
    }

    /// Returns true if the locked-to-owner bit is set.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.validation_bits & VALID_LOCKED != 0
    }
}

/// Fixed-capacity set of arbitration tokens.
#[derive(Debug)]
pub struct TokenPool {
    slots: Vec<Token>,
}

impl Default for TokenPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenPool {
    /// Creates a pool with all tokens available.
    #[must_use]
    pub fn new() -> Self {
        let slots = (0..TOKEN_POOL_CAPACITY)
            .map(|index| Token {
                token_id: TokenId::new(index as u64 + 1),
                owner: TaskId::NONE,
                access_mask: AccessMask::default(),
                resource_name: ResourceName::default(),
                acquisition_time: Time::ZERO,
                validation_bits: VALID_ALLOCATED,
                is_transferable: false,
            })
            .collect();
        Self { slots }
    }

    /// Returns the pool capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of available tokens.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.iter().filter(|t| !t.is_owned()).count()
    }

    /// Acquires the lowest-indexed available token for `requester`.
    pub fn acquire(
        &mut self,
        requester: TaskId,
        request: &TokenRequest,
        now: Time,
    ) -> Result<TokenId> {
        if requester.is_none() {
            return Err(ErrorKind::UnknownTask).context("requester id 0");
        }
        let Some(slot) = self.slots.iter_mut().find(|t| !t.is_owned()) else {
            debug!(requester = %requester, "token acquisition failed, pool exhausted");
            return Err(Error::new(ErrorKind::PoolExhausted));
        };
        slot.owner = requester;
        slot.access_mask = request.mask;
        slot.resource_name = request.resource.clone();
        slot.acquisition_time = now;
        slot.validation_bits = VALID_ALLOCATED | VALID_LOCKED;
        slot.is_transferable = request.transferable;
        trace!(
            requester = %requester,
            token = %slot.token_id,
            resource = %slot.resource_name,
            mask = %slot.access_mask,
            "token acquired"
        );
        Ok(slot.token_id)
    }

    /// Releases an owned token back to the pool.
    pub fn release(&mut self, token_id: TokenId) -> Result<()> {
        let slot = self.slot_mut(token_id)?;
        if !slot.is_owned() {
            return Err(
                Error::new(ErrorKind::NotOwned).with_context(format!("{token_id} is available"))
            );
        }
        trace!(token = %slot.token_id, owner = %slot.owner, "token released");
        slot.owner = TaskId::NONE;
        slot.access_mask = AccessMask::default();
        slot.resource_name = ResourceName::default();
        slot.validation_bits = VALID_ALLOCATED;
        slot.is_transferable = false;
        Ok(())
    }

    /// Atomically moves ownership of a transferable token.
    pub fn transfer(&mut self, token_id: TokenId, from: TaskId, to: TaskId) -> Result<()> {
        if to.is_none() {
            return Err(ErrorKind::UnknownTask).context("transfer target id 0");
        }
        let slot = self.slot_mut(token_id)?;
        if slot.owner != from {
            return Err(Error::new(ErrorKind::NotOwned)
                .with_context(format!("{token_id} not owned by {from}")));
        }
        if !slot.is_transferable {
            return Err(Error::new(ErrorKind::NotTransferable).with_context(format!("{token_id}")));
        }
        slot.owner = to;
        trace!(token = %token_id, from = %from, to = %to, "token transferred");
        Ok(())
    }

    /// Moves every transferable token owned by `from` to `to`.
    ///
    /// Non-transferable tokens remain with `from`. Returns the ids of the
    /// tokens that moved, ascending.
    pub fn transfer_all_owned(&mut self, from: TaskId, to: TaskId) -> Vec<TokenId> {
        let mut moved = Vec::new();
        for slot in &mut self.slots {
            if slot.owner == from && slot.is_transferable {
                slot.owner = to;
                moved.push(slot.token_id);
            }
        }
        if !moved.is_empty() {
            debug!(from = %from, to = %to, moved = moved.len(), "token custody transferred");
        }
        moved
    }

    /// Releases every token owned by `task`, returning the count.
    ///
    /// Used when a task terminates; always succeeds.
    pub fn reclaim_owned_by(&mut self, task: TaskId) -> usize {
        let owned: Vec<TokenId> = self
            .slots
            .iter()
            .filter(|t| t.owner == task)
            .map(|t| t.token_id)
            .collect();
        for token_id in &owned {
            // Owned by construction; release cannot fail here.
            let _ = self.release(*token_id);
        }
        if !owned.is_empty() {
            debug!(task = %task, count = owned.len(), "tokens reclaimed");
        }
        owned.len()
    }

    /// Returns a snapshot of the token, if the id is in range.
    #[must_use]
    pub fn token(&self, token_id: TokenId) -> Option<Token> {
        self.index(token_id).map(|i| self.slots[i].clone())
    }

    /// Returns the ids of tokens owned by `task`, ascending.
    #[must_use]
    pub fn tokens_owned_by(&self, task: TaskId) -> Vec<TokenId> {
        self.slots
            .iter()
            .filter(|t| t.owner == task && !task.is_none())
            .map(|t| t.token_id)
            .collect()
    }

    fn index(&self, token_id: TokenId) -> Option<usize> {
        let raw = token_id.raw();
        if raw == 0 || raw > self.slots.len() as u64 {
            return None;
        }
        Some((raw - 1) as usize)
    }

    fn slot_mut(&mut self, token_id: TokenId) -> Result<&mut Token> {
        let index = self.index(token_id).ok_or_else(|| {
            Error::new(ErrorKind::UnknownToken).with_context(format!("{token_id} out of range"))
        })?;
        Ok(&mut self.slots[index])
    }
}
