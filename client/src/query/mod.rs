//! Queries and the batch dispatcher.
//!
//! TraCI responses carry no correlation id. A query therefore only knows
//! which responses are its own by position: it consumes, in order, exactly as
//! many response containers as it produced request commands, starting where
//! the previous query of the batch stopped.

mod change;
mod control;
mod dispatcher;
mod read;

pub use change::ChangeStateQuery;
pub use control::{CloseQuery, StepQuery, VersionQuery};
pub use dispatcher::{Batch, Dispatcher};
pub use read::{FromValue, ReadQuery, TypedQuery};

use crate::error::{Result, TraciError};
use wire::{Command, ResponseContainer};

pub trait Query {
    /// The commands to send in the next round trip, in order
    fn requests(&self) -> Result<Vec<Command>>;

    /// Consumes one container per command returned by [`Query::requests`]
    fn consume(&self, responses: &mut Responses<'_>) -> Result<()>;
}

/// Anything holding a cached value that can be thrown away
pub trait Obsolete: Send + Sync {
    fn set_obsolete(&self);
}

/// Cursor over the flat response sequence of one batch
pub struct Responses<'a> {
    containers: std::slice::Iter<'a, ResponseContainer>,
    consumed: usize,
}

impl<'a> Responses<'a> {
    pub fn new(containers: &'a [ResponseContainer]) -> Self {
        Self {
            containers: containers.iter(),
            consumed: 0,
        }
    }

    pub fn next_container(&mut self) -> Result<&'a ResponseContainer> {
        let container = self.containers.next().ok_or_else(|| {
            TraciError::Invariant("query consumed more responses than it requested".to_string())
        })?;
        self.consumed += 1;
        Ok(container)
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.containers.len()
    }
}
