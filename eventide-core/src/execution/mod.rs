//! Execution backends: turn Order events into Fill events.

pub mod fees;
pub mod simulated;

pub use fees::{FeeSchedule, PerShareFees, TieredFees, ZeroFees};
pub use simulated::SimulatedExecutionHandler;

use crate::data::{DataError, MarketDataSource};
use crate::domain::OrderEvent;
use crate::queue::{EventQueue, QueueClosed};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The backend refused this order. The run continues.
    #[error("order rejected ({order}): {reason}")]
    Rejected { order: OrderEvent, reason: String },

    /// The backend cannot continue. Aborts the run.
    #[error("execution failed: {0}")]
    Failed(String),

    #[error("price lookup failed: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    QueueClosed(#[from] QueueClosed),
}

impl ExecutionError {
    /// Whether the run has to stop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Order router.
///
/// For every accepted order the backend must eventually deliver exactly one
/// Fill event, either pushed onto `queue` directly or sent later through an
/// [`EventSender`](crate::queue::EventSender). Refused orders are reported
/// as [`ExecutionError::Rejected`] and produce no fill.
pub trait ExecutionHandler: Send {
    fn venue(&self) -> &str;

    fn execute_order(
        &mut self,
        order: &OrderEvent,
        data: &dyn MarketDataSource,
        queue: &mut EventQueue,
    ) -> Result<(), ExecutionError>;
}
