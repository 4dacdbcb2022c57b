//! Domain types for the event pipeline

pub mod bar;
pub mod event;
pub mod fill;
pub mod holdings;
pub mod order;
pub mod position;
pub mod signal;

pub use bar::{Bar, BarField, UnknownBarField};
pub use event::{Event, MarketEvent};
pub use fill::FillEvent;
pub use holdings::{CurrentHoldings, HoldingsSnapshot};
pub use order::{OrderEvent, OrderKind, OrderSide};
pub use position::{PositionMap, PositionsSnapshot};
pub use signal::{Direction, SignalEvent};

