//! Accept-trade capability — an injectable entry filter.
//!
//! The engine consults the filter after all structural checks pass and
//! before committing a trade. The fault boundary is fail-open: a filter
//! error counts as acceptance so a flaky external model can never stall a
//! grid search. Callers that want fail-closed must map errors themselves.

use crate::config::StrategyConfig;
use crate::domain::{Bar, Leg};
use crate::fib::FibLevels;
use crate::swing::SwingType;

/// Errors surfaced by a filter implementation. Boxed so external scorers
/// (model inference, IPC) can report whatever they like.
pub type FilterError = Box<dyn std::error::Error + Send + Sync>;

/// Full decision context handed to the filter at the entry bar.
#[derive(Debug)]
pub struct TradeContext<'a> {
    pub bars: &'a [Bar],
    /// Cursor index of the entry bar within `bars`.
    pub index: usize,
    pub swing: SwingType,
    pub impulse: &'a Leg,
    pub fib: &'a FibLevels,
    pub config: &'a StrategyConfig,
}

/// Single-method predicate abstraction over external accept/reject logic.
pub trait AcceptTrade {
    fn accept(&self, ctx: &TradeContext<'_>) -> Result<bool, FilterError>;
}

/// Apply the fail-open boundary: `Err` degrades to acceptance.
pub fn accept_or_fail_open(filter: &dyn AcceptTrade, ctx: &TradeContext<'_>) -> bool {
    filter.accept(ctx).unwrap_or(true)
}

impl<F> AcceptTrade for F
where
    F: Fn(&TradeContext<'_>) -> Result<bool, FilterError>,
{
    fn accept(&self, ctx: &TradeContext<'_>) -> Result<bool, FilterError> {
        self(ctx)
    }
}
