//! Tool Resolution Engine
//!
//! Turns a tool invocation into a normalized, provider-agnostic result

pub mod classify;
pub mod dispatcher;
pub mod forecast;
pub mod normalize;
pub mod result;
pub mod symbol;

pub use classify::classify;
pub use dispatcher::{ToolCall, ToolDispatcher, ToolDispatcherBuilder};
pub use forecast::{ForecastWindow, RangeExpression, WindowSpan, horizon_days, resolve_window};
pub use result::{
    Article, CanonicalResult, Conversion, CurrentConditions, DisplayMode, FinancialQuote,
    Forecast, ForecastGranularity, ForecastPeriod, InstrumentKind, MediaDetails, ResolvedWindow,
    SearchItem, SearchResultList, SensorReading, Temperature, ToolKind, ToolResolution,
};
pub use symbol::{CurrencyPair, ResolvedSymbol, resolve_currency_pair, resolve_symbol};
