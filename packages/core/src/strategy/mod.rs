//! Call strategies: one operation fanned out over an ordered adapter list.
//!
//! Adapter order is priority order. A strategy is itself a [`Backend`], so
//! it can be mounted like any single store.

mod call_all;
mod fallback_chain;
pub mod runner;

use std::fmt;
use std::io::{Cursor, Read};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Backend, BackendRef, Error};

pub use call_all::CallAllStrategy;
pub use fallback_chain::FallbackChainStrategy;
pub use runner::{AdapterRunner, Answer, Attempt};

/// A [`Backend`] that dispatches to a list of adapters.
pub trait CallStrategy: Backend {
    /// Name used in logs and reported by [`VirtualStorage`](crate::VirtualStorage).
    fn strategy_name(&self) -> &'static str;

    fn adapters(&self) -> &[BackendRef];

    /// Replace the whole adapter list.
    fn set_adapters(&mut self, adapters: Vec<BackendRef>);

    /// Append an adapter at the lowest priority.
    fn add_adapter(&mut self, adapter: BackendRef);
}

/// The strategies available to configuration and the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    CallAll,
    FallbackChain,
}

impl StrategyKind {
    /// Create an empty strategy of this kind.
    pub fn create(self) -> Box<dyn CallStrategy> {
        match self {
            StrategyKind::CallAll => Box::new(CallAllStrategy::new()),
            StrategyKind::FallbackChain => Box::new(FallbackChainStrategy::new()),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StrategyKind::CallAll => "call_all",
            StrategyKind::FallbackChain => "fallback_chain",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    /// Accepts the snake-case names and the strategy names reported in logs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call_all" | call_all::NAME => Ok(StrategyKind::CallAll),
            "fallback_chain" | fallback_chain::NAME => Ok(StrategyKind::FallbackChain),
            other => Err(Error::config(format!("unknown strategy '{other}'"))),
        }
    }
}

/// Read a one-shot stream fully so it can be replayed to several adapters.
fn buffer_stream(stream: &mut dyn Read) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn replay(buffer: &[u8]) -> Cursor<&[u8]> {
    Cursor::new(buffer)
}
