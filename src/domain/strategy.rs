//! Strategy definition: signal expression AST and generator lowering.
//!
//! A strategy names one expression for entry and one for exit. Expressions
//! compose generators with `or` (deduplicated union) and `confirmed`
//! (anchor gated through a confirmation window). Lowering an expression for
//! a direction produces the single [`SignalGenerator`] the simulation
//! consults each day.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::error::PapertraderError;
use crate::domain::indicator::CalculationContext;
use crate::domain::signal::combinator::{ConfirmedSignals, OrSignals};
use crate::domain::signal::confirmation::Confirmation;
use crate::domain::signal::gradient::{GradientSignals, MovingAverage};
use crate::domain::signal::macd_cross::MacdCrossSignals;
use crate::domain::signal::periodic::PeriodicSignals;
use crate::domain::signal::rsi_level::RsiLevelSignals;
use crate::domain::signal::{SignalGenerator, SignalType};

/// Trading days a generator may emit on beyond its indicator window.
pub const DEFAULT_LOOKBACK: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorSpec {
    SmaGradient {
        window: usize,
        lookback: usize,
    },
    EmaGradient {
        window: usize,
        lookback: usize,
    },
    MacdCross {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    RsiLevel {
        window: usize,
        oversold: Decimal,
        overbought: Decimal,
    },
    Periodic {
        frequency_days: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalExpr {
    Generator(GeneratorSpec),
    Or(Box<SignalExpr>, Box<SignalExpr>),
    Confirmed {
        anchor: Box<SignalExpr>,
        confirming: Box<SignalExpr>,
        delay: u32,
        range: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub entry: SignalExpr,
    pub exit: SignalExpr,
}

/// Lower an expression into a generator emitting `direction` signals.
/// `start_date` anchors periodic generators to the simulation start.
pub fn build_generator(
    expr: &SignalExpr,
    direction: SignalType,
    start_date: NaiveDate,
    ctx: &CalculationContext,
) -> Box<dyn SignalGenerator> {
    match expr {
        SignalExpr::Generator(spec) => match spec {
            GeneratorSpec::SmaGradient { window, lookback } => Box::new(GradientSignals::new(
                MovingAverage::Simple(*window),
                direction,
                *lookback,
                ctx.clone(),
            )),
            GeneratorSpec::EmaGradient { window, lookback } => Box::new(GradientSignals::new(
                MovingAverage::Exponential(*window),
                direction,
                *lookback,
                ctx.clone(),
            )),
            GeneratorSpec::MacdCross { fast, slow, signal } => Box::new(MacdCrossSignals::new(
                *fast,
                *slow,
                *signal,
                direction,
                DEFAULT_LOOKBACK,
                ctx.clone(),
            )),
            GeneratorSpec::RsiLevel {
                window,
                oversold,
                overbought,
            } => Box::new(RsiLevelSignals::new(
                *window,
                *oversold,
                *overbought,
                direction,
                DEFAULT_LOOKBACK,
                ctx.clone(),
            )),
            GeneratorSpec::Periodic { frequency_days } => Box::new(PeriodicSignals::new(
                start_date,
                *frequency_days,
                direction,
            )),
        },
        SignalExpr::Or(left, right) => Box::new(OrSignals::new(
            build_generator(left, direction, start_date, ctx),
            build_generator(right, direction, start_date, ctx),
        )),
        SignalExpr::Confirmed {
            anchor,
            confirming,
            delay,
            range,
        } => Box::new(ConfirmedSignals::new(
            build_generator(anchor, direction, start_date, ctx),
            build_generator(confirming, direction, start_date, ctx),
            Confirmation::new(*delay, *range),
        )),
    }
}

/// Reject parameterisations a calculator or schedule would choke on later.
pub fn validate_expr(expr: &SignalExpr) -> Result<(), PapertraderError> {
    match expr {
        SignalExpr::Generator(spec) => validate_spec(spec),
        SignalExpr::Or(left, right) => {
            validate_expr(left)?;
            validate_expr(right)
        }
        SignalExpr::Confirmed {
            anchor, confirming, ..
        } => {
            validate_expr(anchor)?;
            validate_expr(confirming)
        }
    }
}

fn validate_spec(spec: &GeneratorSpec) -> Result<(), PapertraderError> {
    match spec {
        GeneratorSpec::SmaGradient { window, .. } | GeneratorSpec::EmaGradient { window, .. } => {
            if *window == 0 {
                return Err(PapertraderError::StrategyInvalid {
                    reason: "moving average window must be positive".into(),
                });
            }
        }
        GeneratorSpec::MacdCross { fast, slow, signal } => {
            if *fast == 0 || *slow == 0 || *signal == 0 {
                return Err(PapertraderError::StrategyInvalid {
                    reason: "MACD periods must be positive".into(),
                });
            }
            if fast >= slow {
                return Err(PapertraderError::StrategyInvalid {
                    reason: format!(
                        "MACD fast period {} must be below slow period {}",
                        fast, slow
                    ),
                });
            }
        }
        GeneratorSpec::RsiLevel {
            window,
            oversold,
            overbought,
        } => {
            if *window == 0 {
                return Err(PapertraderError::StrategyInvalid {
                    reason: "RSI window must be positive".into(),
                });
            }
            if oversold >= overbought {
                return Err(PapertraderError::StrategyInvalid {
                    reason: format!(
                        "RSI oversold level {} must be below overbought level {}",
                        oversold, overbought
                    ),
                });
            }
        }
        GeneratorSpec::Periodic { frequency_days } => {
            if *frequency_days == 0 {
                return Err(PapertraderError::StrategyInvalid {
                    reason: "periodic frequency must be at least one day".into(),
                });
            }
        }
    }
    Ok(())
}

impl fmt::Display for SignalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalExpr::Generator(spec) => write!(f, "{}", spec),
            SignalExpr::Or(left, right) => write!(f, "{} or {}", left, right),
            SignalExpr::Confirmed {
                anchor,
                confirming,
                delay,
                range,
            } => write!(f, "confirmed({}, {}, {}, {})", anchor, confirming, delay, range),
        }
    }
}

impl fmt::Display for GeneratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorSpec::SmaGradient { window, lookback } => {
                write!(f, "sma-gradient({}, {})", window, lookback)
            }
            GeneratorSpec::EmaGradient { window, lookback } => {
                write!(f, "ema-gradient({}, {})", window, lookback)
            }
            GeneratorSpec::MacdCross { fast, slow, signal } => {
                write!(f, "macd({}, {}, {})", fast, slow, signal)
            }
            GeneratorSpec::RsiLevel {
                window,
                oversold,
                overbought,
            } => write!(f, "rsi({}, {}, {})", window, oversold, overbought),
            GeneratorSpec::Periodic { frequency_days } => {
                write!(f, "periodic({})", frequency_days)
            }
        }
    }
}
