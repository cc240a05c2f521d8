//! The deterministic simulation loop.
//!
//! One trading day is fully processed before the next begins: deposits,
//! then signal generation, then the day's single entry/exit decision, then
//! scheduled management fees. Fee tiering counts trades per calendar month
//! and balance invariants must hold at every observable point, so the loop
//! is single-threaded and synchronous and nothing in it blocks or suspends.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::brokerage::fees::FeeStructure;
use crate::domain::brokerage::Brokerage;
use crate::domain::cash::CashAccount;
use crate::domain::equity::{EquityClass, EquityIdentity, EquityOrderVolume};
use crate::domain::error::PapertraderError;
use crate::domain::event::{
    BrokerageEventListener, CashEventListener, EquityEventListener, OrderEvent, OrderEventListener,
};
use crate::domain::indicator::CalculationContext;
use crate::domain::management_fee::{ChargeAgainst, ManagementFeePolicy};
use crate::domain::order::{EntrySizePolicy, Order};
use crate::domain::price::{validate_sequence, TradingDayPrice};
use crate::domain::signal::periodic::PeriodicSchedule;
use crate::domain::signal::{SignalGenerator, SignalType};
use crate::domain::strategy::{build_generator, Strategy};

/// Validated simulation window. Construction rejects an end before the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationDates {
    start: NaiveDate,
    end: NaiveDate,
}

impl SimulationDates {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PapertraderError> {
        if end < start {
            return Err(PapertraderError::InvalidSimulationDates { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DepositConfiguration {
    None,
    Periodic {
        amount: Decimal,
        frequency_days: u64,
    },
}

#[derive(Debug)]
pub struct SimulationSetup {
    pub identity: EquityIdentity,
    pub equity_class: EquityClass,
    pub dates: SimulationDates,
    pub opening_funds: Decimal,
    pub deposit: DepositConfiguration,
    pub entry_policy: EntrySizePolicy,
    pub fee_structure: FeeStructure,
    pub management_fee: ManagementFeePolicy,
    pub strategy: Strategy,
    pub ctx: CalculationContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthPoint {
    pub date: NaiveDate,
    pub net_worth: Decimal,
}

/// Final ledger of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub cash_balance: Decimal,
    pub equity_balance: Decimal,
    pub final_close: Decimal,
    /// cash + equity x latest close
    pub net_worth: Decimal,
    pub entries: u32,
    pub exits: u32,
    pub deposits: u32,
    pub brokerage_fees: Decimal,
    pub management_fees: Decimal,
    pub net_worth_curve: Vec<NetWorthPoint>,
}

pub struct Simulation {
    identity: EquityIdentity,
    dates: SimulationDates,
    opening_funds: Decimal,
    entry_policy: EntrySizePolicy,
    management_fee: ManagementFeePolicy,
    ctx: CalculationContext,
    cash: CashAccount,
    brokerage: Brokerage,
    entry_generator: Option<Box<dyn SignalGenerator>>,
    exit_generator: Option<Box<dyn SignalGenerator>>,
    deposit: Option<(PeriodicSchedule, Decimal)>,
    fee_anchor: Option<NaiveDate>,
    order_listeners: Vec<Rc<RefCell<dyn OrderEventListener>>>,
    entries: u32,
    exits: u32,
    deposits: u32,
    brokerage_fees: Decimal,
    management_fees: Decimal,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("identity", &self.identity)
            .field("dates", &self.dates)
            .field("opening_funds", &self.opening_funds)
            .field("entry_policy", &self.entry_policy)
            .field("management_fee", &self.management_fee)
            .field("ctx", &self.ctx)
            .field("cash", &self.cash)
            .field("brokerage", &self.brokerage)
            .field("entry_generator", &self.entry_generator.is_some())
            .field("exit_generator", &self.exit_generator.is_some())
            .field("deposit", &self.deposit)
            .field("fee_anchor", &self.fee_anchor)
            .field("order_listeners", &self.order_listeners.len())
            .field("entries", &self.entries)
            .field("exits", &self.exits)
            .field("deposits", &self.deposits)
            .field("brokerage_fees", &self.brokerage_fees)
            .field("management_fees", &self.management_fees)
            .finish()
    }
}

impl Simulation {
    pub fn new(setup: SimulationSetup) -> Result<Self, PapertraderError> {
        let brokerage = Brokerage::new(setup.fee_structure.schedule(), setup.equity_class)?;

        let start = setup.dates.start();
        let entry_generator =
            build_generator(&setup.strategy.entry, SignalType::Bullish, start, &setup.ctx);
        let exit_generator =
            build_generator(&setup.strategy.exit, SignalType::Bearish, start, &setup.ctx);

        let deposit = match setup.deposit {
            DepositConfiguration::None => None,
            DepositConfiguration::Periodic {
                amount,
                frequency_days,
            } => Some((PeriodicSchedule::new(start, frequency_days), amount)),
        };

        Ok(Self {
            identity: setup.identity,
            dates: setup.dates,
            opening_funds: setup.opening_funds,
            entry_policy: setup.entry_policy,
            management_fee: setup.management_fee,
            ctx: setup.ctx,
            cash: CashAccount::new(),
            brokerage,
            entry_generator: Some(entry_generator),
            exit_generator: Some(exit_generator),
            deposit,
            fee_anchor: None,
            order_listeners: Vec::new(),
            entries: 0,
            exits: 0,
            deposits: 0,
            brokerage_fees: Decimal::ZERO,
            management_fees: Decimal::ZERO,
        })
    }

    /// Register one recorder for every event stream the run produces.
    pub fn register_recorder<R>(&mut self, recorder: Rc<RefCell<R>>)
    where
        R: CashEventListener
            + BrokerageEventListener
            + EquityEventListener
            + OrderEventListener
            + 'static,
    {
        self.cash.register_listener(recorder.clone());
        self.brokerage.register_listener(recorder.clone());
        self.brokerage.register_equity_listener(recorder.clone());
        self.order_listeners.push(recorder);
    }

    pub fn cash_balance(&self) -> Decimal {
        self.cash.balance()
    }

    pub fn equity_balance(&self) -> Decimal {
        self.brokerage.equity_balance()
    }

    /// Replay the strategy over the price sequence, one day at a time.
    pub fn run(
        &mut self,
        prices: &[TradingDayPrice],
    ) -> Result<SimulationReport, PapertraderError> {
        validate_sequence(prices)?;
        self.drop_starved_generators(prices);

        let mut opened = false;
        let mut curve = Vec::new();
        let mut final_close = Decimal::ZERO;

        for (index, day) in prices.iter().enumerate() {
            if day.date < self.dates.start() {
                continue;
            }
            if day.date > self.dates.end() {
                break;
            }

            if !opened {
                opened = true;
                self.fee_anchor = Some(day.date);
                if self.opening_funds > Decimal::ZERO {
                    self.cash.deposit(self.opening_funds, day.date)?;
                    self.deposits += 1;
                }
            }

            self.apply_deposit(day.date)?;

            let history = &prices[..=index];
            if self.signal_today(history, day.date, SignalType::Bearish) {
                self.try_exit(day);
            } else if self.signal_today(history, day.date, SignalType::Bullish) {
                self.try_enter(day);
            }

            self.apply_management_fee(day);

            final_close = day.close;
            curve.push(NetWorthPoint {
                date: day.date,
                net_worth: self.cash.balance() + self.brokerage.equity_balance() * day.close,
            });
        }

        Ok(SimulationReport {
            cash_balance: self.cash.balance(),
            equity_balance: self.brokerage.equity_balance(),
            final_close,
            net_worth: self.cash.balance() + self.brokerage.equity_balance() * final_close,
            entries: self.entries,
            exits: self.exits,
            deposits: self.deposits,
            brokerage_fees: self.brokerage_fees,
            management_fees: self.management_fees,
            net_worth_curve: curve,
        })
    }

    /// A generator whose requirement exceeds the whole run contributes no
    /// signals; drop it up front and keep the run going.
    fn drop_starved_generators(&mut self, prices: &[TradingDayPrice]) {
        for (generator, side) in [
            (&mut self.entry_generator, "entry"),
            (&mut self.exit_generator, "exit"),
        ] {
            let starved = generator
                .as_ref()
                .is_some_and(|g| g.required_trading_days() + 1 > prices.len());
            if starved {
                warn!(
                    ticker = %self.identity.ticker,
                    side,
                    have = prices.len(),
                    "too few trading days for generator; it will contribute no signals"
                );
                *generator = None;
            }
        }
    }

    /// Whether the generator for `want` fires a signal dated `today`, given
    /// the trailing slice of history it declared it needs. Data-quality
    /// failures are logged and contribute no signal.
    fn signal_today(
        &mut self,
        history: &[TradingDayPrice],
        today: NaiveDate,
        want: SignalType,
    ) -> bool {
        let generator = match want {
            SignalType::Bullish => self.entry_generator.as_mut(),
            SignalType::Bearish => self.exit_generator.as_mut(),
        };
        let Some(generator) = generator else {
            return false;
        };

        let needed = generator.required_trading_days() + 1;
        if history.len() < needed {
            return false;
        }
        let slice = &history[history.len() - needed..];

        match generator.generate(slice) {
            Ok(signals) => signals
                .iter()
                .any(|s| s.date == today && s.signal_type == want),
            Err(error) => {
                warn!(ticker = %self.identity.ticker, %today, %error, "signal generation failed");
                false
            }
        }
    }

    fn apply_deposit(&mut self, date: NaiveDate) -> Result<(), PapertraderError> {
        let Some((schedule, amount)) = self.deposit.as_mut() else {
            return Ok(());
        };
        if schedule.due(date) {
            let amount = *amount;
            self.cash.deposit(amount, date)?;
            self.deposits += 1;
        }
        Ok(())
    }

    /// Size, place, and execute an entry order. Signal generation has
    /// already happened; the order is placed before any balance mutates,
    /// and a refused debit leaves every balance untouched.
    fn try_enter(&mut self, day: &TradingDayPrice) {
        let target = self.entry_policy.size(self.cash.balance());
        if target <= Decimal::ZERO {
            debug!(date = %day.date, "entry signal without affordable position");
            return;
        }
        if day.close <= Decimal::ZERO {
            warn!(date = %day.date, "entry skipped: close price is zero");
            return;
        }

        // Budget the fee at the full target first; fees are monotonic in
        // trade value, so value + fee(value) can never exceed the target.
        let fee_ceiling = self.brokerage.cost(target, day.date);
        let budget = target - fee_ceiling;
        if budget <= Decimal::ZERO {
            warn!(date = %day.date, "entry skipped: fee exceeds sized position");
            return;
        }

        let volume = match EquityOrderVolume::truncated(budget / day.close, self.identity.scale) {
            Ok(volume) if !volume.is_zero() => volume,
            Ok(_) => {
                debug!(date = %day.date, "entry skipped: sized volume rounds to zero");
                return;
            }
            Err(error) => {
                warn!(date = %day.date, %error, "entry skipped");
                return;
            }
        };

        let value = day.close * volume.value();
        let fee = self.brokerage.cost(value, day.date);
        let order = Order::entry(value + fee, volume, day.date);

        let before = self.cash.balance();
        if let Err(error) = self.cash.debit(order.total_cost, day.date) {
            warn!(date = %day.date, %error, "entry order skipped");
            return;
        }
        self.brokerage.buy(day.close, &order.volume, day.date);

        self.notify_order(OrderEvent {
            class: order.class,
            total_cost: order.total_cost,
            before,
            after: self.cash.balance(),
            date: day.date,
        });
        self.entries += 1;
        self.brokerage_fees += fee;
    }

    /// Close the whole position. A sell whose fee would exceed its proceeds
    /// is skipped rather than executed at a negative net.
    fn try_exit(&mut self, day: &TradingDayPrice) {
        let holding = self.brokerage.equity_balance();
        if holding <= Decimal::ZERO {
            return;
        }
        let volume = match EquityOrderVolume::new(holding) {
            Ok(volume) => volume,
            Err(error) => {
                warn!(date = %day.date, %error, "exit skipped");
                return;
            }
        };

        let value = day.close * holding;
        let fee = self.brokerage.cost(value, day.date);
        if value <= fee {
            warn!(date = %day.date, %value, %fee, "exit skipped: fee exceeds proceeds");
            return;
        }
        let order = Order::exit(value - fee, volume, day.date);

        let before = self.cash.balance();
        let proceeds = match self.brokerage.sell(day.close, &order.volume, day.date) {
            Ok(proceeds) => proceeds,
            Err(error) => {
                warn!(date = %day.date, %error, "exit order skipped");
                return;
            }
        };
        if let Err(error) = self.cash.credit(proceeds, day.date) {
            warn!(date = %day.date, %error, "exit proceeds not credited");
            return;
        }

        self.notify_order(OrderEvent {
            class: order.class,
            total_cost: order.total_cost,
            before,
            after: self.cash.balance(),
            date: day.date,
        });
        self.exits += 1;
        self.brokerage_fees += fee;
    }

    fn apply_management_fee(&mut self, day: &TradingDayPrice) {
        let ManagementFeePolicy::Periodic {
            rate,
            period_days,
            charge,
        } = self.management_fee
        else {
            return;
        };
        let Some(anchor) = self.fee_anchor else {
            return;
        };
        let elapsed = (day.date - anchor).num_days();
        if elapsed < period_days as i64 {
            return;
        }

        let holding = self.brokerage.equity_balance();
        let fee = rate.calculate(holding, day.close, elapsed, &self.ctx);
        self.fee_anchor = Some(day.date);
        if fee <= Decimal::ZERO {
            return;
        }

        match charge {
            ChargeAgainst::Cash => {
                if let Err(error) = self.cash.debit(fee, day.date) {
                    warn!(date = %day.date, %error, "management fee skipped");
                    return;
                }
                self.management_fees += fee;
            }
            ChargeAgainst::Equity => {
                if day.close <= Decimal::ZERO {
                    warn!(date = %day.date, "management fee skipped: close price is zero");
                    return;
                }
                let reduction = (fee / day.close).trunc_with_scale(self.identity.scale);
                if reduction <= Decimal::ZERO {
                    return;
                }
                if let Err(error) = self.brokerage.charge_equity(reduction, day.date) {
                    warn!(date = %day.date, %error, "management fee skipped");
                    return;
                }
                self.management_fees += fee;
            }
        }
    }

    fn notify_order(&self, event: OrderEvent) {
        for listener in &self.order_listeners {
            listener.borrow_mut().order_event(&event);
        }
    }
}
