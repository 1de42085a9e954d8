use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

pub type UpgradeId = u8;

pub const COST_SCALING: f64 = 1.15;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    pub id: UpgradeId,
    pub name: String,
    pub base_cost: u64,
    /// Passive rate added per unit owned, in resource per second.
    pub effect: f64,
}

impl UpgradeSpec {
    fn new(id: UpgradeId, name: &str, base_cost: u64, effect: f64) -> Self {
        Self {
            id,
            name: name.into(),
            base_cost,
            effect,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Gain per manual click.
    pub click_power: f64,
    pub cost_scaling: f64,
    pub catalog: Vec<UpgradeSpec>,
}

impl EconomyConfig {
    pub fn clamped(self) -> Self {
        let cost_scaling = if self.cost_scaling >= 1.0 {
            self.cost_scaling
        } else {
            log::warn!("cost scaling {} would lower prices, using 1.0", self.cost_scaling);
            1.0
        };
        let click_power = if self.click_power.is_finite() && self.click_power >= 0.0 {
            self.click_power
        } else {
            log::warn!("click power {} rejected, using 1.0", self.click_power);
            1.0
        };
        let mut catalog = self.catalog;
        catalog.retain(|spec| spec.effect.is_finite() && spec.effect >= 0.0);
        Self {
            click_power,
            cost_scaling,
            catalog,
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            click_power: 1.0,
            cost_scaling: COST_SCALING,
            catalog: alloc::vec![
                UpgradeSpec::new(1, "Cache Buffer", 15, 1.0),
                UpgradeSpec::new(2, "Node Processor", 100, 5.0),
                UpgradeSpec::new(3, "Server Rack", 500, 20.0),
                UpgradeSpec::new(4, "Quantum Core", 2000, 100.0),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub id: UpgradeId,
    pub name: String,
    pub effect: f64,
    pub cost: u64,
    pub owned: u32,
}

impl Upgrade {
    fn from_spec(spec: &UpgradeSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name.clone(),
            effect: spec.effect,
            cost: spec.base_cost,
            owned: 0,
        }
    }
}

/// Next price after a purchase: `floor(cost * scaling)`.
pub fn scaled_cost(cost: u64, scaling: f64) -> u64 {
    // float-to-int casts truncate, which is floor for non-negative values
    (cost as f64 * scaling) as u64
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PurchaseOutcome {
    NoChange,
    Bought { paid: u64, next_cost: u64 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EconomyInput {
    Gain,
    Purchase(UpgradeId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub balance: f64,
    pub rate: f64,
    pub click_power: f64,
    pub upgrades: Vec<Upgrade>,
}

#[derive(Clone, Debug)]
pub struct IncrementalEconomy {
    config: EconomyConfig,
    balance: f64,
    rate: f64,
    upgrades: Vec<Upgrade>,
}

impl IncrementalEconomy {
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    pub fn upgrade(&self, id: UpgradeId) -> Option<&Upgrade> {
        self.upgrades.iter().find(|upgrade| upgrade.id == id)
    }

    pub fn can_afford(&self, id: UpgradeId) -> bool {
        self.upgrade(id)
            .is_some_and(|upgrade| self.balance >= upgrade.cost as f64)
    }

    /// Player-triggered gain, independent of the passive rate.
    pub fn manual_gain(&mut self, amount: f64) {
        if !(amount.is_finite() && amount >= 0.0) {
            log::warn!("ignored manual gain of {}", amount);
            return;
        }
        self.balance += amount;
    }

    pub fn purchase(&mut self, id: UpgradeId) -> Result<PurchaseOutcome> {
        let scaling = self.config.cost_scaling;
        let upgrade = self
            .upgrades
            .iter_mut()
            .find(|upgrade| upgrade.id == id)
            .ok_or(GameError::UnknownUpgrade(id))?;

        let cost = upgrade.cost;
        if self.balance < cost as f64 {
            return Ok(PurchaseOutcome::NoChange);
        }

        self.balance -= cost as f64;
        self.rate += upgrade.effect;
        upgrade.owned += 1;
        upgrade.cost = scaled_cost(cost, scaling);
        log::debug!(
            "bought {} #{} for {}, rate now {}",
            upgrade.name,
            upgrade.owned,
            cost,
            self.rate
        );

        Ok(PurchaseOutcome::Bought {
            paid: cost,
            next_cost: upgrade.cost,
        })
    }

    fn deal(&mut self) {
        self.balance = 0.0;
        self.rate = 0.0;
        self.upgrades = self.config.catalog.iter().map(Upgrade::from_spec).collect();
    }
}

impl Simulator for IncrementalEconomy {
    type Config = EconomyConfig;
    type Input = EconomyInput;
    type Snapshot = EconomySnapshot;

    /// Deterministic; the seed is unused.
    fn new(config: EconomyConfig, _seed: u64) -> Self {
        let mut game = Self {
            config: config.clamped(),
            balance: 0.0,
            rate: 0.0,
            upgrades: Vec::new(),
        };
        game.deal();
        game
    }

    fn apply(&mut self, input: EconomyInput) {
        match input {
            EconomyInput::Gain => self.manual_gain(self.config.click_power),
            EconomyInput::Purchase(id) => {
                if let Err(err) = self.purchase(id) {
                    log::warn!("ignored {:?}: {}", input, err);
                }
            }
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.balance += self.rate * dt.as_secs_f64();
    }

    /// The economy has no end state.
    fn is_terminal(&self) -> bool {
        false
    }

    fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            balance: self.balance,
            rate: self.rate,
            click_power: self.config.click_power,
            upgrades: self.upgrades.clone(),
        }
    }

    fn reset(&mut self) {
        self.deal();
    }
}
