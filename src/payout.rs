use std::fmt;

/// How one physical hand finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Lost,
    Bust,
    Push,
    Won,
    Blackjack,
    Surrender,
    /// Dealer blackjack against an insured hand: the hand bet comes back.
    Insured,
}

impl Outcome {
    /// Chips credited back to the player for a hand that staked `bet`.
    pub fn payout(self, bet: u32) -> u32 {
        match self {
            Outcome::Lost | Outcome::Bust => 0,
            Outcome::Push | Outcome::Insured => bet,
            Outcome::Won => 2 * bet,
            Outcome::Blackjack => bet * 5 / 2,
            Outcome::Surrender => bet / 2,
        }
    }

    /// Terminal reward credited to the decision that owns the hand.
    pub fn reward(self, bet: u32) -> f64 {
        let bet = bet as f64;
        match self {
            Outcome::Lost | Outcome::Bust => -bet,
            Outcome::Push | Outcome::Insured => bet,
            Outcome::Won => 2.0 * bet,
            Outcome::Blackjack => 2.5 * bet,
            Outcome::Surrender => 0.5 * bet,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Lost => "lost",
            Outcome::Bust => "bust",
            Outcome::Push => "push",
            Outcome::Won => "won",
            Outcome::Blackjack => "blackjack",
            Outcome::Surrender => "surrender",
            Outcome::Insured => "insured",
        };
        write!(f, "{}", s)
    }
}

/// Resolution of the insurance side bet, settled right after the dealer peeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsuranceSettlement {
    /// Bought, and the dealer had blackjack.
    Paid { insurance: u32, bet: u32 },
    /// Bought, and the dealer did not have blackjack.
    Forfeited { insurance: u32 },
    /// Offered and declined.
    Declined { dealer_blackjack: bool, bet: u32 },
}

impl InsuranceSettlement {
    /// Chips credited for the side bet itself.
    pub fn payout(self) -> u32 {
        match self {
            InsuranceSettlement::Paid { insurance, .. } => insurance,
            _ => 0,
        }
    }

    /// Credit owed to the insurance decision, or `None` when it earns nothing
    /// beyond the hand's own outcome.
    pub fn reward(self) -> Option<f64> {
        match self {
            InsuranceSettlement::Paid { insurance, bet } => Some((insurance + bet) as f64),
            InsuranceSettlement::Forfeited { insurance } => Some(-(insurance as f64)),
            InsuranceSettlement::Declined { dealer_blackjack: false, bet } => Some((bet / 2) as f64),
            InsuranceSettlement::Declined { dealer_blackjack: true, .. } => None,
        }
    }
}

/// Price of insuring a round that has `total_bet` chips staked.
pub fn insurance_price(total_bet: u32) -> u32 {
    total_bet / 2
}
