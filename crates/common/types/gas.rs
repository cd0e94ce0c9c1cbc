use serde::{Deserialize, Serialize};
use std::fmt;

/// A two-dimensional gas amount.
///
/// `l2` meters execution, `da` meters data availability. The same shape
/// serves as a cost to debit, a remaining balance, an allocation request and
/// a refund; which one it is depends on where it flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gas {
    pub l2: u64,
    pub da: u64,
}

impl Gas {
    pub const ZERO: Gas = Gas { l2: 0, da: 0 };

    pub const fn new(l2: u64, da: u64) -> Self {
        Gas { l2, da }
    }

    /// Per-dimension minimum. Caps a nested-call allocation request at the
    /// caller's remaining balance.
    pub fn min(self, other: Gas) -> Gas {
        Gas {
            l2: self.l2.min(other.l2),
            da: self.da.min(other.da),
        }
    }

    /// Debits `cost` from both dimensions, naming the dimension that would
    /// go negative. A balance is never partially debited.
    pub fn checked_sub(self, cost: Gas) -> Result<Gas, GasDimension> {
        let l2 = self.l2.checked_sub(cost.l2).ok_or(GasDimension::L2)?;
        let da = self.da.checked_sub(cost.da).ok_or(GasDimension::Da)?;
        Ok(Gas { l2, da })
    }

    pub fn checked_add(self, other: Gas) -> Option<Gas> {
        Some(Gas {
            l2: self.l2.checked_add(other.l2)?,
            da: self.da.checked_add(other.da)?,
        })
    }

    pub fn saturating_add(self, other: Gas) -> Gas {
        Gas {
            l2: self.l2.saturating_add(other.l2),
            da: self.da.saturating_add(other.da),
        }
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{l2: {}, da: {}}}", self.l2, self.da)
    }
}

/// Names one of the two metered resources in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasDimension {
    L2,
    Da,
}

impl fmt::Display for GasDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GasDimension::L2 => write!(f, "l2"),
            GasDimension::Da => write!(f, "da"),
        }
    }
}
