//! Entitlement gate
//!
//! The only contract the simulation has with whatever grants a session
//! (a token burn on the live site): a run may not start until the gate
//! says yes. Each grant is good for exactly one run.

/// Something that can grant a session
pub trait EntitlementGate {
    /// Take one grant if available
    fn try_consume(&mut self) -> bool;
}

/// Grants every request. Used natively and in demo mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOpen;

impl EntitlementGate for AlwaysOpen {
    fn try_consume(&mut self) -> bool {
        true
    }
}

/// Grants issued from outside, e.g. when a payment confirmation lands on a
/// later frame
#[derive(Debug, Default, Clone)]
pub struct ManualGate {
    pending: u32,
}

impl ManualGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self) {
        self.pending += 1;
        log::info!("entitlement granted ({} pending)", self.pending);
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }
}

impl EntitlementGate for ManualGate {
    fn try_consume(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_gate_single_use() {
        let mut gate = ManualGate::new();
        assert!(!gate.try_consume());
        gate.grant();
        assert!(gate.try_consume());
        assert!(!gate.try_consume());
    }

    #[test]
    fn test_always_open() {
        let mut gate = AlwaysOpen;
        assert!(gate.try_consume());
        assert!(gate.try_consume());
    }
}
