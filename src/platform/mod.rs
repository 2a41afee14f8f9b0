//! Platform abstraction layer
//!
//! Host boundary between the browser (or a native harness) and the
//! simulation:
//! - Monotonic time, with pause support
//! - Held-key tracking and the stuck-key safety net
//! - The entitlement gate that guards session start

pub mod clock;
pub mod gate;
pub mod input;

pub use clock::{Clock, ManualClock, PausableClock};
pub use gate::{AlwaysOpen, EntitlementGate, ManualGate};
pub use input::{Binding, InputState, Key, STUCK_KEY_TIMEOUT_MS};
