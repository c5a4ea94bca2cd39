use bt_types::Decision;

use crate::types::Position;

/// Turns a (decision, strength) advisory into a signed order quantity.
pub trait Sizer {
    fn size(&self, decision: Decision, strength: f64, position: Option<&Position>, latest_close: f64) -> f64;
}

/// `default_order_size = floor(default_order_value / latest_close)` for
/// entries; exits flip the sign of the open position's entry quantity.
pub struct DefaultSizer {
    pub default_order_value: f64,
}

impl Sizer for DefaultSizer {
    fn size(&self, decision: Decision, strength: f64, position: Option<&Position>, latest_close: f64) -> f64 {
        match decision {
            Decision::CloseLong | Decision::CloseShort => {
                let entry_quantity = position.expect("exit decision requires an open position").quantity;
                -entry_quantity * strength
            }
            Decision::Long => {
                let default_order_size = (self.default_order_value / latest_close).floor();
                default_order_size * strength
            }
            Decision::Short => {
                let default_order_size = (self.default_order_value / latest_close).floor();
                -default_order_size * strength
            }
            Decision::Nothing => 0.0,
        }
    }
}
