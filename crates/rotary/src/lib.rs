pub mod macros;

pub mod angle;
pub mod range;
pub mod selector;
pub mod settle;
pub mod tick;
pub mod unit;

pub use range::{HighlightBand, RangeError, StepIndex, ValueRange};
pub use selector::{GestureAction, Phase, RotaryValueSelector, SelectorConfig};
pub use settle::{SettleAnimation, SpringParams};
pub use tick::{Emphasis, Tick, Tone};
pub use unit::Unit;
