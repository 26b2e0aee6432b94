//! # sovran-state
//!
//! Thread-safe extrinsic state for shared objects.
//!
//! `sovran-state` lets any shared value (`Arc<T>`) carry a typed "current state"
//! without declaring a field for it and without extending its lifetime. The state
//! lives in a process-wide side table keyed by the identity of the owner's
//! allocation, and the entry goes away once the owner does.
//!
//! ## Key Features
//!
//! - **Extrinsic**: Attach state to types you don't control, after the fact
//! - **Type-safe**: Typed reads and updates are checked at runtime against the stored state type
//! - **Thread-safe**: One lock for the side table, one lock per owner's state cell
//! - **Non-owning**: The side table holds only `Weak` references to owners
//! - **Permissive**: Any state may replace any other; there is no transition table
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_state::{State, Stateful, StatefulExt, WrongState};
//! use std::sync::Arc;
//!
//! struct MyView;
//! impl Stateful for MyView {}
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Normal;
//! impl State for Normal {}
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Disabled {
//!     opacity: f32,
//! }
//! impl State for Disabled {}
//!
//! fn main() -> Result<(), WrongState> {
//!     let view = Arc::new(MyView);
//!
//!     // Nothing is set until someone sets it
//!     assert!(view.current_state().is_none());
//!
//!     // Any state can replace any other
//!     view.set(Disabled { opacity: 0.3 });
//!     view.set(Normal);
//!     assert!(view.is::<Normal>());
//!
//!     // Typed reads fail cleanly on the wrong type
//!     match view.at::<Disabled>() {
//!         Ok(disabled) => println!("Disabled at {}", disabled.opacity),
//!         Err(e) => println!("Not disabled: {}", e),
//!     }
//!
//!     view.reset();
//!     assert!(view.current_state().is_none());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Evolving the Current State
//!
//! ```rust
//! use sovran_state::{State, Stateful, StatefulExt, WrongState};
//! use std::sync::Arc;
//!
//! struct Slider;
//! impl Stateful for Slider {}
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Dragging {
//!     position: u32,
//! }
//! impl State for Dragging {}
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Idle;
//! impl State for Idle {}
//!
//! fn main() -> Result<(), WrongState> {
//!     let slider = Arc::new(Slider);
//!     slider.set(Dragging { position: 10 });
//!
//!     // update works on a copy and writes it back
//!     slider.update(|drag: &mut Dragging| drag.position += 5)?;
//!     assert_eq!(slider.at::<Dragging>()?, Dragging { position: 15 });
//!
//!     // update never changes the state's type
//!     assert!(slider.update(|_: &mut Idle| {}).is_err());
//!     assert_eq!(slider.at::<Dragging>()?, Dragging { position: 15 });
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Deterministic Release
//!
//! Entries for dropped owners are swept automatically as the table grows.
//! Owners that want their entry gone immediately can release it on drop:
//!
//! ```rust
//! use sovran_state::{State, StateTable, Stateful, StatefulExt};
//! use std::sync::Arc;
//!
//! struct Tooltip;
//! impl Stateful for Tooltip {}
//!
//! impl Drop for Tooltip {
//!     fn drop(&mut self) {
//!         StateTable::global().release_in_drop(self);
//!     }
//! }
//!
//! #[derive(Debug, Clone)]
//! struct Visible;
//! impl State for Visible {}
//!
//! let tooltip = Arc::new(Tooltip);
//! tooltip.set(Visible);
//! assert!(StateTable::global().contains(&tooltip));
//! drop(tooltip);
//! ```

mod any_state;
mod cell;
mod error;
mod handle;
mod state;
mod stateful;
mod table;

pub use any_state::AnyState;
pub use cell::StateCell;
pub use error::{Result, WrongState};
pub use handle::StateHandle;
pub use state::{State, StateId};
pub use stateful::{Stateful, StatefulExt};
pub use table::{StateTable, TableConfig};
