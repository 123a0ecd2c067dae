//! Progress bars for running batches.
//!
//! - `style` - progress bar styling options
//! - `display` - the display driven by a batch's events
//!
//! # Examples
//!
//! ```rust
//! use dljob::batch::BatchBuilder;
//! use dljob::progress::StyleOptions;
//!
//! # fn example() -> dljob::Result<()> {
//! let batch = BatchBuilder::new()
//!     .style_options(StyleOptions::default())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
