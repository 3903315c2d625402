pub mod config;
pub mod controller;
pub mod page;
pub mod session;
pub mod surface;
pub mod timeline;

use serde_json::Value;

pub use config::{ConfigError, Settings};
pub use controller::{Booklet, Control, ControlState, Effect};
pub use page::{PageId, Panel, TurnMethod};
pub use session::{Command, Session};
pub use surface::{RecordingSurface, Surface, SurfaceCall};

/// Resolves `options` over the defaults and builds a booklet from the page
/// elements of each panel, in document order.
pub fn create_booklet<E>(
    options: &Value,
    left: impl IntoIterator<Item = E>,
    right: impl IntoIterator<Item = E>,
) -> Result<Booklet<E>, ConfigError> {
    let settings = Settings::from_options(options)?;
    Ok(Booklet::new(settings, left, right))
}
