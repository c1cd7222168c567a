use plugboard_core::Result;

use crate::facade::ServerFacade;

/// The fixed entry-point contract every plugin implements.
///
/// `setup` registers resources, tools, prompts, or sampling handlers on the
/// facade and may read the facade's configuration for its own settings.
/// `teardown` runs once at unload; the default does nothing.
///
/// No execution deadline is imposed on either call: a slow plugin blocks the
/// lifecycle operation that invoked it.
pub trait Plugin: Send {
    fn setup(&mut self, facade: &mut ServerFacade) -> Result<()>;

    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}
