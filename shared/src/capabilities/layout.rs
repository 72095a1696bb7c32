//! Off-screen measurement of a row's hidden tag-panel probe.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::model::RecordKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutOperation {
    /// Lay out the invisible probe rendered for `key` and report its
    /// settled height once.
    MeasureProbe { key: RecordKey },
}

/// `height` is `None` when the host had not laid the row out yet.
/// `at_ms` is on the same clock as animation frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOutput {
    pub height: Option<f64>,
    pub at_ms: f64,
}

impl Operation for LayoutOperation {
    type Output = LayoutOutput;
}

#[derive(crux_core::macros::Capability)]
pub struct Layout<Ev> {
    context: CapabilityContext<LayoutOperation, Ev>,
}

impl<Ev> Layout<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<LayoutOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn measure_probe<F>(&self, key: RecordKey, make_event: F)
    where
        F: FnOnce(LayoutOutput) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let output = context
                .request_from_shell(LayoutOperation::MeasureProbe { key })
                .await;
            context.update_app(make_event(output));
        });
    }
}
