//! Animation-frame clock provided by the shell's compositor.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameOperation {
    NextFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    /// Monotonic frame timestamp in milliseconds.
    pub at_ms: f64,
}

impl Operation for FrameOperation {
    type Output = FrameOutput;
}

#[derive(crux_core::macros::Capability)]
pub struct Frames<Ev> {
    context: CapabilityContext<FrameOperation, Ev>,
}

impl<Ev> Frames<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<FrameOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn next_frame<F>(&self, make_event: F)
    where
        F: FnOnce(f64) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let frame = context.request_from_shell(FrameOperation::NextFrame).await;
            context.update_app(make_event(frame.at_ms));
        });
    }
}
