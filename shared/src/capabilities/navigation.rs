use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Barcode/photo capture flow.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationOperation {
    Navigate { route: Route },
}

impl Operation for NavigationOperation {
    type Output = ();
}

#[derive(crux_core::macros::Capability)]
pub struct Navigation<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Navigation<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn navigate(&self, route: Route) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context
                .notify_shell(NavigationOperation::Navigate { route })
                .await;
        });
    }
}
