//! Inventory fetch. Transport, auth and retries belong to the shell; the
//! core only asks for the current payload and decodes it.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryOperation {
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryOutput {
    Payload { body: String },
    Failed { message: String },
}

impl Operation for InventoryOperation {
    type Output = InventoryOutput;
}

#[derive(crux_core::macros::Capability)]
pub struct Inventory<Ev> {
    context: CapabilityContext<InventoryOperation, Ev>,
}

impl<Ev> Inventory<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<InventoryOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn fetch<F>(&self, make_event: F)
    where
        F: FnOnce(InventoryOutput) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let output = context.request_from_shell(InventoryOperation::Fetch).await;
            context.update_app(make_event(output));
        });
    }
}
