use serenity::{all::ComponentInteraction, prelude::Context as IncomingContext};
use tracing::{debug, error};

use crate::{
    commands::giveaway::interaction,
    common::custom_id::ComponentAction,
    models::{
        command::{InteractionContext, InteractionContextReply},
        handler::Handler,
    },
};

impl Handler {
    pub async fn on_component(&self, ctx: IncomingContext, component: ComponentInteraction) {
        let start = std::time::Instant::now();

        let Some(action) = ComponentAction::parse(&component.data.custom_id) else {
            debug!(
                "Ignoring button press with unknown custom id {}",
                component.data.custom_id
            );
            return;
        };

        let interaction_context = InteractionContext::new(ctx, component);
        if let Err(err) = interaction::handle(self, &interaction_context, action).await {
            error!("Failed to handle button press: {:?}", err);
            if let Err(err) = interaction_context.error_message(err).await {
                error!(
                    "Could not notify user of failed button press. Failed with error: {:?}",
                    err
                );
            }
        }

        debug!("Took {:?} to handle a button press", start.elapsed());
    }
}
