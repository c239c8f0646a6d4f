use super::{block_on, Context, Session};
use crate::output::print_json;
use anyhow::Context as _;
use trigger_core::modal::ModalMode;

/// Set a trigger setting's bypass flag through the setting edit form.
pub fn run(ctx: &Context, object: &str, bypass: bool) -> anyhow::Result<()> {
    block_on(async {
        let mut session = Session::open(ctx).await?;
        let setting = session.select_object(object)?;
        if setting.bypass_execution == bypass {
            println!(
                "{} is already {}",
                setting.developer_name,
                if bypass { "bypassed" } else { "active" }
            );
            return Ok(());
        }

        session.explorer.open_setting(&setting.id, ModalMode::Edit)?;
        session
            .explorer
            .modal_mut()
            .and_then(|m| m.setting_draft_mut())
            .context("setting form is not editable")?
            .bypass_execution = bypass;
        session.explorer.save_modal().await?;
        let message = session.settle().await?;

        let updated = session
            .explorer
            .current_setting()
            .context("setting disappeared after reload")?;
        if ctx.json {
            return print_json(updated);
        }
        println!(
            "{}: {}",
            updated.developer_name,
            message.unwrap_or_else(|| "saved".to_string())
        );
        Ok(())
    })?
}
