use super::{block_on, Context, Session};
use crate::cmd::actions::rows;
use crate::output::{print_json, print_section};
use anyhow::{bail, Context as _};
use std::collections::HashSet;
use trigger_core::action::TriggerAction;
use trigger_core::explorer::ExplorerController;
use trigger_core::types::{Category, Direction, OrderMode, Section, Timing};

/// Move actions into the given sequence, then save with positional numbering.
pub fn positional(
    ctx: &Context,
    object: &str,
    category: Category,
    section: Section,
    names: &[String],
) -> anyhow::Result<()> {
    block_on(async {
        let mut session = open_section(ctx, object, category, section).await?;
        let current = session.explorer.section_actions(section);
        let distinct: HashSet<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
        if names.len() != current.len() || distinct.len() != names.len() {
            bail!(
                "expected each of the {} actions in the {} section exactly once",
                current.len(),
                section
            );
        }

        session.explorer.begin_reorder(section)?;
        for (target, name) in names.iter().enumerate() {
            let id = id_for(&session.explorer.section_actions(section), name)?;
            let from = position(&session.explorer, section, &id)?;
            for _ in target..from {
                session.explorer.move_action(section, &id, Direction::Up)?;
            }
        }
        save(ctx, &mut session, section).await
    })?
}

/// Enter manual mode, type and blur each value, then save.
pub fn manual(
    ctx: &Context,
    object: &str,
    category: Category,
    section: Section,
    assignments: &[String],
) -> anyhow::Result<()> {
    block_on(async {
        let mut session = open_section(ctx, object, category, section).await?;
        session.explorer.begin_reorder(section)?;
        session.explorer.set_order_mode(section, OrderMode::Manual)?;
        for assignment in assignments {
            let Some((name, value)) = assignment.split_once('=') else {
                bail!("expected NAME=VALUE, got '{assignment}'");
            };
            let id = id_for(&session.explorer.section_actions(section), name.trim())?;
            session
                .explorer
                .edit_manual_order(section, &id, value)
                .with_context(|| format!("invalid order for {name}"))?;
            session.explorer.blur_manual_order(section, &id, value)?;
        }
        save(ctx, &mut session, section).await
    })?
}

async fn open_section(
    ctx: &Context,
    object: &str,
    category: Category,
    section: Section,
) -> anyhow::Result<Session> {
    let mut session = Session::open(ctx).await?;
    session.select_object(object)?;
    session.explorer.select_category(category)?;
    if section == Section::Before && category.before_field().is_none() {
        bail!("{category} has no before section");
    }
    let timing = session.explorer.selection().timing();
    if !timing.includes(section) {
        if session.explorer.options().timings.contains(&Timing::Both) {
            session.explorer.select_timing(Timing::Both)?;
        } else {
            bail!("the {section} section is not available for this object");
        }
    }
    Ok(session)
}

async fn save(ctx: &Context, session: &mut Session, section: Section) -> anyhow::Result<()> {
    session.explorer.request_save_order(section)?;
    session.explorer.confirm_save_order().await?;
    let message = session.settle().await?;

    let saved = session.explorer.section_actions(section);
    if ctx.json {
        return print_json(&saved);
    }
    if let Some(message) = message {
        println!("{message}");
    }
    print_section(
        section.title(),
        &["ORDER", "DEVELOPER NAME", "LABEL", "TYPE", "RUNS", "STATUS"],
        rows(&saved),
        "No actions configured.",
    );
    Ok(())
}

fn id_for(actions: &[TriggerAction], name: &str) -> anyhow::Result<String> {
    actions
        .iter()
        .find(|a| a.developer_name.eq_ignore_ascii_case(name))
        .map(|a| a.id.clone())
        .with_context(|| format!("'{name}' is not in this section"))
}

fn position(
    explorer: &ExplorerController,
    section: Section,
    id: &str,
) -> anyhow::Result<usize> {
    explorer
        .section_actions(section)
        .iter()
        .position(|a| a.id == id)
        .with_context(|| format!("action {id} left the section"))
}
