use super::{block_on, Context, Session};
use crate::output::{print_json, print_section};
use serde::Serialize;
use trigger_core::action::{format_order, TriggerAction};
use trigger_core::types::{Category, Section, Timing};

#[derive(Serialize)]
struct PartitionView<'a> {
    setting: &'a str,
    object: &'a str,
    category: Category,
    timing: Timing,
    before: &'a [TriggerAction],
    after: &'a [TriggerAction],
}

pub fn run(ctx: &Context, object: &str, category: Category, timing: Option<Timing>) -> anyhow::Result<()> {
    let mut session = block_on(Session::open(ctx))??;
    let setting = session.select_object(object)?;
    session.explorer.select_category(category)?;
    if let Some(timing) = timing {
        session.explorer.select_timing(timing)?;
    }

    let explorer = &session.explorer;
    let timing = explorer.selection().timing();
    let partition = explorer.partition();
    if ctx.json {
        return print_json(&PartitionView {
            setting: &setting.developer_name,
            object: &setting.object_api_name,
            category,
            timing,
            before: &partition.before,
            after: &partition.after,
        });
    }

    println!("{} ({}) / {}", setting.label, setting.object_api_name, category.label());
    for section in Section::all().iter().copied() {
        if !timing.includes(section) {
            continue;
        }
        println!();
        print_section(
            section.title(),
            &["ORDER", "DEVELOPER NAME", "LABEL", "TYPE", "RUNS", "STATUS"],
            rows(partition.section(section)),
            "No actions configured.",
        );
    }
    Ok(())
}

pub(crate) fn rows(actions: &[TriggerAction]) -> Vec<Vec<String>> {
    actions
        .iter()
        .map(|a| {
            vec![
                format_order(a.order),
                a.developer_name.clone(),
                a.label.clone(),
                a.type_label().to_string(),
                a.implementation_name().to_string(),
                a.status_label().to_string(),
            ]
        })
        .collect()
}
