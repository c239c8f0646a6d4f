use super::{block_on, Context, Session};
use crate::output::{print_json, print_table};

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let session = block_on(Session::open(ctx))??;
    let settings = session.explorer.settings();

    if ctx.json {
        return print_json(&settings);
    }
    if settings.is_empty() {
        println!("No trigger settings.");
        return Ok(());
    }

    let rows = settings
        .iter()
        .map(|s| {
            vec![
                s.developer_name.clone(),
                s.label.clone(),
                s.object_api_name.clone(),
                if s.bypass_execution { "yes" } else { "no" }.to_string(),
                if s.is_change_event() { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(
        &["DEVELOPER NAME", "LABEL", "OBJECT", "BYPASSED", "CHANGE EVENT"],
        rows,
    );
    Ok(())
}
