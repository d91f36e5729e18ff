use crate::{app::App, router::RouteRecord};
use anyhow::Result;

/// Pushes each path through the guarded router, printing where it landed.
///
/// # Errors
/// Returns the first navigation error.
pub async fn visit(app: &mut App, paths: &[String]) -> Result<()> {
    for path in paths {
        let outcome = app.router.push(path).await?;
        for redirect in &outcome.redirects {
            println!("{redirect} -> redirected");
        }
        println!(
            "{} [{}] {:?} \"{}\"",
            outcome.route.full_path,
            outcome.route.name().unwrap_or("-"),
            outcome.status,
            app.router.document().title()
        );
    }
    Ok(())
}

pub fn routes(app: &App) {
    for record in app.router.table().records() {
        print_record(record, 0);
    }
}

fn print_record(record: &RouteRecord, depth: usize) {
    let mut flags = Vec::new();
    if record.requires_auth {
        flags.push("auth");
    }
    if record.guest_only {
        flags.push("guest");
    }

    let target = record
        .redirect
        .as_deref()
        .map(|to| format!("-> {to}"))
        .or_else(|| record.name.clone())
        .unwrap_or_default();

    println!(
        "{:indent$}{:<24} {:<20} {}",
        "",
        record.path,
        target,
        flags.join(","),
        indent = depth * 2
    );

    for child in &record.children {
        print_record(child, depth + 1);
    }
}
