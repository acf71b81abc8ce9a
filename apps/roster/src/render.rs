use client_core::{
    detail::MemberDetail,
    directory::{DirectoryRow, SortIndicator},
    DirectoryEngine, Projection,
};
use shared::domain::SortField;

fn indicator_glyph(indicator: SortIndicator) -> &'static str {
    match indicator {
        SortIndicator::Unsorted => "",
        SortIndicator::Ascending => " ↑",
        SortIndicator::Descending => " ↓",
    }
}

fn marked(text: &str, matched: bool) -> String {
    if matched {
        format!("*{text}*")
    } else {
        text.to_string()
    }
}

fn format_row(row: &DirectoryRow<'_>) -> String {
    format!(
        "{:>4}. {} {} <{}>",
        row.position,
        marked(&row.member.name, row.matches.name),
        marked(&row.member.surname, row.matches.surname),
        marked(&row.member.email, row.matches.email),
    )
}

pub fn print_directory(projection: &Projection<'_>, engine: &DirectoryEngine) {
    let view = engine.view();
    if view.search_term.is_empty() {
        println!("Total Members: {}", projection.total_members);
    } else {
        println!(
            "Found: {} of {} (search \"{}\")",
            projection.total_filtered, projection.total_members, view.search_term
        );
    }
    println!(
        "Sort: Name{} | Surname{}",
        indicator_glyph(engine.sort_indicator(SortField::Name)),
        indicator_glyph(engine.sort_indicator(SortField::Surname)),
    );

    if projection.is_empty() {
        if projection.total_members == 0 {
            println!("No members registered yet.");
        } else {
            println!("No members match \"{}\".", view.search_term);
        }
        return;
    }

    for row in &projection.rows {
        println!("{}", format_row(row));
    }
    if let Some((page, pages)) = projection.page_label() {
        println!(
            "Showing {}-{} of {} | Page {page} of {pages}",
            projection.page_start_index + 1,
            projection.page_end_index_exclusive,
            projection.total_filtered,
        );
    }
}

pub fn print_detail(detail: &MemberDetail) {
    println!("{}", detail.full_name);
    println!("  Email:        {}", detail.email);
    println!("  Registered:   {}", detail.registered);
    if let Some(updated) = &detail.last_updated {
        println!("  Last updated: {updated}");
    }
    println!(
        "  Member since: {} ({} days)",
        detail.registered_short, detail.member_since_days
    );
}
