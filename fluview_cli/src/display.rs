use comfy_table::{presets::NOTHING, *};
use fluview::{endpoint::Endpoint, locations::Coverage};
use strum::IntoEnumIterator;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

pub fn endpoints_table() -> Table {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Endpoint").add_attribute(Attribute::Bold),
        Cell::new("Location parameter").add_attribute(Attribute::Bold),
        Cell::new("Epiweeks required").add_attribute(Attribute::Bold),
    ]);
    for endpoint in Endpoint::iter() {
        table.add_row(vec![
            endpoint.to_string(),
            endpoint.main_param().unwrap_or("-").to_string(),
            if endpoint.requires_time_range() {
                "yes".to_string()
            } else {
                "no".to_string()
            },
        ]);
    }
    table
}

pub fn display_endpoints() {
    println!("\n{}", endpoints_table());
}

/// Prints which requested locations have hospitalization surveillance data.
pub fn display_coverage(coverage: &Coverage) {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Location").add_attribute(Attribute::Bold),
        Cell::new("flusurv").add_attribute(Attribute::Bold),
    ]);
    for location in &coverage.covered {
        table.add_row(vec![location.as_str(), "covered"]);
    }
    for location in &coverage.uncovered {
        table.add_row(vec![location.as_str(), "not covered"]);
    }
    eprintln!("\n{}", table);
}
