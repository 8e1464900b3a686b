//! Report tables using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use mti_sim::SimulationStats;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    if super::no_color() {
        Cell::new(text)
    } else {
        Cell::new(text).add_attribute(Attribute::Bold).fg(Color::Cyan)
    }
}

/// Creates a key-value table (two columns: key and value).
pub fn info_table(entries: &[(&str, String)]) -> Table {
    let mut table = base_table();
    for (key, value) in entries {
        let key_cell = if super::no_color() {
            Cell::new(key)
        } else {
            Cell::new(key).fg(Color::DarkGrey)
        };
        table.add_row(vec![key_cell, Cell::new(value)]);
    }
    table
}

/// Prints a key-value table.
pub fn print_info_table(entries: &[(&str, String)]) {
    println!("{}", info_table(entries));
}

/// Breaks the slot count of a run down by physical status.
///
/// Lost and corrupted slots overlap the three status rows, so their share is
/// shown against the total without summing to it.
pub fn slot_table(stats: &SimulationStats) -> Table {
    let mut table = base_table();
    table.set_header(vec![
        header_cell("Slots"),
        header_cell("Count"),
        header_cell("Share"),
    ]);

    let rows = [
        ("success", stats.success_slots),
        ("collision", stats.collision_slots),
        ("idle", stats.idle_slots),
        ("lost", stats.lost_slots),
        ("corrupted", stats.corrupted_slots),
        ("total", stats.total_slots),
    ];
    for (label, count) in rows {
        let share = if stats.total_slots == 0 {
            0.0
        } else {
            count as f64 / stats.total_slots as f64 * 100.0
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{share:.1}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
