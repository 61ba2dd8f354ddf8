use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{Published, VariableValue},
    readings::Reading,
};

pub fn build_readings_table(readings: &[Reading], published: &Published) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec![
        "Reading",
        if published.last_update_succeeded { "Value" } else { "Value (last update failed)" },
        "Unit",
        "Updated",
    ]);
    for reading in readings {
        let value = reading.value(&published.snapshot);
        let is_stale = value.is_some() && !reading.is_available(published);
        let value_cell = match value {
            Some(VariableValue::Number(value)) => {
                Cell::new(format!("{value:.3}")).set_alignment(CellAlignment::Right)
            }
            Some(VariableValue::Text(text)) => {
                let attributes = reading
                    .attributes(&published.snapshot)
                    .into_iter()
                    .map(|(key, value)| format!("\n{key}: {value}"))
                    .join("");
                Cell::new(format!("{text}{attributes}")).fg(Color::Cyan)
            }
            None => Cell::new("unavailable").add_attribute(Attribute::Dim),
        };
        let updated_at = published
            .snapshot
            .last_success_at(reading.group)
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_default();
        let (value_cell, updated_cell) = if is_stale {
            (
                value_cell.add_attribute(Attribute::Dim),
                Cell::new(format!("{updated_at} stale")).fg(Color::DarkYellow),
            )
        } else {
            (value_cell, Cell::new(updated_at).add_attribute(Attribute::Dim))
        };
        table.add_row(vec![
            Cell::new(&reading.name),
            value_cell,
            Cell::new(reading.unit().map(|unit| unit.to_string()).unwrap_or_default())
                .add_attribute(Attribute::Dim),
            updated_cell,
        ]);
    }
    table
}
