#![no_main]
use db2_table::{ElementType, FieldLayout, LoadOptions, Table, TableLayout};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let layout = TableLayout::new(vec![
        FieldLayout::scalar(ElementType::U32),
        FieldLayout::scalar(ElementType::String),
        FieldLayout::array(ElementType::F32, 3),
        FieldLayout::scalar(ElementType::I16),
    ]);
    let options = LoadOptions {
        require_layout_match: false,
        ..LoadOptions::default()
    };
    if let Ok(table) = Table::load(data, &layout, &options) {
        for row in table.records() {
            for column in 0..layout.len() {
                let _ = row.values(column);
                let _ = row.strings(column);
            }
        }
    }
});
