#![no_main]

use eafsum::category::CategoryTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed tables must come back as errors, never panics
        if let Ok(table) = CategoryTable::from_toml_str(input) {
            for (index, category) in table.categories().iter().enumerate() {
                for code in &category.codes {
                    assert_eq!(table.classify(code), Some(index));
                }
            }
        }
    }
});
