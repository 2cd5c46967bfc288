#![no_main]

use eafsum::category::CategoryTable;
use eafsum::config::AnalysisConfig;
use eafsum::pipeline::Analyzer;
use eafsum::source::AnnotationDocument;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<AnnotationDocument>(data) else {
        return;
    };
    let Ok(table) = CategoryTable::default_table() else {
        return;
    };
    let config = AnalysisConfig::default();
    let analyzer = Analyzer::new(&config, &table);

    if let Some(report) = analyzer.analyze("fuzz", &document) {
        // Totals row is the sum of every tier and combination row
        let exclusive: i64 = report.rows(true, false).iter().map(|r| r.exclusive).sum();
        assert_eq!(report.totals().exclusive, exclusive);
        assert!(report.totals().exclusive >= 0);
    }
});
